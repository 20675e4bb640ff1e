//! Per-frame image validation.
//!
//! Pure with respect to the store: the validator reads image artifacts but
//! never writes, and decoder failures of any kind are converted into problem
//! outcomes rather than propagated.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use image::ImageReader;
use tracing::debug;

use crate::config::AuditConfig;
use crate::constants::store::IMAGES_SUBDIR;
use crate::data::{FrameOutcome, ProblemEntry, ProblemReason, Record, RecordIndex};

/// Locate an image artifact under the store root.
///
/// The root itself is tried first, then the conventional images
/// subdirectory; the first existing path wins.
pub fn resolve_image_path(store_root: &Path, filename: &str) -> Option<PathBuf> {
    let direct = store_root.join(filename);
    if direct.exists() {
        return Some(direct);
    }
    let nested = store_root.join(IMAGES_SUBDIR).join(filename);
    if nested.exists() {
        return Some(nested);
    }
    None
}

/// Validate one frame's image artifact.
///
/// Checks run in order and stop at the first finding: prior deletion, absent
/// reference, missing file, structural decode failure, brightness out of the
/// closed `[min_brightness, max_brightness]` interval. Single attempt per
/// frame, no side effects.
pub fn validate_frame(
    record: &Record,
    store_root: &Path,
    deleted: &HashSet<RecordIndex>,
    config: &AuditConfig,
) -> FrameOutcome {
    if deleted.contains(&record.index) {
        return FrameOutcome::Skipped;
    }
    let Some(filename) = record.image.as_deref() else {
        return FrameOutcome::Skipped;
    };
    let Some(path) = resolve_image_path(store_root, filename) else {
        return FrameOutcome::Problem(ProblemEntry {
            index: record.index,
            image_path: Some(store_root.join(filename)),
            reason: ProblemReason::MissingFile,
        });
    };
    let problem = |reason| {
        FrameOutcome::Problem(ProblemEntry {
            index: record.index,
            image_path: Some(path.clone()),
            reason,
        })
    };
    let Some(mean) = mean_intensity(&path) else {
        return problem(ProblemReason::InvalidImage);
    };
    if mean < config.min_brightness || mean > config.max_brightness {
        return problem(ProblemReason::Brightness(mean));
    }
    FrameOutcome::Valid
}

/// Mean grayscale intensity of the artifact, or `None` when it fails to
/// verify or decode.
///
/// Verification reads only the header (format sniff plus dimensions) so a
/// wrong-format artifact is rejected before any pixel work; the full decode
/// that follows catches truncation and corrupt payloads.
fn mean_intensity(path: &Path) -> Option<f64> {
    let verify = ImageReader::open(path)
        .ok()?
        .with_guessed_format()
        .ok()?
        .into_dimensions();
    if let Err(error) = verify {
        debug!(path = %path.display(), %error, "image failed structural verification");
        return None;
    }
    let decoded = ImageReader::open(path)
        .ok()?
        .with_guessed_format()
        .ok()?
        .decode();
    let gray = match decoded {
        Ok(img) => img.to_luma8(),
        Err(error) => {
            debug!(path = %path.display(), %error, "image failed to decode");
            return None;
        }
    };
    let pixels = gray.as_raw();
    if pixels.is_empty() {
        return None;
    }
    let sum: u64 = pixels.iter().map(|&value| u64::from(value)).sum();
    Some(sum as f64 / pixels.len() as f64)
}
