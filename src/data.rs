use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

/// Stable record identity within one tub store, assigned at capture time.
pub type RecordIndex = u64;

/// One logged frame as read from a catalog segment.
///
/// Records are immutable once loaded; the audit never rewrites them.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Record {
    /// Capture-order index, unique within the store.
    #[serde(rename = "_index")]
    pub index: RecordIndex,
    /// Filename of the image artifact, when one was recorded.
    #[serde(rename = "cam/image_array", default)]
    pub image: Option<String>,
    /// Signed steering angle, when the channel was recorded.
    #[serde(rename = "user/angle", default)]
    pub angle: Option<f64>,
}

/// Why a frame was flagged for exclusion.
#[derive(Clone, Debug, PartialEq)]
pub enum ProblemReason {
    /// The referenced image artifact exists nowhere under the store root.
    MissingFile,
    /// The artifact exists but fails structural verification or decode.
    InvalidImage,
    /// Mean grayscale intensity fell strictly outside the configured bounds.
    Brightness(f64),
    /// The frame sits inside an over-long run of near-zero steering.
    ZeroAngleRun,
}

impl fmt::Display for ProblemReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProblemReason::MissingFile => write!(f, "missing file"),
            ProblemReason::InvalidImage => write!(f, "invalid image"),
            ProblemReason::Brightness(mean) => {
                write!(f, "brightness out of range ({mean:.1})")
            }
            ProblemReason::ZeroAngleRun => write!(f, "zero-angle run"),
        }
    }
}

/// A derived finding pairing a record index with its exclusion reason.
///
/// Never persisted; the deletion index stores only the indices.
#[derive(Clone, Debug, PartialEq)]
pub struct ProblemEntry {
    pub index: RecordIndex,
    /// Resolved image path, when one could be resolved.
    pub image_path: Option<PathBuf>,
    pub reason: ProblemReason,
}

/// Outcome of validating a single frame.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameOutcome {
    /// Already excluded, or nothing to check; no further checks run.
    Skipped,
    /// Image present, structurally sound, and within brightness bounds.
    Valid,
    /// The frame should be excluded from training.
    Problem(ProblemEntry),
}

/// Externally observable result of one audit pass.
#[derive(Clone, Debug)]
pub struct AuditReport {
    /// Records loaded from all catalog segments.
    pub total_records: usize,
    /// Indices already in the deletion index before this pass.
    pub previously_deleted: usize,
    /// Catalog lines skipped because they failed to parse.
    pub malformed_lines: usize,
    /// Newly found problems in discovery order, deduplicated by index.
    pub problems: Vec<ProblemEntry>,
    /// True when findings were committed to the manifest.
    pub committed: bool,
}

impl AuditReport {
    /// Number of newly found problem records.
    pub fn problem_count(&self) -> usize {
        self.problems.len()
    }
}
