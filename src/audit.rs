//! Audit orchestration.
//!
//! One synchronous pass: load the store, run the two pure detectors over the
//! loaded snapshot, merge their findings with first-reason-wins precedence,
//! and commit the merged indices only when removal was requested. The two
//! detectors never share mutable state; precedence is decided in a single
//! merge step keyed by record index.

use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;

use crate::config::AuditConfig;
use crate::data::{AuditReport, FrameOutcome, ProblemEntry, ProblemReason, RecordIndex};
use crate::errors::AuditError;
use crate::sequence::flag_long_runs;
use crate::store::{StoreSnapshot, TubStore};
use crate::validate::{resolve_image_path, validate_frame};

/// Run one full audit pass over the store at `store_root`.
///
/// Store-level structural failures abort before any check runs; per-frame
/// findings accumulate into the report and never halt the pass.
pub fn audit(store_root: &Path, config: &AuditConfig) -> Result<AuditReport, AuditError> {
    let store = TubStore::open(store_root)?;
    let snapshot = store.load()?;
    debug!(
        records = snapshot.records.len(),
        deleted = snapshot.deleted.len(),
        "store loaded"
    );

    let frame_problems = frame_pass(&snapshot, store.root(), config);
    let run_problems = sequence_pass(&snapshot, store.root(), config);
    let problems = merge_problems(frame_problems, run_problems);

    let committed = if config.remove && !problems.is_empty() {
        let new_indexes: HashSet<RecordIndex> =
            problems.iter().map(|entry| entry.index).collect();
        store.commit(&snapshot.manifest_text, &new_indexes)?;
        true
    } else {
        false
    };

    Ok(AuditReport {
        total_records: snapshot.records.len(),
        previously_deleted: snapshot.deleted.len(),
        malformed_lines: snapshot.malformed_lines,
        problems,
        committed,
    })
}

/// Per-frame image validation over every non-deleted record.
fn frame_pass(
    snapshot: &StoreSnapshot,
    store_root: &Path,
    config: &AuditConfig,
) -> Vec<ProblemEntry> {
    snapshot
        .records
        .iter()
        .filter_map(
            |record| match validate_frame(record, store_root, &snapshot.deleted, config) {
                FrameOutcome::Problem(entry) => Some(entry),
                FrameOutcome::Skipped | FrameOutcome::Valid => None,
            },
        )
        .collect()
}

/// Zero-angle run detection over the full record list.
///
/// Runs over every record, deleted ones included, so that deletions never
/// split a genuine run; already-deleted indices are dropped from the output.
fn sequence_pass(
    snapshot: &StoreSnapshot,
    store_root: &Path,
    config: &AuditConfig,
) -> Vec<ProblemEntry> {
    flag_long_runs(&snapshot.records, config)
        .into_iter()
        .map(|pos| &snapshot.records[pos])
        .filter(|record| !snapshot.deleted.contains(&record.index))
        .map(|record| ProblemEntry {
            index: record.index,
            image_path: record
                .image
                .as_deref()
                .and_then(|name| resolve_image_path(store_root, name)),
            reason: ProblemReason::ZeroAngleRun,
        })
        .collect()
}

/// Merge the two problem collections, deduplicating by record index.
///
/// The frame pass is merged first, so its classification wins when both
/// passes flag the same record.
fn merge_problems(
    frame_problems: Vec<ProblemEntry>,
    run_problems: Vec<ProblemEntry>,
) -> Vec<ProblemEntry> {
    let mut merged: IndexMap<RecordIndex, ProblemEntry> = IndexMap::new();
    for entry in frame_problems.into_iter().chain(run_problems) {
        merged.entry(entry.index).or_insert(entry);
    }
    merged.into_values().collect()
}
