//! Zero-steering run detection with turn-context suppression.
//!
//! Both passes here are pure: they read the ordered record slice and return
//! slice positions, leaving problem-entry construction to the orchestrator.

use crate::config::AuditConfig;
use crate::constants::detector::{
    TURN_CONTEXT_WINDOW, TURN_SUPPRESSION_THRESHOLD, ZERO_ANGLE_EPSILON,
};
use crate::data::Record;

/// Find maximal contiguous runs of near-zero steering.
///
/// A record extends the current run when its angle is present and
/// `|angle| < epsilon`; an absent angle or `|angle| >= epsilon` closes the
/// run. Returned runs hold slice positions in capture order and partition the
/// qualifying records, so runs never overlap.
pub fn zero_angle_runs(records: &[Record], epsilon: f64) -> Vec<Vec<usize>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (pos, record) in records.iter().enumerate() {
        match record.angle {
            Some(angle) if angle.abs() < epsilon => current.push(pos),
            _ => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Positions belonging to over-long runs that are not turn-adjacent.
///
/// Runs no longer than `max_zero_angle_count` are ignored. Longer runs are
/// suppressed whole when the mean absolute angle on either side of the run
/// exceeds the turn threshold; a mean exactly at the threshold does not
/// suppress. Runs are never partially flagged.
pub fn flag_long_runs(records: &[Record], config: &AuditConfig) -> Vec<usize> {
    let mut flagged = Vec::new();
    for run in zero_angle_runs(records, ZERO_ANGLE_EPSILON) {
        if run.len() <= config.max_zero_angle_count {
            continue;
        }
        let first = run[0];
        let last = run[run.len() - 1];
        let pre = side_mean(records, first.saturating_sub(TURN_CONTEXT_WINDOW)..first);
        let post = side_mean(
            records,
            last + 1..(last + 1 + TURN_CONTEXT_WINDOW).min(records.len()),
        );
        if pre > TURN_SUPPRESSION_THRESHOLD || post > TURN_SUPPRESSION_THRESHOLD {
            continue;
        }
        flagged.extend(run);
    }
    flagged
}

/// Mean absolute angle over the present-angle records in `range`, 0 if none.
fn side_mean(records: &[Record], range: std::ops::Range<usize>) -> f64 {
    let angles: Vec<f64> = records[range]
        .iter()
        .filter_map(|record| record.angle)
        .map(f64::abs)
        .collect();
    if angles.is_empty() {
        return 0.0;
    }
    angles.iter().sum::<f64>() / angles.len() as f64
}
