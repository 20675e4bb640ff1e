#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Audit orchestration over one loaded store snapshot.
pub mod audit;
/// Command surface producing a validated audit configuration.
pub mod cli;
/// Audit configuration types.
pub mod config;
/// Centralized constants for store layout, detection, and defaults.
pub mod constants;
/// Record, problem, and report types.
pub mod data;
/// Zero-steering run detection and turn-context suppression.
pub mod sequence;
/// On-disk tub store adapter (the only component that mutates the store).
pub mod store;
/// Per-frame image validation.
pub mod validate;

mod errors;

pub use audit::audit;
pub use config::AuditConfig;
pub use data::{AuditReport, FrameOutcome, ProblemEntry, ProblemReason, Record, RecordIndex};
pub use errors::AuditError;
pub use store::{StoreSnapshot, TubStore};
pub use validate::validate_frame;
