use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error type for store-level structural failures and commit failures.
///
/// Per-frame findings are never errors; they surface as
/// [`ProblemEntry`](crate::data::ProblemEntry) values in the audit report.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("store root does not exist: {0}")]
    StoreNotFound(PathBuf),
    #[error("no catalog segments found under {0}")]
    CatalogMissing(PathBuf),
    #[error("manifest not found at {0}")]
    ManifestMissing(PathBuf),
    #[error("manifest has no deleted_indexes field to patch")]
    ManifestUnpatchable,
    #[error(transparent)]
    Io(#[from] io::Error),
}
