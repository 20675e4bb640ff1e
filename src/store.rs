//! On-disk tub store adapter.
//!
//! The adapter is the only component that touches the store: `load` builds a
//! read-only snapshot and `commit` performs the one permitted mutation, a
//! targeted rewrite of the manifest's `deleted_indexes` array. Everything
//! else in the manifest survives a commit byte for byte, since external
//! tooling may depend on its exact formatting.

use std::collections::{BTreeSet, HashSet};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use regex_lite::Regex;
use tracing::warn;
use walkdir::WalkDir;

use crate::constants::store::{
    CATALOG_EXTENSION, CATALOG_PREFIX, DELETED_INDEXES_FIELD, MANIFEST_FILENAME,
};
use crate::data::{Record, RecordIndex};
use crate::errors::AuditError;

/// Read-only view of a tub store produced by [`TubStore::load`].
#[derive(Clone, Debug)]
pub struct StoreSnapshot {
    /// All records across every catalog segment, sorted by index ascending.
    pub records: Vec<Record>,
    /// Record indices already excluded from training.
    pub deleted: HashSet<RecordIndex>,
    /// Verbatim manifest text, retained for the targeted commit patch.
    pub manifest_text: String,
    /// Catalog lines skipped because they failed to parse.
    pub malformed_lines: usize,
}

/// Handle to one tub store root. Sole owner of on-disk mutation.
#[derive(Clone, Debug)]
pub struct TubStore {
    root: PathBuf,
}

impl TubStore {
    /// Open a store, failing if the root path does not exist.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, AuditError> {
        let root = root.into();
        if !root.exists() {
            return Err(AuditError::StoreNotFound(root));
        }
        Ok(Self { root })
    }

    /// Store root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load every catalog segment and the manifest deletion index.
    ///
    /// Catalog read order is irrelevant: record indices are the authoritative
    /// ordering key, and the returned list is sorted by index ascending.
    /// Unparseable lines are skipped and counted, never fatal.
    pub fn load(&self) -> Result<StoreSnapshot, AuditError> {
        let segments = self.catalog_segments();
        if segments.is_empty() {
            return Err(AuditError::CatalogMissing(self.root.clone()));
        }
        let manifest_path = self.manifest_path();
        if !manifest_path.exists() {
            return Err(AuditError::ManifestMissing(manifest_path));
        }
        let manifest_text = fs::read_to_string(&manifest_path)?;
        let deleted = extract_deleted_indexes(&manifest_text)
            .into_iter()
            .collect::<HashSet<_>>();

        let mut records = Vec::new();
        let mut malformed_lines = 0usize;
        for segment in &segments {
            let contents = fs::read_to_string(segment)?;
            for line in contents.lines() {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Record>(line) {
                    Ok(record) => records.push(record),
                    Err(error) => {
                        malformed_lines += 1;
                        warn!(
                            segment = %segment.display(),
                            %error,
                            "skipping unparseable catalog line"
                        );
                    }
                }
            }
        }
        records.sort_by_key(|record| record.index);

        Ok(StoreSnapshot {
            records,
            deleted,
            manifest_text,
            malformed_lines,
        })
    }

    /// Merge `new_indexes` into the manifest's deletion index.
    ///
    /// Writes the sorted union of the manifest's current indices and
    /// `new_indexes`; the deletion index never shrinks. Only the
    /// `deleted_indexes` field is rewritten, as a textual patch of
    /// `manifest_text`, so unrelated manifest content is preserved verbatim.
    pub fn commit(
        &self,
        manifest_text: &str,
        new_indexes: &HashSet<RecordIndex>,
    ) -> Result<(), AuditError> {
        let mut union: BTreeSet<RecordIndex> =
            extract_deleted_indexes(manifest_text).into_iter().collect();
        union.extend(new_indexes.iter().copied());
        let patched = patch_deleted_indexes(manifest_text, &union)?;
        fs::write(self.manifest_path(), patched)?;
        Ok(())
    }

    fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILENAME)
    }

    /// Catalog segment paths directly under the root, sorted for determinism.
    fn catalog_segments(&self) -> Vec<PathBuf> {
        let mut segments: Vec<PathBuf> = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| is_catalog_segment(entry.path()))
            .map(|entry| entry.path().to_path_buf())
            .collect();
        segments.sort();
        segments
    }
}

fn is_catalog_segment(path: &Path) -> bool {
    let name = path
        .file_name()
        .and_then(OsStr::to_str)
        .unwrap_or_default();
    name.starts_with(CATALOG_PREFIX)
        && path.extension().and_then(OsStr::to_str) == Some(CATALOG_EXTENSION)
}

fn deleted_indexes_regex() -> Regex {
    // The array holds flat integers only, so a non-greedy bracket pair is
    // sufficient and cannot cross into other fields.
    Regex::new(&format!(r#""{DELETED_INDEXES_FIELD}"\s*:\s*\[([^\]]*)\]"#))
        .expect("deletion index pattern is valid")
}

/// Indices recorded in the manifest's `deleted_indexes` field.
///
/// Tolerant by contract: an absent field, an empty array, or unparseable
/// elements all degrade to "nothing deleted".
pub fn extract_deleted_indexes(manifest_text: &str) -> Vec<RecordIndex> {
    let Some(captures) = deleted_indexes_regex().captures(manifest_text) else {
        return Vec::new();
    };
    captures[1]
        .split(',')
        .filter_map(|raw| raw.trim().parse::<RecordIndex>().ok())
        .collect()
}

/// Replace the manifest's `deleted_indexes` array with `indexes`, leaving all
/// other bytes untouched. Fails when the field is absent: silently dropping
/// audit results would be worse than aborting the commit.
pub fn patch_deleted_indexes(
    manifest_text: &str,
    indexes: &BTreeSet<RecordIndex>,
) -> Result<String, AuditError> {
    let regex = deleted_indexes_regex();
    let Some(found) = regex.find(manifest_text) else {
        return Err(AuditError::ManifestUnpatchable);
    };
    let rendered: Vec<String> = indexes.iter().map(u64::to_string).collect();
    let replacement = format!(
        r#""{DELETED_INDEXES_FIELD}": [{}]"#,
        rendered.join(", ")
    );
    let mut patched = String::with_capacity(manifest_text.len() + replacement.len());
    patched.push_str(&manifest_text[..found.start()]);
    patched.push_str(&replacement);
    patched.push_str(&manifest_text[found.end()..]);
    Ok(patched)
}
