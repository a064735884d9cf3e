//! Build cache and change detection
//!
//! The cache maps absolute source paths to their last-observed modification
//! time. It lives in memory for the lifetime of one pipeline instance and is
//! replaced wholesale at the end of every cycle: detection takes the previous
//! snapshot by reference and returns a brand-new one, so no component ever
//! mutates a shared cache in place.
//!
//! Detection is timestamp-based, not content-based. A file replaced with
//! different content but an identical modification time is not detected; this
//! is a deliberate, accepted limitation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tokio_util::sync::CancellationToken;

use crate::error::{checkpoint, Result};

/// Last-observed state of one source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntry {
    pub mtime: SystemTime,
}

/// Snapshot of the file set seen by the most recent successful scan.
#[derive(Debug, Clone, Default)]
pub struct BuildCache {
    entries: HashMap<PathBuf, CacheEntry>,
}

impl BuildCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &Path) -> Option<&CacheEntry> {
        self.entries.get(path)
    }

    pub fn insert(&mut self, path: PathBuf, mtime: SystemTime) {
        self.entries.insert(path, CacheEntry { mtime });
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.keys()
    }
}

/// What happened to a file since the previous cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Add,
    Change,
    Remove,
}

/// A single add/change/remove record for one source file path.
///
/// Exactly one change is produced per affected path per cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

impl FileChange {
    pub fn new(kind: ChangeKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

/// Diff the current file set against the previous cache snapshot.
///
/// Every successfully statted file enters the new cache whether or not it
/// produced a change; that is what makes the snapshot authoritative for the
/// next cycle. Files that fail to stat are logged and skipped: they are not
/// reported this cycle and the next one retries. Old-cache entries not seen
/// in the current scan become removes.
pub async fn detect_changes(
    files: &[PathBuf],
    old_cache: &BuildCache,
    token: &CancellationToken,
) -> Result<(Vec<FileChange>, BuildCache)> {
    let mut changes = Vec::new();
    let mut new_cache = BuildCache::new();

    for path in files {
        checkpoint(token)?;

        let mtime = match tokio::fs::metadata(path).await.and_then(|m| m.modified()) {
            Ok(mtime) => mtime,
            Err(e) => {
                tracing::warn!("Error processing file {}: {}", path.display(), e);
                continue;
            }
        };

        match old_cache.get(path) {
            None => changes.push(FileChange::new(ChangeKind::Add, path.clone())),
            Some(entry) if entry.mtime != mtime => {
                changes.push(FileChange::new(ChangeKind::Change, path.clone()));
            }
            Some(_) => {}
        }
        new_cache.insert(path.clone(), mtime);
    }

    for path in old_cache.paths() {
        if new_cache.get(path).is_none() {
            changes.push(FileChange::new(ChangeKind::Remove, path.clone()));
        }
    }

    Ok((changes, new_cache))
}
