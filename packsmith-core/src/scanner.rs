//! Tree scanner
//!
//! Breadth-first walk of a pack's source directory. Entries are filtered
//! before they are statted, so an excluded directory is never descended into.
//! Sibling entries within one directory are statted concurrently; traversal
//! order across directories is not guaranteed. Per-entry I/O failures are
//! logged and skipped so a flaky filesystem cannot abort the whole scan.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::error::{checkpoint, Result};
use crate::filter::PackFilter;

/// Collect the files currently included in a build.
///
/// Checks the cancellation token between directories; an aborted scan returns
/// `Err(Cancelled)` and commits nothing.
pub async fn scan(
    root: &Path,
    filter: &PackFilter,
    token: &CancellationToken,
) -> Result<Vec<PathBuf>> {
    checkpoint(token)?;

    let mut queue: VecDeque<PathBuf> = VecDeque::from([root.to_path_buf()]);
    let mut files = Vec::new();

    while let Some(dir) = queue.pop_front() {
        checkpoint(token)?;

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Error reading directory {}: {}", dir.display(), e);
                continue;
            }
        };

        let mut children = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let path = entry.path();
                    if filter.allows_entry(&path) {
                        children.push(path);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Error listing directory {}: {}", dir.display(), e);
                    break;
                }
            }
        }

        let stats = join_all(children.into_iter().map(|path| async move {
            let meta = tokio::fs::metadata(&path).await;
            (path, meta)
        }))
        .await;

        for (path, meta) in stats {
            match meta {
                Ok(meta) if meta.is_dir() => queue.push_back(path),
                Ok(meta) if meta.is_file() => {
                    if filter.is_included(&path) {
                        files.push(path);
                    }
                }
                // Symlinks to neither, sockets and the like.
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Error processing entry {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(files)
}
