//! Transform & apply engine
//!
//! Applies one file change to the output tree. Adds and changes copy the
//! source file, converting relaxed-JSON variants (`.jsonc`, `.json5`) to
//! canonical pretty-printed JSON along the way; removes delete the mapped
//! destination and clean up a now-empty parent directory. Side effects are
//! confined to the output tree.

use std::path::{Path, PathBuf};

use crate::cache::{ChangeKind, FileChange};
use crate::error::{BuildError, Result};

/// Extensions parsed permissively and re-serialized as strict `.json`.
const CONVERT_EXTENSIONS: [&str; 2] = ["jsonc", "json5"];

fn should_convert(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| CONVERT_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// Map a source path to its destination under the output directory.
///
/// The destination mirrors the source's position relative to the source root,
/// with the extension rewritten to `.json` for convertible files.
pub fn dest_path(src_dir: &Path, out_dir: &Path, src_path: &Path) -> Result<PathBuf> {
    let rel = src_path
        .strip_prefix(src_dir)
        .map_err(|_| BuildError::Internal(format!(
            "path {} is outside the source root {}",
            src_path.display(),
            src_dir.display()
        )))?;

    let mut dest = out_dir.join(rel);
    if should_convert(src_path) {
        dest.set_extension("json");
    }
    Ok(dest)
}

async fn remove_output(dest: &Path) -> Result<()> {
    match tokio::fs::remove_file(dest).await {
        Ok(()) => {}
        // Nothing to remove; nothing to clean up either.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(BuildError::io(dest, e)),
    }

    // Delete the parent directory only when it is genuinely empty.
    let Some(parent) = dest.parent() else {
        return Ok(());
    };
    let mut entries = tokio::fs::read_dir(parent)
        .await
        .map_err(|e| BuildError::io(parent, e))?;
    let empty = entries
        .next_entry()
        .await
        .map_err(|e| BuildError::io(parent, e))?
        .is_none();
    if empty {
        tokio::fs::remove_dir(parent)
            .await
            .map_err(|e| BuildError::io(parent, e))?;
    }

    Ok(())
}

async fn copy_output(src_path: &Path, dest: &Path) -> Result<()> {
    let content = tokio::fs::read(src_path)
        .await
        .map_err(|e| BuildError::io(src_path, e))?;

    let content = if should_convert(src_path) {
        let text = String::from_utf8(content).map_err(|e| BuildError::Convert {
            path: src_path.to_path_buf(),
            message: e.to_string(),
        })?;
        let value: serde_json::Value =
            json5::from_str(&text).map_err(|e| BuildError::Convert {
                path: src_path.to_path_buf(),
                message: e.to_string(),
            })?;
        serde_json::to_string_pretty(&value)?.into_bytes()
    } else {
        content
    };

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| BuildError::io(parent, e))?;
    }
    tokio::fs::write(dest, content)
        .await
        .map_err(|e| BuildError::io(dest, e))?;

    Ok(())
}

/// Apply a single file change to the output tree.
///
/// Conversion failures (malformed relaxed JSON) are hard errors for this
/// file's apply operation: a silently mis-synced output is worse than a loud
/// failure.
pub async fn apply_change(change: &FileChange, src_dir: &Path, out_dir: &Path) -> Result<()> {
    let dest = dest_path(src_dir, out_dir, &change.path)?;

    match change.kind {
        ChangeKind::Remove => remove_output(&dest).await,
        ChangeKind::Add | ChangeKind::Change => copy_output(&change.path, &dest).await,
    }
}
