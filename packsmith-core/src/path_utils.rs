//! Cross-platform path utilities
//!
//! Windows paths use backslashes (`\`) while pack-relative paths (glob
//! matching, texture list entries) use forward slashes. These helpers keep the
//! two consistent.

use std::path::Path;

/// Normalize path separators to forward slashes
#[inline]
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Convert a path to a normalized string
#[inline]
pub fn path_to_string(path: &Path) -> String {
    normalize_path(&path.to_string_lossy())
}

/// Path relative to `root`, as a normalized string.
///
/// Returns `None` for paths outside `root`.
pub fn relative_to(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root).ok().map(path_to_string)
}
