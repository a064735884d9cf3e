//! Inclusion filter
//!
//! Decides whether a path participates in a build. Patterns are glob-style and
//! matched against the path relative to the pack's source root, with forward
//! slashes. Exclude always wins over include, and the generated manifest file
//! is unconditionally excluded (it is a build output, never an input).

use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::error::{BuildError, Result};
use crate::manifest::MANIFEST_FILE;
use crate::path_utils::relative_to;

/// Compiled include/exclude rules for one pack.
///
/// Side-effect free and `Sync`; safe to share across concurrent scan tasks
/// and the filesystem watcher callback.
#[derive(Debug, Clone)]
pub struct PackFilter {
    root: PathBuf,
    include: Option<GlobSet>,
    exclude: GlobSet,
}

fn build_glob_set(patterns: &[String], extra: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns.iter().map(String::as_str).chain(extra.iter().copied()) {
        // `*` stays within one path segment; `**` crosses directories.
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| BuildError::Pattern {
                pattern: pattern.to_string(),
                source,
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| BuildError::Pattern {
        pattern: String::new(),
        source,
    })
}

impl PackFilter {
    pub fn new(root: &Path, include: &[String], exclude: &[String]) -> Result<Self> {
        let include = if include.is_empty() {
            None
        } else {
            Some(build_glob_set(include, &[])?)
        };
        // Manifest files are generated, never mirrored from the source tree.
        let exclude = build_glob_set(exclude, &[MANIFEST_FILE])?;

        Ok(Self {
            root: root.to_path_buf(),
            include,
            exclude,
        })
    }

    /// Exclusion gate applied to every directory entry before it is statted.
    ///
    /// A rejected directory is never descended into, so its contents are
    /// never visited.
    pub fn allows_entry(&self, path: &Path) -> bool {
        let Some(rel) = relative_to(&self.root, path) else {
            return false;
        };
        rel.is_empty() || !self.exclude.is_match(&rel)
    }

    /// Full inclusion check for a file path.
    pub fn is_included(&self, path: &Path) -> bool {
        if !self.allows_entry(path) {
            return false;
        }
        match &self.include {
            Some(include) => {
                // The root itself always passes; include rules apply to files.
                match relative_to(&self.root, path) {
                    Some(rel) if !rel.is_empty() => include.is_match(&rel),
                    _ => true,
                }
            }
            None => true,
        }
    }
}
