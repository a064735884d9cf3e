//! Manifest writer
//!
//! Writes the pack's manifest payload verbatim as pretty-printed JSON to the
//! output root, once at pipeline startup before the first compile cycle.

use std::path::Path;

use crate::error::{BuildError, Result};

/// Fixed manifest filename at the output root.
pub const MANIFEST_FILE: &str = "manifest.json";

pub async fn write_manifest(out_dir: &Path, manifest: &serde_json::Value) -> Result<()> {
    let json = serde_json::to_string_pretty(manifest)?;
    let path = out_dir.join(MANIFEST_FILE);

    tokio::fs::create_dir_all(out_dir)
        .await
        .map_err(|e| BuildError::io(out_dir, e))?;
    tokio::fs::write(&path, json)
        .await
        .map_err(|e| BuildError::io(&path, e))?;

    Ok(())
}
