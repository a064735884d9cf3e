//! Texture list generator
//!
//! Resource packs can opt into a generated `textures/texture_list.json`: a
//! JSON array of the logical paths (extension stripped, forward slashes) of
//! every texture image already present in the output tree. The artifact is
//! always regenerated, never mirrored from the source.

use std::collections::VecDeque;
use std::path::Path;

use crate::error::{BuildError, Result};
use crate::path_utils::relative_to;

/// Artifact path, relative to the pack output root.
pub const TEXTURE_LIST_PATH: &str = "textures/texture_list.json";

/// Texture asset directory, relative to the pack output root.
pub const TEXTURES_DIR: &str = "textures";

/// Enumerate `.png` files under `<outDir>/textures` and write the list.
///
/// Runs post-apply, so the enumeration sees this cycle's copied textures.
pub async fn generate_texture_list(out_dir: &Path) -> Result<()> {
    let textures_dir = out_dir.join(TEXTURES_DIR);

    let mut entries = Vec::new();
    let mut queue = VecDeque::from([textures_dir.clone()]);
    while let Some(dir) = queue.pop_front() {
        let mut read_dir = match tokio::fs::read_dir(&dir).await {
            Ok(read_dir) => read_dir,
            // A pack without textures still gets an (empty) list.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(BuildError::io(&dir, e)),
        };

        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| BuildError::io(&dir, e))?
        {
            let path = entry.path();
            match entry.file_type().await {
                Ok(ty) if ty.is_dir() => queue.push_back(path),
                Ok(ty) if ty.is_file() => {
                    if path.extension().and_then(|e| e.to_str()) == Some("png") {
                        if let Some(rel) = relative_to(&textures_dir, path.with_extension("").as_path())
                        {
                            entries.push(format!("{TEXTURES_DIR}/{rel}"));
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Error processing entry {}: {}", path.display(), e),
            }
        }
    }
    entries.sort();

    let json = serde_json::to_string_pretty(&entries)?;
    let artifact = out_dir.join(TEXTURE_LIST_PATH);
    if let Some(parent) = artifact.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| BuildError::io(parent, e))?;
    }
    tokio::fs::write(&artifact, json)
        .await
        .map_err(|e| BuildError::io(&artifact, e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_texture_list_strips_extensions_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path();
        fs::create_dir_all(out.join("textures/blocks")).unwrap();
        fs::create_dir_all(out.join("textures/items")).unwrap();
        fs::write(out.join("textures/blocks/stone.png"), b"png").unwrap();
        fs::write(out.join("textures/items/sword.png"), b"png").unwrap();
        fs::write(out.join("textures/blocks/notes.txt"), b"skip me").unwrap();

        generate_texture_list(out).await.unwrap();

        let json = fs::read_to_string(out.join(TEXTURE_LIST_PATH)).unwrap();
        let list: Vec<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(
            list,
            vec!["textures/blocks/stone", "textures/items/sword"]
        );
    }

    #[tokio::test]
    async fn test_missing_textures_dir_yields_empty_list() {
        let dir = tempfile::tempdir().unwrap();

        generate_texture_list(dir.path()).await.unwrap();

        let json = fs::read_to_string(dir.path().join(TEXTURE_LIST_PATH)).unwrap();
        let list: Vec<String> = serde_json::from_str(&json).unwrap();
        assert!(list.is_empty());
    }
}
