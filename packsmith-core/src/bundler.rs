//! Script bundler collaborator
//!
//! Behavior-pack script sources are handed to an external `esbuild` process
//! rather than the copy engine. The pipeline only awaits completion; bundler
//! output is never inspected.

use std::path::Path;
use std::process::Stdio;

use tokio_util::sync::CancellationToken;

use crate::error::{checkpoint, BuildError, Result};
use crate::path_utils::path_to_string;
use crate::types::ScriptsConfig;

/// Bundle or transpile a pack's scripts into the output tree.
///
/// In bundle mode the configured entry point becomes one output file; in
/// per-file mode every script source under `src_dir` is transpiled in place.
pub async fn bundle_scripts(
    config: &ScriptsConfig,
    src_dir: &Path,
    out_dir: &Path,
    token: &CancellationToken,
) -> Result<()> {
    checkpoint(token)?;

    tokio::fs::create_dir_all(out_dir)
        .await
        .map_err(|e| BuildError::io(out_dir, e))?;

    let mut cmd = tokio::process::Command::new(&config.esbuild_bin);
    cmd.arg(format!("--outdir={}", path_to_string(out_dir)))
        .arg("--format=esm")
        .arg("--platform=neutral")
        // Minecraft's script API modules are provided by the runtime.
        .arg("--external:@minecraft/*");

    if config.bundle {
        cmd.arg(path_to_string(&src_dir.join(&config.entry)))
            .arg("--bundle");
        if config.minify {
            cmd.arg("--minify");
        }
    } else {
        for script in collect_script_sources(src_dir).await? {
            cmd.arg(path_to_string(&script));
        }
    }

    if config.source_map {
        cmd.arg("--sourcemap=linked")
            .arg(format!("--source-root={}", path_to_string(src_dir)));
    }
    if let Some(tsconfig) = &config.tsconfig {
        cmd.arg(format!("--tsconfig={}", path_to_string(tsconfig)));
    }
    cmd.args(&config.extra_args);

    let status = cmd
        .stdin(Stdio::null())
        .status()
        .await
        .map_err(|e| BuildError::Bundler(format!("failed to run {}: {}", config.esbuild_bin, e)))?;

    if !status.success() {
        return Err(BuildError::Bundler(format!(
            "{} exited with {}",
            config.esbuild_bin, status
        )));
    }
    Ok(())
}

/// Script source extensions handed to the bundler instead of the copy engine.
pub const SCRIPT_EXTENSIONS: [&str; 6] = ["js", "cjs", "mjs", "ts", "cts", "mts"];

pub fn is_script_source(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SCRIPT_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

async fn collect_script_sources(src_dir: &Path) -> Result<Vec<std::path::PathBuf>> {
    let mut queue = std::collections::VecDeque::from([src_dir.to_path_buf()]);
    let mut sources = Vec::new();

    while let Some(dir) = queue.pop_front() {
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Error reading directory {}: {}", dir.display(), e);
                continue;
            }
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            match entry.file_type().await {
                Ok(ty) if ty.is_dir() => queue.push_back(path),
                Ok(ty) if ty.is_file() && is_script_source(&path) => sources.push(path),
                Ok(_) => {}
                Err(e) => tracing::warn!("Error processing entry {}: {}", path.display(), e),
            }
        }
    }

    sources.sort();
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_script_source_extensions() {
        assert!(is_script_source(Path::new("scripts/main.ts")));
        assert!(is_script_source(Path::new("scripts/util.mjs")));
        assert!(!is_script_source(Path::new("scripts/data.json")));
        assert!(!is_script_source(Path::new("scripts/noext")));
    }

    #[tokio::test]
    async fn test_collect_script_sources_recurses() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("lib")).unwrap();
        fs::write(root.join("main.ts"), b"export {}").unwrap();
        fs::write(root.join("lib/util.js"), b"").unwrap();
        fs::write(root.join("lib/readme.md"), b"").unwrap();

        let sources = collect_script_sources(root).await.unwrap();
        assert_eq!(
            sources,
            vec![root.join("lib/util.js"), root.join("main.ts")]
        );
    }

    #[tokio::test]
    async fn test_missing_bundler_binary_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScriptsConfig {
            entry: "main.ts".into(),
            bundle: true,
            minify: false,
            source_map: false,
            tsconfig: None,
            esbuild_bin: "definitely-not-a-real-bundler".to_string(),
            extra_args: Vec::new(),
        };

        let token = CancellationToken::new();
        let err = bundle_scripts(&config, dir.path(), &dir.path().join("out"), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::Bundler(_)));
    }
}
