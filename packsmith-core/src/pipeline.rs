//! Build pipeline entry points
//!
//! `build_pack` runs one pack's full pipeline: setup, manifest, the initial
//! compile cycle, and optionally the watch loop. `build` runs every
//! configured pack concurrently; each pack's pipeline and cache are fully
//! independent.

use std::path::{Path, PathBuf};

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::cache::BuildCache;
use crate::compile::{compile_and_log, PackContext};
use crate::error::{checkpoint, BuildError, Result};
use crate::filter::PackFilter;
use crate::manifest::write_manifest;
use crate::types::{BuildConfig, PackConfig};
use crate::watch::watch_pack;

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| BuildError::io(path, e))
}

/// Run one pack's pipeline until completion (or until cancelled).
///
/// A missing source directory is fatal before any cycle runs. A failing
/// initial compile is logged but does not prevent watch mode from starting.
pub async fn build_pack(pack: &PackConfig, token: &CancellationToken) -> Result<()> {
    checkpoint(token)?;

    let base = pack.base();
    let src_dir = absolute(&base.src_dir)?;
    let out_dir = absolute(&base.out_dir)?;

    if !tokio::fs::try_exists(&src_dir)
        .await
        .map_err(|e| BuildError::io(&src_dir, e))?
    {
        return Err(BuildError::MissingSourceDir(src_dir));
    }

    if base.clean {
        match tokio::fs::remove_dir_all(&out_dir).await {
            Ok(()) => tracing::info!("Cleaned the previous build of '{}'", pack.display_name()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(BuildError::io(&out_dir, e)),
        }
    }
    tokio::fs::create_dir_all(&out_dir)
        .await
        .map_err(|e| BuildError::io(&out_dir, e))?;

    write_manifest(&out_dir, &base.manifest).await?;

    let filter = PackFilter::new(&src_dir, &base.include, &base.exclude)?;
    let ctx = PackContext {
        pack: pack.clone(),
        filter,
        src_dir,
        out_dir,
        token: token.clone(),
    };

    // The cache starts empty and lives only as long as this pipeline.
    let cache = compile_and_log(&ctx, BuildCache::new()).await;

    if !ctx.pack.base().watch {
        return Ok(());
    }
    checkpoint(token)?;
    watch_pack(&ctx, cache).await?;

    Ok(())
}

/// Build every configured pack, each pipeline running independently.
///
/// Per-pack errors are logged with the pack name; the first non-cancellation
/// error is returned after all pipelines have finished.
pub async fn build(config: &BuildConfig, token: &CancellationToken) -> Result<()> {
    checkpoint(token)?;

    if config.packs.is_empty() {
        tracing::warn!("Build ignored because no packs are defined");
        return Ok(());
    }

    tracing::info!("Build start");

    let mut tasks = JoinSet::new();
    for pack in config.packs.iter().cloned() {
        let token = token.clone();
        tasks.spawn(async move {
            let name = pack.display_name().to_string();
            (name, build_pack(&pack, &token).await)
        });
    }

    let mut first_error: Option<BuildError> = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(()))) => {}
            Ok((name, Err(e))) if e.is_cancelled() => {
                tracing::warn!("Aborted building the pack '{}'", name);
            }
            Ok((name, Err(e))) => {
                tracing::error!("Error building the pack '{}': {}", name, e);
                first_error.get_or_insert(e);
            }
            Err(join_error) => {
                tracing::error!("Pack build task failed: {}", join_error);
                first_error.get_or_insert(BuildError::Internal(join_error.to_string()));
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => {
            tracing::info!("Build finished");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn pack(src: &Path, out: &Path) -> PackConfig {
        serde_json::from_value(json!({
            "type": "resource",
            "name": "rp",
            "srcDir": src,
            "outDir": out,
            "manifest": { "header": { "name": "rp" } },
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_missing_source_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let pack = pack(&dir.path().join("nope"), &dir.path().join("out"));

        let token = CancellationToken::new();
        let err = build_pack(&pack, &token).await.unwrap_err();
        assert!(matches!(err, BuildError::MissingSourceDir(_)));
    }

    #[tokio::test]
    async fn test_build_pack_writes_manifest_and_output() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let out = dir.path().join("out");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("sounds.json"), b"{}").unwrap();

        let token = CancellationToken::new();
        build_pack(&pack(&src, &out), &token).await.unwrap();

        assert!(out.join("manifest.json").exists());
        assert!(out.join("sounds.json").exists());
    }

    #[tokio::test]
    async fn test_clean_removes_stale_output() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let out = dir.path().join("out");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("stale.json"), b"{}").unwrap();

        let mut pack = pack(&src, &out);
        pack.base_mut().clean = true;

        let token = CancellationToken::new();
        build_pack(&pack, &token).await.unwrap();

        assert!(!out.join("stale.json").exists());
        assert!(out.join("manifest.json").exists());
    }

    #[tokio::test]
    async fn test_build_with_no_packs_is_a_noop() {
        let token = CancellationToken::new();
        build(&BuildConfig::default(), &token).await.unwrap();
    }

    #[tokio::test]
    async fn test_build_runs_all_packs() {
        let dir = tempfile::tempdir().unwrap();
        let mut packs = Vec::new();
        for name in ["one", "two"] {
            let src = dir.path().join(name).join("src");
            fs::create_dir_all(&src).unwrap();
            fs::write(src.join("a.json"), b"{}").unwrap();
            packs.push(pack(&src, &dir.path().join(name).join("out")));
        }

        let token = CancellationToken::new();
        build(&BuildConfig { packs }, &token).await.unwrap();

        assert!(dir.path().join("one/out/a.json").exists());
        assert!(dir.path().join("two/out/a.json").exists());
    }

    #[tokio::test]
    async fn test_setup_errors_surface_from_build() {
        let dir = tempfile::tempdir().unwrap();
        let config = BuildConfig {
            packs: vec![pack(&dir.path().join("missing"), &dir.path().join("out"))],
        };

        let token = CancellationToken::new();
        let err = build(&config, &token).await.unwrap_err();
        assert!(matches!(err, BuildError::MissingSourceDir(_)));
    }

    #[tokio::test]
    async fn test_watch_mode_stops_on_cancellation() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();

        let mut pack = pack(&src, &dir.path().join("out"));
        pack.base_mut().watch = true;

        let token = CancellationToken::new();
        let handle = tokio::spawn({
            let pack = pack.clone();
            let token = token.clone();
            async move { build_pack(&pack, &token).await }
        });

        // Give the watcher a moment to come up, then cancel.
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        token.cancel();

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("watch loop should stop after cancellation")
            .unwrap();
        result.unwrap();
    }
}
