//! Compile orchestrator
//!
//! One cycle: scan the source tree, diff it against the previous cache
//! snapshot, partition the resulting changes, dispatch the copy engine
//! concurrently, then run the delegated collaborators. Detection fully
//! completes before any apply touches the output tree.

use std::path::PathBuf;
use std::time::Instant;

use futures::future::try_join_all;
use tokio_util::sync::CancellationToken;

use crate::apply::apply_change;
use crate::bundler::{self, is_script_source};
use crate::cache::{detect_changes, BuildCache, FileChange};
use crate::error::{checkpoint, BuildError, Result};
use crate::filter::PackFilter;
use crate::path_utils::relative_to;
use crate::scanner::scan;
use crate::texture_list::{generate_texture_list, TEXTURES_DIR, TEXTURE_LIST_PATH};
use crate::types::PackConfig;

/// Scripts input subdirectory, relative to the pack source root.
pub const SCRIPTS_DIR: &str = "scripts";

/// Everything one pack's cycles need; immutable across cycles.
#[derive(Debug, Clone)]
pub struct PackContext {
    pub pack: PackConfig,
    pub filter: PackFilter,
    pub src_dir: PathBuf,
    pub out_dir: PathBuf,
    pub token: CancellationToken,
}

/// Run one detect→apply→delegate cycle.
///
/// Takes the previous cache snapshot by reference and returns the replacement
/// snapshot. With zero detected changes this is a no-op fast path; the output
/// tree is already consistent.
pub async fn compile_pack(ctx: &PackContext, cache: &BuildCache) -> Result<BuildCache> {
    checkpoint(&ctx.token)?;

    let files = scan(&ctx.src_dir, &ctx.filter, &ctx.token).await?;
    let (changes, new_cache) = detect_changes(&files, cache, &ctx.token).await?;
    if changes.is_empty() {
        return Ok(new_cache);
    }

    let mut scripts_changed = false;
    let mut textures_changed = false;
    let mut engine_changes: Vec<&FileChange> = Vec::new();

    let scripts_prefix = format!("{SCRIPTS_DIR}/");
    let textures_prefix = format!("{TEXTURES_DIR}/");

    for change in &changes {
        checkpoint(&ctx.token)?;
        let Some(rel) = relative_to(&ctx.src_dir, &change.path) else {
            continue;
        };

        // Script sources belong to the bundler, not the copy engine.
        if ctx.pack.scripts().is_some()
            && rel.starts_with(&scripts_prefix)
            && is_script_source(&change.path)
        {
            scripts_changed = true;
            continue;
        }

        if rel.starts_with(&textures_prefix)
            && change.path.extension().and_then(|e| e.to_str()) == Some("png")
        {
            textures_changed = true;
        }
        if rel == TEXTURE_LIST_PATH {
            // Manually edited artifact: regenerate it, never mirror it.
            textures_changed = true;
            continue;
        }

        engine_changes.push(change);
    }

    try_join_all(
        engine_changes
            .into_iter()
            .map(|change| apply_change(change, &ctx.src_dir, &ctx.out_dir)),
    )
    .await?;

    tokio::try_join!(
        bundle_scripts_if_needed(ctx, scripts_changed),
        generate_texture_list_if_needed(ctx, textures_changed),
    )?;

    Ok(new_cache)
}

async fn bundle_scripts_if_needed(ctx: &PackContext, scripts_changed: bool) -> Result<()> {
    let Some(scripts) = ctx.pack.scripts() else {
        return Ok(());
    };
    if !scripts_changed {
        return Ok(());
    }

    let scripts_out = ctx.out_dir.join(SCRIPTS_DIR);
    if ctx.pack.base().clean {
        match tokio::fs::remove_dir_all(&scripts_out).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(BuildError::io(&scripts_out, e)),
        }
    }

    bundler::bundle_scripts(
        scripts,
        &ctx.src_dir.join(SCRIPTS_DIR),
        &scripts_out,
        &ctx.token,
    )
    .await
}

async fn generate_texture_list_if_needed(ctx: &PackContext, textures_changed: bool) -> Result<()> {
    if !textures_changed || !ctx.pack.generates_texture_list() {
        return Ok(());
    }
    generate_texture_list(&ctx.out_dir).await
}

/// Run one cycle with logging; failures keep the previous cache snapshot.
///
/// Cancellation is logged as an abort notice, not as an error.
pub async fn compile_and_log(ctx: &PackContext, cache: BuildCache) -> BuildCache {
    let name = ctx.pack.display_name();
    tracing::info!("Compiling the pack '{}'...", name);
    let started = Instant::now();

    match compile_pack(ctx, &cache).await {
        Ok(new_cache) => {
            tracing::info!(
                "Compiled the pack '{}' successfully in {:.2}ms",
                name,
                started.elapsed().as_secs_f64() * 1000.0
            );
            new_cache
        }
        Err(e) if e.is_cancelled() => {
            tracing::warn!("Aborted compiling the pack '{}'", name);
            cache
        }
        Err(e) => {
            tracing::error!("Error compiling the pack '{}': {}", name, e);
            cache
        }
    }
}
