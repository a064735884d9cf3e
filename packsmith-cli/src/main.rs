//! Packsmith CLI
//!
//! Command-line interface for the Minecraft Bedrock addon compiler.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use packsmith_core::{build, CancellationToken};

mod config;

#[derive(Parser)]
#[command(name = "packsmith")]
#[command(about = "Minecraft Bedrock addon compiler")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "packsmith.config.json")]
    config: PathBuf,

    /// Watch source trees and recompile on changes (overrides the config)
    #[arg(short, long)]
    watch: bool,

    /// Override the pack version in every manifest (major.minor.patch)
    #[arg(long, value_parser = config::parse_version)]
    pack_version: Option<[u32; 3]>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("packsmith_core=info".parse().unwrap())
                .add_directive("packsmith_cli=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let mut build_config = match config::load_config(&cli.config).await {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config file ({}): {:#}", cli.config.display(), e);
            return Ok(ExitCode::FAILURE);
        }
    };

    if cli.watch {
        config::apply_watch_override(&mut build_config);
    }
    if let Some(version) = cli.pack_version {
        config::apply_version_override(&mut build_config, version);
    }

    let token = CancellationToken::new();
    tokio::spawn({
        let token = token.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Aborting...");
                token.cancel();
            }
        }
    });

    match build(&build_config, &token).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) if e.is_cancelled() => Ok(ExitCode::SUCCESS),
        Err(e) => {
            tracing::error!("Build failed: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}
