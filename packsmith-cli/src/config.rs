//! Configuration file loading
//!
//! Loads `packsmith.config.json` (JSON5-tolerant, so the config file can use
//! comments and trailing commas just like the pack sources) and applies the
//! command-line overrides to it.

use std::path::Path;

use anyhow::{Context, Result};
use packsmith_core::BuildConfig;

/// Load a build configuration file.
pub async fn load_config(path: &Path) -> Result<BuildConfig> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let mut config: BuildConfig = json5::from_str(&text)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;

    // Unnamed packs get a stable positional name for logging.
    for (index, pack) in config.packs.iter_mut().enumerate() {
        let base = pack.base_mut();
        if base.name.is_none() {
            base.name = Some(format!("pack@{index}"));
        }
    }

    Ok(config)
}

/// Force watch mode on every pack.
pub fn apply_watch_override(config: &mut BuildConfig) {
    for pack in &mut config.packs {
        pack.base_mut().watch = true;
    }
}

/// Override the pack version in every manifest payload.
///
/// Patches the places a Bedrock manifest carries a version: `header.version`
/// and each entry's `version` under `modules`. Manifests without those keys
/// are left alone.
pub fn apply_version_override(config: &mut BuildConfig, version: [u32; 3]) {
    let version_value = serde_json::json!(version);

    for pack in &mut config.packs {
        let manifest = &mut pack.base_mut().manifest;

        if let Some(header) = manifest.get_mut("header").and_then(|h| h.as_object_mut()) {
            if header.contains_key("version") {
                header.insert("version".to_string(), version_value.clone());
            }
        }
        if let Some(modules) = manifest.get_mut("modules").and_then(|m| m.as_array_mut()) {
            for module in modules {
                if let Some(module) = module.as_object_mut() {
                    if module.contains_key("version") {
                        module.insert("version".to_string(), version_value.clone());
                    }
                }
            }
        }
    }
}

/// Parse a `major.minor.patch` version argument.
pub fn parse_version(s: &str) -> std::result::Result<[u32; 3], String> {
    let parts: Vec<&str> = s.split('.').collect();
    if parts.len() != 3 {
        return Err(format!("'{s}' must match the pattern major.minor.patch"));
    }
    let mut version = [0u32; 3];
    for (slot, part) in version.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .map_err(|_| format!("'{part}' is not a valid version component"))?;
    }
    Ok(version)
}
