//! Pack configuration
//!
//! Defines the `packsmith.config.json` pack entries. A pack is one
//! independently built addon tree; the `type` discriminant selects which
//! variant-specific options are valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Fields shared by every pack variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackBase {
    /// Display name used in logs (filled in by the config loader when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Source directory to compile from
    pub src_dir: PathBuf,

    /// Output directory to compile into
    pub out_dir: PathBuf,

    /// Manifest payload, written verbatim to `<outDir>/manifest.json`.
    /// Opaque to the pipeline.
    pub manifest: serde_json::Value,

    /// Include glob patterns, relative to `srcDir` (empty = include all)
    #[serde(default)]
    pub include: Vec<String>,

    /// Exclude glob patterns, relative to `srcDir` (exclude wins over include)
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Remove the previous build output before the first compile
    #[serde(default)]
    pub clean: bool,

    /// Keep watching the source tree and recompile on changes
    #[serde(default)]
    pub watch: bool,
}

/// Script bundling options for behavior packs.
///
/// The bundler itself is an external `esbuild` process; these options are
/// translated to its command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptsConfig {
    /// Entry point, relative to the scripts source directory
    pub entry: PathBuf,

    /// Bundle into a single output file instead of transpiling per-file
    #[serde(default)]
    pub bundle: bool,

    /// Minify bundled output
    #[serde(default)]
    pub minify: bool,

    /// Emit linked source maps
    #[serde(default)]
    pub source_map: bool,

    /// Optional tsconfig.json path forwarded to the bundler
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tsconfig: Option<PathBuf>,

    /// Bundler executable (default: `esbuild` on PATH)
    #[serde(default = "default_esbuild_bin")]
    pub esbuild_bin: String,

    /// Extra arguments appended to the bundler command line
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_esbuild_bin() -> String {
    "esbuild".to_string()
}

/// One independently built pack.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PackConfig {
    /// Behavior pack, optionally with bundled scripts
    #[serde(rename_all = "camelCase")]
    Behavior {
        #[serde(flatten)]
        base: PackBase,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        scripts: Option<ScriptsConfig>,
    },

    /// Resource pack, optionally regenerating `textures/texture_list.json`
    #[serde(rename_all = "camelCase")]
    Resource {
        #[serde(flatten)]
        base: PackBase,

        #[serde(default)]
        generate_texture_list: bool,
    },
}

impl PackConfig {
    pub fn base(&self) -> &PackBase {
        match self {
            Self::Behavior { base, .. } => base,
            Self::Resource { base, .. } => base,
        }
    }

    pub fn base_mut(&mut self) -> &mut PackBase {
        match self {
            Self::Behavior { base, .. } => base,
            Self::Resource { base, .. } => base,
        }
    }

    /// Script bundling config, if this is a behavior pack that declares one.
    pub fn scripts(&self) -> Option<&ScriptsConfig> {
        match self {
            Self::Behavior { scripts, .. } => scripts.as_ref(),
            Self::Resource { .. } => None,
        }
    }

    /// Whether this is a resource pack that opts into texture list generation.
    pub fn generates_texture_list(&self) -> bool {
        matches!(
            self,
            Self::Resource {
                generate_texture_list: true,
                ..
            }
        )
    }

    pub fn display_name(&self) -> &str {
        self.base().name.as_deref().unwrap_or("unnamed pack")
    }
}

/// The whole build configuration: one pipeline per pack.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    #[serde(default)]
    pub packs: Vec<PackConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn behavior_json() -> &'static str {
        r#"{
            "type": "behavior",
            "name": "my_bp",
            "srcDir": "./src/bp",
            "outDir": "./dist/bp",
            "manifest": { "header": { "version": [1, 0, 0] } },
            "scripts": { "entry": "main.ts", "bundle": true, "minify": true }
        }"#
    }

    #[test]
    fn test_behavior_pack_deserialization() {
        let pack: PackConfig = serde_json::from_str(behavior_json()).unwrap();
        assert_eq!(pack.display_name(), "my_bp");
        assert_eq!(pack.base().src_dir, PathBuf::from("./src/bp"));
        assert!(!pack.base().clean);

        let scripts = pack.scripts().unwrap();
        assert!(scripts.bundle);
        assert!(scripts.minify);
        assert!(!scripts.source_map);
        assert_eq!(scripts.esbuild_bin, "esbuild");
    }

    #[test]
    fn test_resource_pack_defaults() {
        let pack: PackConfig = serde_json::from_str(
            r#"{
                "type": "resource",
                "srcDir": "./src/rp",
                "outDir": "./dist/rp",
                "manifest": {}
            }"#,
        )
        .unwrap();

        assert!(pack.scripts().is_none());
        assert!(!pack.generates_texture_list());
        assert_eq!(pack.display_name(), "unnamed pack");
    }

    #[test]
    fn test_pack_roundtrip() {
        let pack: PackConfig = serde_json::from_str(behavior_json()).unwrap();
        let json = serde_json::to_string_pretty(&pack).unwrap();
        let back: PackConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.display_name(), pack.display_name());
        assert!(back.scripts().is_some());
    }

    #[test]
    fn test_texture_list_opt_in() {
        let pack: PackConfig = serde_json::from_str(
            r#"{
                "type": "resource",
                "srcDir": "rp",
                "outDir": "out/rp",
                "manifest": {},
                "generateTextureList": true
            }"#,
        )
        .unwrap();
        assert!(pack.generates_texture_list());
    }
}
