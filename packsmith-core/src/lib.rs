//! Packsmith Core Library
//!
//! This crate provides the core functionality for Packsmith:
//! - Pack configuration types (behavior and resource variants)
//! - Incremental compilation: tree scan, timestamp cache, change detection
//! - Transform & apply engine (relaxed-JSON conversion, output mirroring)
//! - Manifest writing and the script-bundler / texture-list collaborators
//! - Debounced, cancellable watch mode

pub mod apply;
pub mod bundler;
pub mod cache;
pub mod compile;
pub mod error;
pub mod filter;
pub mod manifest;
pub mod path_utils;
pub mod pipeline;
pub mod scanner;
pub mod texture_list;
pub mod types;
pub mod watch;

// Re-export commonly used types
pub use cache::{BuildCache, CacheEntry, ChangeKind, FileChange};
pub use compile::{compile_pack, PackContext};
pub use error::{BuildError, Result};
pub use filter::PackFilter;
pub use pipeline::{build, build_pack};
pub use types::{BuildConfig, PackBase, PackConfig, ScriptsConfig};

// Re-export the cancellation token so callers don't need a direct
// tokio-util dependency.
pub use tokio_util::sync::CancellationToken;
