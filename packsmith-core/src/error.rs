//! Error types for the build pipeline
//!
//! Cancellation is a distinguished outcome rather than a failure: it gets its
//! own variant so callers can log an abort notice instead of an error.

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;

/// Errors produced by the build pipeline.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("source directory does not exist: {}", .0.display())]
    MissingSourceDir(PathBuf),

    #[error("invalid glob pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        source: globset::Error,
    },

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to convert {}: {message}", .path.display())]
    Convert { path: PathBuf, message: String },

    #[error("failed to encode JSON: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("script bundler failed: {0}")]
    Bundler(String),

    #[error("failed to watch source directory: {0}")]
    Watch(#[from] notify::Error),

    #[error("internal task failure: {0}")]
    Internal(String),

    #[error("build cancelled")]
    Cancelled,
}

impl BuildError {
    /// Attach a path to an `std::io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;

/// Cooperative cancellation check, polled at every loop iteration boundary.
pub fn checkpoint(token: &CancellationToken) -> Result<()> {
    if token.is_cancelled() {
        Err(BuildError::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_passes_until_cancelled() {
        let token = CancellationToken::new();
        assert!(checkpoint(&token).is_ok());

        token.cancel();
        let err = checkpoint(&token).unwrap_err();
        assert!(err.is_cancelled());
    }
}
