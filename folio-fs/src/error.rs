//! Error types for coordinated filesystem access.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for coordinated filesystem operations.
pub type FsResult<T> = Result<T, FsError>;

/// Errors that can occur during coordinated filesystem access.
#[derive(Debug, Error)]
pub enum FsError {
    /// Underlying filesystem failure (missing directory, permission denied,
    /// disk full, path vanished mid-operation).
    #[error("i/o failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The deduplicated-name search space is exhausted. Collision density
    /// like this indicates a misconfigured directory, not a transient
    /// condition.
    #[error("no free deduplicated name for {path} within {attempts} attempts")]
    DedupExhausted { path: PathBuf, attempts: usize },
}

impl FsError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        FsError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether this is a not-found failure, which best-effort deletes treat
    /// as success.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            FsError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}
