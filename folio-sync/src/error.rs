//! Error types for the sync layer.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Coordinated filesystem failure.
    #[error(transparent)]
    Fs(#[from] folio_fs::FsError),

    /// An entity value could not be encoded for persistence.
    #[error("could not encode entity for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Persisted bytes could not be decoded into an entity.
    #[error("malformed entity at {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Key-value serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote backend failure.
    #[error("backend failure: {0}")]
    Backend(String),

    /// A blocking helper task died before completing.
    #[error("worker task failed: {0}")]
    Task(String),
}

impl SyncError {
    pub(crate) fn encode(
        path: &Path,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        SyncError::Encode {
            path: path.to_path_buf(),
            source: Box::new(source),
        }
    }

    pub(crate) fn decode(
        path: &Path,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        SyncError::Decode {
            path: path.to_path_buf(),
            source: Box::new(source),
        }
    }

    pub(crate) fn task(source: tokio::task::JoinError) -> Self {
        SyncError::Task(source.to_string())
    }
}
