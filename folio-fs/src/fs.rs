//! Coordinated filesystem operations.

use crate::coordinator::FileCoordinator;
use crate::error::{FsError, FsResult};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Result of an existence probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Existence {
    pub exists: bool,
    pub is_directory: bool,
}

/// Filesystem access serialized against every other coordinated actor.
///
/// All operations are synchronous from the caller's perspective: the thread
/// blocks until the coordinator grants the intent, runs the operation, then
/// releases. From async contexts, wrap calls in
/// `tokio::task::spawn_blocking`.
#[derive(Clone, Default)]
pub struct CoordinatedFs {
    coordinator: FileCoordinator,
}

impl CoordinatedFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds on an existing coordinator so separate services share grants.
    pub fn with_coordinator(coordinator: FileCoordinator) -> Self {
        Self { coordinator }
    }

    /// The underlying coordinator.
    pub fn coordinator(&self) -> &FileCoordinator {
        &self.coordinator
    }

    /// Reads the full content of the file at `path`.
    pub fn read(&self, path: &Path) -> FsResult<Vec<u8>> {
        let _token = self.coordinator.read_intent(path);
        std::fs::read(path).map_err(|source| FsError::io(path, source))
    }

    /// Writes `data` to `path` atomically: the bytes are staged into a
    /// sibling temp file and land by rename. A failed write leaves any
    /// previous content intact.
    pub fn write(&self, data: &[u8], path: &Path) -> FsResult<()> {
        let _token = self.coordinator.write_intent(path);
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        debug!(path = %path.display(), bytes = data.len(), "coordinated write");
        let mut staged =
            NamedTempFile::new_in(parent).map_err(|source| FsError::io(path, source))?;
        staged
            .write_all(data)
            .map_err(|source| FsError::io(path, source))?;
        staged
            .persist(path)
            .map_err(|persist| FsError::io(path, persist.error))?;
        Ok(())
    }

    /// Removes the file at `path`.
    pub fn remove(&self, path: &Path) -> FsResult<()> {
        let _token = self.coordinator.write_intent(path);
        debug!(path = %path.display(), "coordinated remove");
        std::fs::remove_file(path).map_err(|source| FsError::io(path, source))
    }

    /// Probes whether `path` exists and whether it is a directory.
    pub fn exists(&self, path: &Path) -> Existence {
        let _token = self.coordinator.read_intent(path);
        match std::fs::metadata(path) {
            Ok(metadata) => Existence {
                exists: true,
                is_directory: metadata.is_dir(),
            },
            Err(_) => Existence::default(),
        }
    }

    /// Lists the regular files directly under `dir`, optionally keeping only
    /// those with the given extension (without the dot).
    pub fn list(&self, dir: &Path, extension: Option<&str>) -> FsResult<Vec<PathBuf>> {
        let _token = self.coordinator.read_intent(dir);
        let entries = std::fs::read_dir(dir).map_err(|source| FsError::io(dir, source))?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| FsError::io(dir, source))?;
            let file_type = entry.file_type().map_err(|source| FsError::io(dir, source))?;
            if !file_type.is_file() {
                continue;
            }
            let path = entry.path();
            if let Some(wanted) = extension {
                if path.extension().and_then(|ext| ext.to_str()) != Some(wanted) {
                    continue;
                }
            }
            paths.push(path);
        }
        paths.sort();
        Ok(paths)
    }

    /// Creates `path` and any missing parent directories.
    pub fn create_dir_all(&self, path: &Path) -> FsResult<()> {
        let _token = self.coordinator.write_intent(path);
        std::fs::create_dir_all(path).map_err(|source| FsError::io(path, source))
    }
}
