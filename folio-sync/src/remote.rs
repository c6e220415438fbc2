//! Remote backend abstraction.
//!
//! The multi-device sync backend is the source of truth for availability,
//! download state and conflict versions. The core consumes this interface
//! and never reimplements replication.

use crate::error::SyncResult;
use async_trait::async_trait;
use folio_types::{FileIdentity, FileVersion, VisibleItem};
use std::path::Path;

/// Interface to the remote-replication backend.
///
/// `query` reports the observed state of every tracked item under a base
/// path; the version operations manipulate the conflict versions the
/// backend keeps per identity. Exactly one version per identity is current
/// at any time, and the backend cannot rename the current version in place
/// — promotion always targets another path (or replaces the current slot's
/// content wholesale).
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Lists the observed state of every tracked item under `base`,
    /// optionally restricted to one file extension (without the dot).
    async fn query(&self, base: &Path, extension: Option<&str>) -> SyncResult<Vec<VisibleItem>>;

    /// Requests materialization of a remote-only item so it becomes locally
    /// readable. Completion is observed through later `query` calls.
    async fn begin_download(&self, identity: &FileIdentity) -> SyncResult<()>;

    /// The current version of `identity`.
    async fn current_version(&self, identity: &FileIdentity) -> SyncResult<FileVersion>;

    /// Every version of `identity` still marked as an unresolved conflict.
    async fn unresolved_versions(&self, identity: &FileIdentity) -> SyncResult<Vec<FileVersion>>;

    /// Clears the unresolved-conflict marker on one version.
    async fn resolve_version(&self, identity: &FileIdentity, version_id: &str) -> SyncResult<()>;

    /// Discards one version's content.
    async fn remove_version(&self, identity: &FileIdentity, version_id: &str) -> SyncResult<()>;

    /// Discards every version of `identity` except the current one.
    async fn remove_other_versions(&self, identity: &FileIdentity) -> SyncResult<()>;

    /// Moves `version_id`'s content to `dest`, making it the file at that
    /// path. Promoting onto the identity's own path replaces the current
    /// version's content.
    async fn promote_version(
        &self,
        identity: &FileIdentity,
        version_id: &str,
        dest: &Path,
    ) -> SyncResult<()>;
}
