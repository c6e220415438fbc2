//! Conflict resolution.
//!
//! When two writers edit the same logical entity independently, the backend
//! attaches extra versions to the identity. The resolver applies a
//! [`ResolutionPolicy`] and guarantees that no version is left marked
//! unresolved afterwards.

use crate::error::{SyncError, SyncResult};
use crate::remote::RemoteStore;
use folio_fs::{deduplicated_path, CoordinatedFs};
use folio_types::{FileIdentity, ResolutionPolicy};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of resolving one identity.
#[derive(Debug, Clone, Default)]
pub struct ResolutionOutcome {
    /// Identities whose content changed and should be re-indexed.
    pub updated: Vec<FileIdentity>,
    /// Whether the entity itself was removed.
    pub removed: bool,
}

/// Applies resolution policies to conflicted identities.
///
/// Resolutions for distinct identities may run concurrently; the steps
/// within one identity are strictly sequential. Callers isolate failures
/// per identity — an error here never aborts another identity's
/// resolution.
pub struct ConflictResolver {
    fs: Arc<CoordinatedFs>,
    remote: Arc<dyn RemoteStore>,
}

impl ConflictResolver {
    pub fn new(fs: Arc<CoordinatedFs>, remote: Arc<dyn RemoteStore>) -> Self {
        Self { fs, remote }
    }

    /// Applies `policy` to the versions of `identity`.
    ///
    /// Whatever the policy — including [`ResolutionPolicy::Ignore`] — every
    /// version still attached to the identity afterwards has its conflict
    /// marker cleared; a version left unresolved is a protocol violation.
    /// The one exception is `Keep([])`, which removes the entity (and its
    /// versions with it).
    pub async fn resolve(
        &self,
        identity: &FileIdentity,
        policy: ResolutionPolicy,
    ) -> SyncResult<ResolutionOutcome> {
        debug!(identity = %identity, ?policy, "resolving conflict");
        let mut outcome = ResolutionOutcome::default();

        match policy {
            ResolutionPolicy::Ignore => {}

            ResolutionPolicy::DeleteOthers => {
                self.remote.remove_other_versions(identity).await?;
            }

            ResolutionPolicy::RenameOthers => {
                let current = self.remote.current_version(identity).await?;
                let versions = self.remote.unresolved_versions(identity).await?;
                // The current version cannot be renamed in place; everything
                // else moves aside to a deduplicated sibling.
                for version in versions.iter().filter(|v| v.id != current.id) {
                    let sibling = self.deduplicated_sibling(identity).await?;
                    self.remote
                        .promote_version(identity, &version.id, &sibling)
                        .await?;
                    self.remote.resolve_version(identity, &version.id).await?;
                    outcome.updated.push(FileIdentity::new(&sibling));
                }
            }

            ResolutionPolicy::Keep(kept) => {
                if kept.is_empty() {
                    self.remove_entity(identity).await?;
                    outcome.removed = true;
                    info!(identity = %identity, "conflicted entity removed");
                    return Ok(outcome);
                }

                let current = self.remote.current_version(identity).await?;
                let keeping_current = kept.iter().any(|id| *id == current.id);

                for (index, version_id) in kept.iter().enumerate() {
                    if *version_id == current.id {
                        // Kept and current: it has to stay the current
                        // version, only its marker clears.
                        self.remote.resolve_version(identity, version_id).await?;
                        outcome.updated.push(identity.clone());
                    } else if index == 0 && !keeping_current {
                        // Current is discarded: the first kept version
                        // replaces its content.
                        self.remote
                            .promote_version(identity, version_id, identity.as_path())
                            .await?;
                        self.remote.resolve_version(identity, version_id).await?;
                        outcome.updated.push(identity.clone());
                    } else {
                        let sibling = self.deduplicated_sibling(identity).await?;
                        self.remote
                            .promote_version(identity, version_id, &sibling)
                            .await?;
                        self.remote.resolve_version(identity, version_id).await?;
                        outcome.updated.push(FileIdentity::new(&sibling));
                    }
                }

                self.remote.remove_other_versions(identity).await?;
            }
        }

        for version in self.remote.unresolved_versions(identity).await? {
            self.remote.resolve_version(identity, &version.id).await?;
        }

        info!(identity = %identity, updated = outcome.updated.len(), "conflict resolved");
        Ok(outcome)
    }

    async fn deduplicated_sibling(&self, identity: &FileIdentity) -> SyncResult<PathBuf> {
        let fs = Arc::clone(&self.fs);
        let path = identity.as_path().to_path_buf();
        tokio::task::spawn_blocking(move || deduplicated_path(&fs, &path))
            .await
            .map_err(SyncError::task)?
            .map_err(SyncError::from)
    }

    async fn remove_entity(&self, identity: &FileIdentity) -> SyncResult<()> {
        let fs = Arc::clone(&self.fs);
        let path = identity.as_path().to_path_buf();
        let result = tokio::task::spawn_blocking(move || fs.remove(&path))
            .await
            .map_err(SyncError::task)?;
        match result {
            Ok(()) => Ok(()),
            Err(error) if error.is_not_found() => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}
