//! Conflict versions and resolution policies.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// One concrete revision of an entity, tracked by the remote backend.
///
/// Versions are created by the backend when two writers edit the same
/// logical entity independently; the core only ever destroys them through
/// conflict resolution. The id is backend-assigned and opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileVersion {
    pub id: String,
    pub modified: SystemTime,
    pub size: u64,
}

/// What to do with the versions of a conflicted entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionPolicy {
    /// Leave every version's content in place.
    Ignore,
    /// Remove every non-current version.
    DeleteOthers,
    /// Move every non-current version to a deduplicated sibling path,
    /// leaving the current version at the original path.
    RenameOthers,
    /// Keep exactly the listed version ids and discard the rest. An empty
    /// list removes the entity entirely.
    Keep(Vec<String>),
}
