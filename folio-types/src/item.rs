//! Remote-observed item snapshots.

use crate::identity::FileIdentity;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Download state of a remote-tracked item, as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// No local content at all.
    NotAvailable,
    /// Local content exists but a newer revision is on the backend.
    Outdated,
    /// Local content matches the backend.
    UpToDate,
}

/// State of one remote-tracked file at a single observation.
///
/// Snapshots are ephemeral: the monitor recomputes them on every poll and
/// keeps the previous batch only to diff against. They are never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleItem {
    pub identity: FileIdentity,
    pub size: u64,
    pub modified: SystemTime,
    pub availability: Availability,
    pub downloading: bool,
    pub has_conflicts: bool,
}

impl VisibleItem {
    /// Whether the item belongs to the visible set: some local content
    /// exists or is on its way.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.availability != Availability::NotAvailable
    }

    /// Whether the item still needs a download request.
    #[must_use]
    pub fn needs_download(&self) -> bool {
        self.availability != Availability::UpToDate && !self.downloading
    }
}
