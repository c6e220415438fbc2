//! Core type definitions for Folio.
//!
//! This crate defines the fundamental, format-agnostic types shared by the
//! coordinated filesystem layer and the sync engine:
//! - Canonical file identities
//! - Remote-observed item snapshots and their change sets
//! - The entity persistence capability
//! - Conflict versions and resolution policies
//!
//! Everything that knows about a concrete entity format or a concrete
//! backend belongs in the capability implementations, not here.

mod changes;
mod conflict;
mod identity;
mod item;
mod persist;

pub use changes::ChangeSet;
pub use conflict::{FileVersion, ResolutionPolicy};
pub use identity::FileIdentity;
pub use item::{Availability, VisibleItem};
pub use persist::{Persistable, SuggestsFilename};

use serde::{Deserialize, Serialize};

/// Direction of a collection's exposed sorted view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// Applies the direction to an ordering computed ascending.
    #[must_use]
    pub fn apply(self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}
