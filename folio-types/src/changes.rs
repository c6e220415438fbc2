//! Change sets computed by diffing snapshot collections.

use crate::identity::FileIdentity;
use crate::item::VisibleItem;
use std::collections::HashMap;

/// Partition of identities produced by diffing two snapshot collections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub inserted: Vec<FileIdentity>,
    pub updated: Vec<FileIdentity>,
    pub removed: Vec<FileIdentity>,
}

impl ChangeSet {
    /// Diffs two snapshot collections keyed by identity.
    ///
    /// An identity present on both sides whose snapshot changed in any field
    /// would appear as a removal plus an insertion in a raw diff; it is
    /// reclassified as an update. Content hashes are never compared, so a
    /// delete-then-recreate between two observations also classifies as an
    /// update. Identities whose snapshots are identical produce no change.
    #[must_use]
    pub fn diff(previous: &[VisibleItem], current: &[VisibleItem]) -> Self {
        let before: HashMap<&FileIdentity, &VisibleItem> =
            previous.iter().map(|item| (&item.identity, item)).collect();
        let after: HashMap<&FileIdentity, &VisibleItem> =
            current.iter().map(|item| (&item.identity, item)).collect();

        let mut changes = ChangeSet::default();
        for item in current {
            match before.get(&item.identity) {
                None => changes.inserted.push(item.identity.clone()),
                Some(old) if *old != item => changes.updated.push(item.identity.clone()),
                Some(_) => {}
            }
        }
        for item in previous {
            if !after.contains_key(&item.identity) {
                changes.removed.push(item.identity.clone());
            }
        }

        changes.inserted.sort();
        changes.updated.sort();
        changes.removed.sort();
        changes
    }

    /// Whether the change set carries no changes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    /// Total number of changed identities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inserted.len() + self.updated.len() + self.removed.len()
    }

    /// Drops every change whose identity fails the predicate.
    #[must_use]
    pub fn retain(mut self, keep: impl Fn(&FileIdentity) -> bool) -> Self {
        self.inserted.retain(|identity| keep(identity));
        self.updated.retain(|identity| keep(identity));
        self.removed.retain(|identity| keep(identity));
        self
    }
}
