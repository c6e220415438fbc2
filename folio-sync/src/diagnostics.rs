//! Key-value store health checks.
//!
//! Replicated key-value services impose tight quotas; these checks surface
//! approaching limits before the service starts rejecting writes.

use crate::values::{KeyValueStore, ReplicatedKeyValueStore};

/// Local store size above which some platforms start evicting (soft).
pub const LOCAL_SOFT_LIMIT: usize = 512 * 1024;
/// Local store size above which writes fail outright (hard).
pub const LOCAL_HARD_LIMIT: usize = 1024 * 1024;
/// Maximum key count tolerated by replicated stores.
pub const REPLICATED_KEY_LIMIT: usize = 1024;
/// Per-value and total size quota of replicated stores.
pub const REPLICATED_SIZE_LIMIT: usize = 1024 * 1024;

/// One detected store-health issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreDiagnostic {
    LocalStoreNearCapacity { size: usize },
    LocalStoreOverCapacity { size: usize },
    ReplicatedTooManyKeys { count: usize },
    ReplicatedOversizedValues { keys: Vec<String> },
    ReplicatedOverCapacity { total_size: usize },
}

/// Evaluates the current issues of the given stores.
pub fn verify(
    local: Option<&dyn KeyValueStore>,
    remote: Option<&dyn ReplicatedKeyValueStore>,
) -> Vec<StoreDiagnostic> {
    let mut diagnostics = Vec::new();

    if let Some(local) = local {
        let size: usize = local
            .keys()
            .iter()
            .map(|key| local.get(key).map(|value| value.len()).unwrap_or(0))
            .sum();
        if size >= LOCAL_HARD_LIMIT {
            diagnostics.push(StoreDiagnostic::LocalStoreOverCapacity { size });
        }
        if size >= LOCAL_SOFT_LIMIT {
            diagnostics.push(StoreDiagnostic::LocalStoreNearCapacity { size });
        }
    }

    if let Some(remote) = remote {
        let keys = remote.keys();
        let sizes: Vec<(String, usize)> = keys
            .iter()
            .map(|key| {
                let size = remote.get(key).map(|value| value.len()).unwrap_or(0);
                (key.clone(), size)
            })
            .collect();
        let oversized: Vec<String> = sizes
            .iter()
            .filter(|(_, size)| *size >= REPLICATED_SIZE_LIMIT)
            .map(|(key, _)| key.clone())
            .collect();
        let total_size: usize = sizes.iter().map(|(_, size)| size).sum();

        if keys.len() >= REPLICATED_KEY_LIMIT {
            diagnostics.push(StoreDiagnostic::ReplicatedTooManyKeys { count: keys.len() });
        }
        if !oversized.is_empty() {
            diagnostics.push(StoreDiagnostic::ReplicatedOversizedValues { keys: oversized });
        }
        if total_size >= REPLICATED_SIZE_LIMIT {
            diagnostics.push(StoreDiagnostic::ReplicatedOverCapacity { total_size });
        }
    }

    diagnostics
}
