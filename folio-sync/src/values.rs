//! Synced single values and value collections.
//!
//! A much simpler companion to the file collection: small JSON-encoded
//! values mirrored into a last-writer-wins replicated key-value store.
//! Stores are explicit, injected dependencies and mutation goes through
//! `get`/`set` calls — no hidden persistence on assignment.

use crate::error::SyncResult;
use folio_types::SortOrder;
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::warn;

/// Local byte-valued key-value persistence.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Vec<u8>>;
    fn set(&self, key: &str, value: Vec<u8>);
    fn remove(&self, key: &str);
    fn keys(&self) -> Vec<String>;
}

/// A key-value store mirrored across devices, last writer wins.
pub trait ReplicatedKeyValueStore: KeyValueStore {
    /// Flushes pending writes to the replication service.
    fn synchronize(&self);
}

/// In-memory [`KeyValueStore`], the default local store for tests and
/// ephemeral setups.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: Vec<u8>) {
        self.entries.lock().insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.entries.lock().remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }
}

/// One synced value under one key.
///
/// Reads come from an in-memory cache seeded from the local store; writes
/// encode to the local store and, when one is attached, the replicated
/// store. External changes are imported explicitly through
/// [`apply_remote_change`](Self::apply_remote_change).
pub struct SyncedValue<T> {
    key: String,
    default: T,
    local: Arc<dyn KeyValueStore>,
    remote: Option<Arc<dyn ReplicatedKeyValueStore>>,
    cached: RwLock<T>,
    changed: broadcast::Sender<()>,
}

impl<T> SyncedValue<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Builds the value, seeding the cache from the local store. A missing
    /// or malformed stored value falls back to `default` (malformed is
    /// logged).
    pub fn new(
        key: impl Into<String>,
        default: T,
        local: Arc<dyn KeyValueStore>,
        remote: Option<Arc<dyn ReplicatedKeyValueStore>>,
    ) -> Self {
        let key = key.into();
        let initial = match local.get(&key) {
            Some(bytes) => match serde_json::from_slice(&bytes) {
                Ok(value) => value,
                Err(error) => {
                    warn!(key = %key, %error, "couldn't decode stored value");
                    default.clone()
                }
            },
            None => default.clone(),
        };
        let (changed, _) = broadcast::channel(16);
        Self {
            key,
            default,
            local,
            remote,
            cached: RwLock::new(initial),
            changed,
        }
    }

    /// The current value.
    pub fn get(&self) -> T {
        self.cached.read().clone()
    }

    /// Persists `value` locally and to the replicated store, then fires the
    /// change signal.
    pub fn set(&self, value: T) -> SyncResult<()> {
        let bytes = serde_json::to_vec(&value)?;
        self.local.set(&self.key, bytes.clone());
        if let Some(remote) = &self.remote {
            remote.set(&self.key, bytes);
            remote.synchronize();
        }
        *self.cached.write() = value;
        let _ = self.changed.send(());
        Ok(())
    }

    /// Subscribes to the change signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.changed.subscribe()
    }

    /// Imports the replicated store's current state for this key: an
    /// existing value overwrites the local store and cache, a deleted key
    /// restores the default. Call when the replication service signals an
    /// external change.
    pub fn apply_remote_change(&self) {
        let Some(remote) = &self.remote else {
            return;
        };
        match remote.get(&self.key) {
            Some(bytes) => {
                self.local.set(&self.key, bytes.clone());
                match serde_json::from_slice(&bytes) {
                    Ok(value) => *self.cached.write() = value,
                    Err(error) => {
                        warn!(key = %self.key, %error, "couldn't decode replicated value");
                        return;
                    }
                }
            }
            None => {
                self.local.remove(&self.key);
                *self.cached.write() = self.default.clone();
            }
        }
        let _ = self.changed.send(());
    }
}

/// Values that carry their own stable string id.
pub trait Identified {
    fn id(&self) -> String;
}

/// A synced collection of values sharing one key prefix, exposed sorted.
pub struct SyncedValues<T> {
    prefix: String,
    local: Arc<dyn KeyValueStore>,
    remote: Option<Arc<dyn ReplicatedKeyValueStore>>,
    compare: Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>,
    order: SortOrder,
    changed: broadcast::Sender<()>,
}

impl<T> SyncedValues<T>
where
    T: Clone + Serialize + DeserializeOwned + Identified + Send + Sync + 'static,
{
    /// Builds the collection and imports whatever the replicated store
    /// already holds under the prefix.
    pub fn new<K, F>(
        prefix: impl Into<String>,
        sort_key: F,
        order: SortOrder,
        local: Arc<dyn KeyValueStore>,
        remote: Option<Arc<dyn ReplicatedKeyValueStore>>,
    ) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        let (changed, _) = broadcast::channel(16);
        let values = Self {
            prefix: prefix.into(),
            local,
            remote,
            compare: Arc::new(move |a: &T, b: &T| sort_key(a).cmp(&sort_key(b))),
            order,
            changed,
        };
        values.import_remote();
        values
    }

    fn key_for(&self, id: &str) -> String {
        format!("{}{}", self.prefix, id)
    }

    /// The stored values, sorted. Malformed stored values are logged and
    /// skipped.
    pub fn values(&self) -> Vec<T> {
        let mut values: Vec<T> = self
            .local
            .keys()
            .into_iter()
            .filter(|key| key.starts_with(&self.prefix))
            .filter_map(|key| {
                let bytes = self.local.get(&key)?;
                match serde_json::from_slice(&bytes) {
                    Ok(value) => Some(value),
                    Err(error) => {
                        warn!(key = %key, %error, "couldn't decode stored value");
                        None
                    }
                }
            })
            .collect();
        values.sort_by(|a, b| self.order.apply((self.compare)(a, b)));
        values
    }

    /// Stores one value under its id.
    pub fn insert(&self, value: &T) -> SyncResult<()> {
        self.insert_all(std::slice::from_ref(value))
    }

    /// Stores several values. Encoding failures abort the batch; items
    /// already stored stay stored.
    pub fn insert_all(&self, values: &[T]) -> SyncResult<()> {
        for value in values {
            let key = self.key_for(&value.id());
            let bytes = serde_json::to_vec(value)?;
            self.local.set(&key, bytes.clone());
            if let Some(remote) = &self.remote {
                remote.set(&key, bytes);
            }
        }
        self.synchronize_and_notify();
        Ok(())
    }

    /// Removes one value by id.
    pub fn remove(&self, id: &str) {
        self.remove_all(std::slice::from_ref(&id.to_string()));
    }

    /// Removes several values by id.
    pub fn remove_all(&self, ids: &[String]) {
        for id in ids {
            let key = self.key_for(id);
            self.local.remove(&key);
            if let Some(remote) = &self.remote {
                remote.remove(&key);
            }
        }
        self.synchronize_and_notify();
    }

    /// Removes every stored value.
    pub fn clear(&self) {
        let ids: Vec<String> = self.values().iter().map(Identified::id).collect();
        self.remove_all(&ids);
    }

    /// Subscribes to the change signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.changed.subscribe()
    }

    /// Copies every prefixed key from the replicated store into the local
    /// one. No signal fires; callers read [`values`](Self::values) when
    /// ready.
    pub fn import_remote(&self) {
        let Some(remote) = &self.remote else {
            return;
        };
        for key in remote.keys() {
            if key.starts_with(&self.prefix) {
                self.import_remote_key(remote.as_ref(), &key);
            }
        }
    }

    /// Imports the listed externally-changed keys and fires the change
    /// signal. Keys outside this collection's prefix are ignored.
    pub fn apply_remote_change(&self, keys: &[String]) {
        let Some(remote) = &self.remote else {
            return;
        };
        let mut touched = false;
        for key in keys {
            if key.starts_with(&self.prefix) {
                self.import_remote_key(remote.as_ref(), key);
                touched = true;
            }
        }
        if touched {
            let _ = self.changed.send(());
        }
    }

    fn import_remote_key(&self, remote: &dyn ReplicatedKeyValueStore, key: &str) {
        match remote.get(key) {
            Some(bytes) => self.local.set(key, bytes),
            None => self.local.remove(key),
        }
    }

    fn synchronize_and_notify(&self) {
        if let Some(remote) = &self.remote {
            remote.synchronize();
        }
        let _ = self.changed.send(());
    }
}
