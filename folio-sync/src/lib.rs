//! Remote-change monitoring, conflict resolution and collection management
//! for Folio.
//!
//! A [`FileCollection`] keeps an in-memory index of entity metadata
//! consistent with a directory that other local processes mutate and an
//! external multi-device backend replicates.
//!
//! # Components
//!
//! - **Monitor**: polls the remote backend, requests downloads and diffs
//!   consecutive snapshots into change sets
//! - **Resolver**: applies resolution policies to multi-version conflicts
//! - **Collection**: owns the index, applies serialized transitions and
//!   fires one coalesced change signal per batch
//! - **Values**: synced key-value companion stores
//!
//! # Example
//!
//! ```no_run
//! use folio_sync::{CollectionConfig, FileCollection};
//! # use folio_sync::{RemoteStore, SyncResult};
//! # use folio_fs::CoordinatedFs;
//! # use std::sync::Arc;
//! # async fn open<Note: folio_types::Persistable>(remote: Arc<dyn RemoteStore>) -> SyncResult<()> {
//! let fs = Arc::new(CoordinatedFs::new());
//! let config = CollectionConfig::new("/sync/notes");
//! let notes = FileCollection::<Note>::open(fs, remote, config, |entry| {
//!     entry.filename.clone()
//! })
//! .await?;
//! let _changes = notes.subscribe();
//! # Ok(())
//! # }
//! ```

mod collection;
mod conflict;
pub mod diagnostics;
mod error;
mod monitor;
mod remote;
mod values;

pub use collection::{CollectionConfig, ConflictHandler, FileCollection, FileEntry};
pub use conflict::{ConflictResolver, ResolutionOutcome};
pub use error::{SyncError, SyncResult};
pub use monitor::{ChangeMonitor, MonitorConfig, MonitorEvent};
pub use remote::RemoteStore;
pub use values::{
    Identified, KeyValueStore, MemoryKeyValueStore, ReplicatedKeyValueStore, SyncedValue,
    SyncedValues,
};
