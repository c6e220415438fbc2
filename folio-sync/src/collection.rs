//! Persisted-collection management.
//!
//! A [`FileCollection`] owns the canonical in-memory index of one
//! replicated directory: identity → partial metadata, one entry per
//! identity, mirroring the directory's matching files. Remote changes
//! observed by the monitor and local API calls funnel through the same
//! serialized transition path, so they cannot corrupt each other.

use crate::conflict::{ConflictResolver, ResolutionOutcome};
use crate::error::{SyncError, SyncResult};
use crate::monitor::{ChangeMonitor, MonitorConfig, MonitorEvent};
use crate::remote::RemoteStore;
use folio_fs::CoordinatedFs;
use folio_types::{ChangeSet, FileIdentity, FileVersion, Persistable, ResolutionPolicy, SortOrder, SuggestsFilename};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{info, warn};

/// Configuration for a file collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Directory holding one file per entity.
    pub directory: PathBuf,
    /// Direction of the exposed sorted view.
    pub order: SortOrder,
    /// Remote poll interval, forwarded to the change monitor.
    pub poll_interval: Duration,
}

impl CollectionConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            order: SortOrder::Ascending,
            poll_interval: Duration::from_secs(3),
        }
    }
}

/// One indexed entity: identity, filename and partial metadata.
pub struct FileEntry<P: Persistable> {
    pub identity: FileIdentity,
    pub filename: String,
    pub partial: P::Partial,
}

impl<P: Persistable> Clone for FileEntry<P> {
    fn clone(&self) -> Self {
        Self {
            identity: self.identity.clone(),
            filename: self.filename.clone(),
            partial: self.partial.clone(),
        }
    }
}

impl<P: Persistable> fmt::Debug for FileEntry<P>
where
    P::Partial: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileEntry")
            .field("identity", &self.identity)
            .field("filename", &self.filename)
            .field("partial", &self.partial)
            .finish()
    }
}

/// Maps a conflicted identity and its versions to a resolution policy.
pub type ConflictHandler =
    Arc<dyn Fn(&FileIdentity, &[FileVersion]) -> ResolutionPolicy + Send + Sync>;

type Comparator<P> = Arc<dyn Fn(&FileEntry<P>, &FileEntry<P>) -> Ordering + Send + Sync>;

/// Index transitions. All mutations of the index are expressed as one of
/// these and applied under a single write lock.
enum Transition<P: Persistable> {
    /// Rebuild the index from a full directory listing.
    Reload,
    /// Upsert entries whose partial metadata is already in hand.
    Insert(Vec<(FileIdentity, P::Partial)>),
    /// Upsert entries after a partial read of each path.
    InsertPaths(Vec<FileIdentity>),
    /// Drop entries.
    Delete(Vec<FileIdentity>),
}

impl<P: Persistable> Transition<P> {
    fn is_noop(&self) -> bool {
        match self {
            Transition::Reload => false,
            Transition::Insert(items) => items.is_empty(),
            Transition::InsertPaths(identities) => identities.is_empty(),
            Transition::Delete(identities) => identities.is_empty(),
        }
    }
}

struct IndexState<P: Persistable> {
    entries: HashMap<FileIdentity, P::Partial>,
    view: Vec<FileEntry<P>>,
}

struct CollectionInner<P: Persistable> {
    fs: Arc<CoordinatedFs>,
    config: CollectionConfig,
    compare: Comparator<P>,
    index: RwLock<IndexState<P>>,
    muted: RwLock<HashSet<FileIdentity>>,
    changed: broadcast::Sender<()>,
    resolver: ConflictResolver,
    conflict_handler: RwLock<Option<ConflictHandler>>,
}

/// A collection of persisted entities inside one replicated directory.
///
/// Dropping the collection stops its monitor; in-flight operations on
/// clones of the handle complete normally.
pub struct FileCollection<P: Persistable> {
    inner: Arc<CollectionInner<P>>,
    monitor: ChangeMonitor,
}

impl<P: Persistable> FileCollection<P> {
    /// Opens the collection over `config.directory`, creating the directory
    /// if needed, building the index from a coordinated listing (no
    /// notification fires for the initial load) and starting the remote
    /// monitor.
    pub async fn open<K, F>(
        fs: Arc<CoordinatedFs>,
        remote: Arc<dyn RemoteStore>,
        config: CollectionConfig,
        sort_key: F,
    ) -> SyncResult<Self>
    where
        K: Ord,
        F: Fn(&FileEntry<P>) -> K + Send + Sync + 'static,
    {
        {
            let fs = Arc::clone(&fs);
            let directory = config.directory.clone();
            tokio::task::spawn_blocking(move || {
                if !fs.exists(&directory).exists {
                    fs.create_dir_all(&directory)?;
                }
                Ok::<_, folio_fs::FsError>(())
            })
            .await
            .map_err(SyncError::task)??;
        }

        let (changed, _) = broadcast::channel(16);
        let order = config.order;
        let compare: Comparator<P> = Arc::new(move |a: &FileEntry<P>, b: &FileEntry<P>| {
            order.apply(sort_key(a).cmp(&sort_key(b)))
        });

        let mut monitor_config = MonitorConfig::new(config.directory.clone());
        monitor_config.extension = Some(P::file_extension().to_string());
        monitor_config.poll_interval = config.poll_interval;

        let inner = Arc::new(CollectionInner {
            fs: Arc::clone(&fs),
            config,
            compare,
            index: RwLock::new(IndexState {
                entries: HashMap::new(),
                view: Vec::new(),
            }),
            muted: RwLock::new(HashSet::new()),
            changed,
            resolver: ConflictResolver::new(fs, Arc::clone(&remote)),
            conflict_handler: RwLock::new(None),
        });

        inner.apply(vec![Transition::Reload], false).await;

        let monitor = ChangeMonitor::new(remote, monitor_config);
        let events = monitor.start();
        tokio::spawn(run_event_loop(Arc::clone(&inner), events));

        Ok(Self { inner, monitor })
    }

    /// The sorted snapshot of the collection.
    pub async fn entries(&self) -> Vec<FileEntry<P>> {
        self.inner.index.read().await.view.clone()
    }

    /// Subscribes to the coalesced change signal. One unit value per
    /// non-empty transition batch; re-read [`entries`](Self::entries) on
    /// receipt.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.inner.changed.subscribe()
    }

    /// The collection's directory.
    pub fn directory(&self) -> &PathBuf {
        &self.inner.config.directory
    }

    /// Persists `value` under `filename` (extension appended) and indexes
    /// its partial metadata.
    ///
    /// The index is only touched once the coordinated write has succeeded —
    /// it never claims an entity whose persistence failed; the error goes
    /// back to the caller instead.
    pub async fn insert(&self, value: P, filename: &str) -> SyncResult<FileEntry<P>> {
        let entry = self.write_entity(&value, filename).await?;
        self.inner
            .apply(
                vec![Transition::Insert(vec![(
                    entry.identity.clone(),
                    entry.partial.clone(),
                )])],
                true,
            )
            .await;
        Ok(entry)
    }

    /// Batch insert. Each item's write succeeds or fails independently:
    /// failures are logged and skipped, already-written files are not
    /// rolled back, and the returned entries cover the successes only.
    pub async fn insert_all(&self, items: Vec<(P, String)>) -> Vec<FileEntry<P>> {
        let mut inserted = Vec::new();
        for (value, filename) in items {
            match self.write_entity(&value, &filename).await {
                Ok(entry) => inserted.push(entry),
                Err(error) => {
                    warn!(filename = %filename, %error, "couldn't persist entity");
                }
            }
        }
        self.inner
            .apply(
                vec![Transition::Insert(
                    inserted
                        .iter()
                        .map(|entry| (entry.identity.clone(), entry.partial.clone()))
                        .collect(),
                )],
                true,
            )
            .await;
        inserted
    }

    /// Removes `identity` from disk (best effort) and from the index
    /// (unconditionally).
    ///
    /// The delete transition applies even when the underlying file is
    /// already gone — the index must not retain entries for externally
    /// deleted files.
    pub async fn remove(&self, identity: &FileIdentity) {
        self.remove_all(std::slice::from_ref(identity)).await;
    }

    /// Removes several identities; see [`remove`](Self::remove).
    pub async fn remove_all(&self, identities: &[FileIdentity]) {
        for identity in identities {
            let fs = Arc::clone(&self.inner.fs);
            let path = identity.as_path().to_path_buf();
            let removed = tokio::task::spawn_blocking(move || fs.remove(&path)).await;
            match removed {
                Ok(Ok(())) => {}
                Ok(Err(error)) if error.is_not_found() => {}
                Ok(Err(error)) => warn!(identity = %identity, %error, "couldn't delete entity"),
                Err(error) => warn!(identity = %identity, %error, "delete task failed"),
            }
        }
        self.inner
            .apply(vec![Transition::Delete(identities.to_vec())], true)
            .await;
    }

    /// Reads and fully decodes the entity at `identity`. Errors if the file
    /// is missing or its payload is malformed.
    pub async fn read(&self, identity: &FileIdentity) -> SyncResult<P> {
        let fs = Arc::clone(&self.inner.fs);
        let path = identity.as_path().to_path_buf();
        let bytes = tokio::task::spawn_blocking(move || fs.read(&path))
            .await
            .map_err(SyncError::task)??;
        P::decode(&bytes).map_err(|error| SyncError::decode(identity.as_path(), error))
    }

    /// Removes every indexed entity. With `including_unknown`, first
    /// removes every file in the directory regardless of index membership,
    /// recovering from external corruption; the final reload trues the
    /// index up either way.
    pub async fn clear(&self, including_unknown: bool) {
        if including_unknown {
            let fs = Arc::clone(&self.inner.fs);
            let directory = self.inner.config.directory.clone();
            let removed = tokio::task::spawn_blocking(move || {
                let paths = fs.list(&directory, None)?;
                for path in &paths {
                    if let Err(error) = fs.remove(path) {
                        if !error.is_not_found() {
                            warn!(path = %path.display(), %error, "couldn't delete file");
                        }
                    }
                }
                Ok::<_, folio_fs::FsError>(())
            })
            .await;
            match removed {
                Ok(Ok(())) => {}
                Ok(Err(error)) => warn!(%error, "couldn't list directory for clear"),
                Err(error) => warn!(%error, "clear task failed"),
            }
        }

        let indexed: Vec<FileIdentity> = {
            let index = self.inner.index.read().await;
            index.entries.keys().cloned().collect()
        };
        for identity in &indexed {
            let fs = Arc::clone(&self.inner.fs);
            let path = identity.as_path().to_path_buf();
            let removed = tokio::task::spawn_blocking(move || fs.remove(&path)).await;
            if let Ok(Err(error)) = removed {
                if !error.is_not_found() {
                    warn!(identity = %identity, %error, "couldn't delete entity");
                }
            }
        }

        self.inner
            .apply(vec![Transition::Delete(indexed), Transition::Reload], true)
            .await;
    }

    /// Toggles whether remote-driven changes for `identity` reach the index
    /// and the change signal. Muting supports the "I already know, I just
    /// wrote it" pattern; local API calls are never suppressed.
    pub async fn set_notifications_enabled(&self, identity: &FileIdentity, enabled: bool) {
        let mut muted = self.inner.muted.write().await;
        if enabled {
            muted.remove(identity);
        } else {
            muted.insert(identity.clone());
        }
    }

    /// Registers the callback consulted when the monitor reports a
    /// conflicted identity. Without a registration the defined default
    /// policy is [`ResolutionPolicy::Ignore`] — conflict markers still
    /// clear, content is left alone.
    pub async fn set_conflict_handler<F>(&self, handler: F)
    where
        F: Fn(&FileIdentity, &[FileVersion]) -> ResolutionPolicy + Send + Sync + 'static,
    {
        *self.inner.conflict_handler.write().await = Some(Arc::new(handler));
    }

    /// Removes the conflict handler, restoring the default policy.
    pub async fn clear_conflict_handler(&self) {
        *self.inner.conflict_handler.write().await = None;
    }

    /// Applies `policy` to `identity`'s conflict versions and re-indexes
    /// whatever the resolution touched.
    pub async fn resolve(
        &self,
        identity: &FileIdentity,
        policy: ResolutionPolicy,
    ) -> SyncResult<()> {
        let outcome = self.inner.resolver.resolve(identity, policy).await?;
        self.inner.apply_resolution(identity, outcome).await;
        Ok(())
    }

    async fn write_entity(&self, value: &P, filename: &str) -> SyncResult<FileEntry<P>> {
        let path = self
            .inner
            .config
            .directory
            .join(format!("{filename}.{}", P::file_extension()));
        let identity = FileIdentity::new(&path);
        let bytes = value
            .encode()
            .map_err(|error| SyncError::encode(&path, error))?;

        let fs = Arc::clone(&self.inner.fs);
        let target = path.clone();
        tokio::task::spawn_blocking(move || fs.write(&bytes, &target))
            .await
            .map_err(SyncError::task)??;

        let filename = identity.file_name().unwrap_or(filename).to_string();
        Ok(FileEntry {
            identity,
            filename,
            partial: value.partial(),
        })
    }
}

impl<P: SuggestsFilename> FileCollection<P> {
    /// Inserts `value` under its own suggested filename.
    pub async fn insert_suggested(&self, value: P) -> SyncResult<FileEntry<P>> {
        let filename = value.suggested_filename();
        self.insert(value, &filename).await
    }
}

impl<P: Persistable> Drop for FileCollection<P> {
    fn drop(&mut self) {
        self.monitor.stop();
    }
}

/// Consumes monitor events on one task, so remote deliveries are totally
/// ordered against each other before they reach the index lock.
async fn run_event_loop<P: Persistable>(
    inner: Arc<CollectionInner<P>>,
    mut events: mpsc::Receiver<MonitorEvent>,
) {
    while let Some(event) = events.recv().await {
        match event {
            MonitorEvent::Changed(changes) => {
                inner.apply_remote_changes(changes).await;
            }
            MonitorEvent::Conflicted { identity, versions } => {
                let policy = {
                    let handler = inner.conflict_handler.read().await;
                    match handler.as_ref() {
                        Some(handler) => handler(&identity, &versions),
                        None => ResolutionPolicy::Ignore,
                    }
                };
                // One task per identity: a slow resolution must not hold up
                // the monitor or other identities, and one identity's error
                // stays its own.
                let inner = Arc::clone(&inner);
                tokio::spawn(async move {
                    match inner.resolver.resolve(&identity, policy).await {
                        Ok(outcome) => inner.apply_resolution(&identity, outcome).await,
                        Err(error) => {
                            warn!(identity = %identity, %error, "conflict resolution failed");
                        }
                    }
                });
            }
        }
    }
}

impl<P: Persistable> CollectionInner<P> {
    /// Applies a batch of transitions under the single write lock and fires
    /// at most one change signal. A batch whose every transition is a no-op
    /// fires nothing.
    async fn apply(&self, transitions: Vec<Transition<P>>, notify: bool) {
        let actual: Vec<Transition<P>> = transitions
            .into_iter()
            .filter(|transition| !transition.is_noop())
            .collect();
        if actual.is_empty() {
            return;
        }

        let mut index = self.index.write().await;
        for transition in actual {
            match transition {
                Transition::Reload => match self.scan_directory().await {
                    Ok(entries) => index.entries = entries,
                    Err(error) => {
                        warn!(
                            directory = %self.config.directory.display(),
                            %error,
                            "couldn't list collection directory"
                        );
                    }
                },
                Transition::Insert(items) => {
                    for (identity, partial) in items {
                        index.entries.insert(identity, partial);
                    }
                }
                Transition::InsertPaths(identities) => {
                    for identity in identities {
                        if let Some(partial) = self.partial_read(&identity).await {
                            index.entries.insert(identity, partial);
                        }
                    }
                }
                Transition::Delete(identities) => {
                    for identity in identities {
                        index.entries.remove(&identity);
                    }
                }
            }
        }

        let view = self.sorted_view(&index.entries);
        index.view = view;
        drop(index);

        if notify {
            let _ = self.changed.send(());
        }
    }

    fn sorted_view(&self, entries: &HashMap<FileIdentity, P::Partial>) -> Vec<FileEntry<P>> {
        let mut view: Vec<FileEntry<P>> = entries
            .iter()
            .map(|(identity, partial)| FileEntry {
                identity: identity.clone(),
                filename: identity.file_name().unwrap_or_default().to_string(),
                partial: partial.clone(),
            })
            .collect();
        view.sort_by(|a, b| (self.compare)(a, b));
        view
    }

    /// Lists the directory and partial-reads every matching file. Files
    /// that fail to read or decode are skipped, not fatal.
    async fn scan_directory(&self) -> SyncResult<HashMap<FileIdentity, P::Partial>> {
        let fs = Arc::clone(&self.fs);
        let directory = self.config.directory.clone();
        let paths = tokio::task::spawn_blocking(move || {
            fs.list(&directory, Some(P::file_extension()))
        })
        .await
        .map_err(SyncError::task)??;

        let mut entries = HashMap::new();
        for path in paths {
            let identity = FileIdentity::new(&path);
            if let Some(partial) = self.partial_read(&identity).await {
                entries.insert(identity, partial);
            }
        }
        Ok(entries)
    }

    async fn partial_read(&self, identity: &FileIdentity) -> Option<P::Partial> {
        let fs = Arc::clone(&self.fs);
        let path = identity.as_path().to_path_buf();
        let bytes = match tokio::task::spawn_blocking(move || fs.read(&path)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(error)) => {
                warn!(identity = %identity, %error, "couldn't read entity metadata");
                return None;
            }
            Err(error) => {
                warn!(identity = %identity, %error, "metadata read task failed");
                return None;
            }
        };
        match P::decode_partial(&bytes) {
            Ok(partial) => Some(partial),
            Err(error) => {
                warn!(identity = %identity, %error, "couldn't decode entity metadata");
                None
            }
        }
    }

    /// Routes one remote change set into index transitions, after dropping
    /// muted identities. An update is a delete followed by a re-read of the
    /// same identity.
    async fn apply_remote_changes(&self, changes: ChangeSet) {
        let changes = {
            let muted = self.muted.read().await;
            changes.retain(|identity| !muted.contains(identity))
        };
        if changes.is_empty() {
            return;
        }

        info!(
            inserted = changes.inserted.len(),
            updated = changes.updated.len(),
            removed = changes.removed.len(),
            "applying remote changes"
        );

        let ChangeSet {
            inserted,
            updated,
            removed,
        } = changes;

        let mut deletions = removed;
        deletions.extend(updated.iter().cloned());
        let mut insertions = updated;
        insertions.extend(inserted);

        self.apply(
            vec![
                Transition::Delete(deletions),
                Transition::InsertPaths(insertions),
            ],
            true,
        )
        .await;
    }

    async fn apply_resolution(&self, identity: &FileIdentity, outcome: ResolutionOutcome) {
        let mut transitions = Vec::new();
        if outcome.removed {
            transitions.push(Transition::Delete(vec![identity.clone()]));
        }
        transitions.push(Transition::InsertPaths(outcome.updated));
        self.apply(transitions, true).await;
    }
}
