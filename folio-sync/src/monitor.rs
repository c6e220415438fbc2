//! Remote-change monitoring.
//!
//! The monitor polls the remote backend for the observed state of a
//! replicated directory, requests downloads for items that are not yet
//! materialized, and converts backend state into [`ChangeSet`]s by diffing
//! consecutive snapshots. Conflicted items are reported separately so the
//! resolver can handle them.

use crate::error::SyncResult;
use crate::remote::RemoteStore;
use folio_types::{ChangeSet, FileIdentity, FileVersion, VisibleItem};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Configuration for the change monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Directory whose replicated content is observed.
    pub base_dir: PathBuf,
    /// Restrict observation to files with this extension (without the dot).
    pub extension: Option<String>,
    /// How often to poll the backend. Rapid backend notifications coalesce
    /// into at most one change set per interval.
    pub poll_interval: Duration,
}

impl MonitorConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            extension: None,
            poll_interval: Duration::from_secs(3),
        }
    }
}

/// Events delivered by the monitor.
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// The visible set changed since the previous poll.
    Changed(ChangeSet),
    /// An item has unresolved conflict versions.
    Conflicted {
        identity: FileIdentity,
        versions: Vec<FileVersion>,
    },
}

/// Polls the remote backend and emits [`MonitorEvent`]s.
///
/// The poll loop runs on its own tokio task, never on the caller's context.
/// Events land on a single receiver so deliveries cannot interleave. There
/// is no mid-poll cancellation: `stop` takes effect at the next tick.
#[derive(Clone)]
pub struct ChangeMonitor {
    remote: Arc<dyn RemoteStore>,
    config: MonitorConfig,
    running: Arc<AtomicBool>,
    previous: Arc<tokio::sync::Mutex<Vec<VisibleItem>>>,
}

impl ChangeMonitor {
    pub fn new(remote: Arc<dyn RemoteStore>, config: MonitorConfig) -> Self {
        Self {
            remote,
            config,
            running: Arc::new(AtomicBool::new(false)),
            previous: Arc::new(tokio::sync::Mutex::new(Vec::new())),
        }
    }

    /// Spawns the poll loop and returns the event stream. The first poll
    /// happens after one full interval.
    pub fn start(&self) -> mpsc::Receiver<MonitorEvent> {
        let (events_tx, events_rx) = mpsc::channel(32);
        self.running.store(true, Ordering::SeqCst);

        let monitor = self.clone();
        tokio::spawn(async move {
            monitor.run(events_tx).await;
        });

        events_rx
    }

    /// Stops the poll loop at its next tick.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn run(&self, events: mpsc::Sender<MonitorEvent>) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await; // immediate first tick

        while self.running.load(Ordering::SeqCst) {
            ticker.tick().await;
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            match self.poll_once(&events).await {
                Ok(true) => {}
                Ok(false) => break, // receiver dropped
                Err(error) => {
                    // Transient backend failure: state is unchanged, the
                    // next tick retries.
                    warn!(base = %self.config.base_dir.display(), %error, "poll failed");
                }
            }
        }
        debug!(base = %self.config.base_dir.display(), "change monitor stopped");
    }

    /// Runs one full poll pass. Returns `Ok(false)` once the event receiver
    /// is gone.
    pub async fn poll_once(&self, events: &mpsc::Sender<MonitorEvent>) -> SyncResult<bool> {
        let items = self
            .remote
            .query(&self.config.base_dir, self.config.extension.as_deref())
            .await?;
        debug!(count = items.len(), "processing remote items");

        let (conflicted, clean): (Vec<VisibleItem>, Vec<VisibleItem>) =
            items.into_iter().partition(|item| item.has_conflicts);

        // Materialize whatever the backend has not delivered yet. Failures
        // are logged only: the item stays not-up-to-date and is retried on
        // the next poll.
        for item in clean.iter().filter(|item| item.needs_download()) {
            if let Err(error) = self.remote.begin_download(&item.identity).await {
                warn!(identity = %item.identity, %error, "download request failed");
            }
        }

        let visible: Vec<VisibleItem> = clean
            .into_iter()
            .filter(|item| item.is_visible())
            .collect();

        let changes = {
            let mut previous = self.previous.lock().await;
            let changes = ChangeSet::diff(&previous, &visible);
            *previous = visible;
            changes
        };

        if !changes.is_empty() {
            info!(
                inserted = changes.inserted.len(),
                updated = changes.updated.len(),
                removed = changes.removed.len(),
                "remote changes detected"
            );
            if events.send(MonitorEvent::Changed(changes)).await.is_err() {
                return Ok(false);
            }
        }

        for item in conflicted {
            let versions = match self.remote.unresolved_versions(&item.identity).await {
                Ok(versions) => versions,
                Err(error) => {
                    warn!(identity = %item.identity, %error, "couldn't list conflict versions");
                    continue;
                }
            };
            if versions.is_empty() {
                continue;
            }
            let event = MonitorEvent::Conflicted {
                identity: item.identity,
                versions,
            };
            if events.send(event).await.is_err() {
                return Ok(false);
            }
        }

        Ok(true)
    }
}
