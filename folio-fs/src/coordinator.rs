//! Process-wide per-path access coordination.

use folio_types::FileIdentity;
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Grants shared read intents and exclusive write intents per canonical
/// path.
///
/// Acquisition blocks the calling thread on a condition variable until the
/// grant is available; there is no timeout, so a stalled grant blocks
/// indefinitely. Tokens release on drop and wake every waiter. Paths are
/// keyed by [`FileIdentity`], so `.`/`..`/symlink variants of the same file
/// contend for the same grant.
#[derive(Clone, Default)]
pub struct FileCoordinator {
    inner: Arc<CoordinatorInner>,
}

#[derive(Default)]
struct CoordinatorInner {
    paths: Mutex<HashMap<FileIdentity, PathState>>,
    released: Condvar,
}

#[derive(Default)]
struct PathState {
    readers: usize,
    writer: bool,
}

impl FileCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires a shared read intent for `path`, blocking while a writer
    /// holds it.
    pub fn read_intent(&self, path: &Path) -> AccessToken {
        let identity = FileIdentity::new(path);
        let mut paths = self.inner.paths.lock();
        loop {
            let state = paths.entry(identity.clone()).or_default();
            if !state.writer {
                state.readers += 1;
                break;
            }
            self.inner.released.wait(&mut paths);
        }
        AccessToken {
            inner: Arc::clone(&self.inner),
            identity,
            write: false,
        }
    }

    /// Acquires an exclusive write intent for `path`, blocking while any
    /// reader or writer holds it.
    pub fn write_intent(&self, path: &Path) -> AccessToken {
        let identity = FileIdentity::new(path);
        let mut paths = self.inner.paths.lock();
        loop {
            let state = paths.entry(identity.clone()).or_default();
            if !state.writer && state.readers == 0 {
                state.writer = true;
                break;
            }
            self.inner.released.wait(&mut paths);
        }
        AccessToken {
            inner: Arc::clone(&self.inner),
            identity,
            write: true,
        }
    }
}

/// A granted coordination token. Dropping it releases the grant and wakes
/// waiters.
pub struct AccessToken {
    inner: Arc<CoordinatorInner>,
    identity: FileIdentity,
    write: bool,
}

impl Drop for AccessToken {
    fn drop(&mut self) {
        let mut paths = self.inner.paths.lock();
        if let Some(state) = paths.get_mut(&self.identity) {
            if self.write {
                state.writer = false;
            } else {
                state.readers = state.readers.saturating_sub(1);
            }
            if !state.writer && state.readers == 0 {
                paths.remove(&self.identity);
            }
        }
        drop(paths);
        self.inner.released.notify_all();
    }
}
