//! Coordinated filesystem access for Folio.
//!
//! Every read, write, delete and listing of an entity file goes through
//! [`CoordinatedFs`], which acquires a read- or write-intent token for the
//! path from the process-wide [`FileCoordinator`] before touching the
//! filesystem. No other coordinated actor can observe a half-written file:
//! writes stage into a sibling temp file and land by rename, and writers
//! exclude readers for the duration of the operation.
//!
//! The API is deliberately blocking — acquiring a token suspends the calling
//! thread on a condition variable until the grant is available. Async
//! callers wrap calls in `tokio::task::spawn_blocking`.

mod coordinator;
mod dedup;
mod error;
mod fs;

pub use coordinator::{AccessToken, FileCoordinator};
pub use dedup::deduplicated_path;
pub use error::{FsError, FsResult};
pub use fs::{CoordinatedFs, Existence};
