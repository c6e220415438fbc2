//! Deduplicated sibling naming.

use crate::error::{FsError, FsResult};
use crate::fs::CoordinatedFs;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

const MAX_ATTEMPTS: usize = 1_000;

/// Returns the first `"<stem> N.<ext>"` sibling of `path` that does not
/// exist, for N counting up from 2. Existence is checked through the
/// coordinated service so concurrent writers observe a consistent picture.
///
/// The search is bounded: running out of candidates means the directory has
/// a pathological collision density and surfaces as
/// [`FsError::DedupExhausted`].
pub fn deduplicated_path(fs: &CoordinatedFs, path: &Path) -> FsResult<PathBuf> {
    let stem = path
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or_default();
    let extension = path.extension().and_then(OsStr::to_str);
    let parent = path.parent().unwrap_or_else(|| Path::new(""));

    for index in 2..=MAX_ATTEMPTS {
        let name = match extension {
            Some(ext) => format!("{stem} {index}.{ext}"),
            None => format!("{stem} {index}"),
        };
        let candidate = parent.join(name);
        if !fs.exists(&candidate).exists {
            return Ok(candidate);
        }
    }

    Err(FsError::DedupExhausted {
        path: path.to_path_buf(),
        attempts: MAX_ATTEMPTS,
    })
}
