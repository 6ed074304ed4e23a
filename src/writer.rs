//! Atomic persistence of rendered configuration artifacts
//!
//! The gateway process reads these files on reload, so a partially-written
//! artifact is never acceptable. Writes go through a temporary file in the
//! target directory followed by a rename.

use crate::error::{Result, SyncError};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Write `text` to `path`, creating missing parent directories and replacing
/// any existing file atomically.
pub fn write_atomic(path: &Path, text: &str) -> Result<()> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        std::fs::create_dir_all(parent)
            .map_err(|e| SyncError::io("create directory", parent, e))?;
    }

    // Temp file must live in the target directory so the rename stays on one
    // filesystem and is atomic.
    let dir = parent.unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| SyncError::io("create", path, e))?;
    tmp.write_all(text.as_bytes())
        .map_err(|e| SyncError::io("write", path, e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| SyncError::io("sync", path, e))?;
    tmp.persist(path)
        .map_err(|e| SyncError::io("rename", path, e.error))?;

    debug!(path = %path.display(), bytes = text.len(), "Artifact written");
    Ok(())
}

/// Remove a file if it exists. Returns whether a file was actually removed;
/// absence is not an error.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Artifact removed");
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(SyncError::io("remove", path, e)),
    }
}
