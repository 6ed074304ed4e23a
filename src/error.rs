//! Error taxonomy for the registry and the sync engine

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the registry, renderer, writer and orchestrator.
///
/// Validation and duplicate-key errors are raised before any filesystem
/// effect, so the registry is untouched when they occur. I/O errors during
/// synchronization mean the registry has already committed and the filesystem
/// is behind; `regenerate_all` is the recovery path.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Uniqueness violation on (host, port, path), port, or active path
    #[error("duplicate {field}: {value} already in use")]
    DuplicateKey { field: &'static str, value: String },

    /// Operation referenced a route id that does not exist
    #[error("route {id} not found")]
    NotFound { id: i64 },

    /// Malformed field value, rejected before any side effect
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Filesystem failure, carrying the path and the underlying cause
    #[error("{op} failed for {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Template rendering fault from malformed input data. Should not occur
    /// while registry invariants hold; never retried.
    #[error("render failed: {0}")]
    Render(String),

    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

impl SyncError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
