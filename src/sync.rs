//! Sync orchestrator: keeps on-disk artifacts consistent with the registry
//!
//! Mutating operations on the registry call into this module synchronously,
//! at most once per save. Writers of the same artifact path are serialized
//! through a per-path lock so two near-simultaneous mutations can never
//! interleave renders of the shared global artifact.
//!
//! A failure writing one route's dedicated artifact does not stop the global
//! artifact from being attempted, and no failure here ever rolls back the
//! registry mutation that triggered it; the registry is allowed to run ahead
//! of the filesystem, with `regenerate_all` as the recovery path.

use crate::config::GatewaySettings;
use crate::db::{Database, RouteRecord};
use crate::error::{Result, SyncError};
use crate::{render, writer};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// One failed artifact operation inside an otherwise-committed mutation
#[derive(Debug)]
pub struct SyncFailure {
    pub path: PathBuf,
    pub error: SyncError,
}

/// Outcome of one synchronization pass.
///
/// Failures ride back here as warnings rather than hard errors because the
/// registry mutation has already committed; `is_clean()` is the signal the
/// caller gates the gateway reload on.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Artifact paths written during this pass
    pub written: Vec<PathBuf>,
    /// Artifact paths removed during this pass
    pub removed: Vec<PathBuf>,
    /// Artifacts that could not be brought up to date
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    /// True when every artifact reached disk and a gateway reload is safe
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record_failure(&mut self, path: &Path, error: SyncError) {
        warn!(
            path = %path.display(),
            error = %error,
            "Artifact out of sync with registry; run `routesync regen` to recover"
        );
        self.failures.push(SyncFailure {
            path: path.to_path_buf(),
            error,
        });
    }
}

/// Orchestrates render + write for every artifact affected by a mutation
pub struct Synchronizer {
    gateway: GatewaySettings,
    /// Per-artifact-path write locks; held for the duration of render + write
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl Synchronizer {
    pub fn new(gateway: GatewaySettings) -> Self {
        Self {
            gateway,
            locks: DashMap::new(),
        }
    }

    fn path_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        self.locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Render `text` producer and write `path` under that path's lock
    fn write_locked(&self, path: &Path, render: impl FnOnce() -> Result<String>) -> Result<()> {
        let lock = self.path_lock(path);
        let _guard = lock.lock();
        let text = render()?;
        writer::write_atomic(path, &text)
    }

    fn remove_locked(&self, path: &Path) -> Result<bool> {
        let lock = self.path_lock(path);
        let _guard = lock.lock();
        writer::remove_if_exists(path)
    }

    /// Resynchronize after a route was created or updated.
    ///
    /// Writes (or removes, if the route was deactivated) the route's dedicated
    /// artifact, then regenerates the global artifact from the full active set.
    pub fn route_saved(&self, db: &Database, record: &RouteRecord) -> Result<SyncReport> {
        let mut report = SyncReport::default();

        if record.is_active {
            let singleton = [record.clone()];
            match self.write_locked(&record.config_path, || render::render(&self.gateway, &singleton))
            {
                Ok(()) => report.written.push(record.config_path.clone()),
                // Isolated: the global artifact is still attempted below
                Err(e) => report.record_failure(&record.config_path, e),
            }
        } else {
            match self.remove_locked(&record.config_path) {
                Ok(true) => report.removed.push(record.config_path.clone()),
                Ok(false) => {}
                Err(e) => report.record_failure(&record.config_path, e),
            }
        }

        self.sync_global(db, &mut report)?;
        Ok(report)
    }

    /// Resynchronize after a route was deleted: remove its dedicated artifact
    /// (absence is fine) and regenerate the global artifact without it.
    pub fn route_deleted(&self, db: &Database, record: &RouteRecord) -> Result<SyncReport> {
        let mut report = SyncReport::default();

        match self.remove_locked(&record.config_path) {
            Ok(true) => report.removed.push(record.config_path.clone()),
            Ok(false) => {}
            Err(e) => report.record_failure(&record.config_path, e),
        }

        self.sync_global(db, &mut report)?;
        Ok(report)
    }

    /// Force a full re-render of every active route's dedicated artifact plus
    /// the global artifact. Recovery path after manual edits, corruption, or
    /// an earlier I/O failure.
    pub fn regenerate_all(&self, db: &Database) -> Result<SyncReport> {
        let mut report = SyncReport::default();
        let active = db.list_active()?;

        for record in &active {
            let singleton = [record.clone()];
            match self.write_locked(&record.config_path, || render::render(&self.gateway, &singleton))
            {
                Ok(()) => report.written.push(record.config_path.clone()),
                Err(e) => report.record_failure(&record.config_path, e),
            }
        }

        self.sync_global(db, &mut report)?;

        info!(
            written = report.written.len(),
            failures = report.failures.len(),
            "Full regeneration finished"
        );
        Ok(report)
    }

    /// Rewrite the global artifact from the current active set. When the set
    /// is empty the previous artifact is left untouched rather than replaced
    /// with an empty file the gateway would choke on.
    ///
    /// The active set is read under the global artifact's lock. Reading it
    /// first would let a slower writer overwrite the artifact from a snapshot
    /// that predates another thread's committed mutation.
    fn sync_global(&self, db: &Database, report: &mut SyncReport) -> Result<()> {
        let global_path = self.gateway.global_config_path();
        let lock = self.path_lock(&global_path);
        let _guard = lock.lock();

        let active = db.list_active()?;
        if active.is_empty() {
            warn!(
                path = %global_path.display(),
                "No active routes; leaving previous global artifact untouched"
            );
            return Ok(());
        }

        let outcome = render::render(&self.gateway, &active)
            .and_then(|text| writer::write_atomic(&global_path, &text));
        match outcome {
            Ok(()) => report.written.push(global_path),
            Err(e) => report.record_failure(&global_path, e),
        }
        Ok(())
    }
}
