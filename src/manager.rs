//! Route manager: the mutation interface exposed to the CLI
//!
//! Ties the registry and the sync orchestrator together with an explicit
//! call: every mutating operation commits to the registry first and then
//! invokes synchronization exactly once, returning the mutation result
//! together with the `SyncReport`. Registry errors (validation, duplicates,
//! unknown ids) abort the whole operation before any filesystem effect;
//! artifact failures come back inside the report because the mutation has
//! already committed.

use crate::config::{GatewaySettings, Settings};
use crate::db::{Database, NewRoute, RouteRecord, RouteUpdate};
use crate::error::Result;
use crate::sync::{SyncReport, Synchronizer};

pub struct RouteManager {
    db: Database,
    sync: Synchronizer,
    gateway: GatewaySettings,
}

impl RouteManager {
    /// Open the registry named by the settings
    pub fn open(settings: &Settings) -> Result<Self> {
        let db = Database::open(&settings.storage.db_path)?;
        Ok(Self::with_database(settings.gateway.clone(), db))
    }

    pub fn with_database(gateway: GatewaySettings, db: Database) -> Self {
        Self {
            db,
            sync: Synchronizer::new(gateway.clone()),
            gateway,
        }
    }

    pub fn create_route(&self, new: &NewRoute) -> Result<(RouteRecord, SyncReport)> {
        let record = self.db.create_route(new, &self.gateway)?;
        let report = self.sync.route_saved(&self.db, &record)?;
        Ok((record, report))
    }

    pub fn update_route(&self, id: i64, fields: &RouteUpdate) -> Result<(RouteRecord, SyncReport)> {
        let record = self.db.update_route(id, fields)?;
        let report = self.sync.route_saved(&self.db, &record)?;
        Ok((record, report))
    }

    pub fn delete_route(&self, id: i64) -> Result<(RouteRecord, SyncReport)> {
        let record = self.db.delete_route(id)?;
        let report = self.sync.route_deleted(&self.db, &record)?;
        Ok((record, report))
    }

    pub fn get_route(&self, id: i64) -> Result<RouteRecord> {
        self.db.get_route(id)
    }

    pub fn list_routes(&self) -> Result<Vec<RouteRecord>> {
        self.db.list_routes()
    }

    pub fn list_active(&self) -> Result<Vec<RouteRecord>> {
        self.db.list_active()
    }

    /// Re-render every artifact from the registry; recovery after manual
    /// edits or an earlier sync failure
    pub fn regenerate_all(&self) -> Result<SyncReport> {
        self.sync.regenerate_all(&self.db)
    }
}
