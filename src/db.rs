//! SQLite-backed route registry
//!
//! The registry is the single source of truth for backend route records and
//! owns the uniqueness constraints. Constraint checks and the subsequent
//! insert/update run under the connection lock as one critical section, so
//! two concurrent creates cannot both pass the duplicate check; violations
//! surface before any filesystem effect.

use crate::config::GatewaySettings;
use crate::error::{Result, SyncError};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Current schema version for migrations
const SCHEMA_VERSION: i32 = 1;

/// Deployment environment a route is tagged with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
    Testing,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
            Environment::Testing => "testing",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "development" => Some(Environment::Development),
            "staging" => Some(Environment::Staging),
            "production" => Some(Environment::Production),
            "testing" => Some(Environment::Testing),
            _ => None,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        Environment::parse(s).ok_or_else(|| SyncError::Validation {
            field: "environment",
            reason: format!(
                "{} is not one of development, staging, production, testing",
                s
            ),
        })
    }
}

/// One backend route mapping
#[derive(Debug, Clone, Serialize)]
pub struct RouteRecord {
    pub id: i64,
    /// Display label
    pub name: String,
    /// URL prefix segment, e.g. "api" for /api/
    pub path: String,
    /// Backend hostname or IP; also the server_name grouping key
    pub host: String,
    pub port: u16,
    /// Root directory of the route's static assets
    pub static_root: String,
    pub description: Option<String>,
    /// Only active routes appear in rendered output
    pub is_active: bool,
    pub ssl_enabled: bool,
    pub environment: Option<Environment>,
    pub notes: Option<String>,
    /// Filesystem path this route's dedicated artifact is written to
    pub config_path: PathBuf,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields for creating a route
#[derive(Debug, Clone)]
pub struct NewRoute {
    pub name: String,
    pub path: String,
    pub host: String,
    pub port: u16,
    pub static_root: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub ssl_enabled: bool,
    pub environment: Option<Environment>,
    pub notes: Option<String>,
    /// Dedicated artifact path; derived as
    /// {config_dir}/{host}_{port}_{path}.conf when not supplied
    pub config_path: Option<PathBuf>,
}

impl NewRoute {
    pub fn new(name: &str, path: &str, host: &str, port: u16, static_root: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            host: host.to_string(),
            port,
            static_root: static_root.to_string(),
            description: None,
            is_active: true,
            ssl_enabled: false,
            environment: None,
            notes: None,
            config_path: None,
        }
    }
}

/// Partial update of a route; None fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct RouteUpdate {
    pub name: Option<String>,
    pub path: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub static_root: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub ssl_enabled: Option<bool>,
    pub environment: Option<Environment>,
    pub notes: Option<String>,
    pub config_path: Option<PathBuf>,
}

/// Registry database with thread-safe access
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create a registry database at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| SyncError::io("create directory", parent, e))?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;

        info!(path = %path.display(), "Registry database opened");
        Ok(db)
    }

    /// Open an in-memory registry (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        let current_version: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        if current_version < SCHEMA_VERSION {
            info!(
                "Running migrations from v{} to v{}",
                current_version, SCHEMA_VERSION
            );

            if current_version < 1 {
                self.migrate_v1(&conn)?;
            }
        }

        Ok(())
    }

    /// Migration v1: routes table
    fn migrate_v1(&self, conn: &Connection) -> Result<()> {
        debug!("Applying migration v1: initial schema");

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS routes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                path TEXT NOT NULL,
                host TEXT NOT NULL,
                port INTEGER NOT NULL,
                static_root TEXT NOT NULL,
                description TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                ssl_enabled INTEGER NOT NULL DEFAULT 0,
                environment TEXT,
                notes TEXT,
                config_path TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE (host, port, path),
                UNIQUE (port)
            );

            CREATE INDEX IF NOT EXISTS idx_routes_active ON routes(is_active);
            CREATE INDEX IF NOT EXISTS idx_routes_host ON routes(host);

            INSERT INTO schema_migrations (version) VALUES (1);
        "#,
        )?;

        Ok(())
    }

    // ==================== Route Operations ====================

    /// Create a route. The artifact path is derived from the gateway settings
    /// when not supplied.
    pub fn create_route(&self, new: &NewRoute, gateway: &GatewaySettings) -> Result<RouteRecord> {
        validate_route_fields(&new.name, &new.path, &new.host, new.port, &new.static_root)?;
        if let Some(ref p) = new.config_path {
            validate_config_path(p)?;
        }

        let config_path = new
            .config_path
            .clone()
            .unwrap_or_else(|| gateway.route_config_path(&new.host, new.port, &new.path));

        let conn = self.conn.lock().unwrap();
        check_unique(&conn, &new.host, new.port, &new.path, new.is_active, None)?;

        conn.execute(
            "INSERT INTO routes
                (name, path, host, port, static_root, description, is_active,
                 ssl_enabled, environment, notes, config_path)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                new.name,
                new.path,
                new.host,
                new.port,
                new.static_root,
                new.description,
                new.is_active,
                new.ssl_enabled,
                new.environment.map(|e| e.as_str()),
                new.notes,
                config_path.to_string_lossy().into_owned(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        let record = get_route_locked(&conn, id)?;

        info!(
            id,
            name = %record.name,
            host = %record.host,
            port = record.port,
            "Route created"
        );
        Ok(record)
    }

    /// Apply a partial update to a route
    pub fn update_route(&self, id: i64, fields: &RouteUpdate) -> Result<RouteRecord> {
        let conn = self.conn.lock().unwrap();
        let current = get_route_locked(&conn, id)?;

        let name = fields.name.clone().unwrap_or(current.name);
        let path = fields.path.clone().unwrap_or(current.path);
        let host = fields.host.clone().unwrap_or(current.host);
        let port = fields.port.unwrap_or(current.port);
        let static_root = fields.static_root.clone().unwrap_or(current.static_root);
        let description = fields.description.clone().or(current.description);
        let is_active = fields.is_active.unwrap_or(current.is_active);
        let ssl_enabled = fields.ssl_enabled.unwrap_or(current.ssl_enabled);
        let environment = fields.environment.or(current.environment);
        let notes = fields.notes.clone().or(current.notes);
        let config_path = fields.config_path.clone().unwrap_or(current.config_path);

        validate_route_fields(&name, &path, &host, port, &static_root)?;
        validate_config_path(&config_path)?;
        check_unique(&conn, &host, port, &path, is_active, Some(id))?;

        conn.execute(
            "UPDATE routes SET
                name = ?1, path = ?2, host = ?3, port = ?4, static_root = ?5,
                description = ?6, is_active = ?7, ssl_enabled = ?8,
                environment = ?9, notes = ?10, config_path = ?11,
                updated_at = datetime('now')
             WHERE id = ?12",
            params![
                name,
                path,
                host,
                port,
                static_root,
                description,
                is_active,
                ssl_enabled,
                environment.map(|e| e.as_str()),
                notes,
                config_path.to_string_lossy().into_owned(),
                id,
            ],
        )?;

        let record = get_route_locked(&conn, id)?;
        info!(id, name = %record.name, active = record.is_active, "Route updated");
        Ok(record)
    }

    /// Delete a route, returning the deleted record so the caller can clean
    /// up its artifact
    pub fn delete_route(&self, id: i64) -> Result<RouteRecord> {
        let conn = self.conn.lock().unwrap();
        let record = get_route_locked(&conn, id)?;
        conn.execute("DELETE FROM routes WHERE id = ?1", params![id])?;
        info!(id, name = %record.name, "Route deleted");
        Ok(record)
    }

    /// Get a route by id
    pub fn get_route(&self, id: i64) -> Result<RouteRecord> {
        let conn = self.conn.lock().unwrap();
        get_route_locked(&conn, id)
    }

    /// List all routes in insertion order
    pub fn list_routes(&self) -> Result<Vec<RouteRecord>> {
        self.list_where("")
    }

    /// List active routes in insertion order; this is the set every rendered
    /// configuration is built from, so the ordering must be stable
    pub fn list_active(&self) -> Result<Vec<RouteRecord>> {
        self.list_where("WHERE is_active = 1")
    }

    fn list_where(&self, clause: &str) -> Result<Vec<RouteRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT id, name, path, host, port, static_root, description, is_active,
                    ssl_enabled, environment, notes, config_path, created_at, updated_at
             FROM routes {} ORDER BY id",
            clause
        ))?;

        let routes = stmt
            .query_map([], row_to_route)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(routes)
    }
}

fn get_route_locked(conn: &Connection, id: i64) -> Result<RouteRecord> {
    conn.query_row(
        "SELECT id, name, path, host, port, static_root, description, is_active,
                ssl_enabled, environment, notes, config_path, created_at, updated_at
         FROM routes WHERE id = ?1",
        params![id],
        row_to_route,
    )
    .optional()?
    .ok_or(SyncError::NotFound { id })
}

fn row_to_route(row: &rusqlite::Row<'_>) -> rusqlite::Result<RouteRecord> {
    Ok(RouteRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        path: row.get(2)?,
        host: row.get(3)?,
        port: row.get(4)?,
        static_root: row.get(5)?,
        description: row.get(6)?,
        is_active: row.get(7)?,
        ssl_enabled: row.get(8)?,
        environment: row
            .get::<_, Option<String>>(9)?
            .as_deref()
            .and_then(Environment::parse),
        notes: row.get(10)?,
        config_path: PathBuf::from(row.get::<_, String>(11)?),
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

/// Uniqueness checks: (host, port, path) across all records, port across all
/// records, and path across active records. Must run under the connection
/// lock together with the insert/update.
fn check_unique(
    conn: &Connection,
    host: &str,
    port: u16,
    path: &str,
    is_active: bool,
    exclude_id: Option<i64>,
) -> Result<()> {
    let exclude = exclude_id.unwrap_or(-1);

    let triple: Option<i64> = conn
        .query_row(
            "SELECT id FROM routes WHERE host = ?1 AND port = ?2 AND path = ?3 AND id != ?4",
            params![host, port, path, exclude],
            |row| row.get(0),
        )
        .optional()?;
    if triple.is_some() {
        return Err(SyncError::DuplicateKey {
            field: "host/port/path",
            value: format!("{}:{}/{}", host, port, path),
        });
    }

    let port_clash: Option<i64> = conn
        .query_row(
            "SELECT id FROM routes WHERE port = ?1 AND id != ?2",
            params![port, exclude],
            |row| row.get(0),
        )
        .optional()?;
    if port_clash.is_some() {
        return Err(SyncError::DuplicateKey {
            field: "port",
            value: port.to_string(),
        });
    }

    if is_active {
        let path_clash: Option<i64> = conn
            .query_row(
                "SELECT id FROM routes WHERE path = ?1 AND is_active = 1 AND id != ?2",
                params![path, exclude],
                |row| row.get(0),
            )
            .optional()?;
        if path_clash.is_some() {
            return Err(SyncError::DuplicateKey {
                field: "path",
                value: path.to_string(),
            });
        }
    }

    Ok(())
}

fn validate_route_fields(
    name: &str,
    path: &str,
    host: &str,
    port: u16,
    static_root: &str,
) -> Result<()> {
    if name.trim().is_empty() {
        return Err(SyncError::Validation {
            field: "name",
            reason: "must not be empty".to_string(),
        });
    }
    if path.is_empty() {
        return Err(SyncError::Validation {
            field: "path",
            reason: "must not be empty".to_string(),
        });
    }
    // The segment is interpolated into location directives verbatim, so it
    // must stay within the unreserved URL charset
    if path.starts_with('.')
        || !path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'))
    {
        return Err(SyncError::Validation {
            field: "path",
            reason: format!("{:?} must be a single URL segment", path),
        });
    }
    if host.is_empty() || host.contains('/') || host.chars().any(char::is_whitespace) {
        return Err(SyncError::Validation {
            field: "host",
            reason: format!("{:?} is not a valid hostname or address", host),
        });
    }
    if port == 0 {
        return Err(SyncError::Validation {
            field: "port",
            reason: "must be a positive integer".to_string(),
        });
    }
    if static_root.is_empty() {
        return Err(SyncError::Validation {
            field: "static_root",
            reason: "must not be empty".to_string(),
        });
    }
    validate_no_traversal("static_root", Path::new(static_root))?;
    Ok(())
}

fn validate_config_path(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(SyncError::Validation {
            field: "config_path",
            reason: "must not be empty".to_string(),
        });
    }
    validate_no_traversal("config_path", path)
}

fn validate_no_traversal(field: &'static str, path: &Path) -> Result<()> {
    if path
        .components()
        .any(|c| matches!(c, std::path::Component::ParentDir))
    {
        return Err(SyncError::Validation {
            field,
            reason: format!("{} must not contain traversal sequences", path.display()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> GatewaySettings {
        GatewaySettings::default()
    }

    #[test]
    fn test_create_then_list_active_includes_record_once() {
        let db = Database::open_in_memory().unwrap();
        let record = db
            .create_route(
                &NewRoute::new("api", "api", "localhost", 8001, "/srv/api/static"),
                &gateway(),
            )
            .unwrap();

        let active = db.list_active().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, record.id);
        assert_eq!(active[0].port, 8001);
        assert!(!active[0].created_at.is_empty());
    }

    #[test]
    fn test_config_path_derived_when_not_supplied() {
        let db = Database::open_in_memory().unwrap();
        let record = db
            .create_route(
                &NewRoute::new("api", "api", "localhost", 8001, "/srv/api/static"),
                &gateway(),
            )
            .unwrap();

        assert_eq!(
            record.config_path,
            PathBuf::from("/etc/nginx/conf.d/localhost_8001_api.conf")
        );
    }

    #[test]
    fn test_explicit_config_path_is_kept() {
        let db = Database::open_in_memory().unwrap();
        let mut new = NewRoute::new("api", "api", "localhost", 8001, "/srv/api/static");
        new.config_path = Some(PathBuf::from("/tmp/custom.conf"));

        let record = db.create_route(&new, &gateway()).unwrap();
        assert_eq!(record.config_path, PathBuf::from("/tmp/custom.conf"));
    }

    #[test]
    fn test_duplicate_port_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.create_route(
            &NewRoute::new("api", "api", "localhost", 8000, "/srv/api/static"),
            &gateway(),
        )
        .unwrap();

        // Different host and path, same port: port is a global resource
        let err = db
            .create_route(
                &NewRoute::new("web", "web", "example.com", 8000, "/srv/web/static"),
                &gateway(),
            )
            .unwrap_err();

        match err {
            SyncError::DuplicateKey { field: "port", value } => assert_eq!(value, "8000"),
            other => panic!("expected port duplicate, got {:?}", other),
        }
    }

    #[test]
    fn test_distinct_triple_succeeds() {
        let db = Database::open_in_memory().unwrap();
        db.create_route(
            &NewRoute::new("api", "api", "localhost", 8000, "/srv/api/static"),
            &gateway(),
        )
        .unwrap();
        db.create_route(
            &NewRoute::new("web", "web", "localhost", 8001, "/srv/web/static"),
            &gateway(),
        )
        .unwrap();

        assert_eq!(db.list_routes().unwrap().len(), 2);
    }

    #[test]
    fn test_duplicate_active_path_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.create_route(
            &NewRoute::new("api", "api", "localhost", 8001, "/srv/api/static"),
            &gateway(),
        )
        .unwrap();

        let err = db
            .create_route(
                &NewRoute::new("api2", "api", "example.com", 8002, "/srv/api2/static"),
                &gateway(),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::DuplicateKey { field: "path", .. }
        ));
    }

    #[test]
    fn test_inactive_record_may_reuse_path() {
        let db = Database::open_in_memory().unwrap();
        db.create_route(
            &NewRoute::new("api", "api", "localhost", 8001, "/srv/api/static"),
            &gateway(),
        )
        .unwrap();

        let mut parked = NewRoute::new("api-old", "api", "example.com", 8002, "/srv/old/static");
        parked.is_active = false;
        db.create_route(&parked, &gateway()).unwrap();

        assert_eq!(db.list_active().unwrap().len(), 1);
    }

    #[test]
    fn test_update_unknown_id_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let err = db.update_route(42, &RouteUpdate::default()).unwrap_err();
        assert!(matches!(err, SyncError::NotFound { id: 42 }));
    }

    #[test]
    fn test_update_flips_active_flag() {
        let db = Database::open_in_memory().unwrap();
        let record = db
            .create_route(
                &NewRoute::new("api", "api", "localhost", 8001, "/srv/api/static"),
                &gateway(),
            )
            .unwrap();

        let updated = db
            .update_route(
                record.id,
                &RouteUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(!updated.is_active);
        assert!(db.list_active().unwrap().is_empty());
        assert_eq!(db.list_routes().unwrap().len(), 1);
    }

    #[test]
    fn test_update_cannot_take_existing_port() {
        let db = Database::open_in_memory().unwrap();
        db.create_route(
            &NewRoute::new("api", "api", "localhost", 8001, "/srv/api/static"),
            &gateway(),
        )
        .unwrap();
        let web = db
            .create_route(
                &NewRoute::new("web", "web", "localhost", 8002, "/srv/web/static"),
                &gateway(),
            )
            .unwrap();

        let err = db
            .update_route(
                web.id,
                &RouteUpdate {
                    port: Some(8001),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, SyncError::DuplicateKey { field: "port", .. }));
    }

    #[test]
    fn test_update_keeping_own_keys_is_allowed() {
        let db = Database::open_in_memory().unwrap();
        let record = db
            .create_route(
                &NewRoute::new("api", "api", "localhost", 8001, "/srv/api/static"),
                &gateway(),
            )
            .unwrap();

        // Renaming only must not trip the uniqueness checks against itself
        let updated = db
            .update_route(
                record.id,
                &RouteUpdate {
                    name: Some("api-v2".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "api-v2");
        assert_eq!(updated.port, 8001);
    }

    #[test]
    fn test_delete_returns_record_and_removes_row() {
        let db = Database::open_in_memory().unwrap();
        let record = db
            .create_route(
                &NewRoute::new("api", "api", "localhost", 8001, "/srv/api/static"),
                &gateway(),
            )
            .unwrap();

        let deleted = db.delete_route(record.id).unwrap();
        assert_eq!(deleted.id, record.id);
        assert!(db.list_routes().unwrap().is_empty());
        assert!(matches!(
            db.get_route(record.id).unwrap_err(),
            SyncError::NotFound { .. }
        ));
    }

    #[test]
    fn test_list_active_preserves_insertion_order() {
        let db = Database::open_in_memory().unwrap();
        for (name, port) in [("c", 9003u16), ("a", 9001), ("b", 9002)] {
            db.create_route(
                &NewRoute::new(name, name, "localhost", port, "/srv/static"),
                &gateway(),
            )
            .unwrap();
        }

        let names: Vec<String> = db
            .list_active()
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[test]
    fn test_validation_rejects_traversal_path() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .create_route(
                &NewRoute::new("api", "../etc", "localhost", 8001, "/srv/api/static"),
                &gateway(),
            )
            .unwrap_err();
        assert!(matches!(err, SyncError::Validation { field: "path", .. }));

        let err = db
            .create_route(
                &NewRoute::new("api", "api", "localhost", 8001, "/srv/../../etc"),
                &gateway(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::Validation {
                field: "static_root",
                ..
            }
        ));
    }

    #[test]
    fn test_validation_rejects_non_url_segment_path() {
        let db = Database::open_in_memory().unwrap();
        // Whitespace or quotes would land verbatim inside a location directive
        for bad in ["my api", "api\"", "api'", "api{", "api;x", "café"] {
            let err = db
                .create_route(
                    &NewRoute::new("api", bad, "localhost", 8001, "/srv/api/static"),
                    &gateway(),
                )
                .unwrap_err();
            assert!(
                matches!(err, SyncError::Validation { field: "path", .. }),
                "{:?} should be rejected",
                bad
            );
        }

        for ok in ["api", "api-v2", "my_app", "v1.2", "a~b"] {
            validate_route_fields("api", ok, "localhost", 8001, "/srv/api/static").unwrap();
        }
    }

    #[test]
    fn test_validation_rejects_port_zero() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .create_route(
                &NewRoute::new("api", "api", "localhost", 0, "/srv/api/static"),
                &gateway(),
            )
            .unwrap_err();
        assert!(matches!(err, SyncError::Validation { field: "port", .. }));
    }

    #[test]
    fn test_environment_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let mut new = NewRoute::new("api", "api", "localhost", 8001, "/srv/api/static");
        new.environment = Some(Environment::Production);

        let record = db.create_route(&new, &gateway()).unwrap();
        let fetched = db.get_route(record.id).unwrap();
        assert_eq!(fetched.environment, Some(Environment::Production));
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!("staging".parse::<Environment>().unwrap(), Environment::Staging);
        assert!("prod".parse::<Environment>().is_err());
    }
}
