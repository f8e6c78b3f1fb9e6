//! SQLite Database
//!
//! Embedded entity store using rusqlite with r2d2 connection pooling. Every
//! pooled connection is configured with foreign keys on and a bounded busy
//! timeout so lock waits surface as retryable conflicts.

use std::path::{Path, PathBuf};
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, DatabaseName};

use crate::models::settings::DatabaseConfig;
use crate::services::search_index::SearchIndexSynchronizer;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::database_path;

/// Type alias for the connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// Type alias for a checked-out connection
pub type DbConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Database service for managing SQLite operations
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Create a database from an existing connection pool.
    pub fn from_pool(pool: DbPool) -> AppResult<Self> {
        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory database for testing.
    ///
    /// Uses an in-memory SQLite database with the same schema as the
    /// production database. Every in-memory connection is its own database,
    /// so the pool holds exactly one connection.
    pub fn new_in_memory() -> AppResult<Self> {
        let manager = SqliteConnectionManager::memory().with_init(|conn| configure(conn, 5000));
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| AppError::internal(format!("Failed to create connection pool: {}", e)))?;

        Self::from_pool(pool)
    }

    /// Create a new database instance at the configured (or default) location
    pub fn new(config: &DatabaseConfig) -> AppResult<Self> {
        let db_path = match &config.path {
            Some(path) => PathBuf::from(path),
            None => database_path()?,
        };
        Self::open(&db_path, config)
    }

    /// Open (or create) a database file with connection pooling
    pub fn open(db_path: &Path, config: &DatabaseConfig) -> AppResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let busy_timeout_ms = config.busy_timeout_ms;
        let manager = SqliteConnectionManager::file(db_path).with_init(move |conn| {
            // busy_timeout first so the WAL switch waits on sibling connections
            configure(conn, busy_timeout_ms)?;
            conn.pragma_update(None::<DatabaseName>, "journal_mode", "WAL")?;
            conn.pragma_update(None::<DatabaseName>, "synchronous", "NORMAL")
        });
        let pool = Pool::builder()
            .max_size(config.pool_size)
            .build(manager)
            .map_err(|e| AppError::internal(format!("Failed to create connection pool: {}", e)))?;

        tracing::info!(
            "[Database] opened {} (pool_size={}, busy_timeout_ms={})",
            db_path.display(),
            config.pool_size,
            busy_timeout_ms
        );
        Self::from_pool(pool)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> AppResult<()> {
        let conn = self.get_connection()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS project (
                id TEXT PRIMARY KEY,
                key TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS membership (
                project_id TEXT NOT NULL REFERENCES project(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL,
                role TEXT NOT NULL CHECK (role IN ('view', 'edit', 'admin')),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (project_id, user_id)
            );

            CREATE INDEX IF NOT EXISTS idx_membership_user ON membership(user_id);

            CREATE TABLE IF NOT EXISTS task_status (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL REFERENCES project(id) ON DELETE CASCADE,
                key TEXT NOT NULL,
                label TEXT NOT NULL,
                position INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (project_id, key),
                UNIQUE (project_id, position)
            );

            CREATE TABLE IF NOT EXISTS task (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL REFERENCES project(id) ON DELETE CASCADE,
                status TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                deleted_at TEXT,
                FOREIGN KEY (project_id, status) REFERENCES task_status(project_id, key)
            );

            CREATE INDEX IF NOT EXISTS idx_task_project_status ON task(project_id, status);

            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                actor_id TEXT NOT NULL,
                entity_type TEXT NOT NULL,
                entity_id TEXT NOT NULL,
                action TEXT NOT NULL,
                detail TEXT NOT NULL DEFAULT 'null',
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_audit_log_entity
                ON audit_log(entity_type, entity_id);",
        )?;

        // Search index table and the triggers that keep it in step with `task`
        SearchIndexSynchronizer::install(&conn)?;

        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> AppResult<DbConnection> {
        Ok(self.pool.get()?)
    }

    /// Get the connection pool
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Check if the database is healthy
    pub fn is_healthy(&self) -> bool {
        if let Ok(conn) = self.pool.get() {
            conn.query_row("SELECT 1", [], |_| Ok(())).is_ok()
        } else {
            false
        }
    }
}

/// Per-connection settings applied by the pool on checkout of a new connection
fn configure(conn: &mut Connection, busy_timeout_ms: u64) -> rusqlite::Result<()> {
    conn.pragma_update(None::<DatabaseName>, "foreign_keys", "ON")?;
    conn.busy_timeout(Duration::from_millis(busy_timeout_ms))?;
    Ok(())
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("pool_size", &self.pool.state().connections)
            .finish()
    }
}
