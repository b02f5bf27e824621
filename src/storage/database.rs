use crate::storage::errors::{Result, StorageError};
use crate::storage::schema;
use directories::ProjectDirs;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Connection statistics for monitoring
#[derive(Debug, Default)]
pub struct ConnectionStats {
    pub operations_count: AtomicU64,
    pub transaction_count: AtomicU64,
    pub error_count: AtomicU64,
    pub total_time_ms: AtomicU64,
}

impl ConnectionStats {
    pub fn record_operation(&self, duration: Duration) {
        self.operations_count.fetch_add(1, Ordering::Relaxed);
        self.total_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_transaction(&self) {
        self.transaction_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    /// (operations, transactions, errors, total milliseconds)
    pub fn get_stats(&self) -> (u64, u64, u64, u64) {
        (
            self.operations_count.load(Ordering::Relaxed),
            self.transaction_count.load(Ordering::Relaxed),
            self.error_count.load(Ordering::Relaxed),
            self.total_time_ms.load(Ordering::Relaxed),
        )
    }
}

/// Shared handle to the server's SQLite store.
///
/// A single connection sits behind a mutex; every transaction holds it for its
/// whole duration, which is what makes queue claims and move commits indivisible.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    stats: Arc<ConnectionStats>,
}

impl Database {
    /// Open (creating if needed) the database file at `path` and run migrations
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::database_path_error(format!(
                    "Failed to create database directory: {}",
                    e
                ))
            })?;
        }

        let conn = Self::create_optimized_connection(path)?;
        info!("Opened database at {}", path.display());
        Self::from_connection(conn)
    }

    /// Open a private in-memory database, used by tests and `--ephemeral` runs
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        schema::initialize_schema(&conn)?;
        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
            stats: Arc::new(ConnectionStats::default()),
        })
    }

    /// Create a connection with SQLite settings suited to a single-writer server
    fn create_optimized_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path)?;

        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!("SQLite journal mode: {}", mode);
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "busy_timeout", 5000)?;
        conn.pragma_update(None, "temp_store", "memory")?;

        Ok(conn)
    }

    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    /// Execute a closure with access to the connection
    pub fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let start_time = Instant::now();
        let conn = self.conn.lock();

        match f(&conn) {
            Ok(result) => {
                self.stats.record_operation(start_time.elapsed());
                Ok(result)
            }
            Err(e) => {
                self.stats.record_error();
                Err(e)
            }
        }
    }

    /// Execute a transaction with automatic rollback on error
    pub fn with_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let start_time = Instant::now();
        let conn = self.conn.lock();

        let tx = conn
            .unchecked_transaction()
            .map_err(StorageError::ConnectionFailed)?;

        match f(&tx) {
            Ok(result) => {
                tx.commit().map_err(StorageError::ConnectionFailed)?;
                self.stats.record_operation(start_time.elapsed());
                self.stats.record_transaction();
                Ok(result)
            }
            Err(e) => {
                let _ = tx.rollback(); // Ignore rollback errors, return original error
                self.stats.record_error();
                Err(e)
            }
        }
    }

    /// Get current Unix timestamp
    pub fn current_timestamp() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default()
    }
}

/// Get the appropriate database path for the current platform
pub fn get_database_path() -> Result<PathBuf> {
    // Check for override environment variable first
    if let Ok(custom_data_dir) = std::env::var("GAMBIT_DATA_DIR") {
        let data_dir = PathBuf::from(custom_data_dir);
        return Ok(data_dir.join("gambit.sqlite"));
    }

    let project_dirs = ProjectDirs::from("dev", "gambit", "gambit").ok_or_else(|| {
        StorageError::database_path_error("Failed to determine application data directory")
    })?;

    Ok(project_dirs.data_dir().join("gambit.sqlite"))
}
