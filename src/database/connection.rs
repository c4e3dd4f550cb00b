/*!
 * Database connection management.
 *
 * This module handles SQLite database connection creation, initialization,
 * and provides async-safe access patterns using tokio's spawn_blocking.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::schema;

/// Default database filename
const DEFAULT_DB_FILENAME: &str = "catalog.db";

/// Default database directory name under user's data directory
const DEFAULT_DB_DIRNAME: &str = "peds-catalog";

/// Database connection wrapper with thread-safe access
#[derive(Clone)]
pub struct DatabaseConnection {
    /// Path to the database file
    db_path: PathBuf,
    /// Thread-safe connection wrapped in Arc<Mutex>
    connection: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for DatabaseConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConnection")
            .field("db_path", &self.db_path)
            .finish()
    }
}

impl DatabaseConnection {
    /// Create a new database connection at the default location
    pub fn new_default() -> Result<Self> {
        let db_path = Self::default_database_path()?;
        Self::new(&db_path)
    }

    /// Create a new database connection at the specified path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory: {:?}", parent)
                })?;
            }
        }

        info!("Opening catalog database at: {:?}", db_path);

        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database: {:?}", db_path))?;

        schema::initialize_schema(&conn)?;

        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        debug!("Creating in-memory catalog database");

        let conn =
            Connection::open_in_memory().context("Failed to create in-memory database")?;

        schema::initialize_schema(&conn)?;

        Ok(Self {
            db_path: PathBuf::from(":memory:"),
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Get the default database path
    pub fn default_database_path() -> Result<PathBuf> {
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

        Ok(base_dir.join(DEFAULT_DB_DIRNAME).join(DEFAULT_DB_FILENAME))
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Execute a database operation with the connection
    ///
    /// This method acquires the mutex lock and executes the provided closure
    /// with access to the connection. For async contexts, use `execute_async`.
    pub fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .connection
            .lock()
            .map_err(|e| anyhow::anyhow!("Failed to acquire database lock: {}", e))?;

        f(&conn)
    }

    /// Execute a database operation asynchronously using spawn_blocking
    ///
    /// This is the preferred method for async contexts as it prevents
    /// blocking the async runtime.
    pub async fn execute_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.connection.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| anyhow::anyhow!("Failed to acquire database lock: {}", e))?;

            f(&conn)
        })
        .await
        .context("Database task panicked")?
    }

    /// Begin a transaction and execute operations within it
    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&rusqlite::Transaction) -> Result<T>,
    {
        let mut conn = self
            .connection
            .lock()
            .map_err(|e| anyhow::anyhow!("Failed to acquire database lock: {}", e))?;

        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;

        Ok(result)
    }

    /// Begin an async transaction and execute operations within it
    pub async fn transaction_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&rusqlite::Transaction) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.connection.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| anyhow::anyhow!("Failed to acquire database lock: {}", e))?;

            let tx = conn.transaction()?;
            let result = f(&tx)?;
            tx.commit()?;

            Ok(result)
        })
        .await
        .context("Database transaction task panicked")?
    }

    /// Get row counts for the catalog tables
    pub fn stats(&self) -> Result<DatabaseStats> {
        self.execute(|conn| {
            let count = |table: &str| -> i64 {
                conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })
                .unwrap_or(0)
            };

            let file_size = if self.db_path.to_string_lossy() != ":memory:" {
                std::fs::metadata(&self.db_path)
                    .map(|m| m.len())
                    .unwrap_or(0)
            } else {
                0
            };

            Ok(DatabaseStats {
                trigger_count: count("triggers"),
                video_count: count("videos"),
                cluster_count: count("video_clusters"),
                membership_count: count("cluster_videos"),
                trigger_mapping_count: count("trigger_videos"),
                localized_title_count: count("localized_titles"),
                file_size_bytes: file_size,
            })
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Number of triggers
    pub trigger_count: i64,
    /// Number of videos
    pub video_count: i64,
    /// Number of video clusters
    pub cluster_count: i64,
    /// Number of cluster memberships
    pub membership_count: i64,
    /// Number of trigger-video mappings
    pub trigger_mapping_count: i64,
    /// Number of stored localized titles
    pub localized_title_count: i64,
    /// Database file size in bytes
    pub file_size_bytes: u64,
}

impl std::fmt::Display for DatabaseStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Triggers: {}, Videos: {}, Clusters: {}, Memberships: {}, Trigger mappings: {}, Localized titles: {}, Size: {} KB",
            self.trigger_count,
            self.video_count,
            self.cluster_count,
            self.membership_count,
            self.trigger_mapping_count,
            self.localized_title_count,
            self.file_size_bytes / 1024
        )
    }
}
