/*!
 * Key/value cache backends.
 *
 * The sharing catalog and the message-prefix builder store serialized values
 * through the `CacheBackend` trait, so the backend can be swapped without
 * touching the components that read or invalidate entries:
 * - `memory`: process-local map, used in tests and single-process runs
 * - `sqlite`: table in the catalog database, shared by every process that
 *   opens the same file
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{CacheBackendKind, CacheConfig};
use crate::database::DatabaseConnection;
use crate::errors::CacheError;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryCache;
pub use sqlite::SqliteCache;

/// Common trait for all cache backends
///
/// Values are opaque strings. A `None` TTL keeps the entry until it is
/// deleted; entries past their TTL read as absent.
#[async_trait]
pub trait CacheBackend: Send + Sync + Debug {
    /// Fetch the value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError>;

    /// Remove `key`; removing an absent key is not an error
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Create the backend selected in configuration
pub fn create_backend(config: &CacheConfig, db: &DatabaseConnection) -> Arc<dyn CacheBackend> {
    match config.backend {
        CacheBackendKind::Memory => Arc::new(MemoryCache::new()),
        CacheBackendKind::Sqlite => Arc::new(SqliteCache::new(db.clone())),
    }
}
