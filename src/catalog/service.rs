/*!
 * Sharing catalog cache service.
 *
 * Holds the snapshot of all published entries under one fixed key. Entries
 * never expire on their own; writers call `invalidate` after each committed
 * change and the next `get` rebuilds from the store.
 */

use log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;

use super::snapshot::CatalogSnapshot;
use crate::cache::CacheBackend;
use crate::database::Repository;
use crate::errors::{CacheError, CatalogError};

/// Fixed cache key of the sharing catalog snapshot
pub const CATALOG_CACHE_KEY: &str = "catalog_json_v1";

/// Keyed cache service for the sharing catalog snapshot
#[derive(Clone)]
pub struct SharingCatalog {
    /// Catalog store the snapshot is built from
    repository: Repository,
    /// Where the serialized snapshot lives
    backend: Arc<dyn CacheBackend>,
    /// Cache key of the snapshot
    key: String,
}

impl fmt::Debug for SharingCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharingCatalog")
            .field("backend", &self.backend)
            .field("key", &self.key)
            .finish()
    }
}

impl SharingCatalog {
    /// Create the service with the default key
    pub fn new(repository: Repository, backend: Arc<dyn CacheBackend>) -> Self {
        Self::with_key(repository, backend, CATALOG_CACHE_KEY)
    }

    /// Create the service with a custom key
    pub fn with_key(
        repository: Repository,
        backend: Arc<dyn CacheBackend>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            backend,
            key: key.into(),
        }
    }

    /// Cache key of the snapshot
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Backend shared with other cached values
    pub fn backend(&self) -> Arc<dyn CacheBackend> {
        self.backend.clone()
    }

    /// Return the snapshot, rebuilding it on a miss
    pub async fn get(&self) -> Result<CatalogSnapshot, CatalogError> {
        if let Some(cached) = self.read_cached().await {
            match serde_json::from_str::<CatalogSnapshot>(&cached) {
                Ok(snapshot) => return Ok(snapshot),
                Err(e) => warn!(
                    "Discarding unreadable cached snapshot under '{}': {}",
                    self.key, e
                ),
            }
        }

        let (snapshot, _) = self.rebuild().await?;
        Ok(snapshot)
    }

    /// Return the serialized snapshot, rebuilding it on a miss
    pub async fn get_serialized(&self) -> Result<String, CatalogError> {
        if let Some(cached) = self.read_cached().await {
            if serde_json::from_str::<CatalogSnapshot>(&cached).is_ok() {
                return Ok(cached);
            }
            warn!("Discarding unreadable cached snapshot under '{}'", self.key);
        }

        let (_, serialized) = self.rebuild().await?;
        Ok(serialized)
    }

    /// Remove the cached snapshot
    pub async fn invalidate(&self) -> Result<(), CacheError> {
        match self.backend.delete(&self.key).await {
            Ok(()) => {
                debug!("Invalidated sharing catalog '{}'", self.key);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to invalidate sharing catalog '{}': {}", self.key, e);
                Err(e)
            }
        }
    }

    /// Build the snapshot from the store and try to cache it
    ///
    /// A backend failure while storing is logged and ignored; the caller
    /// still gets the fresh snapshot.
    pub async fn rebuild(&self) -> Result<(CatalogSnapshot, String), CatalogError> {
        let rows = self.repository.load_catalog_rows(true).await?;
        let snapshot = CatalogSnapshot::assemble(&rows);
        let serialized = serde_json::to_string(&snapshot)
            .map_err(|e| CatalogError::Store(format!("Failed to serialize snapshot: {}", e)))?;

        match self.backend.set(&self.key, &serialized, None).await {
            Ok(()) => info!(
                "Rebuilt sharing catalog: {} triggers, {} videos, {} clusters",
                snapshot.triggers.len(),
                snapshot.videos.len(),
                snapshot.clusters.len()
            ),
            Err(e) => warn!("Could not cache sharing catalog, serving uncached: {}", e),
        }

        Ok((snapshot, serialized))
    }

    async fn read_cached(&self) -> Option<String> {
        match self.backend.get(&self.key).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Cache backend unavailable, rebuilding sharing catalog: {}", e);
                None
            }
        }
    }
}
