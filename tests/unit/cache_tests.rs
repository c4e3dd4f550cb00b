/*!
 * Tests for the cache backends
 */

use anyhow::Result;
use std::time::Duration;

use peds_catalog::app_config::{CacheBackendKind, CacheConfig};
use peds_catalog::cache::{CacheBackend, MemoryCache, SqliteCache, create_backend};
use peds_catalog::database::DatabaseConnection;

use crate::common;

#[tokio::test]
async fn test_memoryCache_withElapsedTtl_shouldReadAsAbsent() -> Result<()> {
    let cache = MemoryCache::new();
    cache.set("short", "v", Some(Duration::from_millis(20))).await?;
    cache.set("forever", "v", None).await?;

    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(cache.get("short").await?, None);
    assert_eq!(cache.get("forever").await?, Some("v".to_string()));
    assert_eq!(cache.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_memoryCache_clones_shouldShareEntries() -> Result<()> {
    let cache = MemoryCache::new();
    let other = cache.clone();

    cache.set("k", "v", None).await?;
    other.delete("k").await?;

    assert!(cache.is_empty());
    let (hits, misses, _) = cache.stats();
    assert_eq!((hits, misses), (0, 0));
    Ok(())
}

#[tokio::test]
async fn test_sqliteCache_shouldBeSharedAcrossConnections() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("catalog.db");
    let first = SqliteCache::new(DatabaseConnection::new(&path)?);
    let second = SqliteCache::new(DatabaseConnection::new(&path)?);

    first.set("catalog_json_v1", "{}", None).await?;
    assert_eq!(second.get("catalog_json_v1").await?, Some("{}".to_string()));

    second.delete("catalog_json_v1").await?;
    assert_eq!(first.get("catalog_json_v1").await?, None);
    Ok(())
}

#[tokio::test]
async fn test_sqliteCache_withElapsedTtl_shouldExpireAndBePurgedOnWrite() -> Result<()> {
    let db = DatabaseConnection::new_in_memory()?;
    let cache = SqliteCache::new(db.clone());
    cache.set("wa_prefixes_v2_short", "v", Some(Duration::from_millis(10))).await?;

    tokio::time::sleep(Duration::from_millis(40)).await;
    cache.set("forever", "v", None).await?;

    let keys: Vec<String> = db.execute(|conn| {
        let mut stmt = conn.prepare("SELECT key FROM cache_entries ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    })?;
    assert_eq!(keys, vec!["forever".to_string()]);
    assert_eq!(cache.get("wa_prefixes_v2_short").await?, None);
    assert_eq!(cache.get("forever").await?, Some("v".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_sqliteCache_set_shouldReplaceValue() -> Result<()> {
    let cache = SqliteCache::new(DatabaseConnection::new_in_memory()?);

    cache.set("k", "old", Some(Duration::from_millis(1))).await?;
    cache.set("k", "new", None).await?;
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(cache.get("k").await?, Some("new".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_createBackend_shouldFollowConfiguration() -> Result<()> {
    let db = DatabaseConnection::new_in_memory()?;
    let memory = create_backend(
        &CacheConfig {
            backend: CacheBackendKind::Memory,
            ..CacheConfig::default()
        },
        &db,
    );
    let sqlite = create_backend(&CacheConfig::default(), &db);

    memory.set("k", "memory", None).await?;
    sqlite.set("k", "sqlite", None).await?;

    assert_eq!(memory.get("k").await?, Some("memory".to_string()));
    assert_eq!(sqlite.get("k").await?, Some("sqlite".to_string()));
    assert!(format!("{:?}", sqlite).contains("SqliteCache"));
    Ok(())
}
