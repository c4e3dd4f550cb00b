/*!
 * Cache backend stored in the catalog database.
 *
 * Every process that opens the same database file (importer runs, admin
 * commands, web workers) sees the same entries, so an invalidation in one
 * process is visible to the others on their next read.
 */

use async_trait::async_trait;
use log::debug;
use rusqlite::{Connection, OptionalExtension, params};
use std::time::Duration;

use super::CacheBackend;
use crate::database::DatabaseConnection;
use crate::errors::CacheError;

/// Cache backend over the `cache_entries` table
#[derive(Debug, Clone)]
pub struct SqliteCache {
    db: DatabaseConnection,
}

impl SqliteCache {
    /// Create a backend over an initialized catalog database
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Expiry timestamp in milliseconds; `None` (no expiry) when it does not fit
fn expiry_millis(now_millis: i64, ttl: Duration) -> Option<i64> {
    i64::try_from(ttl.as_millis())
        .ok()
        .and_then(|ttl| now_millis.checked_add(ttl))
}

fn delete_expired(conn: &Connection, now_millis: i64) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM cache_entries WHERE expires_at IS NOT NULL AND expires_at <= ?1",
        [now_millis],
    )
}

fn unavailable(error: anyhow::Error) -> CacheError {
    CacheError::Unavailable(format!("{:#}", error))
}

#[async_trait]
impl CacheBackend for SqliteCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let key = key.to_string();
        let now = chrono::Utc::now().timestamp_millis();

        let value = self
            .db
            .execute_async(move |conn| {
                let entry: Option<(String, Option<i64>)> = conn
                    .query_row(
                        "SELECT value, expires_at FROM cache_entries WHERE key = ?1",
                        [&key],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                    .optional()?;

                match entry {
                    Some((_, Some(expires_at))) if expires_at <= now => {
                        conn.execute(
                            "DELETE FROM cache_entries WHERE key = ?1 AND expires_at <= ?2",
                            params![key, now],
                        )?;
                        Ok(None)
                    }
                    Some((value, _)) => Ok(Some(value)),
                    None => Ok(None),
                }
            })
            .await
            .map_err(unavailable)?;

        debug!(
            "Cache {} in sqlite backend",
            if value.is_some() { "hit" } else { "miss" }
        );
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let key = key.to_string();
        let value = value.to_string();
        let now = chrono::Utc::now();
        let now_millis = now.timestamp_millis();
        let expires_at = ttl.and_then(|ttl| expiry_millis(now_millis, ttl));
        let updated_at = now.to_rfc3339();

        self.db
            .execute_async(move |conn| {
                let purged = delete_expired(conn, now_millis)?;
                if purged > 0 {
                    debug!("Purged {} expired cache entries", purged);
                }
                conn.execute(
                    r#"
                    INSERT INTO cache_entries (key, value, expires_at, updated_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        expires_at = excluded.expires_at,
                        updated_at = excluded.updated_at
                    "#,
                    params![key, value, expires_at, updated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(unavailable)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let key = key.to_string();

        self.db
            .execute_async(move |conn| {
                conn.execute("DELETE FROM cache_entries WHERE key = ?1", [&key])?;
                Ok(())
            })
            .await
            .map_err(unavailable)
    }
}
