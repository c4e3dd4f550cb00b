/*!
 * Repository layer for catalog operations.
 *
 * This module provides a high-level API for all catalog database operations,
 * abstracting away the SQL details. Every entity is addressed by its external
 * code; internal keys never leave this layer except inside `CatalogRows`.
 */

use anyhow::Result;
use log::debug;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::BTreeMap;

use super::connection::DatabaseConnection;
use super::models::{
    CatalogRows, ClusterInput, ClusterRecord, EntityKind, EntityUpsert, MappingOutcome,
    MembershipRecord, TriggerInput, TriggerMappingRecord, TriggerRecord, UpsertOutcome,
    VideoInput, VideoRecord,
};

/// Row of the cluster-video mapping file, by external codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipInput {
    /// Cluster external code
    pub cluster_code: String,
    /// Video external code
    pub video_code: String,
    /// Position inside the cluster
    pub position: i64,
}

/// Row of the trigger-video mapping file, by external codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerMappingInput {
    /// Trigger external code
    pub trigger_code: String,
    /// Video external code
    pub video_code: String,
}

/// Repository for catalog operations
#[derive(Clone, Debug)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with the default database location
    pub fn new_default() -> Result<Self> {
        let db = DatabaseConnection::new_default()?;
        Ok(Self::new(db))
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    /// Underlying connection, shared with the storage-backed cache
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    // =========================================================================
    // Entity Upserts
    // =========================================================================

    /// Upsert a batch of triggers in one transaction
    pub async fn upsert_triggers(&self, inputs: Vec<TriggerInput>) -> Result<Vec<EntityUpsert>> {
        self.db
            .transaction_async(move |tx| {
                inputs
                    .iter()
                    .map(|input| {
                        upsert_entity(
                            tx,
                            EntityKind::Trigger,
                            &input.code,
                            &input.title,
                            None,
                            input.is_published,
                        )
                    })
                    .collect()
            })
            .await
    }

    /// Upsert a batch of videos in one transaction
    pub async fn upsert_videos(&self, inputs: Vec<VideoInput>) -> Result<Vec<EntityUpsert>> {
        self.db
            .transaction_async(move |tx| {
                inputs
                    .iter()
                    .map(|input| {
                        upsert_entity(
                            tx,
                            EntityKind::Video,
                            &input.code,
                            &input.title,
                            Some(&input.url),
                            input.is_published,
                        )
                    })
                    .collect()
            })
            .await
    }

    /// Upsert a batch of clusters in one transaction
    pub async fn upsert_clusters(&self, inputs: Vec<ClusterInput>) -> Result<Vec<EntityUpsert>> {
        self.db
            .transaction_async(move |tx| {
                inputs
                    .iter()
                    .map(|input| {
                        upsert_entity(
                            tx,
                            EntityKind::Cluster,
                            &input.code,
                            &input.title,
                            None,
                            input.is_published,
                        )
                    })
                    .collect()
            })
            .await
    }

    // =========================================================================
    // Mapping Operations
    // =========================================================================

    /// Apply cluster memberships in one transaction
    ///
    /// Rows whose cluster or video code is unknown are reported as
    /// `MappingOutcome::Missing` and leave the store untouched.
    pub async fn apply_memberships(
        &self,
        inputs: Vec<MembershipInput>,
    ) -> Result<Vec<MappingOutcome>> {
        self.db
            .transaction_async(move |tx| {
                let mut outcomes = Vec::with_capacity(inputs.len());
                for input in &inputs {
                    let Some(cluster_id) = find_id(tx, EntityKind::Cluster, &input.cluster_code)?
                    else {
                        outcomes.push(MappingOutcome::Missing {
                            kind: EntityKind::Cluster,
                            code: input.cluster_code.clone(),
                        });
                        continue;
                    };
                    let Some(video_id) = find_id(tx, EntityKind::Video, &input.video_code)? else {
                        outcomes.push(MappingOutcome::Missing {
                            kind: EntityKind::Video,
                            code: input.video_code.clone(),
                        });
                        continue;
                    };
                    let outcome = upsert_membership(tx, cluster_id, video_id, input.position)?;
                    outcomes.push(MappingOutcome::Applied(outcome));
                }
                Ok(outcomes)
            })
            .await
    }

    /// Apply trigger-video mappings in one transaction
    pub async fn apply_trigger_mappings(
        &self,
        inputs: Vec<TriggerMappingInput>,
    ) -> Result<Vec<MappingOutcome>> {
        self.db
            .transaction_async(move |tx| {
                let mut outcomes = Vec::with_capacity(inputs.len());
                for input in &inputs {
                    let Some(trigger_id) = find_id(tx, EntityKind::Trigger, &input.trigger_code)?
                    else {
                        outcomes.push(MappingOutcome::Missing {
                            kind: EntityKind::Trigger,
                            code: input.trigger_code.clone(),
                        });
                        continue;
                    };
                    let Some(video_id) = find_id(tx, EntityKind::Video, &input.video_code)? else {
                        outcomes.push(MappingOutcome::Missing {
                            kind: EntityKind::Video,
                            code: input.video_code.clone(),
                        });
                        continue;
                    };
                    let inserted = tx.execute(
                        "INSERT OR IGNORE INTO trigger_videos (trigger_id, video_id) VALUES (?1, ?2)",
                        params![trigger_id, video_id],
                    )?;
                    let outcome = if inserted > 0 {
                        UpsertOutcome::Created
                    } else {
                        UpsertOutcome::Unchanged
                    };
                    outcomes.push(MappingOutcome::Applied(outcome));
                }
                Ok(outcomes)
            })
            .await
    }

    /// Remove a video from a cluster; returns whether a membership existed
    pub async fn remove_membership(&self, cluster_id: i64, video_id: i64) -> Result<bool> {
        self.db
            .execute_async(move |conn| {
                let deleted = conn.execute(
                    "DELETE FROM cluster_videos WHERE cluster_id = ?1 AND video_id = ?2",
                    params![cluster_id, video_id],
                )?;
                Ok(deleted > 0)
            })
            .await
    }

    /// Remove a trigger-video mapping; returns whether a mapping existed
    pub async fn remove_trigger_mapping(&self, trigger_id: i64, video_id: i64) -> Result<bool> {
        self.db
            .execute_async(move |conn| {
                let deleted = conn.execute(
                    "DELETE FROM trigger_videos WHERE trigger_id = ?1 AND video_id = ?2",
                    params![trigger_id, video_id],
                )?;
                Ok(deleted > 0)
            })
            .await
    }

    /// Set the position of a video inside a cluster, inserting the membership if needed
    pub async fn upsert_membership(
        &self,
        cluster_id: i64,
        video_id: i64,
        position: i64,
    ) -> Result<UpsertOutcome> {
        self.db
            .execute_async(move |conn| upsert_membership(conn, cluster_id, video_id, position))
            .await
    }

    // =========================================================================
    // Lookups and Admin Writes
    // =========================================================================

    /// Resolve an external code to the internal key
    pub async fn find_id(&self, kind: EntityKind, code: &str) -> Result<Option<i64>> {
        let code = code.to_string();

        self.db
            .execute_async(move |conn| find_id(conn, kind, &code))
            .await
    }

    /// Get a video by external code
    pub async fn get_video(&self, code: &str) -> Result<Option<VideoRecord>> {
        let code = code.to_string();

        self.db
            .execute_async(move |conn| {
                let result = conn
                    .query_row(
                        "SELECT id, code, title, url, is_published FROM videos WHERE code = ?1",
                        [&code],
                        parse_video_row,
                    )
                    .optional()?;
                Ok(result)
            })
            .await
    }

    /// Get a trigger by external code
    pub async fn get_trigger(&self, code: &str) -> Result<Option<TriggerRecord>> {
        let code = code.to_string();

        self.db
            .execute_async(move |conn| {
                let result = conn
                    .query_row(
                        "SELECT id, code, title, is_published FROM triggers WHERE code = ?1",
                        [&code],
                        parse_trigger_row,
                    )
                    .optional()?;
                Ok(result)
            })
            .await
    }

    /// Set the publish flag; returns whether the entity exists
    pub async fn set_published(&self, kind: EntityKind, code: &str, published: bool) -> Result<bool> {
        let code = code.to_string();
        let now = chrono::Utc::now().to_rfc3339();

        self.db
            .execute_async(move |conn| {
                let updated = conn.execute(
                    &format!(
                        "UPDATE {} SET is_published = ?1, updated_at = ?2 WHERE code = ?3",
                        kind.table()
                    ),
                    params![published, now, code],
                )?;
                Ok(updated > 0)
            })
            .await
    }

    /// Delete an entity with its mappings and localized titles
    ///
    /// Returns whether the entity existed.
    pub async fn delete_entity(&self, kind: EntityKind, code: &str) -> Result<bool> {
        let code = code.to_string();

        self.db
            .transaction_async(move |tx| {
                let Some(id) = find_id(tx, kind, &code)? else {
                    return Ok(false);
                };
                tx.execute(
                    "DELETE FROM localized_titles WHERE entity_kind = ?1 AND entity_id = ?2",
                    params![kind.to_string(), id],
                )?;
                // Memberships and mappings follow through ON DELETE CASCADE
                tx.execute(&format!("DELETE FROM {} WHERE id = ?1", kind.table()), [id])?;
                debug!("Deleted {} {}", kind, code);
                Ok(true)
            })
            .await
    }

    // =========================================================================
    // Localized Titles
    // =========================================================================

    /// Store localized titles for an entity, overwriting the given languages
    pub async fn store_localized_titles(
        &self,
        kind: EntityKind,
        entity_id: i64,
        titles: BTreeMap<String, String>,
    ) -> Result<()> {
        self.db
            .transaction_async(move |tx| {
                for (language_code, title) in &titles {
                    tx.execute(
                        r#"
                        INSERT INTO localized_titles (entity_kind, entity_id, language_code, title)
                        VALUES (?1, ?2, ?3, ?4)
                        ON CONFLICT(entity_kind, entity_id, language_code)
                        DO UPDATE SET title = excluded.title
                        "#,
                        params![kind.to_string(), entity_id, language_code, title],
                    )?;
                }
                Ok(())
            })
            .await
    }

    /// Remove every localized title of an entity; returns the number removed
    pub async fn clear_localized_titles(&self, kind: EntityKind, entity_id: i64) -> Result<usize> {
        self.db
            .execute_async(move |conn| {
                let deleted = conn.execute(
                    "DELETE FROM localized_titles WHERE entity_kind = ?1 AND entity_id = ?2",
                    params![kind.to_string(), entity_id],
                )?;
                Ok(deleted)
            })
            .await
    }

    /// Localized titles of an entity keyed by language code
    pub async fn get_localized_titles(
        &self,
        kind: EntityKind,
        entity_id: i64,
    ) -> Result<BTreeMap<String, String>> {
        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT language_code, title FROM localized_titles
                    WHERE entity_kind = ?1 AND entity_id = ?2
                    "#,
                )?;
                let rows = stmt.query_map(params![kind.to_string(), entity_id], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?;

                let mut titles = BTreeMap::new();
                for row in rows {
                    let (language_code, title) = row?;
                    titles.insert(language_code, title);
                }
                Ok(titles)
            })
            .await
    }

    // =========================================================================
    // Snapshot Reads
    // =========================================================================

    /// Read every row needed to assemble the sharing snapshot under one lock
    pub async fn load_catalog_rows(&self, published_only: bool) -> Result<CatalogRows> {
        self.db
            .execute_async(move |conn| load_catalog_rows(conn, published_only))
            .await
    }

    /// Cluster memberships of one cluster as (video code, position), ordered
    pub async fn list_cluster_videos(&self, cluster_code: &str) -> Result<Vec<(String, i64)>> {
        let cluster_code = cluster_code.to_string();

        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT v.code, cv.position
                    FROM cluster_videos cv
                    JOIN video_clusters c ON c.id = cv.cluster_id
                    JOIN videos v ON v.id = cv.video_id
                    WHERE c.code = ?1
                    ORDER BY cv.position, v.code
                    "#,
                )?;
                let rows = stmt
                    .query_map([&cluster_code], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await
    }

}

/// Resolve an external code inside an open connection or transaction
fn find_id(conn: &Connection, kind: EntityKind, code: &str) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            &format!("SELECT id FROM {} WHERE code = ?1", kind.table()),
            [code],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

/// Insert or update one entity by external code
///
/// `url` is only meaningful for videos. A `None` publish flag keeps the
/// stored flag and publishes new rows.
fn upsert_entity(
    conn: &Connection,
    kind: EntityKind,
    code: &str,
    title: &str,
    url: Option<&str>,
    is_published: Option<bool>,
) -> Result<EntityUpsert> {
    let table = kind.table();
    let now = chrono::Utc::now().to_rfc3339();

    let existing: Option<(i64, String, Option<String>, bool)> = conn
        .query_row(
            &format!(
                "SELECT id, title, {}, is_published FROM {} WHERE code = ?1",
                if kind == EntityKind::Video { "url" } else { "NULL" },
                table
            ),
            [code],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .optional()?;

    let Some((id, stored_title, stored_url, stored_published)) = existing else {
        let published = is_published.unwrap_or(true);
        match url {
            Some(url) => conn.execute(
                &format!(
                    "INSERT INTO {} (code, title, url, is_published, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                    table
                ),
                params![code, title, url, published, now],
            )?,
            None => conn.execute(
                &format!(
                    "INSERT INTO {} (code, title, is_published, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
                    table
                ),
                params![code, title, published, now],
            )?,
        };
        debug!("Created {} {}", kind, code);
        return Ok(EntityUpsert {
            id: conn.last_insert_rowid(),
            outcome: UpsertOutcome::Created,
            title_changed: true,
        });
    };

    let title_changed = stored_title != title;
    let url_changed = match url {
        Some(url) => stored_url.as_deref() != Some(url),
        None => false,
    };
    let published = is_published.unwrap_or(stored_published);
    let published_changed = published != stored_published;

    if !(title_changed || url_changed || published_changed) {
        return Ok(EntityUpsert {
            id,
            outcome: UpsertOutcome::Unchanged,
            title_changed: false,
        });
    }

    match url {
        Some(url) => conn.execute(
            &format!(
                "UPDATE {} SET title = ?1, url = ?2, is_published = ?3, updated_at = ?4 WHERE id = ?5",
                table
            ),
            params![title, url, published, now, id],
        )?,
        None => conn.execute(
            &format!(
                "UPDATE {} SET title = ?1, is_published = ?2, updated_at = ?3 WHERE id = ?4",
                table
            ),
            params![title, published, now, id],
        )?,
    };
    debug!("Updated {} {}", kind, code);

    Ok(EntityUpsert {
        id,
        outcome: UpsertOutcome::Updated,
        title_changed,
    })
}

/// Insert a membership or move it to a new position
fn upsert_membership(
    conn: &Connection,
    cluster_id: i64,
    video_id: i64,
    position: i64,
) -> Result<UpsertOutcome> {
    let stored: Option<i64> = conn
        .query_row(
            "SELECT position FROM cluster_videos WHERE cluster_id = ?1 AND video_id = ?2",
            params![cluster_id, video_id],
            |row| row.get(0),
        )
        .optional()?;

    match stored {
        None => {
            conn.execute(
                "INSERT INTO cluster_videos (cluster_id, video_id, position) VALUES (?1, ?2, ?3)",
                params![cluster_id, video_id, position],
            )?;
            Ok(UpsertOutcome::Created)
        }
        Some(current) if current == position => Ok(UpsertOutcome::Unchanged),
        Some(_) => {
            conn.execute(
                "UPDATE cluster_videos SET position = ?1 WHERE cluster_id = ?2 AND video_id = ?3",
                params![position, cluster_id, video_id],
            )?;
            Ok(UpsertOutcome::Updated)
        }
    }
}

fn parse_trigger_row(row: &rusqlite::Row) -> rusqlite::Result<TriggerRecord> {
    Ok(TriggerRecord {
        id: row.get(0)?,
        code: row.get(1)?,
        title: row.get(2)?,
        is_published: row.get(3)?,
    })
}

fn parse_video_row(row: &rusqlite::Row) -> rusqlite::Result<VideoRecord> {
    Ok(VideoRecord {
        id: row.get(0)?,
        code: row.get(1)?,
        title: row.get(2)?,
        url: row.get(3)?,
        is_published: row.get(4)?,
    })
}

fn parse_cluster_row(row: &rusqlite::Row) -> rusqlite::Result<ClusterRecord> {
    Ok(ClusterRecord {
        id: row.get(0)?,
        code: row.get(1)?,
        title: row.get(2)?,
        is_published: row.get(3)?,
    })
}

fn load_catalog_rows(conn: &Connection, published_only: bool) -> Result<CatalogRows> {
    let filter = if published_only {
        "WHERE is_published = 1"
    } else {
        ""
    };

    let triggers = conn
        .prepare(&format!(
            "SELECT id, code, title, is_published FROM triggers {} ORDER BY code",
            filter
        ))?
        .query_map([], parse_trigger_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let videos = conn
        .prepare(&format!(
            "SELECT id, code, title, url, is_published FROM videos {} ORDER BY code",
            filter
        ))?
        .query_map([], parse_video_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let clusters = conn
        .prepare(&format!(
            "SELECT id, code, title, is_published FROM video_clusters {} ORDER BY code",
            filter
        ))?
        .query_map([], parse_cluster_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let memberships = conn
        .prepare("SELECT cluster_id, video_id, position FROM cluster_videos ORDER BY cluster_id, position")?
        .query_map([], |row| {
            Ok(MembershipRecord {
                cluster_id: row.get(0)?,
                video_id: row.get(1)?,
                position: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let trigger_mappings = conn
        .prepare("SELECT trigger_id, video_id FROM trigger_videos ORDER BY trigger_id")?
        .query_map([], |row| {
            Ok(TriggerMappingRecord {
                trigger_id: row.get(0)?,
                video_id: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut localized_titles: BTreeMap<(EntityKind, i64), BTreeMap<String, String>> =
        BTreeMap::new();
    let mut stmt =
        conn.prepare("SELECT entity_kind, entity_id, language_code, title FROM localized_titles")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;
    for row in rows {
        let (kind, entity_id, language_code, title) = row?;
        // Rows with an unknown kind cannot belong to any entity; ignore them
        let Ok(kind) = kind.parse::<EntityKind>() else {
            continue;
        };
        localized_titles
            .entry((kind, entity_id))
            .or_default()
            .insert(language_code, title);
    }

    Ok(CatalogRows {
        triggers,
        videos,
        clusters,
        memberships,
        trigger_mappings,
        localized_titles,
    })
}
