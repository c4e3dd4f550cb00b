/*!
 * Database schema definitions and migrations.
 *
 * This module contains the SQL schema for the catalog tables and the
 * storage-backed cache, and handles schema migrations for version upgrades.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    // Foreign keys are a per-connection setting in SQLite
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;

    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Initializing catalog schema v{}", SCHEMA_VERSION);
        create_all_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!(
            "Migrating catalog schema from v{} to v{}",
            current_version, SCHEMA_VERSION
        );
        migrate_schema(conn, current_version)?;
    } else {
        debug!("Catalog schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get the current schema version from the database
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let table_exists: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )
        .context("Failed to check schema_version table existence")?;

    if !table_exists {
        return Ok(0);
    }

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    Ok(version)
}

/// Set the schema version in the database
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

/// Create all database tables
fn create_all_tables(conn: &Connection) -> Result<()> {
    // WAL lets web workers keep reading while the importer writes
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS triggers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            is_published INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS videos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            url TEXT NOT NULL,
            is_published INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS video_clusters (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            is_published INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_triggers_published ON triggers(is_published);
        CREATE INDEX IF NOT EXISTS idx_videos_published ON videos(is_published);
        CREATE INDEX IF NOT EXISTS idx_clusters_published ON video_clusters(is_published);
        "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS cluster_videos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            cluster_id INTEGER NOT NULL REFERENCES video_clusters(id) ON DELETE CASCADE,
            video_id INTEGER NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            UNIQUE(cluster_id, video_id)
        );

        CREATE INDEX IF NOT EXISTS idx_cluster_videos_order ON cluster_videos(cluster_id, position);

        CREATE TABLE IF NOT EXISTS trigger_videos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            trigger_id INTEGER NOT NULL REFERENCES triggers(id) ON DELETE CASCADE,
            video_id INTEGER NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
            UNIQUE(trigger_id, video_id)
        );

        CREATE INDEX IF NOT EXISTS idx_trigger_videos_trigger ON trigger_videos(trigger_id);
        "#,
    )?;

    // Localized titles are keyed by entity kind; removal follows the entity
    // through the repository since SQLite cannot reference several parents.
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS localized_titles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            entity_kind TEXT NOT NULL,
            entity_id INTEGER NOT NULL,
            language_code TEXT NOT NULL,
            title TEXT NOT NULL,
            UNIQUE(entity_kind, entity_id, language_code)
        );

        CREATE INDEX IF NOT EXISTS idx_localized_titles_entity ON localized_titles(entity_kind, entity_id);
        "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS cache_entries (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            expires_at INTEGER,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;

    info!("Catalog schema created successfully");
    Ok(())
}

/// Migrate the schema from one version to another
fn migrate_schema(conn: &Connection, from_version: i32) -> Result<()> {
    let current = from_version;

    if current < SCHEMA_VERSION {
        return Err(anyhow::anyhow!(
            "Unknown schema version: {}. Cannot migrate.",
            current
        ));
    }

    set_schema_version(conn, SCHEMA_VERSION)?;
    info!("Schema migration completed to v{}", SCHEMA_VERSION);
    Ok(())
}
