/*!
 * Database module for the persistent catalog store.
 *
 * This module provides SQLite-based persistence for:
 * - Triggers, videos and clusters keyed by external code
 * - Cluster memberships and trigger mappings
 * - Localized titles
 * - The `cache_entries` table used by the shared cache backend
 */

pub mod connection;
pub mod models;
pub mod repository;
pub mod schema;

// Re-export main types
pub use connection::{DatabaseConnection, DatabaseStats};
pub use repository::{MembershipInput, Repository, TriggerMappingInput};
