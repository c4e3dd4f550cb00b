/*!
 * # peds-catalog - catalog core for pediatric patient education
 *
 * Doctors share whitelabeled education videos (single videos or curated
 * clusters) with patients, who read them in one of the supported languages.
 * This library holds the catalog behind that workflow.
 *
 * ## Features
 *
 * - Bulk load of master data from five CSV files, idempotent on re-run
 * - SQLite catalog store for triggers, videos, clusters and their mappings
 * - Cached, pre-joined snapshot of everything published, invalidated on write
 * - Optional transliteration of titles into the supported Indian languages
 * - Patient page resolution with default-language fallback
 * - Per-doctor multilingual message prefixes
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `database`: Catalog store (connection, schema, repository, models)
 * - `importer`: Master-data CSV importer
 * - `cache`: Pluggable key/value cache backends
 * - `catalog`: Sharing catalog snapshot, its cache service and admin writes
 * - `sharing`: Patient page and doctor share helpers
 * - `transliteration`: Optional transliteration capability
 * - `language_utils`: Supported language codes
 * - `app_controller`: Wiring used by the command line interface
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod cache;
pub mod catalog;
pub mod database;
pub mod errors;
pub mod importer;
pub mod language_utils;
pub mod sharing;
pub mod transliteration;

// Re-export main types for easier usage
pub use app_config::Config;
pub use catalog::{CatalogAdmin, CatalogSnapshot, SharingCatalog};
pub use database::Repository;
pub use errors::{AppError, CacheError, CatalogError, ImportError, TransliterationError};
pub use importer::{ImportSummary, Importer};
pub use language_utils::{get_language_name, normalize_language};
