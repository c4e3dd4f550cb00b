/*!
 * Error types for the peds-catalog application.
 *
 * This module contains custom error types for the different parts of the
 * catalog core, using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;

use thiserror::Error;

/// Structural errors raised by the master-data importer.
///
/// Row-level problems never surface here; they are recorded as skipped rows
/// in the run summary.
#[derive(Error, Debug)]
pub enum ImportError {
    /// A required CSV file is not present in the import directory
    #[error("Required file is missing: {0}")]
    MissingFile(PathBuf),

    /// The file exists but could not be opened or its header could not be read
    #[error("Failed to read {path}: {message}")]
    Unreadable {
        /// Path of the offending file
        path: PathBuf,
        /// Underlying reader error
        message: String,
    },

    /// The header row lacks a column the file kind requires
    #[error("{file} is missing required column '{column}'")]
    MissingColumn {
        /// File name (without directory)
        file: String,
        /// Name of the absent column
        column: String,
    },

    /// The catalog store rejected a write
    #[error("Catalog store error: {0}")]
    Store(String),
}

/// Errors reported by a cache backend
#[derive(Error, Debug)]
pub enum CacheError {
    /// The backend could not be reached or refused the operation
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),

    /// The stored payload could not be encoded or decoded
    #[error("Cache payload error: {0}")]
    Serialization(String),
}

/// Errors from the optional transliteration capability
#[derive(Error, Debug)]
pub enum TransliterationError {
    /// Request to the transliteration service failed
    #[error("Transliteration request failed: {0}")]
    RequestFailed(String),

    /// The service answered with an error status
    #[error("Transliteration service responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the service
        message: String,
    },

    /// The response body did not have the expected shape
    #[error("Failed to parse transliteration response: {0}")]
    ParseError(String),

    /// Language is not one the capability can produce
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),
}

/// Errors raised by catalog reads and administrative writes
#[derive(Error, Debug)]
pub enum CatalogError {
    /// No entity of the given kind carries the external code
    #[error("No {kind} with code '{code}'")]
    NotFound {
        /// Entity kind (trigger, video, cluster)
        kind: String,
        /// External code that was looked up
        code: String,
    },

    /// Input rejected before reaching the store
    #[error("Invalid input: {0}")]
    Invalid(String),

    /// The catalog store failed
    #[error("Catalog store error: {0}")]
    Store(String),

    /// Invalidation after a committed write failed
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the importer
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Error from the catalog
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Error from a cache backend
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<anyhow::Error> for CatalogError {
    fn from(error: anyhow::Error) -> Self {
        Self::Store(format!("{:#}", error))
    }
}

impl From<anyhow::Error> for ImportError {
    fn from(error: anyhow::Error) -> Self {
        Self::Store(format!("{:#}", error))
    }
}
