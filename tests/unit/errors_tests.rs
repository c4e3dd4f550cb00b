/*!
 * Tests for error types and conversions
 */

use std::path::PathBuf;

use peds_catalog::errors::{AppError, CacheError, CatalogError, ImportError, TransliterationError};

#[test]
fn test_importError_display_shouldNameFileAndColumn() {
    let missing = ImportError::MissingFile(PathBuf::from("/data/video_master.csv"));
    let column = ImportError::MissingColumn {
        file: "video_master.csv".to_string(),
        column: "url".to_string(),
    };

    assert!(missing.to_string().contains("/data/video_master.csv"));
    assert_eq!(column.to_string(), "video_master.csv is missing required column 'url'");
}

#[test]
fn test_catalogError_fromCacheError_shouldWrap() {
    let error: CatalogError = CacheError::Unavailable("down".to_string()).into();

    assert!(matches!(error, CatalogError::Cache(_)));
    assert!(error.to_string().contains("down"));
}

#[test]
fn test_appError_fromAnyhow_shouldBeUnknown() {
    let error: AppError = anyhow::anyhow!("boom").into();

    assert!(matches!(error, AppError::Unknown(ref message) if message == "boom"));
}

#[test]
fn test_appError_fromImportError_shouldKeepMessage() {
    let error: AppError = ImportError::Store("disk full".to_string()).into();

    assert_eq!(error.to_string(), "Import error: Catalog store error: disk full");
}

#[test]
fn test_transliterationError_apiError_shouldIncludeStatus() {
    let error = TransliterationError::ApiError {
        status_code: 503,
        message: "unavailable".to_string(),
    };

    assert!(error.to_string().contains("503"));
}

#[test]
fn test_catalogError_notFound_shouldNameKindAndCode() {
    let error = CatalogError::NotFound {
        kind: "video".to_string(),
        code: "V9".to_string(),
    };

    assert_eq!(error.to_string(), "No video with code 'V9'");
}
