use anyhow::{Result, anyhow};
use isolang::Language;
use serde::{Deserialize, Serialize};

// Language utilities for the fixed set of catalog languages.
// Titles are stored in the default language and may carry variants in the
// other supported languages. Codes are ISO 639-1.

/// Default (source) language of every catalog title
pub const DEFAULT_LANGUAGE: &str = "en";

/// Supported language codes, default first
pub const SUPPORTED_LANGUAGES: [&str; 8] = ["en", "hi", "te", "ml", "mr", "kn", "ta", "bn"];

/// Language code and display name pair, as exposed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageEntry {
    /// ISO 639-1 code
    pub code: String,
    /// English display name
    pub name: String,
}

/// Check whether a code belongs to the supported set (case-insensitive)
pub fn is_supported(code: &str) -> bool {
    let normalized = code.trim().to_lowercase();
    SUPPORTED_LANGUAGES.contains(&normalized.as_str())
}

/// Supported languages other than the default one
pub fn localized_languages() -> impl Iterator<Item = &'static str> {
    SUPPORTED_LANGUAGES
        .iter()
        .copied()
        .filter(|code| *code != DEFAULT_LANGUAGE)
}

/// Normalize a requested language to a supported code
///
/// Missing, blank or unknown codes resolve to the default language.
pub fn normalize_language(code: Option<&str>) -> &'static str {
    let Some(code) = code else {
        return DEFAULT_LANGUAGE;
    };
    let normalized = code.trim().to_lowercase();
    SUPPORTED_LANGUAGES
        .iter()
        .copied()
        .find(|supported| *supported == normalized)
        .unwrap_or(DEFAULT_LANGUAGE)
}

/// Validate a code as a supported, non-default language and return it normalized
pub fn validate_localized_language(code: &str) -> Result<&'static str> {
    let normalized = code.trim().to_lowercase();
    localized_languages()
        .find(|supported| *supported == normalized)
        .ok_or_else(|| anyhow!("Unsupported localization language: {}", code))
}

/// Get the language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = code.trim().to_lowercase();
    let lang = Language::from_639_1(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", code))?;

    Ok(lang.to_name().to_string())
}

/// Code/name pairs for every supported language, in display order
pub fn supported_language_entries() -> Vec<LanguageEntry> {
    SUPPORTED_LANGUAGES
        .iter()
        .map(|code| LanguageEntry {
            code: (*code).to_string(),
            name: get_language_name(code).unwrap_or_else(|_| (*code).to_string()),
        })
        .collect()
}
