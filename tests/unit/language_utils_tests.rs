/*!
 * Tests for language utilities
 */

use peds_catalog::language_utils::{
    DEFAULT_LANGUAGE, SUPPORTED_LANGUAGES, get_language_name, is_supported, localized_languages,
    normalize_language, supported_language_entries, validate_localized_language,
};

#[test]
fn test_normalizeLanguage_withVariousInputs_shouldResolveToSupportedCode() {
    assert_eq!(normalize_language(Some("TA")), "ta");
    assert_eq!(normalize_language(Some(" bn ")), "bn");
    assert_eq!(normalize_language(Some("fr")), DEFAULT_LANGUAGE);
    assert_eq!(normalize_language(Some("")), DEFAULT_LANGUAGE);
    assert_eq!(normalize_language(None), DEFAULT_LANGUAGE);
}

#[test]
fn test_localizedLanguages_shouldExcludeDefault() {
    let languages: Vec<&str> = localized_languages().collect();

    assert_eq!(languages.len(), SUPPORTED_LANGUAGES.len() - 1);
    assert!(!languages.contains(&"en"));
    assert_eq!(languages[0], "hi");
}

#[test]
fn test_validateLocalizedLanguage_shouldRejectDefaultAndUnknown() {
    assert_eq!(validate_localized_language("Hi").unwrap(), "hi");
    assert!(validate_localized_language("en").is_err());
    assert!(validate_localized_language("de").is_err());
}

#[test]
fn test_isSupported_shouldIgnoreCase() {
    assert!(is_supported("ML"));
    assert!(!is_supported("xx"));
}

#[test]
fn test_languageEntries_shouldUseIsoNamesInOrder() {
    let entries = supported_language_entries();

    assert_eq!(entries.len(), 8);
    assert_eq!(entries[0].code, "en");
    assert_eq!(entries[0].name, "English");
    assert_eq!(get_language_name("ta").unwrap(), "Tamil");
    assert!(get_language_name("zz").is_err());
}
