/*!
 * Optional transliteration capability.
 *
 * Localized titles are generated from the default-language title by a
 * `Transliterator`. Two implementations exist:
 * - `NoopTransliterator`: always unavailable, produces nothing
 * - `HttpTransliterator`: calls a transliteration server over HTTP
 *
 * The importer only depends on the trait. `select_transliterator` picks the
 * implementation at startup based on configuration and reachability.
 */

use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::app_config::TransliterationConfig;
use crate::errors::TransliterationError;
use crate::language_utils::localized_languages;

pub mod http;
pub mod noop;

pub use http::HttpTransliterator;
pub use noop::NoopTransliterator;

/// Common trait for transliteration capabilities
#[async_trait]
pub trait Transliterator: Send + Sync + Debug {
    /// Whether this capability can produce output at all
    fn is_available(&self) -> bool;

    /// Transliterate a default-language sentence into `language`
    async fn transliterate(
        &self,
        text: &str,
        language: &str,
    ) -> Result<String, TransliterationError>;

    /// Check that the capability is reachable
    async fn test_connection(&self) -> Result<(), TransliterationError>;
}

/// Generate localized titles for every supported non-default language
///
/// Languages whose transliteration fails, comes back empty, or equals the
/// input are omitted; readers fall back to the default title for them.
pub async fn localize_title(
    transliterator: &dyn Transliterator,
    title: &str,
) -> BTreeMap<String, String> {
    if !transliterator.is_available() || title.trim().is_empty() {
        return BTreeMap::new();
    }

    let languages: Vec<&str> = localized_languages().collect();
    let results = join_all(
        languages
            .iter()
            .map(|language| transliterator.transliterate(title, language)),
    )
    .await;

    let mut titles = BTreeMap::new();
    for (language, result) in languages.into_iter().zip(results) {
        match result {
            Ok(localized) => {
                let localized = localized.trim();
                if !localized.is_empty() && localized != title {
                    titles.insert(language.to_string(), localized.to_string());
                }
            }
            Err(e) => debug!("No {} title for '{}': {}", language, title, e),
        }
    }
    titles
}

/// Pick the transliteration capability for this process
pub async fn select_transliterator(config: &TransliterationConfig) -> Arc<dyn Transliterator> {
    if !config.enabled {
        debug!("Transliteration disabled; localized titles will not be generated");
        return Arc::new(NoopTransliterator);
    }

    let http = match HttpTransliterator::new(&config.endpoint, config.timeout_secs) {
        Ok(http) => http,
        Err(e) => {
            warn!("Transliteration unavailable: {}", e);
            return Arc::new(NoopTransliterator);
        }
    };

    match http.test_connection().await {
        Ok(()) => {
            info!("Using transliteration service at {}", config.endpoint);
            Arc::new(http)
        }
        Err(e) => {
            warn!(
                "Transliteration service at {} unreachable, continuing without it: {}",
                config.endpoint, e
            );
            Arc::new(NoopTransliterator)
        }
    }
}
