/*!
 * Transliterators with predetermined output
 *
 * `ScriptedTransliterator` answers `"{language}: {text}"` for every language
 * except the ones it is told to fail, and records how often it was called.
 */

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

use peds_catalog::errors::TransliterationError;
use peds_catalog::transliteration::Transliterator;

#[derive(Debug, Default)]
pub struct ScriptedTransliterator {
    failing: HashSet<String>,
    requests: Mutex<Vec<(String, String)>>,
}

impl ScriptedTransliterator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every request for `language`
    pub fn failing_for(mut self, language: &str) -> Self {
        self.failing.insert(language.to_string());
        self
    }

    /// (text, language) pairs requested so far
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn expected(text: &str, language: &str) -> String {
        format!("{}: {}", language, text)
    }
}

#[async_trait]
impl Transliterator for ScriptedTransliterator {
    fn is_available(&self) -> bool {
        true
    }

    async fn transliterate(&self, text: &str, language: &str) -> Result<String, TransliterationError> {
        self.requests
            .lock()
            .unwrap()
            .push((text.to_string(), language.to_string()));
        if self.failing.contains(language) {
            return Err(TransliterationError::RequestFailed("scripted failure".to_string()));
        }
        Ok(Self::expected(text, language))
    }

    async fn test_connection(&self) -> Result<(), TransliterationError> {
        Ok(())
    }
}
