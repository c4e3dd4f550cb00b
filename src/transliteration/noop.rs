use async_trait::async_trait;

use super::Transliterator;
use crate::errors::TransliterationError;

/// Capability used when no transliteration service is available
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTransliterator;

#[async_trait]
impl Transliterator for NoopTransliterator {
    fn is_available(&self) -> bool {
        false
    }

    async fn transliterate(
        &self,
        _text: &str,
        language: &str,
    ) -> Result<String, TransliterationError> {
        Err(TransliterationError::UnsupportedLanguage(language.to_string()))
    }

    async fn test_connection(&self) -> Result<(), TransliterationError> {
        Ok(())
    }
}
