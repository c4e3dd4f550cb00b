use async_trait::async_trait;
use log::{debug, error};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use super::Transliterator;
use crate::errors::TransliterationError;
use crate::language_utils::validate_localized_language;

/// Characters kept when cleaning a title before transliteration
static DISALLOWED_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9A-Za-z\s.,'!?-]").expect("valid character class"));

static WHITESPACE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Client for a transliteration server exposing `GET /tl/{lang}/{text}`
#[derive(Debug, Clone)]
pub struct HttpTransliterator {
    /// Base URL of the service
    base_url: Url,
    /// HTTP client for making requests
    client: Client,
}

/// Response body of the transliteration endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct XlitResponse {
    /// Whether the service produced candidates
    #[serde(default)]
    pub success: bool,
    /// Candidates, best first
    #[serde(default)]
    pub result: Vec<String>,
    /// Error message when `success` is false
    #[serde(default)]
    pub error: Option<String>,
}

impl HttpTransliterator {
    /// Create a client for the service at `endpoint`
    pub fn new(endpoint: &str, timeout_secs: u64) -> Result<Self, TransliterationError> {
        let base_url = Url::parse(endpoint)
            .map_err(|e| TransliterationError::RequestFailed(format!("invalid endpoint: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(TransliterationError::RequestFailed(format!(
                "endpoint cannot be a base URL: {}",
                endpoint
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| TransliterationError::RequestFailed(e.to_string()))?;

        Ok(Self { base_url, client })
    }

    /// Make a title safe for the service: `&` becomes "and", other symbols
    /// become spaces, whitespace runs collapse
    pub fn clean_text(text: &str) -> String {
        let replaced = text.replace('&', "and");
        let stripped = DISALLOWED_CHARS.replace_all(&replaced, " ");
        WHITESPACE_RUNS.replace_all(&stripped, " ").trim().to_string()
    }

    /// URL of the transliteration request for one sentence
    pub fn request_url(&self, language: &str, text: &str) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in `new`
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("tl").push(language).push(text);
        }
        url
    }

    /// Extract the best candidate from a response
    pub fn extract_text(response: &XlitResponse) -> Option<&str> {
        if !response.success {
            return None;
        }
        response
            .result
            .iter()
            .map(|candidate| candidate.trim())
            .find(|candidate| !candidate.is_empty())
    }
}

#[async_trait]
impl Transliterator for HttpTransliterator {
    fn is_available(&self) -> bool {
        true
    }

    async fn transliterate(
        &self,
        text: &str,
        language: &str,
    ) -> Result<String, TransliterationError> {
        let language = validate_localized_language(language)
            .map_err(|_| TransliterationError::UnsupportedLanguage(language.to_string()))?;

        let cleaned = Self::clean_text(text);
        if cleaned.is_empty() {
            return Err(TransliterationError::ParseError(
                "nothing left to transliterate after cleaning".to_string(),
            ));
        }

        let url = self.request_url(language, &cleaned);
        debug!("Transliterating '{}' into {}", cleaned, language);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransliterationError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Transliteration service error ({}): {}", status, message);
            return Err(TransliterationError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let body: XlitResponse = response
            .json()
            .await
            .map_err(|e| TransliterationError::ParseError(e.to_string()))?;

        match Self::extract_text(&body) {
            Some(candidate) => Ok(candidate.to_string()),
            None => Err(TransliterationError::ParseError(
                body.error
                    .unwrap_or_else(|| "response carried no candidates".to_string()),
            )),
        }
    }

    async fn test_connection(&self) -> Result<(), TransliterationError> {
        // Any HTTP answer means the server is up; only transport errors count
        self.client
            .get(self.base_url.clone())
            .send()
            .await
            .map(|_| ())
            .map_err(|e| TransliterationError::RequestFailed(e.to_string()))
    }
}
