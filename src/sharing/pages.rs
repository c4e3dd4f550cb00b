use serde::Serialize;
use serde_json::{Value, json};

use super::messages::MessagePrefixes;
use crate::catalog::{CatalogSnapshot, Localized};
use crate::language_utils::normalize_language;

/// Patient page of a single published video
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoPage {
    pub code: String,
    /// Title in the page language, or the default title
    pub title: String,
    pub url: String,
    /// Normalized page language
    pub language: &'static str,
}

/// One video on a cluster page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterPageItem {
    pub code: String,
    pub title: String,
    pub url: String,
}

/// Patient page of a published cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterPage {
    pub code: String,
    pub title: String,
    pub language: &'static str,
    /// Videos in cluster order
    pub items: Vec<ClusterPageItem>,
}

/// Resolve the patient page of a published video
pub fn video_page(snapshot: &CatalogSnapshot, code: &str, lang: Option<&str>) -> Option<VideoPage> {
    let language = normalize_language(lang);
    let video = snapshot.video(code)?;

    Some(VideoPage {
        code: video.code.clone(),
        title: video.title_in(language).to_string(),
        url: video.url.clone(),
        language,
    })
}

/// Resolve the patient page of a published cluster
pub fn cluster_page(
    snapshot: &CatalogSnapshot,
    code: &str,
    lang: Option<&str>,
) -> Option<ClusterPage> {
    let language = normalize_language(lang);
    let cluster = snapshot.cluster(code)?;

    let items = cluster
        .videos
        .iter()
        .map(|entry| ClusterPageItem {
            code: entry.video.code.clone(),
            title: entry.video.title_in(language).to_string(),
            url: entry.video.url.clone(),
        })
        .collect();

    Some(ClusterPage {
        code: cluster.code.clone(),
        title: cluster.title_in(language).to_string(),
        language,
        items,
    })
}

/// Snapshot JSON for a doctor's sharing screen
///
/// The doctor-specific fields are added to a copy; the cached snapshot
/// never carries them.
pub fn share_payload(
    snapshot: &CatalogSnapshot,
    doctor_id: &str,
    prefixes: &MessagePrefixes,
) -> Result<Value, serde_json::Error> {
    let mut payload = serde_json::to_value(snapshot)?;
    if let Value::Object(map) = &mut payload {
        map.insert("doctor_id".to_string(), json!(doctor_id));
        map.insert("message_prefixes".to_string(), serde_json::to_value(prefixes)?);
    }
    Ok(payload)
}
