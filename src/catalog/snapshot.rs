/*!
 * Sharing catalog snapshot.
 *
 * The snapshot is the pre-joined, read-optimized view of every published
 * trigger, video and cluster. Assembly is a pure function of the catalog
 * rows and is deterministic, so racing rebuilds serialize to identical bytes.
 */

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::database::models::{CatalogRows, EntityKind};
use crate::language_utils::{LanguageEntry, supported_language_entries};

/// Access to a default-language title and its per-language variants
pub trait Localized {
    /// Title in the default language
    fn default_title(&self) -> &str;

    /// Stored variants keyed by language code
    fn titles(&self) -> &BTreeMap<String, String>;

    /// Title in `language`, falling back to the default-language title
    fn title_in(&self, language: &str) -> &str {
        self.titles()
            .get(language)
            .map(String::as_str)
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| self.default_title())
    }
}

/// Published video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoEntry {
    /// External code
    pub code: String,
    /// Default-language title
    pub title: String,
    /// Localized titles
    #[serde(default)]
    pub titles: BTreeMap<String, String>,
    /// Source URL
    pub url: String,
}

/// Video inside a cluster with its position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterVideoEntry {
    /// Display position
    pub position: i64,
    /// The video
    pub video: VideoEntry,
}

/// Published cluster with its ordered published videos
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterEntry {
    /// External code
    pub code: String,
    /// Default-language title
    pub title: String,
    /// Localized titles
    #[serde(default)]
    pub titles: BTreeMap<String, String>,
    /// Videos ascending by position
    pub videos: Vec<ClusterVideoEntry>,
}

/// Published trigger with its mapped published videos
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerEntry {
    /// External code
    pub code: String,
    /// Default-language title
    pub title: String,
    /// Localized titles
    #[serde(default)]
    pub titles: BTreeMap<String, String>,
    /// Mapped videos ordered by code
    pub videos: Vec<VideoEntry>,
}

macro_rules! impl_localized {
    ($($entry:ty),*) => {
        $(
            impl Localized for $entry {
                fn default_title(&self) -> &str {
                    &self.title
                }

                fn titles(&self) -> &BTreeMap<String, String> {
                    &self.titles
                }
            }
        )*
    };
}

impl_localized!(VideoEntry, ClusterEntry, TriggerEntry);

/// Serialized view of all published catalog entries
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Supported languages in display order
    pub languages: Vec<LanguageEntry>,
    /// Published triggers ordered by code
    pub triggers: Vec<TriggerEntry>,
    /// Published videos ordered by code
    pub videos: Vec<VideoEntry>,
    /// Published clusters ordered by code
    pub clusters: Vec<ClusterEntry>,
}

impl CatalogSnapshot {
    /// Assemble the snapshot from catalog rows
    ///
    /// Rows may include drafts; every unpublished entity is dropped here as
    /// well, including videos referenced from published clusters or triggers.
    pub fn assemble(rows: &CatalogRows) -> Self {
        let titles_of = |kind: EntityKind, id: i64| -> BTreeMap<String, String> {
            rows.localized_titles
                .get(&(kind, id))
                .cloned()
                .unwrap_or_default()
        };

        let videos_by_id: HashMap<i64, VideoEntry> = rows
            .videos
            .iter()
            .filter(|video| video.is_published)
            .map(|video| {
                (
                    video.id,
                    VideoEntry {
                        code: video.code.clone(),
                        title: video.title.clone(),
                        titles: titles_of(EntityKind::Video, video.id),
                        url: video.url.clone(),
                    },
                )
            })
            .collect();

        let mut videos: Vec<VideoEntry> = videos_by_id.values().cloned().collect();
        videos.sort_by(|a, b| a.code.cmp(&b.code));

        let mut clusters: Vec<ClusterEntry> = rows
            .clusters
            .iter()
            .filter(|cluster| cluster.is_published)
            .map(|cluster| {
                let mut members: Vec<ClusterVideoEntry> = rows
                    .memberships
                    .iter()
                    .filter(|membership| membership.cluster_id == cluster.id)
                    .filter_map(|membership| {
                        videos_by_id.get(&membership.video_id).map(|video| ClusterVideoEntry {
                            position: membership.position,
                            video: video.clone(),
                        })
                    })
                    .collect();
                members.sort_by(|a, b| {
                    a.position
                        .cmp(&b.position)
                        .then_with(|| a.video.code.cmp(&b.video.code))
                });

                ClusterEntry {
                    code: cluster.code.clone(),
                    title: cluster.title.clone(),
                    titles: titles_of(EntityKind::Cluster, cluster.id),
                    videos: members,
                }
            })
            .collect();
        clusters.sort_by(|a, b| a.code.cmp(&b.code));

        let mut triggers: Vec<TriggerEntry> = rows
            .triggers
            .iter()
            .filter(|trigger| trigger.is_published)
            .map(|trigger| {
                let mut mapped: Vec<VideoEntry> = rows
                    .trigger_mappings
                    .iter()
                    .filter(|mapping| mapping.trigger_id == trigger.id)
                    .filter_map(|mapping| videos_by_id.get(&mapping.video_id).cloned())
                    .collect();
                mapped.sort_by(|a, b| a.code.cmp(&b.code));
                mapped.dedup_by(|a, b| a.code == b.code);

                TriggerEntry {
                    code: trigger.code.clone(),
                    title: trigger.title.clone(),
                    titles: titles_of(EntityKind::Trigger, trigger.id),
                    videos: mapped,
                }
            })
            .collect();
        triggers.sort_by(|a, b| a.code.cmp(&b.code));

        Self {
            languages: supported_language_entries(),
            triggers,
            videos,
            clusters,
        }
    }

    /// Find a published video by external code
    pub fn video(&self, code: &str) -> Option<&VideoEntry> {
        self.videos.iter().find(|video| video.code == code)
    }

    /// Find a published cluster by external code
    pub fn cluster(&self, code: &str) -> Option<&ClusterEntry> {
        self.clusters.iter().find(|cluster| cluster.code == code)
    }

    /// Find a published trigger by external code
    pub fn trigger(&self, code: &str) -> Option<&TriggerEntry> {
        self.triggers.iter().find(|trigger| trigger.code == code)
    }
}
