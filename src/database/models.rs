/*!
 * Database entity models and DTOs.
 *
 * These structures map directly to catalog tables and provide
 * type-safe access to persisted data.
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of catalog entity addressed by an external code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Clinical/educational prompt
    Trigger,
    /// Single educational video
    Video,
    /// Ordered bundle of videos
    Cluster,
}

impl EntityKind {
    /// Table holding entities of this kind
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Trigger => "triggers",
            EntityKind::Video => "videos",
            EntityKind::Cluster => "video_clusters",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Trigger => write!(f, "trigger"),
            EntityKind::Video => write!(f, "video"),
            EntityKind::Cluster => write!(f, "cluster"),
        }
    }
}

impl std::str::FromStr for EntityKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trigger" => Ok(EntityKind::Trigger),
            "video" => Ok(EntityKind::Video),
            "cluster" | "video_cluster" => Ok(EntityKind::Cluster),
            _ => Err(anyhow::anyhow!("Invalid entity kind: {}", s)),
        }
    }
}

/// Result of an idempotent upsert keyed by external code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new row was inserted
    Created,
    /// An existing row had at least one field changed
    Updated,
    /// The stored row already matched
    Unchanged,
}

impl fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpsertOutcome::Created => write!(f, "created"),
            UpsertOutcome::Updated => write!(f, "updated"),
            UpsertOutcome::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Trigger record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRecord {
    /// Internal key
    pub id: i64,
    /// External code
    pub code: String,
    /// Default-language title
    pub title: String,
    /// Visibility to doctors and patients
    pub is_published: bool,
}

/// Video record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Internal key
    pub id: i64,
    /// External code
    pub code: String,
    /// Default-language title
    pub title: String,
    /// Source URL
    pub url: String,
    /// Visibility to doctors and patients
    pub is_published: bool,
}

/// Video cluster record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRecord {
    /// Internal key
    pub id: i64,
    /// External code
    pub code: String,
    /// Default-language title
    pub title: String,
    /// Visibility to doctors and patients
    pub is_published: bool,
}

/// Cluster membership row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRecord {
    /// Cluster internal key
    pub cluster_id: i64,
    /// Video internal key
    pub video_id: i64,
    /// Display position inside the cluster
    pub position: i64,
}

/// Trigger-video mapping row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerMappingRecord {
    /// Trigger internal key
    pub trigger_id: i64,
    /// Video internal key
    pub video_id: i64,
}

/// Trigger upsert input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerInput {
    /// External code
    pub code: String,
    /// Default-language title
    pub title: String,
    /// Explicit publish flag; `None` keeps the stored flag (new rows publish)
    pub is_published: Option<bool>,
}

/// Video upsert input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInput {
    /// External code
    pub code: String,
    /// Default-language title
    pub title: String,
    /// Source URL
    pub url: String,
    /// Explicit publish flag; `None` keeps the stored flag (new rows publish)
    pub is_published: Option<bool>,
}

/// Cluster upsert input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterInput {
    /// External code
    pub code: String,
    /// Default-language title
    pub title: String,
    /// Explicit publish flag; `None` keeps the stored flag (new rows publish)
    pub is_published: Option<bool>,
}

/// Outcome of an entity upsert, with what the importer needs for localization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityUpsert {
    /// Internal key of the affected row
    pub id: i64,
    /// What happened to the row
    pub outcome: UpsertOutcome,
    /// Whether the default-language title is new or differs from the stored one
    pub title_changed: bool,
}

/// Outcome of applying one mapping row referenced by external codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingOutcome {
    /// Both ends resolved and the mapping was written (or already matched)
    Applied(UpsertOutcome),
    /// A referenced external code does not exist
    Missing {
        /// Kind of the unresolved entity
        kind: EntityKind,
        /// Unresolved external code
        code: String,
    },
}

/// Everything needed to assemble the sharing snapshot, read in one lock
#[derive(Debug, Clone, Default)]
pub struct CatalogRows {
    /// Triggers (filtered by the publish flag when requested)
    pub triggers: Vec<TriggerRecord>,
    /// Videos (filtered by the publish flag when requested)
    pub videos: Vec<VideoRecord>,
    /// Clusters (filtered by the publish flag when requested)
    pub clusters: Vec<ClusterRecord>,
    /// All cluster memberships
    pub memberships: Vec<MembershipRecord>,
    /// All trigger mappings
    pub trigger_mappings: Vec<TriggerMappingRecord>,
    /// Localized titles keyed by (kind, entity id)
    pub localized_titles: BTreeMap<(EntityKind, i64), BTreeMap<String, String>>,
}

/// Parse a publish flag cell
///
/// Returns `Ok(None)` for a blank cell.
pub fn parse_publish_flag(value: &str) -> Result<Option<bool>, String> {
    match value.trim().to_lowercase().as_str() {
        "" => Ok(None),
        "1" | "true" | "yes" | "y" => Ok(Some(true)),
        "0" | "false" | "no" | "n" => Ok(Some(false)),
        other => Err(format!("invalid is_published value '{}'", other)),
    }
}
