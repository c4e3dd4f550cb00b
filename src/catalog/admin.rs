/*!
 * Administrative catalog writes.
 *
 * Every write made outside the importer goes through `CatalogAdmin`, which
 * invalidates the sharing catalog once the write has committed.
 */

use log::info;
use std::collections::BTreeMap;

use super::service::SharingCatalog;
use crate::database::Repository;
use crate::database::models::{
    ClusterInput, EntityKind, EntityUpsert, MappingOutcome, TriggerInput, UpsertOutcome,
    VideoInput,
};
use crate::database::repository::TriggerMappingInput;
use crate::errors::CatalogError;
use crate::language_utils::validate_localized_language;

/// Service for administrative catalog edits
#[derive(Debug, Clone)]
pub struct CatalogAdmin {
    repository: Repository,
    catalog: SharingCatalog,
}

impl CatalogAdmin {
    /// Create an admin service writing through `repository`
    pub fn new(repository: Repository, catalog: SharingCatalog) -> Self {
        Self {
            repository,
            catalog,
        }
    }

    /// Create or update a trigger
    pub async fn save_trigger(
        &self,
        code: &str,
        title: &str,
        is_published: Option<bool>,
    ) -> Result<UpsertOutcome, CatalogError> {
        let (code, title) = (required("code", code)?, required("title", title)?);
        let upserted = self
            .repository
            .upsert_triggers(vec![TriggerInput {
                code,
                title,
                is_published,
            }])
            .await?;
        self.after_upsert(EntityKind::Trigger, upserted).await
    }

    /// Create or update a video
    pub async fn save_video(
        &self,
        code: &str,
        title: &str,
        url: &str,
        is_published: Option<bool>,
    ) -> Result<UpsertOutcome, CatalogError> {
        let input = VideoInput {
            code: required("code", code)?,
            title: required("title", title)?,
            url: required("url", url)?,
            is_published,
        };
        let upserted = self.repository.upsert_videos(vec![input]).await?;
        self.after_upsert(EntityKind::Video, upserted).await
    }

    /// Create or update a cluster
    pub async fn save_cluster(
        &self,
        code: &str,
        title: &str,
        is_published: Option<bool>,
    ) -> Result<UpsertOutcome, CatalogError> {
        let (code, title) = (required("code", code)?, required("title", title)?);
        let upserted = self
            .repository
            .upsert_clusters(vec![ClusterInput {
                code,
                title,
                is_published,
            }])
            .await?;
        self.after_upsert(EntityKind::Cluster, upserted).await
    }

    /// Publish or unpublish an entity
    pub async fn set_published(
        &self,
        kind: EntityKind,
        code: &str,
        published: bool,
    ) -> Result<(), CatalogError> {
        if !self.repository.set_published(kind, code, published).await? {
            return Err(not_found(kind, code));
        }
        info!(
            "{} {} {}",
            if published { "Published" } else { "Unpublished" },
            kind,
            code
        );
        self.catalog.invalidate().await?;
        Ok(())
    }

    /// Set one localized title of an entity
    pub async fn set_localized_title(
        &self,
        kind: EntityKind,
        code: &str,
        language: &str,
        title: &str,
    ) -> Result<(), CatalogError> {
        let language = validate_localized_language(language)
            .map_err(|e| CatalogError::Invalid(e.to_string()))?;
        let title = required("title", title)?;
        let id = self.resolve(kind, code).await?;

        self.repository
            .store_localized_titles(kind, id, BTreeMap::from([(language.to_string(), title)]))
            .await?;
        self.catalog.invalidate().await?;
        Ok(())
    }

    /// Place a video in a cluster at `position`, moving it if already a member
    pub async fn add_video_to_cluster(
        &self,
        cluster_code: &str,
        video_code: &str,
        position: i64,
    ) -> Result<UpsertOutcome, CatalogError> {
        if position < 0 {
            return Err(CatalogError::Invalid(format!(
                "position must not be negative, got {}",
                position
            )));
        }
        let cluster_id = self.resolve(EntityKind::Cluster, cluster_code).await?;
        let video_id = self.resolve(EntityKind::Video, video_code).await?;

        let outcome = self
            .repository
            .upsert_membership(cluster_id, video_id, position)
            .await?;
        self.catalog.invalidate().await?;
        Ok(outcome)
    }

    /// Remove a video from a cluster; returns whether it was a member
    pub async fn remove_video_from_cluster(
        &self,
        cluster_code: &str,
        video_code: &str,
    ) -> Result<bool, CatalogError> {
        let cluster_id = self.resolve(EntityKind::Cluster, cluster_code).await?;
        let video_id = self.resolve(EntityKind::Video, video_code).await?;

        let removed = self.repository.remove_membership(cluster_id, video_id).await?;
        self.catalog.invalidate().await?;
        Ok(removed)
    }

    /// Tag a video with a trigger
    pub async fn map_video_to_trigger(
        &self,
        trigger_code: &str,
        video_code: &str,
    ) -> Result<UpsertOutcome, CatalogError> {
        self.resolve(EntityKind::Trigger, trigger_code).await?;
        self.resolve(EntityKind::Video, video_code).await?;

        let outcomes = self
            .repository
            .apply_trigger_mappings(vec![TriggerMappingInput {
                trigger_code: trigger_code.to_string(),
                video_code: video_code.to_string(),
            }])
            .await?;
        self.catalog.invalidate().await?;

        match outcomes.into_iter().next() {
            Some(MappingOutcome::Applied(outcome)) => Ok(outcome),
            Some(MappingOutcome::Missing { kind, code }) => Err(not_found(kind, &code)),
            None => Err(CatalogError::Store("mapping produced no outcome".to_string())),
        }
    }

    /// Remove a trigger tag from a video; returns whether it was mapped
    pub async fn unmap_video_from_trigger(
        &self,
        trigger_code: &str,
        video_code: &str,
    ) -> Result<bool, CatalogError> {
        let trigger_id = self.resolve(EntityKind::Trigger, trigger_code).await?;
        let video_id = self.resolve(EntityKind::Video, video_code).await?;

        let removed = self
            .repository
            .remove_trigger_mapping(trigger_id, video_id)
            .await?;
        self.catalog.invalidate().await?;
        Ok(removed)
    }

    /// Delete an entity together with its mappings and localized titles
    pub async fn delete(&self, kind: EntityKind, code: &str) -> Result<(), CatalogError> {
        if !self.repository.delete_entity(kind, code).await? {
            return Err(not_found(kind, code));
        }
        info!("Deleted {} {}", kind, code);
        self.catalog.invalidate().await?;
        Ok(())
    }

    async fn resolve(&self, kind: EntityKind, code: &str) -> Result<i64, CatalogError> {
        self.repository
            .find_id(kind, code)
            .await?
            .ok_or_else(|| not_found(kind, code))
    }

    async fn after_upsert(
        &self,
        kind: EntityKind,
        upserted: Vec<EntityUpsert>,
    ) -> Result<UpsertOutcome, CatalogError> {
        let upsert = upserted
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::Store(format!("{} upsert produced no row", kind)))?;

        // A retitled entity's stored variants describe the old title
        if upsert.outcome == UpsertOutcome::Updated && upsert.title_changed {
            self.repository.clear_localized_titles(kind, upsert.id).await?;
        }
        if upsert.outcome != UpsertOutcome::Unchanged {
            self.catalog.invalidate().await?;
        }
        Ok(upsert.outcome)
    }
}

fn required(field: &str, value: &str) -> Result<String, CatalogError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CatalogError::Invalid(format!("{} must not be empty", field)));
    }
    Ok(value.to_string())
}

fn not_found(kind: EntityKind, code: &str) -> CatalogError {
    CatalogError::NotFound {
        kind: kind.to_string(),
        code: code.to_string(),
    }
}
