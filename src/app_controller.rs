use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use crate::app_config::Config;
use crate::cache::create_backend;
use crate::catalog::{CatalogAdmin, SharingCatalog};
use crate::database::models::EntityKind;
use crate::database::{DatabaseConnection, Repository};
use crate::importer::{FileKind, ImportSummary, Importer};
use crate::sharing::{self, ClusterPage, MessagePrefixes, VideoPage};
use crate::transliteration::{Transliterator, select_transliterator};

// @module: Application controller wiring store, cache and capabilities

/// Main application controller for the catalog core
pub struct Controller {
    // @field: App configuration
    config: Config,
    repository: Repository,
    catalog: SharingCatalog,
    transliterator: Arc<dyn Transliterator>,
}

impl Controller {
    /// Create a controller on the database named by the configuration
    pub async fn with_config(config: Config) -> Result<Self> {
        let path = config.database_path()?;
        let db = DatabaseConnection::new(&path)
            .with_context(|| format!("Failed to open catalog database at {:?}", path))?;
        Self::with_connection(config, db).await
    }

    /// Create a controller on an already opened database
    pub async fn with_connection(config: Config, db: DatabaseConnection) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;

        let backend = create_backend(&config.cache, &db);
        let repository = Repository::new(db);
        let catalog =
            SharingCatalog::with_key(repository.clone(), backend, config.cache.catalog_key.clone());
        let transliterator = select_transliterator(&config.transliteration).await;
        debug!(
            "Controller ready: cache backend {}, transliteration {}",
            config.cache.backend,
            if transliterator.is_available() { "on" } else { "off" }
        );

        Ok(Self {
            config,
            repository,
            catalog,
            transliterator,
        })
    }

    /// Create a controller on an in-memory database (for testing)
    pub async fn new_for_test() -> Result<Self> {
        Self::with_connection(Config::default(), DatabaseConnection::new_in_memory()?).await
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Sharing catalog cache service
    pub fn catalog(&self) -> &SharingCatalog {
        &self.catalog
    }

    /// Admin service writing through this controller's store
    pub fn admin(&self) -> CatalogAdmin {
        CatalogAdmin::new(self.repository.clone(), self.catalog.clone())
    }

    /// Importer that invalidates this controller's catalog
    pub fn importer(&self) -> Importer {
        Importer::new(self.repository.clone(), self.transliterator.clone())
            .with_catalog(self.catalog.clone())
    }

    /// Run the importer on `dir`, optionally restricted to one file
    pub async fn run_import(&self, dir: &Path, only: Option<FileKind>) -> Result<ImportSummary> {
        if !dir.is_dir() {
            return Err(anyhow!("Import directory does not exist: {:?}", dir));
        }
        let start_time = std::time::Instant::now();
        let importer = self.importer();

        let summary = match only {
            Some(kind) => {
                let file = importer.import_file(kind, &dir.join(kind.file_name())).await?;
                ImportSummary { files: vec![file] }
            }
            None => {
                let progress_bar = ProgressBar::new(FileKind::ALL.len() as u64);
                let style = ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} files {msg}")
                    .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{bar:30}] {pos}/{len} {msg}"))
                    .unwrap_or_else(|_| ProgressStyle::default_bar());
                progress_bar.set_style(style.progress_chars("=>-"));
                progress_bar.set_message("Importing");

                let pb = progress_bar.clone();
                let result = importer
                    .import_directory_with_progress(dir, move |kind, done, _total| {
                        pb.set_position(done as u64);
                        pb.set_message(kind.file_name());
                    })
                    .await;
                progress_bar.finish_and_clear();
                result?
            }
        };

        info!(
            "Import finished in {:.2}s: {} created, {} updated, {} skipped",
            start_time.elapsed().as_secs_f64(),
            summary.total_created(),
            summary.total_updated(),
            summary.total_skipped()
        );
        Ok(summary)
    }

    /// Serialized snapshot, served through the cache
    pub async fn snapshot_json(&self, pretty: bool) -> Result<String> {
        if !pretty {
            return Ok(self.catalog.get_serialized().await?);
        }
        let snapshot = self.catalog.get().await?;
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// Drop the cached snapshot
    pub async fn invalidate(&self) -> Result<()> {
        self.catalog.invalidate().await?;
        Ok(())
    }

    /// Publish or unpublish an entity
    pub async fn set_published(&self, kind: EntityKind, code: &str, published: bool) -> Result<()> {
        self.admin().set_published(kind, code, published).await?;
        Ok(())
    }

    /// Patient page of a published video
    pub async fn video_page(&self, code: &str, lang: Option<&str>) -> Result<Option<VideoPage>> {
        let snapshot = self.catalog.get().await?;
        Ok(sharing::video_page(&snapshot, code, lang))
    }

    /// Patient page of a published cluster
    pub async fn cluster_page(&self, code: &str, lang: Option<&str>) -> Result<Option<ClusterPage>> {
        let snapshot = self.catalog.get().await?;
        Ok(sharing::cluster_page(&snapshot, code, lang))
    }

    /// Message prefixes for a doctor, cached on the shared backend
    pub async fn message_prefixes(&self, doctor_name: &str) -> MessagePrefixes {
        let backend = self.catalog.backend();
        let ttl = std::time::Duration::from_secs(self.config.cache.message_prefix_ttl_secs);
        MessagePrefixes::build(doctor_name, backend.as_ref(), ttl).await
    }

    /// Payload of a doctor's sharing screen
    pub async fn share_payload(&self, doctor_id: &str, doctor_name: &str) -> Result<Value> {
        let snapshot = self.catalog.get().await?;
        let prefixes = self.message_prefixes(doctor_name).await;
        Ok(sharing::share_payload(&snapshot, doctor_id, &prefixes)?)
    }
}
