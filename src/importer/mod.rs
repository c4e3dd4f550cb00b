/*!
 * Master-data importer.
 *
 * Loads the five master-data CSV files into the catalog store:
 * - `csv_files`: file kinds, header validation and row parsing
 * - `summary`: per-file counts and skip reasons
 *
 * Files are processed in dependency order (triggers, videos, clusters, then
 * the two mapping files). Each file is written in one transaction. Row
 * problems skip the row; only structural problems fail the run, and those
 * are detected for all files before anything is written.
 */

use log::{debug, info, warn};
use std::path::Path;
use std::sync::Arc;

use crate::catalog::SharingCatalog;
use crate::database::Repository;
use crate::database::models::{EntityKind, EntityUpsert, MappingOutcome, UpsertOutcome};
use crate::errors::ImportError;
use crate::transliteration::{Transliterator, localize_title};

pub mod csv_files;
pub mod summary;

pub use csv_files::{CsvTable, FileKind};
pub use summary::{FileSummary, ImportSummary, SkipReason};

use csv_files::{
    CsvRow, parse_cluster, parse_membership, parse_trigger, parse_trigger_mapping, parse_video,
};

/// Imports master-data CSV files into the catalog store
#[derive(Debug, Clone)]
pub struct Importer {
    repository: Repository,
    transliterator: Arc<dyn Transliterator>,
    catalog: Option<SharingCatalog>,
}

impl Importer {
    /// Create an importer writing through `repository`
    pub fn new(repository: Repository, transliterator: Arc<dyn Transliterator>) -> Self {
        Self {
            repository,
            transliterator,
            catalog: None,
        }
    }

    /// Invalidate `catalog` after runs that changed data
    pub fn with_catalog(mut self, catalog: SharingCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Import all five files from `dir`
    pub async fn import_directory(&self, dir: &Path) -> Result<ImportSummary, ImportError> {
        self.import_directory_with_progress(dir, |_, _, _| {}).await
    }

    /// Import all five files from `dir`, reporting each finished file
    ///
    /// `on_file` receives the finished kind, the number of files done and the
    /// total number of files.
    pub async fn import_directory_with_progress<F>(
        &self,
        dir: &Path,
        on_file: F,
    ) -> Result<ImportSummary, ImportError>
    where
        F: Fn(FileKind, usize, usize),
    {
        let tables = FileKind::ALL
            .iter()
            .map(|kind| CsvTable::open_in(dir, *kind))
            .collect::<Result<Vec<_>, _>>()?;
        info!(
            "Importing master data from {} ({} rows)",
            dir.display(),
            tables.iter().map(CsvTable::len).sum::<usize>()
        );

        let mut summary = ImportSummary::default();
        for (done, table) in tables.iter().enumerate() {
            match self.import_table(table).await {
                Ok(file) => summary.files.push(file),
                Err(e) => {
                    // Earlier files (and part of this one) may have committed
                    self.invalidate_catalog().await;
                    return Err(e);
                }
            }
            on_file(table.kind, done + 1, tables.len());
        }

        self.finish(&summary).await;
        Ok(summary)
    }

    /// Import a single file of `kind`
    pub async fn import_file(&self, kind: FileKind, path: &Path) -> Result<FileSummary, ImportError> {
        let table = CsvTable::open(path, kind)?;
        let file = match self.import_table(&table).await {
            Ok(file) => file,
            Err(e) => {
                self.invalidate_catalog().await;
                return Err(e);
            }
        };

        self.finish(&ImportSummary {
            files: vec![file.clone()],
        })
        .await;
        Ok(file)
    }

    pub async fn import_triggers(&self, path: &Path) -> Result<FileSummary, ImportError> {
        self.import_file(FileKind::Triggers, path).await
    }

    pub async fn import_videos(&self, path: &Path) -> Result<FileSummary, ImportError> {
        self.import_file(FileKind::Videos, path).await
    }

    pub async fn import_clusters(&self, path: &Path) -> Result<FileSummary, ImportError> {
        self.import_file(FileKind::Clusters, path).await
    }

    pub async fn import_cluster_videos(&self, path: &Path) -> Result<FileSummary, ImportError> {
        self.import_file(FileKind::ClusterVideos, path).await
    }

    pub async fn import_trigger_videos(&self, path: &Path) -> Result<FileSummary, ImportError> {
        self.import_file(FileKind::TriggerVideos, path).await
    }

    async fn import_table(&self, table: &CsvTable) -> Result<FileSummary, ImportError> {
        let mut file = FileSummary::new(table.kind);

        match table.kind {
            FileKind::Triggers => {
                let (_, inputs): (Vec<_>, Vec<_>) =
                    parse_rows(table, &mut file, parse_trigger).into_iter().unzip();
                let titles: Vec<String> = inputs.iter().map(|input| input.title.clone()).collect();
                let upserts = self.repository.upsert_triggers(inputs).await?;
                self.apply_upserts(EntityKind::Trigger, &titles, upserts, &mut file)
                    .await?;
            }
            FileKind::Videos => {
                let (_, inputs): (Vec<_>, Vec<_>) =
                    parse_rows(table, &mut file, parse_video).into_iter().unzip();
                let titles: Vec<String> = inputs.iter().map(|input| input.title.clone()).collect();
                let upserts = self.repository.upsert_videos(inputs).await?;
                self.apply_upserts(EntityKind::Video, &titles, upserts, &mut file)
                    .await?;
            }
            FileKind::Clusters => {
                let (_, inputs): (Vec<_>, Vec<_>) =
                    parse_rows(table, &mut file, parse_cluster).into_iter().unzip();
                let titles: Vec<String> = inputs.iter().map(|input| input.title.clone()).collect();
                let upserts = self.repository.upsert_clusters(inputs).await?;
                self.apply_upserts(EntityKind::Cluster, &titles, upserts, &mut file)
                    .await?;
            }
            FileKind::ClusterVideos => {
                let (rows, inputs): (Vec<_>, Vec<_>) =
                    parse_rows(table, &mut file, parse_membership).into_iter().unzip();
                let outcomes = self.repository.apply_memberships(inputs).await?;
                tally_mappings(&rows, outcomes, &mut file);
            }
            FileKind::TriggerVideos => {
                let (rows, inputs): (Vec<_>, Vec<_>) =
                    parse_rows(table, &mut file, parse_trigger_mapping)
                        .into_iter()
                        .unzip();
                let outcomes = self.repository.apply_trigger_mappings(inputs).await?;
                tally_mappings(&rows, outcomes, &mut file);
            }
        }

        info!("{}", file);
        Ok(file)
    }

    /// Count entity outcomes and keep localized titles in step with the
    /// default-language title
    async fn apply_upserts(
        &self,
        kind: EntityKind,
        titles: &[String],
        upserts: Vec<EntityUpsert>,
        file: &mut FileSummary,
    ) -> Result<(), ImportError> {
        let localize = self.transliterator.is_available();

        for (title, upsert) in titles.iter().zip(upserts) {
            file.record(upsert.outcome);
            if !upsert.title_changed {
                continue;
            }

            if upsert.outcome == UpsertOutcome::Updated {
                let cleared = self.repository.clear_localized_titles(kind, upsert.id).await?;
                if cleared > 0 {
                    debug!("Cleared {} stale localized titles of {} '{}'", cleared, kind, title);
                }
            }
            if localize {
                let localized = localize_title(self.transliterator.as_ref(), title).await;
                if !localized.is_empty() {
                    debug!("Storing {} localized titles for {} '{}'", localized.len(), kind, title);
                    self.repository
                        .store_localized_titles(kind, upsert.id, localized)
                        .await?;
                }
            }
        }
        Ok(())
    }

    async fn finish(&self, summary: &ImportSummary) {
        if summary.has_changes() {
            self.invalidate_catalog().await;
        }
    }

    async fn invalidate_catalog(&self) {
        if let Some(catalog) = &self.catalog {
            // The writes already committed; a stale snapshot is only logged
            if let Err(e) = catalog.invalidate().await {
                warn!("Import wrote data but the sharing catalog could not be invalidated: {}", e);
            }
        }
    }
}

/// Parse every row of `table`, skipping the ones `parse` rejects
fn parse_rows<T>(
    table: &CsvTable,
    file: &mut FileSummary,
    parse: impl Fn(&CsvRow<'_>) -> Result<T, String>,
) -> Vec<(usize, T)> {
    let mut parsed = Vec::with_capacity(table.len());
    for (number, row) in table.rows() {
        match row.and_then(|row| parse(&row)) {
            Ok(input) => parsed.push((number, input)),
            Err(reason) => file.skip(number, reason),
        }
    }
    parsed
}

fn tally_mappings(rows: &[usize], outcomes: Vec<MappingOutcome>, file: &mut FileSummary) {
    for (row, outcome) in rows.iter().zip(outcomes) {
        match outcome {
            MappingOutcome::Applied(outcome) => file.record(outcome),
            MappingOutcome::Missing { kind, code } => {
                file.skip(*row, format!("unknown {} code {}", kind, code))
            }
        }
    }
}
