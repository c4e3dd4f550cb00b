/*!
 * Common test utilities for the peds-catalog test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use peds_catalog::cache::{CacheBackend, MemoryCache};
use peds_catalog::catalog::SharingCatalog;
use peds_catalog::database::Repository;
use peds_catalog::importer::{FileKind, Importer};
use peds_catalog::transliteration::{NoopTransliterator, Transliterator};

pub mod mock_backends;
pub mod mock_transliterators;

/// Route library logs to the test harness output
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Writes a master-data file of `kind` into `dir`
pub fn write_master_file(dir: &Path, kind: FileKind, content: &str) -> Result<PathBuf> {
    let path = dir.join(kind.file_name());
    fs::write(&path, content)?;
    Ok(path)
}

/// Rows of the five master-data files, without headers
#[derive(Debug, Default, Clone)]
pub struct MasterData {
    pub triggers: Vec<&'static str>,
    pub videos: Vec<&'static str>,
    pub clusters: Vec<&'static str>,
    pub cluster_videos: Vec<&'static str>,
    pub trigger_videos: Vec<&'static str>,
}

impl MasterData {
    /// Small catalog: two triggers, four videos (one draft), two clusters
    pub fn sample() -> Self {
        Self {
            triggers: vec!["T1,Fever,", "T2,Cough,"],
            videos: vec![
                "V1,Fever Care,https://videos.example.org/V1,",
                "V2,Sponging a Child,https://videos.example.org/V2,",
                "V3,Cough Remedies,https://videos.example.org/V3,",
                "V4,Draft Video,https://videos.example.org/V4,0",
            ],
            clusters: vec!["C1,Fever Basics,", "C2,Hidden Cluster,no"],
            cluster_videos: vec!["C1,V1,2", "C1,V2,0", "C1,V3,1", "C1,V4,3", "C2,V1,0"],
            trigger_videos: vec!["T1,V1", "T1,V2", "T1,V4", "T2,V3"],
        }
    }

    /// Writes all five files with their headers into `dir`
    pub fn write_to(&self, dir: &Path) -> Result<()> {
        let files = [
            (FileKind::Triggers, "trigger_code,title,is_published", &self.triggers),
            (FileKind::Videos, "video_code,title,url,is_published", &self.videos),
            (FileKind::Clusters, "cluster_code,title,is_published", &self.clusters),
            (FileKind::ClusterVideos, "cluster_code,video_code,position", &self.cluster_videos),
            (FileKind::TriggerVideos, "trigger_code,video_code", &self.trigger_videos),
        ];
        for (kind, header, rows) in files {
            let mut content = String::from(header);
            content.push('\n');
            for row in rows.iter() {
                content.push_str(row);
                content.push('\n');
            }
            write_master_file(dir, kind, &content)?;
        }
        Ok(())
    }
}

/// Store, cache and importer wired together over an in-memory database
pub struct TestCatalog {
    pub repository: Repository,
    pub backend: Arc<dyn CacheBackend>,
    pub catalog: SharingCatalog,
    pub importer: Importer,
}

impl TestCatalog {
    /// In-memory store with a memory cache and no transliteration
    pub fn new() -> Result<Self> {
        Self::with_parts(Arc::new(MemoryCache::new()), Arc::new(NoopTransliterator))
    }

    pub fn with_backend(backend: Arc<dyn CacheBackend>) -> Result<Self> {
        Self::with_parts(backend, Arc::new(NoopTransliterator))
    }

    pub fn with_transliterator(transliterator: Arc<dyn Transliterator>) -> Result<Self> {
        Self::with_parts(Arc::new(MemoryCache::new()), transliterator)
    }

    pub fn with_parts(
        backend: Arc<dyn CacheBackend>,
        transliterator: Arc<dyn Transliterator>,
    ) -> Result<Self> {
        init_logging();
        let repository = Repository::new_in_memory()?;
        let catalog = SharingCatalog::new(repository.clone(), backend.clone());
        let importer =
            Importer::new(repository.clone(), transliterator).with_catalog(catalog.clone());
        Ok(Self {
            repository,
            backend,
            catalog,
            importer,
        })
    }
}
