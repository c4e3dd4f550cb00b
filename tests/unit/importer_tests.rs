/*!
 * Tests for the master-data importer
 */

use anyhow::Result;
use std::sync::Arc;

use peds_catalog::database::models::EntityKind;
use peds_catalog::errors::ImportError;
use peds_catalog::importer::{FileKind, Importer};

use crate::common::mock_transliterators::ScriptedTransliterator;
use crate::common::{self, MasterData, TestCatalog};

#[tokio::test]
async fn test_importVideos_withPublishColumn_shouldHonourExplicitFlag() -> Result<()> {
    let test = TestCatalog::new()?;
    let dir = common::create_temp_dir()?;
    let path = common::write_master_file(
        dir.path(),
        FileKind::Videos,
        "video_code,title,url,is_published\nV1,A,https://v.example.org/1,\nV2,B,https://v.example.org/2,false\n",
    )?;

    let summary = test.importer.import_videos(&path).await?;

    assert_eq!(summary.created, 2);
    assert!(test.repository.get_video("V1").await?.unwrap().is_published);
    assert!(!test.repository.get_video("V2").await?.unwrap().is_published);
    Ok(())
}

#[tokio::test]
async fn test_importVideos_withoutPublishColumn_shouldKeepAdminDeactivation() -> Result<()> {
    let test = TestCatalog::new()?;
    let dir = common::create_temp_dir()?;
    let path = common::write_master_file(
        dir.path(),
        FileKind::Videos,
        "video_code,title,url\nV1,A,https://v.example.org/1\n",
    )?;
    test.importer.import_videos(&path).await?;
    test.repository.set_published(EntityKind::Video, "V1", false).await?;

    let summary = test.importer.import_videos(&path).await?;

    assert_eq!(summary.unchanged, 1);
    assert!(!test.repository.get_video("V1").await?.unwrap().is_published);
    Ok(())
}

#[tokio::test]
async fn test_importVideos_withChangedUrl_shouldUpdate() -> Result<()> {
    let test = TestCatalog::new()?;
    let dir = common::create_temp_dir()?;
    let path = common::write_master_file(
        dir.path(),
        FileKind::Videos,
        "video_code,title,url\nV1,A,https://v.example.org/old\n",
    )?;
    test.importer.import_videos(&path).await?;
    common::write_master_file(
        dir.path(),
        FileKind::Videos,
        "video_code,title,url\nV1,A,https://v.example.org/new\n",
    )?;

    let summary = test.importer.import_videos(&path).await?;

    assert_eq!((summary.created, summary.updated), (0, 1));
    assert_eq!(
        test.repository.get_video("V1").await?.unwrap().url,
        "https://v.example.org/new"
    );
    Ok(())
}

#[tokio::test]
async fn test_importTriggers_withInvalidRows_shouldSkipWithRowNumbers() -> Result<()> {
    let test = TestCatalog::new()?;
    let dir = common::create_temp_dir()?;
    let path = common::write_master_file(
        dir.path(),
        FileKind::Triggers,
        "trigger_code,title,is_published\nT1,Fever,\n,Missing code,\nT3,,\nT4,Cough,perhaps\nT5,Rash\n",
    )?;

    let summary = test.importer.import_triggers(&path).await?;

    assert_eq!(summary.created, 1);
    let rows: Vec<usize> = summary.skipped.iter().map(|skip| skip.row).collect();
    assert_eq!(rows, vec![2, 3, 4, 5]);
    assert_eq!(summary.skipped[0].reason, "empty trigger_code");
    assert_eq!(summary.skipped[1].reason, "empty title");
    assert!(summary.skipped[3].reason.starts_with("malformed record"));
    Ok(())
}

#[tokio::test]
async fn test_importFile_withMissingColumn_shouldFailStructurally() -> Result<()> {
    let test = TestCatalog::new()?;
    let dir = common::create_temp_dir()?;
    let path = common::write_master_file(
        dir.path(),
        FileKind::ClusterVideos,
        "cluster_code,video_code\nC1,V1\n",
    )?;

    let result = test.importer.import_cluster_videos(&path).await;

    assert!(matches!(
        result,
        Err(ImportError::MissingColumn { ref column, .. }) if column == "position"
    ));
    Ok(())
}

#[tokio::test]
async fn test_importDirectory_withTransliterator_shouldStoreLocalizedTitles() -> Result<()> {
    let transliterator = Arc::new(ScriptedTransliterator::new().failing_for("ta"));
    let test = TestCatalog::with_transliterator(transliterator.clone())?;
    let dir = common::create_temp_dir()?;
    MasterData::sample().write_to(dir.path())?;

    test.importer.import_directory(dir.path()).await?;

    let snapshot = test.catalog.get().await?;
    let video = snapshot.video("V1").unwrap();
    assert_eq!(
        video.titles.get("hi"),
        Some(&ScriptedTransliterator::expected("Fever Care", "hi"))
    );
    assert!(!video.titles.contains_key("ta"));
    assert!(!video.titles.contains_key("en"));
    Ok(())
}

#[tokio::test]
async fn test_reimport_withUnchangedTitles_shouldNotTransliterateAgain() -> Result<()> {
    let transliterator = Arc::new(ScriptedTransliterator::new());
    let test = TestCatalog::with_transliterator(transliterator.clone())?;
    let dir = common::create_temp_dir()?;
    MasterData::sample().write_to(dir.path())?;

    test.importer.import_directory(dir.path()).await?;
    let first_run = transliterator.requests().len();
    test.importer.import_directory(dir.path()).await?;

    assert!(first_run > 0);
    assert_eq!(transliterator.requests().len(), first_run);
    Ok(())
}

#[tokio::test]
async fn test_reimport_withNewTitleAndNoTransliterator_shouldClearLocalizedTitles() -> Result<()> {
    let test = TestCatalog::new()?;
    let dir = common::create_temp_dir()?;
    let path = common::write_master_file(
        dir.path(),
        FileKind::Clusters,
        "cluster_code,title\nC1,Fever Basics\n",
    )?;
    test.importer.import_clusters(&path).await?;
    let id = test.repository.find_id(EntityKind::Cluster, "C1").await?.unwrap();
    test.repository
        .store_localized_titles(
            EntityKind::Cluster,
            id,
            [("hi".to_string(), "बुखार".to_string())].into_iter().collect(),
        )
        .await?;

    common::write_master_file(
        dir.path(),
        FileKind::Clusters,
        "cluster_code,title\nC1,Fever at Home\n",
    )?;
    test.importer.import_clusters(&path).await?;

    assert!(test.repository.get_localized_titles(EntityKind::Cluster, id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_reimport_withNewTitleAndFailingLanguage_shouldDropOldVariant() -> Result<()> {
    let test = TestCatalog::with_transliterator(Arc::new(ScriptedTransliterator::new()))?;
    let dir = common::create_temp_dir()?;
    let mut data = MasterData::sample();
    data.write_to(dir.path())?;
    test.importer.import_directory(dir.path()).await?;
    let id = test.repository.find_id(EntityKind::Video, "V1").await?.unwrap();
    assert_eq!(
        test.repository.get_localized_titles(EntityKind::Video, id).await?.get("ta"),
        Some(&ScriptedTransliterator::expected("Fever Care", "ta"))
    );

    data.videos[0] = "V1,Fever at Home,https://videos.example.org/V1,";
    data.write_to(dir.path())?;
    let tamil_down = Importer::new(
        test.repository.clone(),
        Arc::new(ScriptedTransliterator::new().failing_for("ta")),
    )
    .with_catalog(test.catalog.clone());
    tamil_down.import_directory(dir.path()).await?;

    let titles = test.repository.get_localized_titles(EntityKind::Video, id).await?;
    assert_eq!(
        titles.get("hi"),
        Some(&ScriptedTransliterator::expected("Fever at Home", "hi"))
    );
    assert!(!titles.contains_key("ta"));
    let snapshot = test.catalog.get().await?;
    let page = peds_catalog::sharing::video_page(&snapshot, "V1", Some("ta")).unwrap();
    assert_eq!(page.title, "Fever at Home");
    Ok(())
}

#[tokio::test]
async fn test_importClusterVideos_withRepeatedRun_shouldReportUnchanged() -> Result<()> {
    let test = TestCatalog::new()?;
    let dir = common::create_temp_dir()?;
    MasterData::sample().write_to(dir.path())?;
    test.importer.import_directory(dir.path()).await?;

    let summary = test
        .importer
        .import_cluster_videos(&dir.path().join(FileKind::ClusterVideos.file_name()))
        .await?;

    assert_eq!((summary.created, summary.updated), (0, 0));
    assert_eq!(summary.unchanged, 5);
    assert_eq!(summary.skipped_count(), 0);
    Ok(())
}
