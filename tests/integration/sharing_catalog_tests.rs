/*!
 * Integration tests for the sharing catalog, admin writes and patient pages
 */

use anyhow::Result;
use std::sync::Arc;

use peds_catalog::app_controller::Controller;
use peds_catalog::cache::{CacheBackend, MemoryCache};
use peds_catalog::catalog::{CATALOG_CACHE_KEY, CatalogAdmin};
use peds_catalog::database::models::EntityKind;
use peds_catalog::sharing;

use crate::common::mock_backends::FailingCache;
use crate::common::{self, MasterData, TestCatalog};

async fn imported(test: &TestCatalog) -> Result<()> {
    let dir = common::create_temp_dir()?;
    MasterData::sample().write_to(dir.path())?;
    test.importer.import_directory(dir.path()).await?;
    Ok(())
}

fn admin(test: &TestCatalog) -> CatalogAdmin {
    CatalogAdmin::new(test.repository.clone(), test.catalog.clone())
}

#[tokio::test]
async fn test_snapshot_shouldOnlyContainPublishedEntities() -> Result<()> {
    let test = TestCatalog::new()?;
    imported(&test).await?;

    let snapshot = test.catalog.get().await?;

    let videos: Vec<&str> = snapshot.videos.iter().map(|v| v.code.as_str()).collect();
    assert_eq!(videos, vec!["V1", "V2", "V3"]);
    assert!(snapshot.cluster("C2").is_none());
    let fever = snapshot.trigger("T1").unwrap();
    let mapped: Vec<&str> = fever.videos.iter().map(|v| v.code.as_str()).collect();
    assert_eq!(mapped, vec!["V1", "V2"]);
    Ok(())
}

#[tokio::test]
async fn test_clusterPage_withPositionsOutOfOrder_shouldSortAscending() -> Result<()> {
    let test = TestCatalog::new()?;
    imported(&test).await?;

    let snapshot = test.catalog.get().await?;
    let page = sharing::cluster_page(&snapshot, "C1", None).unwrap();

    let codes: Vec<&str> = page.items.iter().map(|item| item.code.as_str()).collect();
    assert_eq!(codes, vec!["V2", "V3", "V1"]);
    Ok(())
}

#[tokio::test]
async fn test_videoPage_withMissingTamilTitle_shouldFallBackToDefault() -> Result<()> {
    let test = TestCatalog::new()?;
    imported(&test).await?;
    admin(&test)
        .set_localized_title(EntityKind::Video, "V1", "hi", "बुखार की देखभाल")
        .await?;

    let snapshot = test.catalog.get().await?;
    let tamil = sharing::video_page(&snapshot, "V1", Some("ta")).unwrap();
    let hindi = sharing::video_page(&snapshot, "V1", Some("hi")).unwrap();

    assert_eq!(tamil.title, "Fever Care");
    assert_eq!(tamil.language, "ta");
    assert_eq!(hindi.title, "बुखार की देखभाल");
    Ok(())
}

#[tokio::test]
async fn test_unpublishVideo_shouldDisappearFromNextRead() -> Result<()> {
    let test = TestCatalog::new()?;
    imported(&test).await?;
    assert!(test.catalog.get().await?.video("V2").is_some());

    admin(&test).set_published(EntityKind::Video, "V2", false).await?;

    let snapshot = test.catalog.get().await?;
    assert!(snapshot.video("V2").is_none());
    let cluster: Vec<&str> = snapshot
        .cluster("C1")
        .unwrap()
        .videos
        .iter()
        .map(|entry| entry.video.code.as_str())
        .collect();
    assert_eq!(cluster, vec!["V3", "V1"]);
    Ok(())
}

#[tokio::test]
async fn test_adminWrites_shouldKeepSnapshotCoherent() -> Result<()> {
    let test = TestCatalog::new()?;
    imported(&test).await?;
    let admin = admin(&test);
    test.catalog.get().await?;

    admin
        .save_video("V5", "Hydration Tips", "https://videos.example.org/V5", None)
        .await?;
    admin.add_video_to_cluster("C1", "V5", 1).await?;
    admin.map_video_to_trigger("T2", "V5").await?;
    admin.remove_video_from_cluster("C1", "V2").await?;

    let snapshot = test.catalog.get().await?;
    let cluster: Vec<(&str, i64)> = snapshot
        .cluster("C1")
        .unwrap()
        .videos
        .iter()
        .map(|entry| (entry.video.code.as_str(), entry.position))
        .collect();
    assert_eq!(cluster, vec![("V3", 1), ("V5", 1), ("V1", 2)]);
    let cough: Vec<&str> = snapshot
        .trigger("T2")
        .unwrap()
        .videos
        .iter()
        .map(|v| v.code.as_str())
        .collect();
    assert_eq!(cough, vec!["V3", "V5"]);
    Ok(())
}

#[tokio::test]
async fn test_adminDelete_withUnknownCode_shouldReportNotFound() -> Result<()> {
    let test = TestCatalog::new()?;
    imported(&test).await?;

    let error = admin(&test)
        .delete(EntityKind::Cluster, "C404")
        .await
        .unwrap_err();

    assert!(error.to_string().contains("C404"));
    Ok(())
}

#[tokio::test]
async fn test_get_withFailingBackend_shouldServeFreshSnapshot() -> Result<()> {
    let backend = Arc::new(FailingCache::new());
    let test = TestCatalog::with_backend(backend.clone())?;
    imported(&test).await?;

    let first = test.catalog.get().await?;
    admin(&test).set_published(EntityKind::Video, "V1", false).await.ok();
    let second = test.catalog.get().await?;

    assert!(first.video("V1").is_some());
    assert!(second.video("V1").is_none());
    assert!(backend.call_count() > 0);
    Ok(())
}

#[tokio::test]
async fn test_setPublished_withFailingBackend_shouldCommitAndReportCacheError() -> Result<()> {
    let test = TestCatalog::with_backend(Arc::new(FailingCache::new()))?;
    imported(&test).await?;

    let result = admin(&test).set_published(EntityKind::Cluster, "C2", true).await;

    assert!(result.is_err());
    assert!(test.catalog.get().await?.cluster("C2").is_some());
    Ok(())
}

#[tokio::test]
async fn test_getSerialized_shouldMatchCachedPayload() -> Result<()> {
    let backend = Arc::new(MemoryCache::new());
    let test = TestCatalog::with_backend(backend.clone())?;
    imported(&test).await?;

    let served = test.catalog.get_serialized().await?;
    let cached = backend.get(CATALOG_CACHE_KEY).await?;

    assert_eq!(cached.as_deref(), Some(served.as_str()));
    assert_eq!(test.catalog.get_serialized().await?, served);
    Ok(())
}

#[test]
fn test_controller_shouldResolvePagesAndSharePayload() -> Result<()> {
    tokio_test::block_on(async {
        let controller = Controller::new_for_test().await?;
        let dir = common::create_temp_dir()?;
        MasterData::sample().write_to(dir.path())?;

        let summary = controller.run_import(dir.path(), None).await?;
        assert_eq!(summary.total_skipped(), 0);

        let page = controller.video_page("V3", Some("kn")).await?.unwrap();
        assert_eq!(page.title, "Cough Remedies");
        assert!(controller.cluster_page("C2", None).await?.is_none());

        let payload = controller.share_payload("DR7", "  ").await?;
        assert_eq!(payload["doctor_id"], "DR7");
        assert!(
            payload["message_prefixes"]["en"]
                .as_str()
                .unwrap()
                .contains("your doctor")
        );
        Ok(())
    })
}

#[tokio::test]
async fn test_controller_withOnlyFile_shouldImportThatFileAlone() -> Result<()> {
    let controller = Controller::new_for_test().await?;
    let dir = common::create_temp_dir()?;
    MasterData::sample().write_to(dir.path())?;

    let summary = controller
        .run_import(dir.path(), Some(peds_catalog::importer::FileKind::Videos))
        .await?;

    assert_eq!(summary.files.len(), 1);
    assert_eq!(summary.total_created(), 4);
    assert!(controller.repository().get_trigger("T1").await?.is_none());
    Ok(())
}
