mod common;

use std::sync::atomic::Ordering;

use scroll_capture::DiscoveredResource;
use scroll_capture::services::Downloader;

use common::{start_server, test_config};

fn resource(index: u32, url: String) -> DiscoveredResource {
    DiscoveredResource { index, url }
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let server = start_server().await;
    let dir = tempfile::tempdir().unwrap();
    let downloader = Downloader::from_config(&test_config(dir.path())).unwrap();

    let results = downloader
        .download_all(&[resource(7, server.url("/img/flaky.png"))], dir.path())
        .await
        .unwrap();

    assert!(results[0].is_saved());
    assert_eq!(results[0].local_path.as_deref(), Some(dir.path().join("page7.png").as_path()));
    assert_eq!(server.state.flaky_hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = start_server().await;
    let dir = tempfile::tempdir().unwrap();
    let downloader = Downloader::from_config(&test_config(dir.path())).unwrap();

    let results = downloader
        .download_all(&[resource(0, server.url("/img/missing.jpg"))], dir.path())
        .await
        .unwrap();

    assert!(!results[0].is_saved());
    assert!(results[0].error.as_deref().unwrap().contains("404"));
    assert_eq!(server.state.missing_hits.load(Ordering::SeqCst), 1);
    assert!(!dir.path().join("page0.jpg").exists());
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let server = start_server().await;
    let dir = tempfile::tempdir().unwrap();
    let downloader = Downloader::from_config(&test_config(dir.path())).unwrap();

    let results = downloader
        .download_all(&[resource(3, server.url("/img/down.png"))], dir.path())
        .await
        .unwrap();

    assert!(!results[0].is_saved());
    assert_eq!(server.state.down_hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_extension_from_content_type_when_url_has_none() {
    let server = start_server().await;
    let dir = tempfile::tempdir().unwrap();
    let downloader = Downloader::from_config(&test_config(dir.path())).unwrap();

    let results = downloader
        .download_all(&[resource(5, server.url("/img/render?sig=abc"))], dir.path())
        .await
        .unwrap();

    assert!(results[0].is_saved());
    assert!(dir.path().join("page5.png").exists());
}

#[tokio::test]
async fn test_failures_do_not_affect_other_images() {
    let server = start_server().await;
    let dir = tempfile::tempdir().unwrap();
    let downloader = Downloader::from_config(&test_config(dir.path())).unwrap();

    let resources = vec![
        resource(4, server.url("/img/page2.png")),
        resource(2, server.url("/img/missing.jpg")),
        resource(0, server.url("/img/page0.jpg")),
        resource(1, String::new()),
        resource(3, "data:image/gif;base64,R0lGODlhAQABAIAAAP///wAAACwAAAAAAQABAAACAkQBADs=".to_string()),
    ];
    let results = downloader.download_all(&resources, dir.path()).await.unwrap();

    let indices: Vec<u32> = results.iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);

    let saved: Vec<bool> = results.iter().map(|r| r.is_saved()).collect();
    assert_eq!(saved, vec![true, false, false, true, true]);
    assert!(results[1].error.as_deref().unwrap().contains("地址为空"));

    assert!(dir.path().join("page0.jpg").exists());
    assert!(dir.path().join("page3.gif").exists());
    assert!(dir.path().join("page4.png").exists());
}

#[tokio::test]
async fn test_images_dir_is_created() {
    let server = start_server().await;
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let downloader = Downloader::from_config(&test_config(dir.path())).unwrap();

    let results = downloader
        .download_all(&[resource(1, server.url("/img/page1.png"))], &nested)
        .await
        .unwrap();

    assert!(results[0].is_saved());
    assert!(nested.join("page1.png").exists());
}

#[tokio::test]
async fn test_in_flight_requests_never_exceed_concurrency() {
    let server = start_server().await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.concurrency = 3;
    let downloader = Downloader::from_config(&config).unwrap();

    let resources: Vec<DiscoveredResource> = (0..12)
        .map(|i| resource(i, server.url(&format!("/img/slow.png?i={}", i))))
        .collect();
    let results = downloader.download_all(&resources, dir.path()).await.unwrap();

    assert_eq!(results.iter().filter(|r| r.is_saved()).count(), 12);
    let peak = server.state.slow_peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "同时下载数 {} 超过并发上限", peak);
    assert!(peak >= 2, "下载没有并发执行");
    assert_eq!(server.state.slow_in_flight.load(Ordering::SeqCst), 0);
}
