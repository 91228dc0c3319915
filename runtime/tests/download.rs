//! Download orchestrator against a mock origin.

mod common;

use common::{img_page, unit};
use std::sync::Arc;
use tankobon_runtime::download::{download, download_truncated, Downloader};
use tankobon_runtime::model::{ContentCard, ContentUnit};
use tankobon_runtime::provider::Provider;
use tankobon_runtime::FetchError;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn serve_picture(server: &MockServer, at: &str, body: &[u8], times: u64) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_download_writes_numbered_files() {
    let server = MockServer::start().await;
    serve_picture(&server, "/img/a.PNG", b"first", 1).await;
    serve_picture(&server, "/img/b.webp", b"second", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let provider = common::http_only_provider(&server, dir.path());
    let mut chapter = unit(&server, 1);
    chapter.pictures = vec![
        format!("{}/img/a.PNG", server.uri()),
        format!("{}/img/b.webp?token=1", server.uri()),
    ];

    let location = download(&provider, &mut chapter).await.unwrap();

    let expected = dir.path().join("AsuraScans/Solo Leveling S2/Chapter 1");
    assert_eq!(location, expected);
    assert_eq!(std::fs::read(expected.join("00000.png")).unwrap(), b"first");
    assert_eq!(std::fs::read(expected.join("00001.webp")).unwrap(), b"second");
}

#[tokio::test]
async fn test_second_download_is_served_from_cache() {
    let server = MockServer::start().await;
    serve_picture(&server, "/img/a.jpg", b"first", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let provider = common::http_only_provider(&server, dir.path());
    let mut chapter = unit(&server, 1);
    chapter.pictures = vec![format!("{}/img/a.jpg", server.uri())];

    let a = download(&provider, &mut chapter).await.unwrap();
    let b = download(&provider, &mut chapter).await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_exhausted_picture_aborts_unit() {
    let server = MockServer::start().await;
    serve_picture(&server, "/img/0.jpg", b"ok", 1).await;
    Mock::given(method("GET"))
        .and(path("/img/1.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&server)
        .await;
    serve_picture(&server, "/img/2.jpg", b"never", 0).await;

    let dir = tempfile::tempdir().unwrap();
    let provider = common::http_only_provider(&server, dir.path());
    let mut chapter = unit(&server, 1);
    chapter.pictures = (0..3)
        .map(|i| format!("{}/img/{i}.jpg", server.uri()))
        .collect();

    let err = download(&provider, &mut chapter).await.unwrap_err();
    match err {
        FetchError::PictureDownloadExhausted {
            url,
            attempts,
            reason,
        } => {
            assert_eq!(url, format!("{}/img/1.jpg", server.uri()));
            assert_eq!(attempts, 3);
            assert_eq!(reason, "HTTP 404");
        }
        other => panic!("unexpected error: {other}"),
    }

    // No rollback: the first picture stays, nothing after the failure exists.
    let folder = dir.path().join("AsuraScans/Solo Leveling S2/Chapter 1");
    assert!(folder.join("00000.jpg").exists());
    assert!(!folder.join("00001.jpg").exists());
    assert!(!folder.join("00002.jpg").exists());
}

#[tokio::test]
async fn test_unnamed_work_downloads_under_unit_folder() {
    let server = MockServer::start().await;
    serve_picture(&server, "/img/a.jpg", b"first", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let provider = common::http_only_provider(&server, dir.path());
    let named = unit(&server, 1);
    let card = Arc::new(ContentCard::new("AsuraScans", "", named.card.url.clone(), ""));
    let mut chapter = ContentUnit::new("AsuraScans", "Chapter 1", named.url.clone(), card);
    chapter.pictures = vec![format!("{}/img/a.jpg", server.uri())];

    let location = download(&provider, &mut chapter).await.unwrap();

    let expected = dir.path().join("AsuraScans/Chapter 1");
    assert_eq!(location, expected);
    assert_eq!(std::fs::read(expected.join("00000.jpg")).unwrap(), b"first");
}

#[tokio::test]
async fn test_pictures_carry_work_referer() {
    let server = MockServer::start().await;
    let card_url = format!("{}/series/solo", server.uri());
    Mock::given(method("GET"))
        .and(path("/img/a.jpg"))
        .and(header("referer", card_url.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let provider = common::http_only_provider(&server, dir.path());
    let mut chapter = unit(&server, 1);
    chapter.pictures = vec![format!("{}/img/a.jpg", server.uri())];

    download(&provider, &mut chapter).await.unwrap();
}

#[tokio::test]
async fn test_download_discovers_pictures_first() {
    let server = MockServer::start().await;
    let pictures = vec![
        format!("{}/chapter/1/01.jpg", server.uri()),
        format!("{}/chapter/1/02.jpg", server.uri()),
    ];
    Mock::given(method("GET"))
        .and(path("/series/solo/chapter/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(img_page(&pictures)))
        .expect(1)
        .mount(&server)
        .await;
    serve_picture(&server, "/chapter/1/01.jpg", b"one", 1).await;
    serve_picture(&server, "/chapter/1/02.jpg", b"two", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let provider = common::http_only_provider(&server, dir.path());
    let mut chapter = unit(&server, 1);

    let location = download_truncated(&provider, &mut chapter, Some(4))
        .await
        .unwrap();
    assert_eq!(chapter.pictures, pictures);
    assert_eq!(location, dir.path().join("AsuraScans/Solo/Chap"));
    assert_eq!(std::fs::read(location.join("00001.jpg")).unwrap(), b"two");
}

#[tokio::test]
async fn test_download_many_isolates_failures() {
    let server = MockServer::start().await;
    serve_picture(&server, "/img/good.jpg", b"good", 1).await;
    Mock::given(method("GET"))
        .and(path("/img/bad.jpg"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(common::http_only_provider(&server, dir.path()));
    let mut good = unit(&server, 1);
    good.pictures = vec![format!("{}/img/good.jpg", server.uri())];
    let mut bad = unit(&server, 2);
    bad.pictures = vec![format!("{}/img/bad.jpg", server.uri())];

    let downloader = Downloader::new(provider.clone());
    let mut results = downloader.download_many(vec![good, bad], 2).await;
    results.sort_by(|a, b| a.unit.name.cmp(&b.unit.name));

    assert_eq!(results.len(), 2);
    assert_eq!(
        results[0].result.as_ref().unwrap(),
        &provider.session().storage_dir("Solo Leveling S2/Chapter 1")
    );
    assert!(matches!(
        results[1].result,
        Err(FetchError::PictureDownloadExhausted { .. })
    ));
}
