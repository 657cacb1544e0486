//! Fetch worker behavior against a local mock HTTP server.

use std::sync::Arc;

use webcrawler::config::Config;
use webcrawler::fetch::{build_client, run_fetch, FetchContext, FetchJob, Pacer};
use webcrawler::storage::Storage;

fn temp_storage() -> (Arc<Storage>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(Storage::open(&dir.path().join("crawler.db")).unwrap());
    (storage, dir)
}

fn test_config() -> Arc<Config> {
    Arc::new(Config {
        max_page_size: 1024,
        max_depth: 2,
        ..Config::default()
    })
}

#[tokio::test]
async fn successful_fetch_stores_page_and_enqueues_links() {
    let mut server = mockito::Server::new_async().await;
    let page = format!(
        "<html><body><a href=\"/child\">child</a><a href=\"report.pdf\">skip me</a></body></html>"
    );
    let mock = server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(&page)
        .create_async()
        .await;

    let (storage, _dir) = temp_storage();
    let config = test_config();
    let session = storage.create_session(&server.url()).unwrap();

    let ctx = FetchContext {
        client: build_client(&config).unwrap(),
        storage: storage.clone(),
        config: config.clone(),
        pacer: Pacer::new(0),
        session_id: session.id,
    };

    run_fetch(
        &ctx,
        FetchJob {
            url: format!("{}/", server.url()),
            depth: 0,
        },
    )
    .await;

    mock.assert_async().await;
    assert!(storage
        .is_page_stored(session.id, &format!("{}/", server.url()))
        .unwrap());

    let child = format!("{}/child", server.url());
    let child_row = storage.frontier_row(session.id, &child).unwrap();
    assert!(child_row.is_some(), "relative link should be enqueued");

    let skipped = storage
        .frontier_row(session.id, &format!("{}/report.pdf", server.url()))
        .unwrap();
    assert!(skipped.is_none(), "pdf link should be filtered by skip patterns");
}

#[tokio::test]
async fn non_success_response_is_recorded_as_error_with_no_page() {
    let mut server = mockito::Server::new_async().await;
    let mock = server.mock("GET", "/").with_status(500).create_async().await;

    let (storage, _dir) = temp_storage();
    let config = test_config();
    let session = storage.create_session(&server.url()).unwrap();

    let ctx = FetchContext {
        client: build_client(&config).unwrap(),
        storage: storage.clone(),
        config: config.clone(),
        pacer: Pacer::new(0),
        session_id: session.id,
    };

    run_fetch(
        &ctx,
        FetchJob {
            url: format!("{}/", server.url()),
            depth: 0,
        },
    )
    .await;

    mock.assert_async().await;
    assert!(!storage
        .is_page_stored(session.id, &format!("{}/", server.url()))
        .unwrap());

    let stats = storage.session_stats(session.id).unwrap();
    assert_eq!(stats.errors, 1);
    assert_eq!(stats.pages_crawled, 0);
}

#[tokio::test]
async fn oversize_body_is_aborted_without_storing_a_page() {
    let mut server = mockito::Server::new_async().await;
    let huge_body = "x".repeat(4096);
    let mock = server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(&huge_body)
        .create_async()
        .await;

    let (storage, _dir) = temp_storage();
    let config = test_config(); // max_page_size: 1024, smaller than the body
    let session = storage.create_session(&server.url()).unwrap();

    let ctx = FetchContext {
        client: build_client(&config).unwrap(),
        storage: storage.clone(),
        config: config.clone(),
        pacer: Pacer::new(0),
        session_id: session.id,
    };

    run_fetch(
        &ctx,
        FetchJob {
            url: format!("{}/", server.url()),
            depth: 0,
        },
    )
    .await;

    mock.assert_async().await;
    assert!(!storage
        .is_page_stored(session.id, &format!("{}/", server.url()))
        .unwrap());
    let stats = storage.session_stats(session.id).unwrap();
    assert_eq!(stats.errors, 1);
}

#[tokio::test]
async fn links_past_max_depth_are_not_enqueued() {
    let mut server = mockito::Server::new_async().await;
    let page = "<html><body><a href=\"/deeper\">deeper</a></body></html>";
    let mock = server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(page)
        .create_async()
        .await;

    let (storage, _dir) = temp_storage();
    let mut config_value = Config::default();
    config_value.max_depth = 0;
    let config = Arc::new(config_value);
    let session = storage.create_session(&server.url()).unwrap();

    let ctx = FetchContext {
        client: build_client(&config).unwrap(),
        storage: storage.clone(),
        config: config.clone(),
        pacer: Pacer::new(0),
        session_id: session.id,
    };

    run_fetch(
        &ctx,
        FetchJob {
            url: format!("{}/", server.url()),
            depth: 0,
        },
    )
    .await;

    mock.assert_async().await;
    let deeper = storage
        .frontier_row(session.id, &format!("{}/deeper", server.url()))
        .unwrap();
    assert!(deeper.is_none(), "depth 0 is already at max_depth, child must not enqueue");
}
