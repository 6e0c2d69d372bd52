//! Integration tests for the ingestor
//!
//! These tests use wiremock to create mock HTTP origins and exercise
//! the full fetch, persist, and flush cycle end-to-end.

use document_ingestor::config::Config;
use document_ingestor::crawler::{run_crawl, Coordinator, FailureReason};
use document_ingestor::state::RecordStatus;
use document_ingestor::storage::{sha256_hex, ContentWriter, MetadataStore, StorageError};
use document_ingestor::transform::{ContentTransform, ExtractedText, TextSink, TransformError};
use document_ingestor::IngestError;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::{tempdir, TempDir};
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing into `dir`
fn create_test_config(dir: &TempDir, seeds: Vec<String>) -> Config {
    let mut config = Config::new(
        seeds,
        dir.path().join("raw"),
        dir.path().join("crawl_metadata.json"),
    );
    config.transform.text_dir = dir.path().join("text");
    config
}

/// Runs one pass with a fresh store loaded from the configured metadata file
async fn run_once(config: &Config) -> Vec<document_ingestor::UrlOutcome> {
    run_crawl(config).await.expect("run should succeed")
}

fn read_metadata(path: &Path) -> Value {
    let content = std::fs::read_to_string(path).expect("metadata file should exist");
    serde_json::from_str(&content).expect("metadata should be valid JSON")
}

#[tokio::test]
async fn test_first_fetch_writes_content_and_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("hello")
                .insert_header("ETag", "abc"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let url = format!("{}/doc", server.uri());
    let config = create_test_config(&dir, vec![url.clone()]);

    let results = run_once(&config).await;

    assert_eq!(results.len(), 1);
    let record = results[0].record().expect("fetch should succeed");
    assert_eq!(record.status, RecordStatus::Fetched);
    assert_eq!(record.etag(), Some("abc"));
    assert_eq!(record.last_modified(), None);
    assert_eq!(record.content_hash, sha256_hex(b"hello"));

    let expected_path = ContentWriter::new(dir.path().join("raw")).path_for(&url);
    assert_eq!(record.storage_path, expected_path);
    assert_eq!(std::fs::read(&expected_path).unwrap(), b"hello");

    let metadata = read_metadata(&config.crawler.metadata_path);
    let entry = &metadata[&url];
    assert_eq!(entry["etag"], "abc");
    assert_eq!(entry["last_modified"], "");
    assert_eq!(entry["sha256"], sha256_hex(b"hello"));
    assert_eq!(entry["path"], expected_path.to_string_lossy().as_ref());
}

#[tokio::test]
async fn test_not_modified_reuses_record_and_is_idempotent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("hello")
                .insert_header("ETag", "abc")
                .insert_header("Last-Modified", "Wed, 21 Oct 2015 07:28:00 GMT"),
        )
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let url = format!("{}/doc", server.uri());
    let config = create_test_config(&dir, vec![url.clone()]);

    let first = run_once(&config).await;
    let first_record = first[0].record().unwrap().clone();
    let metadata_after_first = std::fs::read(&config.crawler.metadata_path).unwrap();
    let modified_after_first = std::fs::metadata(&first_record.storage_path)
        .unwrap()
        .modified()
        .unwrap();

    // The origin now only answers conditional requests carrying both headers
    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .and(header("If-None-Match", "abc"))
        .and(header_exists("If-Modified-Since"))
        .respond_with(ResponseTemplate::new(304))
        .expect(2)
        .mount(&server)
        .await;

    for _ in 0..2 {
        let results = run_once(&config).await;
        assert!(results[0].is_skipped());
        let record = results[0].record().expect("304 should reuse the record");

        assert_eq!(record.status, RecordStatus::Skipped);
        assert_eq!(record.storage_path, first_record.storage_path);
        assert_eq!(record.content_hash, first_record.content_hash);
        assert_eq!(record.validators, first_record.validators);

        let metadata = std::fs::read(&config.crawler.metadata_path).unwrap();
        assert_eq!(metadata, metadata_after_first);
    }

    let modified_now = std::fs::metadata(&first_record.storage_path)
        .unwrap()
        .modified()
        .unwrap();
    assert_eq!(modified_now, modified_after_first);
    assert_eq!(std::fs::read(&first_record.storage_path).unwrap(), b"hello");
}

#[tokio::test]
async fn test_bad_status_does_not_block_other_urls() {
    let server = MockServer::start().await;
    for (route, status) in [("/a", 200), ("/b", 500), ("/c", 200)] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_string(route))
            .mount(&server)
            .await;
    }

    let dir = tempdir().unwrap();
    let urls: Vec<String> = ["/a", "/b", "/c"]
        .iter()
        .map(|route| format!("{}{}", server.uri(), route))
        .collect();
    let config = create_test_config(&dir, urls.clone());

    let results = run_once(&config).await;

    let result_urls: Vec<_> = results.iter().map(|r| r.url.clone()).collect();
    assert_eq!(result_urls, urls);
    assert!(results[0].is_fetched());
    assert!(results[1].is_failed());
    assert_eq!(
        results[1].failure(),
        Some(&FailureReason::BadStatus { status: 500 })
    );
    assert!(results[2].is_fetched());

    let metadata = read_metadata(&config.crawler.metadata_path);
    let keys: Vec<_> = metadata.as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys.len(), 2);
    assert!(metadata.get(&urls[1]).is_none());

    let broken_path = ContentWriter::new(dir.path().join("raw")).path_for(&urls[1]);
    assert!(!broken_path.exists());
}

#[tokio::test]
async fn test_failed_refetch_keeps_prior_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("hello")
                .insert_header("ETag", "abc"),
        )
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let url = format!("{}/doc", server.uri());
    let config = create_test_config(&dir, vec![url.clone()]);
    run_once(&config).await;

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let results = run_once(&config).await;
    assert_eq!(
        results[0].failure(),
        Some(&FailureReason::BadStatus { status: 503 })
    );

    let metadata = read_metadata(&config.crawler.metadata_path);
    assert_eq!(metadata[&url]["etag"], "abc");
    assert_eq!(metadata[&url]["sha256"], sha256_hex(b"hello"));
}

#[tokio::test]
async fn test_validators_are_not_carried_over() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("v1")
                .insert_header("ETag", "abc"),
        )
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let url = format!("{}/doc", server.uri());
    let config = create_test_config(&dir, vec![url.clone()]);
    run_once(&config).await;

    // New content arrives without any validators
    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .and(header("If-None-Match", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("v2"))
        .expect(1)
        .mount(&server)
        .await;

    let results = run_once(&config).await;
    let record = results[0].record().unwrap();
    assert_eq!(record.status, RecordStatus::Fetched);
    assert_eq!(record.etag(), None);
    assert_eq!(record.content_hash, sha256_hex(b"v2"));

    let metadata = read_metadata(&config.crawler.metadata_path);
    assert_eq!(metadata[&url]["etag"], "");

    // With no validators on record the next request is unconditional
    server.reset().await;
    Mock::given(method("GET"))
        .and(header_exists("If-None-Match"))
        .respond_with(ResponseTemplate::new(304))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("v2"))
        .expect(1)
        .mount(&server)
        .await;

    let results = run_once(&config).await;
    assert!(results[0].is_fetched());
}

#[tokio::test]
async fn test_unexpected_not_modified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .respond_with(ResponseTemplate::new(304))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let url = format!("{}/doc", server.uri());
    let config = create_test_config(&dir, vec![url.clone()]);

    let results = run_once(&config).await;

    assert_eq!(
        results[0].failure(),
        Some(&FailureReason::UnexpectedNotModified)
    );
    let metadata = read_metadata(&config.crawler.metadata_path);
    assert!(metadata.as_object().unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_urls_fetch_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string("a"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).set_body_string("b"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let a = format!("{}/a", server.uri());
    let b = format!("{}/b", server.uri());
    let config = create_test_config(&dir, vec![a.clone(), b.clone(), a.clone()]);

    let results = run_once(&config).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].url, a);
    assert_eq!(results[1].url, b);
    assert_eq!(results[2].url, a);
    assert_eq!(results[0].result, results[2].result);

    let metadata = read_metadata(&config.crawler.metadata_path);
    assert_eq!(metadata.as_object().unwrap().len(), 2);
}

#[tokio::test]
async fn test_write_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let url = format!("{}/doc", server.uri());
    let config = create_test_config(&dir, vec![url.clone()]);

    // A non-empty directory squats on the content path
    let blocked = ContentWriter::new(&config.crawler.output_dir).path_for(&url);
    std::fs::create_dir_all(&blocked).unwrap();
    std::fs::write(blocked.join("keep"), b"x").unwrap();

    let results = run_once(&config).await;

    assert!(matches!(
        results[0].failure(),
        Some(FailureReason::WriteFailed(_))
    ));
    let metadata = read_metadata(&config.crawler.metadata_path);
    assert!(metadata.get(&url).is_none());
}

#[tokio::test]
async fn test_corrupt_metadata_aborts_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let config = create_test_config(&dir, vec![format!("{}/doc", server.uri())]);
    std::fs::write(&config.crawler.metadata_path, "{ not json").unwrap();

    let result = run_crawl(&config).await;

    assert!(matches!(
        result,
        Err(IngestError::Storage(StorageError::CorruptMetadata { .. }))
    ));
    assert_eq!(
        std::fs::read_to_string(&config.crawler.metadata_path).unwrap(),
        "{ not json"
    );
}

#[tokio::test]
async fn test_concurrency_limit_is_respected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("slow")
                .set_delay(Duration::from_millis(200)),
        )
        .expect(3)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let urls = (0..3).map(|i| format!("{}/doc{}", server.uri(), i)).collect();
    let mut config = create_test_config(&dir, urls);
    config.crawler.max_concurrent_fetches = 1;

    let start = Instant::now();
    let results = run_once(&config).await;

    assert!(results.iter().all(|r| r.is_fetched()));
    assert!(start.elapsed() >= Duration::from_millis(600));
}

#[tokio::test]
async fn test_timeout_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let mut config = create_test_config(&dir, vec![format!("{}/doc", server.uri())]);
    config.crawler.request_timeout_secs = 1;

    let results = run_once(&config).await;

    assert_eq!(results[0].failure(), Some(&FailureReason::Timeout));
}

#[tokio::test]
async fn test_cancellation_flushes_completed_work() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fast"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fast"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("slow")
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let fast = format!("{}/fast", server.uri());
    let slow = format!("{}/slow", server.uri());
    let config = create_test_config(&dir, vec![fast.clone(), slow.clone()]);

    let coordinator = Coordinator::new(&config).unwrap();
    let cancel = coordinator.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        cancel.cancel();
    });

    let mut store = MetadataStore::load(&config.crawler.metadata_path).await.unwrap();
    let start = Instant::now();
    let results = coordinator
        .run(config.crawler.seed_urls.clone(), &mut store)
        .await
        .unwrap();

    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(results[0].is_fetched());
    assert_eq!(results[1].failure(), Some(&FailureReason::Cancelled));

    let metadata = read_metadata(&config.crawler.metadata_path);
    assert!(metadata.get(&fast).is_some());
    assert!(metadata.get(&slow).is_none());
}

#[tokio::test]
async fn test_tampered_content_is_refetched_on_not_modified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("hello")
                .insert_header("ETag", "abc"),
        )
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let url = format!("{}/doc", server.uri());
    let config = create_test_config(&dir, vec![url.clone()]);
    let first = run_once(&config).await;
    let stored_path = first[0].record().unwrap().storage_path.clone();

    std::fs::write(&stored_path, b"tampered").unwrap();

    // Conditional requests get 304; the unconditional retry gets the body
    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .and(header("If-None-Match", "abc"))
        .respond_with(ResponseTemplate::new(304))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("hello")
                .insert_header("ETag", "abc"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let results = run_once(&config).await;
    let record = results[0].record().unwrap();

    assert_eq!(record.status, RecordStatus::Fetched);
    assert_eq!(std::fs::read(&stored_path).unwrap(), b"hello");

    let store = MetadataStore::load(&config.crawler.metadata_path).await.unwrap();
    assert_eq!(store.verify(&url).await.map(|i| i.is_intact()), Some(true));
}

#[tokio::test]
async fn test_text_extraction_writes_text_file() {
    let server = MockServer::start().await;
    let html = "<html><head><title>Annual Report</title><style>p{}</style></head>\
                <body><p>Hello world</p><script>var x = 1;</script></body></html>";
    Mock::given(method("GET"))
        .and(path("/report.html"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html)
                .insert_header("Content-Type", "text/html"),
        )
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let url = format!("{}/report.html", server.uri());
    let mut config = create_test_config(&dir, vec![url.clone()]);
    config.transform.enabled = true;

    let results = run_once(&config).await;
    let record = results[0].record().unwrap();

    let text_path = config.transform.text_dir.join(format!(
        "Annual_Report_{}.txt",
        &record.content_hash[..8]
    ));
    let text = std::fs::read_to_string(&text_path).expect("text file should exist");
    assert!(text.contains("Hello world"));
    assert!(!text.contains("var x"));

    // Raw bytes are stored untouched
    assert_eq!(std::fs::read(&record.storage_path).unwrap(), html.as_bytes());
}

/// Transform that blows up on every document
struct PanickingTransform;

impl ContentTransform for PanickingTransform {
    fn extract(&self, _url: &str, _bytes: &[u8]) -> Result<ExtractedText, TransformError> {
        panic!("extractor crashed")
    }
}

#[tokio::test]
async fn test_panicking_transform_does_not_lose_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let url = format!("{}/doc", server.uri());
    let config = create_test_config(&dir, vec![url.clone()]);
    let text_dir = dir.path().join("custom-text");

    let coordinator = Coordinator::new(&config)
        .unwrap()
        .with_text_sink(TextSink::new(&text_dir, Arc::new(PanickingTransform)));
    let mut store = MetadataStore::load(&config.crawler.metadata_path)
        .await
        .unwrap();

    let results = coordinator
        .run(config.crawler.seed_urls.clone(), &mut store)
        .await
        .unwrap();

    let record = results[0].record().expect("record survives a transform panic");
    assert_eq!(record.status, RecordStatus::Fetched);
    assert_eq!(std::fs::read(&record.storage_path).unwrap(), b"hello");

    let metadata = read_metadata(&config.crawler.metadata_path);
    assert_eq!(metadata[&url]["sha256"], sha256_hex(b"hello"));
    assert!(!text_dir.exists());
}
