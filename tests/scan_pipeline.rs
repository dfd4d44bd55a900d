//! Integration tests for the probe/walk/scan pipeline.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no
//! real network traffic is made. Listing pages are served from small
//! fixtures using the real marker classes.

use std::sync::Arc;

use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mlscan::models::{CategoryConfig, Config, StorageMode};
use mlscan::pipeline::run_scan;
use mlscan::services::ListingScanner;
use mlscan::storage::{FileStore, ProductStore};

/// Render a listing page with the given item numbers.
fn listing_page(ids: &[u32]) -> String {
    let items: String = ids
        .iter()
        .map(|n| {
            format!(
                r#"<li class="ui-search-layout__item">
                    <h2 class="ui-search-item__title">Producto {n}</h2>
                    <a href="/MLC-{n}-producto"></a>
                    <span class="andes-money-amount__fraction">10.000</span>
                    <img data-src="https://http2.mlstatic.com/{n}.webp">
                </li>"#
            )
        })
        .collect();
    format!("<html><body><ol>{items}</ol></body></html>")
}

/// A page using the fallback result containers instead of the layout list.
fn fallback_page(ids: &[u32]) -> String {
    let items: String = ids
        .iter()
        .map(|n| {
            format!(
                r#"<div class="ui-search-result">
                    <h2>Producto {n}</h2>
                    <a href="/MLC-{n}-producto"></a>
                </div>"#
            )
        })
        .collect();
    format!("<html><body>{items}</body></html>")
}

/// Config with one category pointing at the mock server.
///
/// The category URL carries the `_OrderId` token so page 2 resolves to
/// `/celulares_Desde_51_OrderId`.
fn test_config(server_uri: &str, max_pages: u32) -> Config {
    let mut config = Config::default();
    config.scanner.page_delay_ms = 0;
    config.scanner.site_origin = server_uri.to_string();
    config.categories = vec![CategoryConfig {
        name: "celulares".to_string(),
        url: format!("{server_uri}/celulares_OrderId"),
        max_pages,
    }];
    config.storage.mode = StorageMode::Stateless;
    config
}

fn scanner_for(config: &Config) -> ListingScanner {
    ListingScanner::new(Arc::new(config.clone())).unwrap()
}

// ---------------------------------------------------------------------------
// Probe semantics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn probe_reports_missing_on_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/celulares_OrderId"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), 1);
    let scanner = scanner_for(&config);

    let probe = scanner.probe_page(&config.categories[0].url).await;
    assert!(!probe.exists);
    assert_eq!(probe.item_count, 0);
    assert!(probe.responded);
}

#[tokio::test]
async fn probe_reports_missing_on_non_markup_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/celulares_OrderId"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"not\": \"html\"}"))
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), 1);
    let scanner = scanner_for(&config);

    let probe = scanner.probe_page(&config.categories[0].url).await;
    assert!(!probe.exists);
}

#[tokio::test]
async fn probe_counts_items_with_primary_selector() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/celulares_OrderId"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[1, 2, 3])))
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), 1);
    let scanner = scanner_for(&config);

    let probe = scanner.probe_page(&config.categories[0].url).await;
    assert!(probe.exists);
    assert_eq!(probe.item_count, 3);
}

#[tokio::test]
async fn probe_falls_back_to_secondary_selector() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/celulares_OrderId"))
        .respond_with(ResponseTemplate::new(200).set_body_string(fallback_page(&[1, 2])))
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), 1);
    let scanner = scanner_for(&config);

    let probe = scanner.probe_page(&config.categories[0].url).await;
    assert!(probe.exists);
    assert_eq!(probe.item_count, 2);
}

#[tokio::test]
async fn probe_reports_unresponsive_upstream() {
    // Nothing listens on port 1; connections are refused immediately.
    let dead_uri = "http://127.0.0.1:1";

    let config = test_config(dead_uri, 1);
    let scanner = scanner_for(&config);

    let probe = scanner.probe_page(&config.categories[0].url).await;
    assert!(!probe.exists);
    assert!(!probe.responded);
}

// ---------------------------------------------------------------------------
// Pagination walking
// ---------------------------------------------------------------------------

#[tokio::test]
async fn walker_stops_at_first_missing_page() {
    let server = MockServer::start().await;

    // Pages 1 and 2 exist; each is probed once and fetched once.
    Mock::given(method("GET"))
        .and(path("/celulares_OrderId"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[1, 2])))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/celulares_Desde_51_OrderId"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[3])))
        .expect(2)
        .mount(&server)
        .await;
    // Page 3 is probed once and never fetched.
    Mock::given(method("GET"))
        .and(path("/celulares_Desde_101_OrderId"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), 3);
    let scanner = scanner_for(&config);

    let walk = scanner.walk_category(&config.categories[0]).await;
    assert_eq!(walk.pages_walked, 2);

    let ids: Vec<&str> = walk.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["MLC1", "MLC2", "MLC3"]);
    assert_eq!(walk.records[0].page, 1);
    assert_eq!(walk.records[2].page, 2);

    // Dropping the server verifies the expected request counts.
}

#[tokio::test]
async fn walker_respects_max_pages_cap() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/celulares_OrderId"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[1])))
        .expect(2)
        .mount(&server)
        .await;
    // Page 2 would exist, but max_pages is 1 so it is never requested.

    let config = test_config(&server.uri(), 1);
    let scanner = scanner_for(&config);

    let walk = scanner.walk_category(&config.categories[0]).await;
    assert_eq!(walk.pages_walked, 1);
    assert_eq!(walk.records.len(), 1);
}

#[tokio::test]
async fn walker_skips_failed_fetch_but_continues() {
    let server = MockServer::start().await;

    // Page 1: the probe sees a healthy page, the full fetch gets a 500.
    Mock::given(method("GET"))
        .and(path("/celulares_OrderId"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[1])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/celulares_OrderId"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    // Page 2 works for both probe and fetch.
    Mock::given(method("GET"))
        .and(path("/celulares_Desde_51_OrderId"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[7])))
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), 2);
    let scanner = scanner_for(&config);

    let walk = scanner.walk_category(&config.categories[0]).await;
    // Page 1 yielded nothing but did not terminate the category.
    assert_eq!(walk.pages_walked, 2);
    let ids: Vec<&str> = walk.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["MLC7"]);
}

// ---------------------------------------------------------------------------
// Full scans and reconciliation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stateless_scan_returns_all_records_as_output() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/celulares_OrderId"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[1, 2])))
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), 1);
    let scanner = scanner_for(&config);

    let summary = run_scan(&scanner, None, &config).await.unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.new_total, 2);
    assert_eq!(summary.new_records.len(), 2);
    assert_eq!(summary.categories.len(), 1);
    assert_eq!(summary.categories[0].total, 2);
}

#[tokio::test]
async fn repeated_scan_against_file_store_reports_nothing_new() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/celulares_OrderId"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[1, 2, 3])))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let store = FileStore::new(tmp.path());
    let config = test_config(&server.uri(), 1);
    let scanner = scanner_for(&config);

    let first = run_scan(&scanner, Some(&store as &dyn ProductStore), &config)
        .await
        .unwrap();
    assert_eq!(first.new_total, 3);

    let second = run_scan(&scanner, Some(&store as &dyn ProductStore), &config)
        .await
        .unwrap();
    assert_eq!(second.total, 3);
    assert_eq!(second.new_total, 0);
    assert!(second.new_records.is_empty());
}

#[tokio::test]
async fn store_follows_the_listing_across_scans() {
    let server = MockServer::start().await;

    // First scan sees items 1 and 2; the listing then rotates to 2 and 9.
    Mock::given(method("GET"))
        .and(path("/celulares_OrderId"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[1, 2])))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/celulares_OrderId"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[2, 9])))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let store = FileStore::new(tmp.path());
    let config = test_config(&server.uri(), 1);
    let scanner = scanner_for(&config);

    run_scan(&scanner, Some(&store as &dyn ProductStore), &config)
        .await
        .unwrap();
    let second = run_scan(&scanner, Some(&store as &dyn ProductStore), &config)
        .await
        .unwrap();

    let new_ids: Vec<&str> = second.new_records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(new_ids, vec!["MLC9"]);

    // Item 1 vanished from the listing and therefore from the store.
    let universe = store.load().await.unwrap();
    assert!(!universe.contains_key("MLC1"));
    assert!(universe.contains_key("MLC2"));
    assert!(universe.contains_key("MLC9"));
}

#[tokio::test]
async fn scan_fails_when_upstream_never_responds() {
    // Nothing listens on port 1; connections are refused immediately.
    let dead_uri = "http://127.0.0.1:1";

    let config = test_config(dead_uri, 2);
    let scanner = scanner_for(&config);

    let result = run_scan(&scanner, None, &config).await;
    assert!(result.is_err(), "expected scan-level failure, got: {result:?}");
}

#[tokio::test]
async fn empty_but_reachable_listing_is_a_successful_empty_scan() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/celulares_OrderId"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><div class="ui-search-rescue">Sin resultados</div></body></html>"#,
        ))
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), 2);
    let scanner = scanner_for(&config);

    let summary = run_scan(&scanner, None, &config).await.unwrap();
    assert_eq!(summary.total, 0);
    assert_eq!(summary.categories[0].pages_walked, 0);
}
