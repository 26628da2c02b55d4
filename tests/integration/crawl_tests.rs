//! Integration tests for the harvester
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full listing → detail → image → export cycle end-to-end.

use std::time::Duration;
use sumi_harvest::config::{
    parse_config, Config, CrawlerConfig, ImageConfig, OutputConfig, OutputFormat, SchemaConfig,
    SiteConfig, UserAgentConfig,
};
use sumi_harvest::crawler::{
    build_orchestrator, run, FetchError, ImageError, StopReason, Termination,
};
use sumi_harvest::output::export_report;
use sumi_harvest::records::{DetailOutcome, ImageOutcome, UNAVAILABLE, UNKNOWN};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_AGENT: &str = "TestHarvester/1.0 (+https://example.com/bot)";

/// Creates a test configuration pointed at the mock server
fn create_test_config(base_url: &str, work_dir: &TempDir) -> Config {
    Config {
        site: SiteConfig {
            base_url: base_url.to_string(),
            listing_template: format!("{}/search?page={{page}}", base_url),
        },
        crawler: CrawlerConfig {
            max_pages: None,
            detail_concurrency: 4,
            page_delay_ms: 0,
            request_timeout_ms: 2_000,
            recycle_client_every: None,
            dedupe_by_url: false,
        },
        user_agent: UserAgentConfig {
            value: USER_AGENT.to_string(),
        },
        schema: SchemaConfig::default(),
        images: ImageConfig {
            enabled: false,
            directory: work_dir.path().join("images").display().to_string(),
        },
        output: OutputConfig {
            path: work_dir.path().join("products.csv").display().to_string(),
            format: OutputFormat::Csv,
        },
    }
}

/// Listing page markup with one entry per `(path, title)` pair
fn listing_html(items: &[(&str, &str)]) -> String {
    let entries: String = items
        .iter()
        .map(|(path, title)| {
            format!(
                r#"<div class="search-title-row">
                     <a href="{path}"><h3>{title}</h3></a>
                     <div class="price-details">PKR 1,200</div>
                     <img class="lazy pic" src="/placeholder.gif" data-original="{path}.jpg">
                   </div>"#
            )
        })
        .collect();
    format!("<html><body><main>{}</main></body></html>", entries)
}

fn detail_html(manufacturer: &str, details: &str) -> String {
    format!(
        r#"<html><body>
             <h5 class="nomargin">{manufacturer}</h5>
             <div class="primary-lang"><p>{details}</p></div>
           </body></html>"#
    )
}

async fn mount_listing(server: &MockServer, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", page))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, item_path: &str, body: String, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(item_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

async fn mount_image(server: &MockServer, image_path: &str) {
    Mock::given(method("GET"))
        .and(path(image_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0]))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_harvest_with_partial_failures() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let work_dir = TempDir::new().unwrap();

    mount_listing(
        &mock_server,
        "1",
        listing_html(&[
            ("/p/a", "Brake Pads"),
            ("/p/b", "Air Filter"),
            ("/p/c", "Spark Plug"),
        ]),
    )
    .await;
    mount_listing(&mock_server, "2", listing_html(&[])).await;

    mount_detail(
        &mock_server,
        "/p/a",
        detail_html("Toyota", "Genuine part"),
        Duration::ZERO,
    )
    .await;
    // Slower than the request timeout
    mount_detail(
        &mock_server,
        "/p/b",
        detail_html("Honda", "Never seen"),
        Duration::from_secs(3),
    )
    .await;
    mount_detail(
        &mock_server,
        "/p/c",
        detail_html("NGK", "Iridium tip"),
        Duration::ZERO,
    )
    .await;

    mount_image(&mock_server, "/p/a.jpg").await;
    mount_image(&mock_server, "/p/b.jpg").await;
    // /p/c.jpg is not mounted and answers 404

    let mut config = create_test_config(&base_url, &work_dir);
    config.crawler.request_timeout_ms = 500;
    config.images.enabled = true;

    let report = run(&config, None, 4).await.expect("crawl setup failed");

    assert_eq!(
        report.termination,
        Termination::Clean(StopReason::EmptyPage { page_index: 2 })
    );
    assert_eq!(report.termination.exit_code(), 0);
    assert_eq!(report.pages_crawled, 1);
    assert_eq!(report.record_count(), 3);

    let titles: Vec<&str> = report.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Brake Pads", "Air Filter", "Spark Plug"]);

    let a = &report.records[0];
    assert_eq!(a.url, format!("{}/p/a", base_url));
    assert_eq!(a.price, "PKR 1,200");
    assert_eq!(a.manufacturer(), "Toyota");
    assert_eq!(a.details(), "Genuine part");
    assert!(matches!(a.image, ImageOutcome::Stored(_)));
    assert!(std::path::Path::new(a.image_column()).exists());

    let b = &report.records[1];
    assert!(matches!(
        &b.detail,
        DetailOutcome::Failed(FetchError::Timeout { .. })
    ));
    assert_eq!(b.manufacturer(), UNKNOWN);
    assert_eq!(b.details(), UNKNOWN);
    assert!(matches!(b.image, ImageOutcome::Stored(_)));

    let c = &report.records[2];
    assert_eq!(c.manufacturer(), "NGK");
    assert!(matches!(
        &c.image,
        ImageOutcome::Failed(ImageError::Fetch(FetchError::NonSuccessStatus {
            status: 404,
            ..
        }))
    ));
    assert_eq!(c.image_column(), UNAVAILABLE);
}

#[tokio::test]
async fn test_listing_failure_keeps_earlier_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let work_dir = TempDir::new().unwrap();

    mount_listing(&mock_server, "1", listing_html(&[("/p/a", "Brake Pads")])).await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    mount_detail(
        &mock_server,
        "/p/a",
        detail_html("Toyota", "Genuine part"),
        Duration::ZERO,
    )
    .await;

    let config = create_test_config(&base_url, &work_dir);
    let report = run(&config, None, 2).await.unwrap();

    match &report.termination {
        Termination::ListingFailed { page_index, error } => {
            assert_eq!(*page_index, 2);
            assert!(matches!(
                error,
                FetchError::NonSuccessStatus { status: 500, .. }
            ));
        }
        other => panic!("Expected listing failure, got {:?}", other),
    }
    assert!(!report.termination.is_clean());
    assert_eq!(report.termination.exit_code(), 2);

    assert_eq!(report.record_count(), 1);
    assert_eq!(report.records[0].manufacturer(), "Toyota");
    // Images disabled: the listing URL is carried through
    assert_eq!(
        report.records[0].image_column(),
        format!("{}/p/a.jpg", base_url)
    );
}

#[tokio::test]
async fn test_page_limit_stops_before_next_page() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let work_dir = TempDir::new().unwrap();

    mount_listing(&mock_server, "1", listing_html(&[("/p/a", "Brake Pads")])).await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(&[("/p/z", "Never")])))
        .expect(0)
        .mount(&mock_server)
        .await;
    mount_detail(
        &mock_server,
        "/p/a",
        detail_html("Toyota", "Genuine part"),
        Duration::ZERO,
    )
    .await;

    let config = create_test_config(&base_url, &work_dir);
    let report = run(&config, Some(1), 2).await.unwrap();

    assert_eq!(
        report.termination,
        Termination::Clean(StopReason::PageLimitReached { limit: 1 })
    );
    assert_eq!(report.record_count(), 1);
}

#[tokio::test]
async fn test_requests_carry_configured_user_agent() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let work_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(&[])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, &work_dir);
    let report = run(&config, None, 1).await.unwrap();

    assert_eq!(
        report.termination,
        Termination::Clean(StopReason::EmptyPage { page_index: 1 })
    );
    assert_eq!(report.record_count(), 0);
}

#[tokio::test]
async fn test_client_recycling_keeps_crawling() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let work_dir = TempDir::new().unwrap();

    for page in 1..=3 {
        let item = format!("/p/{}", page);
        mount_listing(
            &mock_server,
            &page.to_string(),
            listing_html(&[(item.as_str(), "Item")]),
        )
        .await;
        mount_detail(
            &mock_server,
            &item,
            detail_html("Maker", "Details"),
            Duration::ZERO,
        )
        .await;
    }
    mount_listing(&mock_server, "4", listing_html(&[])).await;

    let mut config = create_test_config(&base_url, &work_dir);
    config.crawler.recycle_client_every = Some(1);

    let mut orchestrator = build_orchestrator(&config).unwrap();
    let report = orchestrator.run(None, 2).await;

    assert!(report.termination.is_clean());
    assert_eq!(report.pages_crawled, 3);
    let pages: Vec<u32> = report.records.iter().map(|r| r.page_index).collect();
    assert_eq!(pages, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_toml_config_to_csv_export() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let work_dir = TempDir::new().unwrap();
    let csv_path = work_dir.path().join("out").join("products.csv");

    mount_listing(
        &mock_server,
        "1",
        listing_html(&[("/p/a", "Brake Pads"), ("/p/b", "Air Filter")]),
    )
    .await;
    mount_listing(&mock_server, "2", listing_html(&[])).await;
    mount_detail(
        &mock_server,
        "/p/a",
        detail_html("Toyota", "Genuine part"),
        Duration::ZERO,
    )
    .await;
    // /p/b has no detail page and answers 404

    let toml = format!(
        r#"
[site]
base-url = "{base}"
listing-template = "{base}/search?page={{page}}"

[crawler]
detail-concurrency = 2
page-delay-ms = 0
request-timeout-ms = 2000

[user-agent]
value = "{ua}"

[output]
path = "{path}"
format = "csv"
"#,
        base = base_url,
        ua = USER_AGENT,
        path = csv_path.display()
    );
    let config = parse_config(&toml).expect("config should parse");

    let report = run(&config, config.crawler.max_pages, 2).await.unwrap();
    let written = export_report(&config.output, None, &report, "hash").unwrap();
    assert_eq!(written, 2);

    let mut reader = csv::Reader::from_path(&csv_path).unwrap();
    let headers: Vec<String> = reader
        .headers()
        .unwrap()
        .iter()
        .map(|h| h.to_string())
        .collect();
    assert_eq!(
        headers,
        vec!["title", "url", "price", "image", "manufacturer", "details"]
    );

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "Brake Pads");
    assert_eq!(&rows[0][2], "PKR 1,200");
    assert_eq!(&rows[0][4], "Toyota");
    assert_eq!(&rows[1][0], "Air Filter");
    assert_eq!(&rows[1][4], UNKNOWN);
    assert_eq!(&rows[1][5], UNKNOWN);
}
