//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and drive the full
//! crawl cycle end-to-end through the plain HTTP renderer.

use page_ripple::cache::{MemoryCache, ResponseCache};
use page_ripple::config::{parse_config, CrawlConfig, RendererConfig};
use page_ripple::crawler::{Coordinator, HttpRenderer, MarkdownConverter};
use page_ripple::output::{write_output, CrawlOutput};
use page_ripple::{PageOutcome, RippleError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Filler long enough for the extractor to treat a block as content
const BODY_TEXT: &str = "This paragraph is long enough to count as real article content for the extractor. \
                         It keeps going for a while so that the scorer sees more than a hundred characters.";

/// Builds a page with an article body and the given hrefs
fn html_page(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<li><a href="{}">{}</a></li>"#, href, href))
        .collect();

    format!(
        r#"<html><head><title>{title}</title></head><body>
        <nav>Navigation menu</nav>
        <article><h1>{title}</h1><p>{body}</p></article>
        <ul>{anchors}</ul>
        <footer>Footer text</footer>
        </body></html>"#,
        title = title,
        body = BODY_TEXT,
        anchors = anchors
    )
}

fn html_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, route: &str, title: &str, links: &[&str]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_response(html_page(title, links)))
        .mount(server)
        .await;
}

/// Fast crawl settings for tests
fn test_config() -> CrawlConfig {
    let mut config = CrawlConfig {
        max_depth: 2,
        max_pages: 20,
        workers: 3,
        page_timeout: Duration::from_secs(5),
        rate_limit: 0.0,
        delay: Duration::ZERO,
        ..CrawlConfig::default()
    };
    config.retry.initial_delay = Duration::from_millis(10);
    config.retry.max_delay = Duration::from_millis(50);
    config
}

fn http_coordinator(config: &CrawlConfig) -> Coordinator {
    let renderer = HttpRenderer::from_config(&RendererConfig::default(), config.page_timeout)
        .expect("Failed to build HTTP client");
    Coordinator::new(Arc::new(renderer), Arc::new(MarkdownConverter::new()))
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        "Home",
        &["/page1", "/page2", "https://external.example.org/"],
    )
    .await;
    mount_page(&server, "/page1", "Page One", &["/", "/page2"]).await;
    mount_page(&server, "/page2", "Page Two", &[]).await;

    let config = test_config();
    let report = http_coordinator(&config)
        .crawl_with_report(&base, &config, CancellationToken::new())
        .await
        .expect("Crawl failed");

    let results = &report.results;
    assert_eq!(results.len(), 3, "results: {:?}", results);

    let home = results
        .iter()
        .find(|r| r.depth == 0)
        .expect("Seed page missing");
    assert_eq!(home.url, format!("{}/", base));
    assert!(home.markdown.contains("Home"));
    assert!(home.markdown.contains("real article content"));
    assert!(!home.markdown.contains("Footer text"));

    for page in ["page1", "page2"] {
        let result = results
            .iter()
            .find(|r| r.url == format!("{}/{}", base, page))
            .unwrap_or_else(|| panic!("{} missing", page));
        assert_eq!(result.depth, 1);
    }

    // Each page requested exactly once
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    assert_eq!(report.stats.visited, 3);
}

#[tokio::test]
async fn test_crawl_with_depth_limit() {
    let server = MockServer::start().await;

    mount_page(&server, "/", "Level 0", &["/level1"]).await;
    mount_page(&server, "/level1", "Level 1", &["/level2"]).await;
    mount_page(&server, "/level2", "Level 2", &["/level3"]).await;
    mount_page(&server, "/level3", "Level 3", &[]).await;

    let mut config = test_config();
    config.max_depth = 1;

    let results = http_coordinator(&config)
        .crawl(&server.uri(), &config, CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.depth <= 1));
    assert!(!results.iter().any(|r| r.url.ends_with("/level2")));
}

#[tokio::test]
async fn test_max_pages_limit() {
    let server = MockServer::start().await;

    let children: Vec<String> = (0..10).map(|i| format!("/child{}", i)).collect();
    let child_refs: Vec<&str> = children.iter().map(String::as_str).collect();
    mount_page(&server, "/", "Hub", &child_refs).await;
    for child in &children {
        mount_page(&server, child, child, &[]).await;
    }

    let mut config = test_config();
    config.max_pages = 4;

    let results = http_coordinator(&config)
        .crawl(&server.uri(), &config, CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(results.len(), 4);
}

#[tokio::test]
async fn test_transient_errors_are_retried() {
    let server = MockServer::start().await;

    mount_page(&server, "/", "Home", &["/flaky"]).await;

    // Two 503s, then the real page
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_page(&server, "/flaky", "Eventually", &[]).await;

    let config = test_config();
    let report = http_coordinator(&config)
        .crawl_with_report(&server.uri(), &config, CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(report.results.len(), 2);
    assert!(report
        .results
        .iter()
        .any(|r| r.url.ends_with("/flaky") && r.markdown.contains("Eventually")));
}

#[tokio::test]
async fn test_permanent_errors_are_skipped() {
    let server = MockServer::start().await;

    mount_page(&server, "/", "Home", &["/missing", "/data.json", "/ok"]).await;
    mount_page(&server, "/ok", "Fine", &[]).await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"a":1}"#, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config();
    let report = http_coordinator(&config)
        .crawl_with_report(&server.uri(), &config, CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.stats.count(PageOutcome::RenderFailed), 2);
    assert_eq!(report.stats.count(PageOutcome::Processed), 2);
}

#[tokio::test]
async fn test_slow_page_times_out() {
    let server = MockServer::start().await;

    mount_page(&server, "/", "Home", &["/slow"]).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            html_response(html_page("Slow", &[])).set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let mut config = test_config();
    config.page_timeout = Duration::from_millis(200);
    config.retry.max_retries = 1;

    let started = Instant::now();
    let report = http_coordinator(&config)
        .crawl_with_report(&server.uri(), &config, CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.stats.count(PageOutcome::RenderFailed), 1);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_cancellation_keeps_partial_results() {
    let server = MockServer::start().await;

    mount_page(&server, "/", "Home", &["/slow"]).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            html_response(html_page("Slow", &[])).set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let mut config = test_config();
    config.page_timeout = Duration::from_secs(60);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let results = http_coordinator(&config)
        .crawl(&server.uri(), &config, cancel)
        .await
        .expect("Crawl failed");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].depth, 0);
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_rate_limit_spaces_requests() {
    let server = MockServer::start().await;

    mount_page(&server, "/", "Home", &["/a", "/b", "/c"]).await;
    for route in ["/a", "/b", "/c"] {
        mount_page(&server, route, route, &[]).await;
    }

    let mut config = test_config();
    // Burst of 2, then one request every 500ms
    config.rate_limit = 2.0;

    let started = Instant::now();
    let results = http_coordinator(&config)
        .crawl(&server.uri(), &config, CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(results.len(), 4);
    assert!(
        started.elapsed() >= Duration::from_millis(900),
        "4 requests at 2/s finished in {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn test_cache_is_populated() {
    let server = MockServer::start().await;

    mount_page(&server, "/", "Home", &["/a"]).await;
    mount_page(&server, "/a", "Page A", &[]).await;

    let config = test_config();
    let cache = Arc::new(MemoryCache::new());

    let results = http_coordinator(&config)
        .with_cache(cache.clone())
        .crawl(&server.uri(), &config, CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(results.len(), 2);
    for result in &results {
        assert_eq!(cache.get(&result.url).as_deref(), Some(result.markdown.as_str()));
    }
}

#[tokio::test]
async fn test_invalid_start_url() {
    let config = test_config();
    let result = http_coordinator(&config)
        .crawl("ftp://example.com/", &config, CancellationToken::new())
        .await;

    assert!(matches!(result, Err(RippleError::InvalidStartUrl { .. })));
}

#[tokio::test]
async fn test_crawl_to_markdown_directory() {
    let server = MockServer::start().await;

    mount_page(&server, "/", "Home", &["/docs/intro"]).await;
    mount_page(&server, "/docs/intro", "Intro", &[]).await;

    let config = test_config();
    let started = Instant::now();
    let results = http_coordinator(&config)
        .crawl(&server.uri(), &config, CancellationToken::new())
        .await
        .expect("Crawl failed");
    assert_eq!(results.len(), 2);

    let dir = TempDir::new().unwrap();
    let target = dir.path().join("site.md");
    let output = CrawlOutput::new(server.uri(), results, started.elapsed());
    let written = write_output(Some(target.as_path()), &output).expect("Failed to write output");
    assert_eq!(written, 2);

    let out_dir = dir.path().join("site");
    let intro = std::fs::read_to_string(out_dir.join("127_0_0_1_docs_intro.md"))
        .expect("Intro page file missing");
    assert!(intro.starts_with(&format!("# {}/docs/intro\n", server.uri())));
    assert!(intro.contains("**Depth:** 1  \n"));
    assert!(intro.contains("Intro"));
    assert!(out_dir.join("127_0_0_1_index.md").is_file());
}

#[tokio::test]
async fn test_crawl_with_file_config() {
    let server = MockServer::start().await;

    mount_page(&server, "/", "Home", &["/a"]).await;
    mount_page(&server, "/a", "Page A", &["/b"]).await;
    mount_page(&server, "/b", "Page B", &[]).await;

    let config = parse_config(
        r#"
        [crawler]
        max-depth = 1
        max-pages = 5
        workers = 2
        rate-limit = 0.0
        delay = 0

        [renderer]
        use-browser = false
        "#,
    )
    .expect("Failed to parse config");

    assert!(!config.renderer.use_browser);

    let results = http_coordinator(&config.crawler)
        .crawl(&server.uri(), &config.crawler, CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(results.len(), 2);
}
