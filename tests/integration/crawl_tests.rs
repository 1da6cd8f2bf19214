//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and exercise
//! redirect-chain resolution, sitemap discovery and crawl orchestration
//! end-to-end.

use sitemap_crawler::config::Config;
use sitemap_crawler::crawler::{ChainResolver, Coordinator};
use sitemap_crawler::scoring::{IssueKind, Metric, Severity};
use sitemap_crawler::sitemap::{SitemapEntry, SitemapResolver};
use sitemap_crawler::{CrawlerError, Winner};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with short timeouts and no retries
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.crawler.concurrency = 3;
    config.crawler.timeout_ms = 2_000;
    config.crawler.max_hops = 10;
    config.crawler.max_retries_per_hop = 0;
    config
}

/// HTML page scoring full marks on every content metric
fn complete_page(canonical: &str) -> String {
    format!(
        r#"<html><head>
        <title>{}</title>
        <meta name="description" content="{}">
        <meta property="og:image" content="/cover.png">
        <meta property="og:title" content="Cover">
        <meta property="og:description" content="About">
        <link rel="canonical" href="{}">
        </head><body><h1>Welcome</h1></body></html>"#,
        "t".repeat(60),
        "d".repeat(155),
        canonical
    )
}

fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into(), "text/html")
}

fn xml(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into(), "application/xml")
}

fn redirect(status: u16, location: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).insert_header("Location", location)
}

fn urlset(locs: &[String]) -> String {
    let mut body = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    body.push_str(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);
    for loc in locs {
        body.push_str(&format!("<url><loc>{}</loc><lastmod>2024-01-15</lastmod><priority>0.8</priority></url>", loc));
    }
    body.push_str("</urlset>");
    body
}

/// A local port with nothing listening on it
fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

/// Serves an HTML 200 whose body stops short of its Content-Length
///
/// Returns the page URL and a count of accepted connections.
async fn truncated_body_server() -> (String, Arc<AtomicUsize>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let accepted = Arc::clone(&connections);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            accepted.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let mut request = [0u8; 1024];
                let _ = socket.read(&mut request).await;
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 1000\r\n\r\n<title>Cut",
                    )
                    .await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{}/page", addr), connections)
}

#[tokio::test]
async fn test_redirect_chain_is_recorded_hop_by_hop() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/start"))
        .respond_with(redirect(301, "/middle"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/middle"))
        .respond_with(redirect(301, &format!("{}/final", base_url)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/final"))
        .respond_with(html("<html><body><p>No metadata here</p></body></html>"))
        .mount(&mock_server)
        .await;

    let resolver = ChainResolver::from_config(&create_test_config()).unwrap();
    let chain = resolver.resolve(&format!("{}/start", base_url)).await.unwrap();

    assert_eq!(chain.len(), 3);
    let statuses: Vec<_> = chain.hops().iter().map(|h| h.status_code).collect();
    assert_eq!(statuses, vec![Some(301), Some(301), Some(200)]);
    assert_eq!(chain.hops()[1].url, format!("{}/middle", base_url));
    assert_eq!(chain.hops()[2].url, format!("{}/final", base_url));

    // Response times are cumulative from the start of the chain
    for pair in chain.hops().windows(2) {
        assert!(pair[0].response_time_ms <= pair[1].response_time_ms);
    }

    let score = chain.score();
    assert_eq!(score.points(Metric::Redirects), 5);
    assert_eq!(score.points(Metric::Title), 0);
    assert_eq!(score.points(Metric::MetaDescription), 0);
}

#[tokio::test]
async fn test_redirect_without_location_ends_chain() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(ResponseTemplate::new(302))
        .mount(&mock_server)
        .await;

    let resolver = ChainResolver::from_config(&create_test_config()).unwrap();
    let chain = resolver.resolve(&format!("{}/moved", mock_server.uri())).await.unwrap();

    assert_eq!(chain.len(), 1);
    assert_eq!(chain.hops()[0].status_code, Some(302));
    assert!(!chain.hops()[0].is_error());
}

#[tokio::test]
async fn test_redirect_loop_is_bounded_and_flagged() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(redirect(302, "/b"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(redirect(302, "/a"))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.crawler.max_hops = 4;
    let resolver = ChainResolver::from_config(&config).unwrap();
    let chain = resolver.resolve(&format!("{}/a", mock_server.uri())).await.unwrap();

    // Four redirects plus the terminal record for the URL never fetched
    assert_eq!(chain.len(), 5);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 4);
    assert!(chain.has_loop());

    let final_hop = chain.final_hop().unwrap();
    assert!(final_hop.is_error());
    assert!(!final_hop.is_redirect());

    let issues = chain.issues();
    let loop_issue = issues.iter().find(|i| i.kind == IssueKind::RedirectLoop).unwrap();
    assert_eq!(loop_issue.severity, Severity::Critical);
    assert!(issues.iter().any(|i| i.kind == IssueKind::RedirectLimitExceeded));
}

#[tokio::test]
async fn test_connection_refused_becomes_error_hop() {
    let mut config = create_test_config();
    config.crawler.max_retries_per_hop = 1;
    let resolver = ChainResolver::from_config(&config).unwrap();

    let url = format!("http://127.0.0.1:{}/", closed_port());
    let chain = resolver.resolve(&url).await.unwrap();

    assert_eq!(chain.len(), 1);
    let hop = &chain.hops()[0];
    assert_eq!(hop.status_code, None);
    // One retry means one backoff of 1000ms before the terminal record
    assert!(hop.response_time_ms >= 1000);

    let error = hop.error.as_deref().unwrap();
    assert!(error.contains("Connection refused"), "unexpected error: {}", error);

    let issues = chain.issues();
    assert_eq!(issues[0].kind, IssueKind::ConnectionRefused);
    assert_eq!(chain.score().points(Metric::Redirects), 0);
}

#[tokio::test]
async fn test_timeouts_are_retried_per_hop() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("<html></html>").set_delay(Duration::from_millis(1_000)))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.crawler.timeout_ms = 150;
    config.crawler.max_retries_per_hop = 1;
    let resolver = ChainResolver::from_config(&config).unwrap();

    let chain = resolver.resolve(&format!("{}/slow", mock_server.uri())).await.unwrap();

    assert_eq!(chain.len(), 1);
    let error = chain.hops()[0].error.as_deref().unwrap();
    assert!(error.starts_with("Request timeout"), "unexpected error: {}", error);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 2);
    assert_eq!(chain.issues()[0].kind, IssueKind::NetworkTimeout);
}

#[tokio::test]
async fn test_retry_recovers_on_same_hop() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(html("<html></html>").set_delay(Duration::from_millis(1_000)))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(html("<html><title>Back</title></html>"))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.crawler.timeout_ms = 150;
    config.crawler.max_retries_per_hop = 2;
    let resolver = ChainResolver::from_config(&config).unwrap();

    let chain = resolver.resolve(&format!("{}/flaky", mock_server.uri())).await.unwrap();

    // The retry does not add a hop
    assert_eq!(chain.len(), 1);
    let hop = &chain.hops()[0];
    assert_eq!(hop.status_code, Some(200));
    assert_eq!(hop.page_title.as_deref(), Some("Back"));
    assert!(hop.response_time_ms >= 1000);
}

#[tokio::test]
async fn test_unreadable_body_keeps_status() {
    let (url, connections) = truncated_body_server().await;

    let mut config = create_test_config();
    config.crawler.max_retries_per_hop = 2;
    let resolver = ChainResolver::from_config(&config).unwrap();

    let chain = resolver.resolve(&url).await.unwrap();

    assert_eq!(chain.len(), 1);
    let hop = &chain.hops()[0];
    assert_eq!(hop.status_code, Some(200));
    assert_eq!(hop.error, None);
    assert_eq!(hop.page_title, None);
    // The status arrived, so the hop is not retried
    assert_eq!(connections.load(Ordering::SeqCst), 1);
    assert!(chain.issues().iter().any(|i| i.kind == IssueKind::MissingTitle));
}

#[tokio::test]
async fn test_network_issue_ignores_words_in_url_path() {
    let resolver = ChainResolver::from_config(&create_test_config()).unwrap();

    let url = format!("http://127.0.0.1:{}/blog/timeout-settings", closed_port());
    let chain = resolver.resolve(&url).await.unwrap();

    let kinds: Vec<_> = chain.issues().iter().map(|i| i.kind).collect();
    assert_eq!(kinds, vec![IssueKind::ConnectionRefused, IssueKind::NotHttps]);
}

#[tokio::test]
async fn test_sitemap_index_is_expanded_in_order() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(xml(format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <sitemap><loc>{0}/sitemap-posts.xml</loc></sitemap>
              <sitemap><loc>{0}/sitemap-missing.xml</loc></sitemap>
              <sitemap><loc>{0}/sitemap-pages.xml</loc></sitemap>
            </sitemapindex>"#,
            base_url
        )))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap-posts.xml"))
        .respond_with(xml(urlset(&[
            format!("{}/post-1", base_url),
            format!("{}/post-2", base_url),
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap-pages.xml"))
        .respond_with(xml(urlset(&[format!("{}/about", base_url)])))
        .mount(&mock_server)
        .await;

    let resolver = SitemapResolver::from_config(&create_test_config()).unwrap();
    let entries = resolver.resolve(&base_url).await.unwrap();

    let locs: Vec<_> = entries.iter().map(|e| e.loc.as_str()).collect();
    assert_eq!(
        locs,
        vec![
            format!("{}/post-1", base_url),
            format!("{}/post-2", base_url),
            format!("{}/about", base_url),
        ]
    );
    assert_eq!(entries[0].last_modified.as_deref(), Some("2024-01-15"));
    assert_eq!(entries[0].priority, Some(0.8));
}

#[tokio::test]
async fn test_sitemap_falls_back_to_index_path() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap_index.xml"))
        .respond_with(xml(urlset(&[
            format!("{}/one", base_url),
            format!("{}/two", base_url),
        ])))
        .mount(&mock_server)
        .await;

    let resolver = SitemapResolver::from_config(&create_test_config()).unwrap();
    let entries = resolver.resolve(&format!("{}/", base_url)).await.unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].loc, format!("{}/two", base_url));
}

#[tokio::test]
async fn test_gzip_sitemap_fallback_is_parsed() {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(urlset(&[format!("{}/zipped", base_url)]).as_bytes())
        .unwrap();
    let compressed = encoder.finish().unwrap();

    // The other candidates fall through to wiremock's default 404
    Mock::given(method("GET"))
        .and(path("/sitemap.xml.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(compressed, "application/x-gzip"))
        .mount(&mock_server)
        .await;

    let resolver = SitemapResolver::from_config(&create_test_config()).unwrap();
    let entries = resolver.resolve(&base_url).await.unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].loc, format!("{}/zipped", base_url));
    assert_eq!(entries[0].priority, Some(0.8));
}

#[tokio::test]
async fn test_plain_text_sitemap() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(format!("{0}/a\n\n{0}/b\n", base_url), "text/plain"),
        )
        .mount(&mock_server)
        .await;

    let resolver = SitemapResolver::from_config(&create_test_config()).unwrap();
    let entries = resolver.resolve(&base_url).await.unwrap();

    assert_eq!(entries, vec![
        SitemapEntry::new(format!("{}/a", base_url)),
        SitemapEntry::new(format!("{}/b", base_url)),
    ]);
}

#[tokio::test]
async fn test_missing_sitemap_lists_every_candidate() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let coordinator = Coordinator::new(&create_test_config()).unwrap();
    let error = coordinator.crawl_site(&base_url).await.unwrap_err();

    let CrawlerError::Sitemap(sitemap_error) = &error else {
        panic!("expected a sitemap error, got {:?}", error);
    };
    assert_eq!(
        sitemap_error.attempted_urls(),
        vec![
            format!("{}/sitemap.xml", base_url),
            format!("{}/sitemap_index.xml", base_url),
            format!("{}/wp-sitemap.xml", base_url),
            format!("{}/sitemap.xml.gz", base_url),
        ]
    );

    let message = error.to_string();
    assert!(message.starts_with("No sitemap found"));
    assert!(message.contains("sitemap not found (HTTP 404)"));
}

#[tokio::test]
async fn test_self_referencing_index_terminates() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(xml(format!(
            r#"<sitemapindex><sitemap><loc>{}/sitemap.xml</loc></sitemap></sitemapindex>"#,
            base_url
        )))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.sitemap.max_depth = 3;
    let resolver = SitemapResolver::from_config(&config).unwrap();

    let error = resolver.resolve(&base_url).await.unwrap_err();
    assert_eq!(error.attempted_urls().len(), 4);
}

#[tokio::test]
async fn test_full_crawl_scores_every_entry() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let pages: Vec<String> = (1..=3).map(|i| format!("{}/page{}", base_url, i)).collect();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(xml(urlset(&pages)))
        .mount(&mock_server)
        .await;
    for page in &pages {
        let page_path = page.trim_start_matches(base_url.as_str()).to_string();
        Mock::given(method("GET"))
            .and(path(page_path))
            .respond_with(html(complete_page(page)))
            .mount(&mock_server)
            .await;
    }

    let coordinator = Coordinator::new(&create_test_config()).unwrap();
    let report = coordinator.crawl_site(&base_url).await.unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.processed, 3);
    for (result, page) in report.results.iter().zip(&pages) {
        assert_eq!(&result.original_url, page);
        assert_eq!(result.last_modified.as_deref(), Some("2024-01-15"));
        assert_eq!(result.chain.len(), 1);

        // Everything but HTTPS: the mock server is plain HTTP
        let score = result.chain.score();
        assert_eq!(score.points(Metric::Https), 0);
        assert_eq!(score.total, 70);
    }
}

#[tokio::test]
async fn test_batch_preserves_order_and_isolates_failures() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("<title>slow</title>").set_delay(Duration::from_millis(300)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fast"))
        .respond_with(html("<title>fast</title>"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&mock_server)
        .await;

    let entries = vec![
        SitemapEntry::new(format!("{}/slow", base_url)),
        SitemapEntry::new("::not a url::"),
        SitemapEntry::new(format!("{}/fast", base_url)),
        SitemapEntry::new(format!("{}/gone", base_url)),
    ];

    let coordinator = Coordinator::new(&create_test_config()).unwrap();
    let results = coordinator.crawl_all(&entries).await;

    assert_eq!(results.len(), 4);
    for (result, entry) in results.iter().zip(&entries) {
        assert_eq!(result.original_url, entry.loc);
        assert_eq!(result.chain.len(), 1);
    }

    assert_eq!(results[0].chain.hops()[0].page_title.as_deref(), Some("slow"));
    assert!(results[1].chain.hops()[0].is_error());
    assert_eq!(results[2].chain.hops()[0].page_title.as_deref(), Some("fast"));
    assert_eq!(results[3].chain.hops()[0].status_code, Some(410));
}

#[tokio::test]
async fn test_batch_respects_concurrency_limit() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .respond_with(html("<title>page</title>").set_delay(Duration::from_millis(300)))
        .mount(&mock_server)
        .await;

    let entries: Vec<_> = (0..6)
        .map(|i| SitemapEntry::new(format!("{}/page-{}", base_url, i)))
        .collect();

    let mut config = create_test_config();
    config.crawler.concurrency = 2;
    let coordinator = Coordinator::new(&config).unwrap();

    let started = Instant::now();
    let results = coordinator.crawl_all(&entries).await;
    let elapsed = started.elapsed();

    // Six 300ms responses two at a time need at least three rounds
    assert!(elapsed >= Duration::from_millis(850), "finished in {:?}", elapsed);
    assert_eq!(results.len(), 6);
    assert!(results.iter().all(|r| r.chain.hops()[0].status_code == Some(200)));
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 6);
}

#[tokio::test]
async fn test_resolving_twice_gives_same_chain() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(redirect(301, "/new"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html(complete_page(&format!("{}/new", base_url))))
        .mount(&mock_server)
        .await;

    let resolver = ChainResolver::from_config(&create_test_config()).unwrap();
    let url = format!("{}/old", base_url);
    let first = resolver.resolve(&url).await.unwrap();
    let second = resolver.resolve(&url).await.unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(first.len(), second.len());
    for (a, b) in first.hops().iter().zip(second.hops()) {
        assert_eq!(a.url, b.url);
        assert_eq!(a.status_code, b.status_code);
        assert_eq!(a.page_title, b.page_title);
        assert_eq!(a.meta_description, b.meta_description);
    }
    assert_eq!(first.score().total, second.score().total);
}

#[tokio::test]
async fn test_single_url_has_no_sitemap_metadata() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<title>Home</title>"))
        .mount(&mock_server)
        .await;

    let coordinator = Coordinator::new(&create_test_config()).unwrap();
    let result = coordinator.crawl_single(&mock_server.uri()).await.unwrap();

    assert_eq!(result.last_modified, None);
    assert_eq!(result.priority, None);
    assert_eq!(result.chain.hops()[0].page_title.as_deref(), Some("Home"));
}

#[tokio::test]
async fn test_compare_two_sites() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/good"))
        .respond_with(html(complete_page(&format!("{}/good", base_url))))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bad"))
        .respond_with(redirect(301, "/missing"))
        .mount(&mock_server)
        .await;

    let coordinator = Coordinator::new(&create_test_config()).unwrap();
    let report = coordinator
        .compare_sites(&format!("{}/good", base_url), &format!("{}/bad", base_url))
        .await
        .unwrap();

    assert_eq!(report.site_a.score.total, 70);
    assert_eq!(report.site_b.chain.len(), 2);
    assert_eq!(report.site_b.chain.final_hop().unwrap().status_code, Some(404));
    assert_eq!(report.winner, Winner::SiteA);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["winner"], "siteA");
    assert_eq!(json["siteB"]["chain"][1]["statusCode"], 404);
}
