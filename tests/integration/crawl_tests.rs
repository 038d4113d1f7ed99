//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full fetch, extract, and index cycle end-to-end.

use crate::common::{test_config, test_crawler, test_extractor, Broken, Passthrough};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tidepool::crawler::{Outcome, SkipReason};
use tidepool::storage::IndexStore;
use tidepool::{Extractor, QueryEngine, TidepoolError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EXAMPLE_PAGE: &str = r#"<html><head><title>Example Domain</title></head>
<body><h1>Example Domain</h1><p>This domain is for use in illustrative examples.</p></body></html>"#;

async fn mount_html(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_html_and_pdf_are_indexed() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_html(&server, "/", EXAMPLE_PAGE).await;
    Mock::given(method("GET"))
        .and(path("/files/doc.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("quarterly widget report", "application/pdf"),
        )
        .mount(&server)
        .await;

    let page_url = format!("{}/", base_url);
    let pdf_url = format!("{}/files/doc.pdf", base_url);

    let (crawler, store) = test_crawler(&test_config(), test_extractor());
    let started = Utc::now();
    let report = crawler.run(&[page_url.clone(), pdf_url.clone()]).await;

    assert_eq!(report.indexed(), 2);
    assert_eq!(store.count_pages().unwrap(), 2);
    for url in [&page_url, &pdf_url] {
        assert!(store.last_visit(url).unwrap().unwrap() >= started);
        assert!(store.get_page(url).unwrap().unwrap().crawled_at >= started);
    }

    let page = store.get_page(&page_url).unwrap().unwrap();
    assert_eq!(page.title, "Example Domain");
    assert!(page.body.contains("illustrative examples"));

    let pdf = store.get_page(&pdf_url).unwrap().unwrap();
    assert_eq!(pdf.title, "doc.pdf");
    assert_eq!(pdf.body, "quarterly widget report");

    let results = QueryEngine::new(store.clone()).search("doc").unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].url, pdf_url);
}

#[tokio::test]
async fn test_plain_text_is_indexed_with_path_title() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notes/todo.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("buy milk", "text/plain"))
        .mount(&server)
        .await;

    let url = format!("{}/notes/todo.txt", server.uri());
    let (crawler, store) = test_crawler(&test_config(), test_extractor());
    let report = crawler.run(&[url.clone()]).await;

    assert_eq!(report.indexed(), 1);
    let page = store.get_page(&url).unwrap().unwrap();
    assert_eq!(page.title, "todo.txt");
    assert_eq!(page.body, "buy milk");
}

#[tokio::test]
async fn test_recently_visited_url_is_not_fetched_again() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(EXAMPLE_PAGE, "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/", server.uri());
    let (crawler, store) = test_crawler(&test_config(), test_extractor());

    let first = crawler.run(&[url.clone()]).await;
    assert_eq!(first.indexed(), 1);

    let second = crawler.run(&[url.clone()]).await;
    assert_eq!(second.skipped(), 1);
    assert!(matches!(
        second.outcome_for(&url),
        Some(Outcome::Skipped(SkipReason::RecentlyVisited { .. }))
    ));
    assert_eq!(store.count_pages().unwrap(), 1);
}

#[tokio::test]
async fn test_recrawl_replaces_page_without_duplicating() {
    let server = MockServer::start().await;
    mount_html(&server, "/", EXAMPLE_PAGE).await;

    let url = format!("{}/", server.uri());
    let mut config = test_config();
    config.crawler.recrawl_interval_hours = 0;
    let (crawler, store) = test_crawler(&config, test_extractor());

    let first = crawler.run(&[url.clone()]).await;
    let first_page = store.get_page(&url).unwrap().unwrap();
    let second = crawler.run(&[url.clone()]).await;
    let second_page = store.get_page(&url).unwrap().unwrap();

    assert_eq!(first.indexed(), 1);
    assert_eq!(second.indexed(), 1);
    assert_eq!(store.count_pages().unwrap(), 1);
    assert_eq!(first_page.title, second_page.title);
    assert_eq!(first_page.body, second_page.body);
    assert!(second_page.crawled_at >= first_page.crawled_at);
    assert_eq!(QueryEngine::new(store.clone()).search("example").unwrap().len(), 1);
}

#[tokio::test]
async fn test_redirect_indexes_final_url_and_logs_both() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/b"))
        .mount(&server)
        .await;
    mount_html(&server, "/b", EXAMPLE_PAGE).await;

    let a = format!("{}/a", server.uri());
    let b = format!("{}/b", server.uri());
    let (crawler, store) = test_crawler(&test_config(), test_extractor());
    let started = Utc::now();
    let report = crawler.run(&[a.clone()]).await;

    match report.outcome_for(&a) {
        Some(Outcome::Indexed { final_url, .. }) => assert_eq!(final_url, &b),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(store.get_page(&b).unwrap().is_some());
    assert!(store.get_page(&a).unwrap().is_none());
    assert!(store.last_visit(&a).unwrap().unwrap() >= started);
    assert!(store.last_visit(&b).unwrap().unwrap() >= started);
}

#[tokio::test]
async fn test_redirect_fragment_is_dropped_from_keys() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/b#section"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(EXAMPLE_PAGE, "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let a = format!("{}/a", server.uri());
    let b = format!("{}/b", server.uri());
    let (crawler, store) = test_crawler(&test_config(), test_extractor());

    let first = crawler.run(&[a.clone()]).await;
    match first.outcome_for(&a) {
        Some(Outcome::Indexed { final_url, .. }) => assert_eq!(final_url, &b),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(store.last_visit(&b).unwrap().is_some());
    assert!(store.get_page(&b).unwrap().is_some());

    // The fragment-free form is now recently visited
    let second = crawler.run(&[b.clone()]).await;
    assert!(matches!(
        second.outcome_for(&b),
        Some(Outcome::Skipped(SkipReason::RecentlyVisited { .. }))
    ));
    assert_eq!(store.count_pages().unwrap(), 1);
}

#[tokio::test]
async fn test_redirect_into_disallowed_path_is_not_fetched() {
    let seed_host = MockServer::start().await;
    let other_host = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/go"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/private/doc", other_host.uri()).as_str()),
        )
        .mount(&seed_host)
        .await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("User-agent: *\nDisallow: /private", "text/plain"),
        )
        .mount(&other_host)
        .await;
    Mock::given(method("GET"))
        .and(path("/private/doc"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(EXAMPLE_PAGE, "text/html"))
        .expect(0)
        .mount(&other_host)
        .await;

    let seed = format!("{}/go", seed_host.uri());
    let hop = format!("{}/private/doc", other_host.uri());
    let mut config = test_config();
    config.crawler.respect_robots = true;
    let (crawler, store) = test_crawler(&config, test_extractor());
    let report = crawler.run(&[seed.clone()]).await;

    assert!(matches!(
        report.outcome_for(&seed),
        Some(Outcome::Failed(TidepoolError::RobotsDenied { url })) if url == &hop
    ));
    assert!(store.last_visit(&hop).unwrap().is_some());
    assert_eq!(store.count_pages().unwrap(), 0);
}

#[tokio::test]
async fn test_redirect_loop_fails_and_logs_hops() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/pong"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pong"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/ping"))
        .mount(&server)
        .await;

    let ping = format!("{}/ping", server.uri());
    let (crawler, store) = test_crawler(&test_config(), test_extractor());
    let report = crawler.run(&[ping.clone()]).await;

    assert!(matches!(
        report.outcome_for(&ping),
        Some(Outcome::Failed(TidepoolError::RedirectLoop { .. }))
    ));
    assert!(store
        .last_visit(&format!("{}/pong", server.uri()))
        .unwrap()
        .is_some());
    assert_eq!(store.count_pages().unwrap(), 0);
}

#[tokio::test]
async fn test_encoded_pdf_name_is_searchable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/annual%20report.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("revenue grew", "application/pdf"))
        .mount(&server)
        .await;

    let url = format!("{}/annual%20report.pdf", server.uri());
    let (crawler, store) = test_crawler(&test_config(), test_extractor());
    let report = crawler.run(&[url.clone()]).await;

    assert_eq!(report.indexed(), 1);
    assert_eq!(store.get_page(&url).unwrap().unwrap().title, "annual report.pdf");
    let results = QueryEngine::new(store.clone()).search("report").unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].url, url);
}

#[tokio::test]
async fn test_politeness_delay_spaces_requests_of_one_worker() {
    let server = MockServer::start().await;
    for route in ["/one", "/two", "/three"] {
        mount_html(&server, route, EXAMPLE_PAGE).await;
    }

    let mut config = test_config();
    config.crawler.parallelism = 1;
    config.crawler.politeness_delay_ms = 150;
    let (crawler, _store) = test_crawler(&config, test_extractor());

    let urls: Vec<String> = ["/one", "/two", "/three"]
        .iter()
        .map(|route| format!("{}{}", server.uri(), route))
        .collect();
    let report = crawler.run(&urls).await;

    assert_eq!(report.indexed(), 3);
    // Three requests from one worker wait out the delay twice
    assert!(report.elapsed >= Duration::from_millis(300));
}

#[tokio::test]
async fn test_unsupported_media_type_is_logged_not_indexed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0x89u8, b'P', b'N', b'G'], "image/png"))
        .mount(&server)
        .await;

    let url = format!("{}/logo.png", server.uri());
    let (crawler, store) = test_crawler(&test_config(), test_extractor());
    let report = crawler.run(&[url.clone()]).await;

    assert_eq!(report.failed(), 1);
    assert!(matches!(
        report.outcome_for(&url),
        Some(Outcome::Failed(TidepoolError::Extract(_)))
    ));
    assert!(store.get_page(&url).unwrap().is_none());
    assert!(store.last_visit(&url).unwrap().is_some());
}

#[tokio::test]
async fn test_error_status_is_logged_not_indexed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}/gone", server.uri());
    let (crawler, store) = test_crawler(&test_config(), test_extractor());
    let report = crawler.run(&[url.clone()]).await;

    assert!(matches!(
        report.outcome_for(&url),
        Some(Outcome::Failed(TidepoolError::HttpStatus { status: 404, .. }))
    ));
    assert_eq!(store.count_pages().unwrap(), 0);
    assert!(store.last_visit(&url).unwrap().is_some());
}

#[tokio::test]
async fn test_converter_failure_fails_only_that_url() {
    let server = MockServer::start().await;
    mount_html(&server, "/page", EXAMPLE_PAGE).await;
    Mock::given(method("GET"))
        .and(path("/doc.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("pdf text", "application/pdf"))
        .mount(&server)
        .await;

    let page = format!("{}/page", server.uri());
    let pdf = format!("{}/doc.pdf", server.uri());
    let extractor = Extractor::new(Arc::new(Broken), Arc::new(Passthrough));
    let (crawler, store) = test_crawler(&test_config(), extractor);
    let report = crawler.run(&[page.clone(), pdf.clone()]).await;

    assert!(report.outcome_for(&page).unwrap().is_failed());
    assert!(report.outcome_for(&pdf).unwrap().is_indexed());
    assert_eq!(store.count_pages().unwrap(), 1);
}

#[tokio::test]
async fn test_robots_disallowed_url_is_never_fetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("User-agent: *\nDisallow: /private", "text/plain"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(EXAMPLE_PAGE, "text/html"))
        .expect(0)
        .mount(&server)
        .await;
    mount_html(&server, "/public", EXAMPLE_PAGE).await;

    let private = format!("{}/private", server.uri());
    let public = format!("{}/public", server.uri());
    let mut config = test_config();
    config.crawler.respect_robots = true;
    let (crawler, store) = test_crawler(&config, test_extractor());
    let report = crawler.run(&[private.clone(), public.clone()]).await;

    assert!(matches!(
        report.outcome_for(&private),
        Some(Outcome::Failed(TidepoolError::RobotsDenied { .. }))
    ));
    assert!(report.outcome_for(&public).unwrap().is_indexed());
    assert!(store.last_visit(&private).unwrap().is_none());
}

#[tokio::test]
async fn test_robots_server_error_disallows_origin() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(EXAMPLE_PAGE, "text/html"))
        .expect(0)
        .mount(&server)
        .await;

    let url = format!("{}/", server.uri());
    let mut config = test_config();
    config.crawler.respect_robots = true;
    let (crawler, _store) = test_crawler(&config, test_extractor());
    let report = crawler.run(&[url]).await;

    assert_eq!(report.failed(), 1);
}

#[tokio::test]
async fn test_unreachable_host_does_not_stop_the_run() {
    let server = MockServer::start().await;
    mount_html(&server, "/", EXAMPLE_PAGE).await;

    let good = format!("{}/", server.uri());
    let bad = "http://127.0.0.1:9/".to_string();
    let (crawler, store) = test_crawler(&test_config(), test_extractor());
    let report = crawler.run(&[bad.clone(), good.clone()]).await;

    assert!(report.outcome_for(&bad).unwrap().is_failed());
    assert!(report.outcome_for(&good).unwrap().is_indexed());
    assert_eq!(store.count_pages().unwrap(), 1);
}

#[tokio::test]
async fn test_duplicate_and_invalid_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(EXAMPLE_PAGE, "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/", server.uri());
    let (crawler, _store) = test_crawler(&test_config(), test_extractor());
    let report = crawler
        .run(&[url.clone(), format!("{}#top", url), "not a url".to_string()])
        .await;

    assert_eq!(report.indexed(), 1);
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.failed(), 1);
}
