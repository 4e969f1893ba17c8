//! Integration tests for the harvester
//!
//! These tests use wiremock to serve a small marketplace and run the full
//! engine, HTTP fetcher and marketplace extractor end-to-end.

use market_harvest::config::Config;
use market_harvest::crawler::{HttpFetcher, MarketExtractor, PendingRecord};
use market_harvest::output::{JsonLinesWriter, RecordSink};
use market_harvest::{CrawlEngine, EngineOptions, NextResult};
use serde_json::Value;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app_page(name: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|l| format!(r#"<a href="{}">link</a>"#, l))
        .collect();
    format!(
        r#"<html><body><div class="page-content">
        <div class="breadcrumbs"><a href="/apps">Apps</a></div>
        <div class="apps details-page">
          <h1 class="doc-banner-title">{}</h1>
          <a class="doc-header-link" href="/developer?pub=Acme">Acme</a>
          <span class="buy-button-price">Install</span>
          {}
        </div></div></body></html>"#,
        name, anchors
    )
}

async fn serve(server: &MockServer, route: &str, id: Option<(&str, &str)>, body: String) {
    let mut mock = Mock::given(method("GET")).and(path(route));
    if let Some((key, value)) = id {
        mock = mock.and(query_param(key, value));
    }
    mock.respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn engine_for(server: &MockServer) -> CrawlEngine<HttpFetcher, MarketExtractor> {
    let base = format!("{}/", server.uri());
    let options = EngineOptions {
        base_url: Some(base.clone()),
        concurrency: 3,
        poll_interval: Duration::from_millis(10),
    };
    CrawlEngine::new(
        &base,
        options,
        HttpFetcher::new(&Config::default()).unwrap(),
        MarketExtractor::new(&base).unwrap(),
    )
    .unwrap()
}

async fn harvest(
    engine: &mut CrawlEngine<HttpFetcher, MarketExtractor>,
    sink: &mut impl RecordSink,
) -> Vec<PendingRecord> {
    tokio::time::timeout(Duration::from_secs(30), async {
        let mut records = Vec::new();
        loop {
            match engine.next_result().await {
                NextResult::Record(record) => {
                    sink.write_record(&record).unwrap();
                    records.push(record);
                }
                NextResult::Failed(e) => panic!("worker failed: {}", e),
                NextResult::Completed => return records,
            }
        }
    })
    .await
    .expect("harvest did not terminate")
}

#[tokio::test]
async fn test_full_harvest_writes_each_app_once() {
    let server = MockServer::start().await;

    serve(
        &server,
        "/",
        None,
        r#"<a href="/details?id=apps_topselling_free">Top free</a>
           <a href="/details?id=com.acme.a">A</a>
           <a href="/developer?pub=Acme">Acme</a>
           <a href="/about">About</a>"#
            .to_string(),
    )
    .await;
    serve(
        &server,
        "/details",
        Some(("id", "apps_topselling_free")),
        r#"<a href="/details?id=com.acme.a">A</a>
           <a href="/details?id=com.acme.gone">Gone</a>"#
            .to_string(),
    )
    .await;
    serve(
        &server,
        "/developer",
        Some(("pub", "Acme")),
        r#"<h1 class="page-banner-text">Apps by Acme</h1>
           <a href="/details?id=com.acme.b">B</a>"#
            .to_string(),
    )
    .await;
    serve(
        &server,
        "/details",
        Some(("id", "com.acme.a")),
        app_page("App A", &["/details?id=com.acme.b", "/details?id=com.acme.a&reviewId=7"]),
    )
    .await;
    serve(
        &server,
        "/details",
        Some(("id", "com.acme.b")),
        app_page("App B", &["/details?id=com.acme.a"]),
    )
    .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("apps.jsonl");
    let mut sink = JsonLinesWriter::create(&out).unwrap();

    let mut engine = engine_for(&server);
    let records = harvest(&mut engine, &mut sink).await;
    sink.finish().unwrap();

    let mut uids: Vec<&str> = records.iter().map(|r| r.entity_id()).collect();
    uids.sort();
    assert_eq!(uids, vec!["com.acme.a", "com.acme.b"]);

    let contents = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<Value> = contents
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    for line in &lines {
        assert_eq!(line["is_free"], Value::Bool(true));
        assert_eq!(
            line["dev_link"],
            Value::String(format!("{}/developer?pub=Acme", server.uri()))
        );
    }

    let stats = engine.stats();
    assert_eq!(stats.not_found, 1);
    assert_eq!(stats.records_emitted, 2);
    assert_eq!(stats.fetch_failures, 0);
    assert!(engine.next_result().await.is_completed());
}

#[tokio::test]
async fn test_pages_outside_apps_are_not_expanded() {
    let server = MockServer::start().await;

    serve(
        &server,
        "/",
        None,
        r#"<a href="/details?id=movie-1">Movie</a>"#.to_string(),
    )
    .await;
    serve(
        &server,
        "/details",
        Some(("id", "movie-1")),
        r#"<div class="page-content"><div class="breadcrumbs"><a>Movies</a></div>
           <div class="movies details-page"><a href="/details?id=movie-2">Next</a></div></div>"#
            .to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/details"))
        .and(query_param("id", "movie-2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut sink = JsonLinesWriter::new(Vec::new());
    let mut engine = engine_for(&server);
    let records = harvest(&mut engine, &mut sink).await;

    assert!(records.is_empty());
    assert_eq!(sink.records_written(), 0);

    let stats = engine.stats();
    assert_eq!(stats.dispatched, 2);
    assert_eq!(stats.pages_ignored, 1);
}

#[tokio::test]
async fn test_server_errors_are_counted_not_fatal() {
    let server = MockServer::start().await;

    serve(
        &server,
        "/",
        None,
        r#"<a href="/details?id=com.flaky">Flaky</a>
           <a href="/details?id=com.fine">Fine</a>"#
            .to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/details"))
        .and(query_param("id", "com.flaky"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    serve(
        &server,
        "/details",
        Some(("id", "com.fine")),
        app_page("Fine", &[]),
    )
    .await;

    let mut sink = JsonLinesWriter::new(Vec::new());
    let mut engine = engine_for(&server);
    let records = harvest(&mut engine, &mut sink).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].entity_id(), "com.fine");
    assert_eq!(engine.stats().fetch_failures, 1);
}
