mod common;

use async_trait::async_trait;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use nox::llm::{GenerationSettings, LlmHandle, ScriptedTransport};
use nox::pipeline::{Document, Scraper, SearchEngine, SearchResult, StageRunner};
use nox::research::{HttpScraper, HttpSearchEngine, PromptedReasoner};
use nox::streaming::CollectingSink;
use pretty_assertions::assert_eq;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;

const MARKET: &str = "http://marketabcdefghijklmnopqrstuvwxyz234567abcdefghijklmnop.onion";
const FORUM: &str = "http://forumabcdefghijklmnopqrstuvwxyz234567abcdefghijklmnop.onion";
const PASTE: &str = "http://pasteabcdefghijklmnopqrstuvwxyz234567abcdefghijklmnop.onion";

async fn ahmia(Query(params): Query<HashMap<String, String>>) -> Html<String> {
    let q = params.get("q").cloned().unwrap_or_default();
    Html(format!(
        r#"<html><body><h1>Results for {q}</h1><ol>
            <li><a href="{MARKET}/">Card <em>market</em></a></li>
            <li><a href="{FORUM}/threads/1">Carding forum</a></li>
            <li><a href="https://clearnet.example/">Not onion</a></li>
        </ol></body></html>"#
    ))
}

async fn torch() -> Html<String> {
    Html(format!(
        r#"<a href="{FORUM}/threads/1">Carding forum mirror</a>
           <a href="{PASTE}">Paste</a>"#
    ))
}

fn search_router() -> Router {
    Router::new()
        .route("/ahmia", get(ahmia))
        .route("/torch", get(torch))
        .route("/broken", get(|| async { (StatusCode::BAD_GATEWAY, "tor circuit failed") }))
}

#[tokio::test]
async fn test_search_merges_engines_and_skips_failures() {
    let base = common::spawn(search_router()).await;
    let engine = HttpSearchEngine::new(
        Client::new(),
        vec![
            format!("{}/ahmia?q={{query}}", base),
            format!("{}/broken?q={{query}}", base),
            format!("{}/torch?q={{query}}", base),
            format!("{}/ahmia?q={{query}}", common::dead_base_url().await),
        ],
    )
    .unwrap();

    let results = engine.search("stolen cards", 4).await.unwrap();
    let links: Vec<&str> = results.iter().map(|r| r.link.as_str()).collect();
    let forum_thread = format!("{}/threads/1", FORUM);
    assert_eq!(links, vec![MARKET, forum_thread.as_str(), PASTE]);
    assert_eq!(results[0].title, "Card market");
    // first engine wins on duplicate links
    assert_eq!(results[1].title, "Carding forum");
}

#[tokio::test]
async fn test_search_with_no_reachable_engine_is_empty() {
    let dead = common::dead_base_url().await;
    let engine =
        HttpSearchEngine::new(Client::new(), vec![format!("{}/?q={{query}}", dead)]).unwrap();
    assert!(engine.search("anything", 2).await.unwrap().is_empty());
}

fn page_router() -> Router {
    Router::new()
        .route(
            "/listing",
            get(|| async {
                Html(
                    "<html><head><script>track()</script><style>p{}</style></head>\
                     <body><p>Vendor &amp; escrow: BTC only</p></body></html>",
                )
            }),
        )
        .route("/empty", get(|| async { Html("<html><body>  </body></html>") }))
        .route("/gone", get(|| async { StatusCode::NOT_FOUND }))
        .route("/long", get(|| async { Html("x".repeat(500)) }))
}

#[tokio::test]
async fn test_scraper_keeps_order_and_drops_bad_pages() {
    let base = common::spawn(page_router()).await;
    let scraper = HttpScraper::new(Client::new(), 100).unwrap();
    let results = vec![
        SearchResult::new("long", format!("{}/long", base)),
        SearchResult::new("gone", format!("{}/gone", base)),
        SearchResult::new("empty", format!("{}/empty", base)),
        SearchResult::new("listing", format!("{}/listing", base)),
    ];

    let documents = scraper.scrape(&results, 3).await.unwrap();
    let titles: Vec<&str> = documents.iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, vec!["long", "listing"]);
    assert_eq!(documents[0].content.chars().count(), 100);
    assert_eq!(documents[1].content, "Vendor & escrow: BTC only");
    assert_eq!(documents[1].link, format!("{}/listing", base));
}

/// Returns one canned page per result without touching the network.
struct CannedScraper;

#[async_trait]
impl Scraper for CannedScraper {
    async fn scrape(
        &self,
        results: &[SearchResult],
        _concurrency: usize,
    ) -> anyhow::Result<Vec<Document>> {
        Ok(results
            .iter()
            .map(|r| Document {
                title: r.title.clone(),
                link: r.link.clone(),
                content: format!("contents of {}", r.title),
            })
            .collect())
    }
}

#[tokio::test]
async fn test_run_with_http_search_and_prompted_reasoner() {
    let base = common::spawn(search_router()).await;
    let search = HttpSearchEngine::new(
        Client::new(),
        vec![format!("{}/ahmia?q={{query}}", base), format!("{}/torch?q={{query}}", base)],
    )
    .unwrap();

    let transport = Arc::new(
        ScriptedTransport::new("scripted")
            .reply(&["\"carding markets\""])
            .reply(&["3, 1"])
            .reply(&["## Summary\n", "Two sources."]),
    );
    let sink = Arc::new(CollectingSink::new());
    let llm = LlmHandle::new(
        "scripted-model",
        "scripted-model",
        transport.clone(),
        GenerationSettings::default(),
        vec![sink.clone()],
    );

    let mut runner = StageRunner::new(
        Arc::new(search),
        Arc::new(CannedScraper),
        Arc::new(PromptedReasoner::new()),
    )
    .with_threads(2);
    let outcome = runner.run(&llm, "where are stolen cards sold").await.unwrap();

    assert_eq!(outcome.refined_query, "carding markets");
    assert_eq!(outcome.results.len(), 3);
    let kept: Vec<&str> = outcome.filtered.iter().map(|r| r.link.as_str()).collect();
    assert_eq!(kept, vec![PASTE, MARKET]);
    assert_eq!(outcome.documents[0].content, "contents of Paste");
    assert_eq!(outcome.summary, "## Summary\nTwo sources.");

    let requests = transport.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests[1].messages[1].content.contains("Search query: carding markets"));
    assert!(requests[2].messages[1].content.contains(PASTE));
}
