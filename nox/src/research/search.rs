use super::html::HtmlCleaner;
use crate::config::SearchConfig;
use crate::pipeline::{SearchEngine, SearchResult};
use anyhow::Context;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use regex::Regex;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

pub const QUERY_PLACEHOLDER: &str = "{query}";

/// Queries every configured search page and collects `.onion` links.
pub struct HttpSearchEngine {
    client: Client,
    engines: Vec<String>,
    anchor: Regex,
    cleaner: HtmlCleaner,
}

impl HttpSearchEngine {
    pub fn from_config(config: &SearchConfig) -> anyhow::Result<Self> {
        let mut builder = Client::builder().timeout(Duration::from_secs(config.timeout_secs));
        if let Some(proxy) = config.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let proxy = reqwest::Proxy::all(proxy)
                .with_context(|| format!("invalid search proxy '{}'", proxy))?;
            builder = builder.proxy(proxy);
        }
        let client = builder.build().context("failed to create search HTTP client")?;
        Self::new(client, config.engines.clone())
    }

    pub fn new(client: Client, engines: Vec<String>) -> anyhow::Result<Self> {
        Ok(Self {
            client,
            engines,
            anchor: Regex::new(concat!(
                r#"(?is)<a\s[^>]*href\s*=\s*["']"#,
                r#"(https?://[a-z2-7]{16,56}\.onion[^"'\s]*)"#,
                r#"["'][^>]*>(.*?)</a>"#,
            ))?,
            cleaner: HtmlCleaner::new()?,
        })
    }

    pub fn search_url(template: &str, query: &str) -> String {
        template.replace(QUERY_PLACEHOLDER, &urlencoding::encode(query))
    }

    /// `.onion` anchors in page order, titled by their link text.
    pub fn extract_results(&self, html: &str) -> Vec<SearchResult> {
        self.anchor
            .captures_iter(html)
            .map(|caps| {
                let link = caps[1].trim_end_matches('/').to_string();
                let title = self.cleaner.to_text(&caps[2]);
                let title = if title.is_empty() { link.clone() } else { title };
                SearchResult { title, link }
            })
            .collect()
    }

    async fn fetch(&self, url: &str) -> anyhow::Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl SearchEngine for HttpSearchEngine {
    async fn search(&self, query: &str, concurrency: usize) -> anyhow::Result<Vec<SearchResult>> {
        // Collected up front: a lazy `.map` adapter inside the stream keeps the
        // boxed future from being Send.
        let fetches: Vec<_> = self
            .engines
            .iter()
            .enumerate()
            .map(|(idx, template)| {
                let url = Self::search_url(template, query);
                async move {
                    let page = self.fetch(&url).await;
                    (idx, url, page)
                }
            })
            .collect();
        let pages: Vec<(usize, String, anyhow::Result<String>)> = stream::iter(fetches)
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        let results = pages
            .into_iter()
            .sorted_by_key(|(idx, _, _)| *idx)
            .flat_map(|(_, url, page)| match page {
                Ok(html) => {
                    let found = self.extract_results(&html);
                    debug!(url = %url, found = found.len(), "search engine answered");
                    found
                }
                Err(e) => {
                    warn!(url = %url, "skipping search engine: {:#}", e);
                    Vec::new()
                }
            })
            .unique_by(|r| r.link.clone())
            .collect();
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> HttpSearchEngine {
        HttpSearchEngine::new(Client::new(), Vec::new()).unwrap()
    }

    #[test]
    fn test_search_url_encodes_query() {
        assert_eq!(
            HttpSearchEngine::search_url(
                "http://x.test/search?q={query}&page=1",
                "leaked db & creds"
            ),
            "http://x.test/search?q=leaked%20db%20%26%20creds&page=1"
        );
    }

    #[test]
    fn test_extracts_onion_anchors_only() {
        let onion = "abcdefghijklmnopqrstuvwxyz234567abcdefghijklmnopqrstuvwx";
        let html = format!(
            r#"<li><a href="http://{onion}.onion/">  <b>Market</b> listing </a></li>
               <li><a class="x" href='https://example.com/page'>Clearnet</a></li>
               <li><a href="http://{onion}.onion/forum"></a></li>"#
        );
        let results = engine().extract_results(&html);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Market listing");
        assert_eq!(results[0].link, format!("http://{}.onion", onion));
        assert_eq!(results[1].title, results[1].link);
    }
}
