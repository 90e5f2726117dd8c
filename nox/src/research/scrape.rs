use super::html::{truncate_chars, HtmlCleaner};
use crate::config::ScrapeConfig;
use crate::pipeline::{Document, Scraper, SearchResult};
use anyhow::Context;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

pub struct HttpScraper {
    client: Client,
    cleaner: HtmlCleaner,
    max_chars: usize,
}

impl HttpScraper {
    pub fn from_config(config: &ScrapeConfig) -> anyhow::Result<Self> {
        let mut builder = Client::builder().timeout(Duration::from_secs(config.timeout_secs));
        if let Some(proxy) = config.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let proxy = reqwest::Proxy::all(proxy)
                .with_context(|| format!("invalid scrape proxy '{}'", proxy))?;
            builder = builder.proxy(proxy);
        }
        let client = builder.build().context("failed to create scrape HTTP client")?;
        Self::new(client, config.max_chars)
    }

    pub fn new(client: Client, max_chars: usize) -> anyhow::Result<Self> {
        Ok(Self {
            client,
            cleaner: HtmlCleaner::new()?,
            max_chars,
        })
    }

    async fn fetch_text(&self, link: &str) -> anyhow::Result<String> {
        let response = self.client.get(link).send().await?.error_for_status()?;
        let html = response.text().await?;
        Ok(truncate_chars(&self.cleaner.to_text(&html), self.max_chars))
    }
}

#[async_trait]
impl Scraper for HttpScraper {
    /// Fetch every result concurrently; failed and empty pages are dropped.
    /// Output keeps the input order.
    async fn scrape(
        &self,
        results: &[SearchResult],
        concurrency: usize,
    ) -> anyhow::Result<Vec<Document>> {
        let fetches: Vec<_> = results
            .iter()
            .enumerate()
            .map(|(idx, result)| async move {
                let document = match self.fetch_text(&result.link).await {
                    Ok(content) if !content.is_empty() => Some(Document {
                        title: result.title.clone(),
                        link: result.link.clone(),
                        content,
                    }),
                    Ok(_) => {
                        debug!(link = %result.link, "page had no text");
                        None
                    }
                    Err(e) => {
                        warn!(link = %result.link, "scrape failed: {:#}", e);
                        None
                    }
                };
                (idx, document)
            })
            .collect();
        let mut fetched: Vec<(usize, Option<Document>)> = stream::iter(fetches)
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        fetched.sort_by_key(|(idx, _)| *idx);
        Ok(fetched.into_iter().filter_map(|(_, doc)| doc).collect())
    }
}
