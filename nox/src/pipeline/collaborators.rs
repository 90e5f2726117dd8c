//! Seams between the stage runner and the work it delegates.

use crate::llm::{BackendError, LlmHandle};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
}

impl SearchResult {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
        }
    }
}

/// Cleaned page content for one search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub link: String,
    pub content: String,
}

/// Retrieval. `concurrency` bounds in-flight requests.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    async fn search(&self, query: &str, concurrency: usize) -> anyhow::Result<Vec<SearchResult>>;
}

#[async_trait]
pub trait Scraper: Send + Sync {
    async fn scrape(
        &self,
        results: &[SearchResult],
        concurrency: usize,
    ) -> anyhow::Result<Vec<Document>>;
}

/// The three model-backed steps. Implementations decide the prompts.
#[async_trait]
pub trait Reasoner: Send + Sync {
    async fn refine(&self, llm: &LlmHandle, query: &str) -> Result<String, BackendError>;

    async fn filter(
        &self,
        llm: &LlmHandle,
        query: &str,
        results: &[SearchResult],
    ) -> Result<Vec<SearchResult>, BackendError>;

    async fn summarize(
        &self,
        llm: &LlmHandle,
        query: &str,
        documents: &[Document],
    ) -> Result<String, BackendError>;
}
