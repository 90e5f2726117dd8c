use super::cache::PipelineCache;
use super::collaborators::{Document, Reasoner, Scraper, SearchEngine, SearchResult};
use super::hints::failure_hints;
use crate::config::PipelineConfig;
use crate::llm::{BackendError, LlmHandle};
use crate::streaming::SharedSink;
use itertools::Itertools;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_THREADS: usize = 5;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Refining,
    Searching,
    Filtering,
    Scraping,
    Summarizing,
}

impl Stage {
    /// Cache namespace and log label
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Refining => "refine",
            Stage::Searching => "search",
            Stage::Filtering => "filter",
            Stage::Scraping => "scrape",
            Stage::Summarizing => "summarize",
        }
    }

    /// Status line shown while the stage runs
    pub fn progress_label(&self) -> &'static str {
        match self {
            Stage::Refining => "Refining query",
            Stage::Searching => "Searching",
            Stage::Filtering => "Filtering results",
            Stage::Scraping => "Scraping content",
            Stage::Summarizing => "Generating summary",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    NoSearchResults,
    NoScrapableContent,
    /// Model backend error, message kept verbatim
    Backend(String),
    /// Search or scrape collaborator error, message kept verbatim
    Collaborator(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NoSearchResults => f.write_str("no search results"),
            FailureReason::NoScrapableContent => f.write_str("no scrapable content"),
            FailureReason::Backend(message) | FailureReason::Collaborator(message) => {
                f.write_str(message)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage} failed: {reason}")]
pub struct StageFailure {
    pub stage: Stage,
    pub reason: FailureReason,
}

impl StageFailure {
    fn backend(stage: Stage, error: BackendError) -> Self {
        Self {
            stage,
            reason: FailureReason::Backend(error.to_string()),
        }
    }

    fn collaborator(stage: Stage, error: anyhow::Error) -> Self {
        Self {
            stage,
            reason: FailureReason::Collaborator(format!("{:#}", error)),
        }
    }

    /// Empty-result outcomes are expected operator conditions, not defects.
    pub fn is_empty_result(&self) -> bool {
        matches!(
            self.reason,
            FailureReason::NoSearchResults | FailureReason::NoScrapableContent
        )
    }

    /// Troubleshooting hints for backend failures; empty otherwise.
    pub fn hints(&self) -> Vec<String> {
        match &self.reason {
            FailureReason::Backend(message) => failure_hints(message),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Init,
    Running(Stage),
    Done,
    Failed(StageFailure),
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Failed(_))
    }
}

/// Notified on every state transition of a run
pub trait RunObserver: Send + Sync {
    fn on_transition(&self, state: &RunState);
}

impl<F> RunObserver for F
where
    F: Fn(&RunState) + Send + Sync,
{
    fn on_transition(&self, state: &RunState) {
        self(state)
    }
}

/// Everything a completed run produced
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub query: String,
    pub refined_query: String,
    pub results: Vec<SearchResult>,
    pub filtered: Vec<SearchResult>,
    pub documents: Vec<Document>,
    pub summary: String,
}

/// Drives refine, search, filter, scrape and summarize in order.
///
/// Search and scrape outputs are memoized per input for the cache TTL, so a
/// repeated run with the same refined query skips the network. Expired entries
/// are dropped when a run starts. Refine, filter and summarize always call the
/// model.
pub struct StageRunner {
    search: Arc<dyn SearchEngine>,
    scraper: Arc<dyn Scraper>,
    reasoner: Arc<dyn Reasoner>,
    search_cache: PipelineCache<Vec<SearchResult>>,
    scrape_cache: PipelineCache<Vec<Document>>,
    threads: usize,
    cache_ttl: Duration,
    observer: Option<Arc<dyn RunObserver>>,
    summary_sink: Option<SharedSink>,
    state: RunState,
}

impl StageRunner {
    pub fn new(
        search: Arc<dyn SearchEngine>,
        scraper: Arc<dyn Scraper>,
        reasoner: Arc<dyn Reasoner>,
    ) -> Self {
        Self {
            search,
            scraper,
            reasoner,
            search_cache: PipelineCache::new(),
            scrape_cache: PipelineCache::new(),
            threads: DEFAULT_THREADS,
            cache_ttl: DEFAULT_CACHE_TTL,
            observer: None,
            summary_sink: None,
            state: RunState::Init,
        }
    }

    pub fn with_config(self, config: &PipelineConfig) -> Self {
        self.with_threads(config.threads)
            .with_cache_ttl(Duration::from_secs(config.cache_ttl_secs))
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Extra sink attached to the summarize call only.
    pub fn with_summary_sink(mut self, sink: SharedSink) -> Self {
        self.summary_sink = Some(sink);
        self
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub async fn run(&mut self, llm: &LlmHandle, query: &str) -> Result<RunOutcome, StageFailure> {
        self.transition(RunState::Init);
        self.purge_expired();
        match self.execute(llm, query).await {
            Ok(outcome) => {
                self.transition(RunState::Done);
                Ok(outcome)
            }
            Err(failure) => {
                self.transition(RunState::Failed(failure.clone()));
                Err(failure)
            }
        }
    }

    fn purge_expired(&self) {
        let removed = self.search_cache.purge_expired() + self.scrape_cache.purge_expired();
        if removed > 0 {
            debug!(removed, "dropped expired cache entries");
        }
    }

    async fn execute(&mut self, llm: &LlmHandle, query: &str) -> Result<RunOutcome, StageFailure> {
        self.transition(RunState::Running(Stage::Refining));
        let refined = self
            .reasoner
            .refine(llm, query)
            .await
            .map_err(|e| StageFailure::backend(Stage::Refining, e))?;
        let refined_query = match refined.trim() {
            "" => {
                debug!("refinement came back empty, keeping the original query");
                query.trim().to_string()
            }
            text => text.to_string(),
        };

        self.transition(RunState::Running(Stage::Searching));
        let results = self.search_cached(&refined_query).await?;
        if results.is_empty() {
            return Err(StageFailure {
                stage: Stage::Searching,
                reason: FailureReason::NoSearchResults,
            });
        }

        self.transition(RunState::Running(Stage::Filtering));
        let filtered = self
            .reasoner
            .filter(llm, &refined_query, &results)
            .await
            .map_err(|e| StageFailure::backend(Stage::Filtering, e))?;

        self.transition(RunState::Running(Stage::Scraping));
        let documents = self.scrape_cached(&filtered).await?;
        if documents.is_empty() {
            return Err(StageFailure {
                stage: Stage::Scraping,
                reason: FailureReason::NoScrapableContent,
            });
        }

        self.transition(RunState::Running(Stage::Summarizing));
        let summarizer = match &self.summary_sink {
            Some(sink) => llm.with_sink(sink.clone()),
            None => llm.clone(),
        };
        let summary = self
            .reasoner
            .summarize(&summarizer, query, &documents)
            .await
            .map_err(|e| StageFailure::backend(Stage::Summarizing, e))?;

        Ok(RunOutcome {
            query: query.to_string(),
            refined_query,
            results,
            filtered,
            documents,
            summary,
        })
    }

    async fn search_cached(
        &self,
        refined_query: &str,
    ) -> Result<Vec<SearchResult>, StageFailure> {
        let key = format!("{}\u{1f}{}", refined_query, self.threads);
        let search = &self.search;
        let threads = self.threads;
        self.search_cache
            .get_or_compute(Stage::Searching.as_str(), &key, self.cache_ttl, || {
                search.search(refined_query, threads)
            })
            .await
            .map_err(|e| StageFailure::collaborator(Stage::Searching, e))
    }

    async fn scrape_cached(
        &self,
        filtered: &[SearchResult],
    ) -> Result<Vec<Document>, StageFailure> {
        let key = format!(
            "{}\u{1f}{}",
            filtered
                .iter()
                .map(|r| format!("{}\t{}", r.title, r.link))
                .join("\n"),
            self.threads
        );
        let scraper = &self.scraper;
        let threads = self.threads;
        self.scrape_cache
            .get_or_compute(Stage::Scraping.as_str(), &key, self.cache_ttl, || {
                scraper.scrape(filtered, threads)
            })
            .await
            .map_err(|e| StageFailure::collaborator(Stage::Scraping, e))
    }

    fn transition(&mut self, state: RunState) {
        match &state {
            RunState::Running(stage) => {
                info!(stage = stage.as_str(), "{}", stage.progress_label())
            }
            RunState::Failed(failure) => {
                info!(stage = failure.stage.as_str(), "run failed: {}", failure.reason)
            }
            RunState::Done => info!("run complete"),
            RunState::Init => {}
        }
        if let Some(observer) = &self.observer {
            observer.on_transition(&state);
        }
        self.state = state;
    }
}
