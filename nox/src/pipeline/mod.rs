//! Staged investigation pipeline
//!
//! `refine -> search -> filter -> scrape -> summarize`, strictly sequential.
//! An empty search or scrape ends the run with a distinct reason; any other
//! error ends it with the error text. There are no retries between stages.

pub mod cache;
pub mod collaborators;
pub mod hints;
pub mod runner;

pub use cache::PipelineCache;
pub use collaborators::{Document, Reasoner, Scraper, SearchEngine, SearchResult};
pub use hints::failure_hints;
pub use runner::{
    FailureReason, RunObserver, RunOutcome, RunState, Stage, StageFailure, StageRunner,
};
