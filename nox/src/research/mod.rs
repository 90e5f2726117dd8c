//! Default search, scrape, reasoning and report implementations used by the
//! `nox run` command.

pub mod html;
pub mod reasoner;
pub mod report;
pub mod scrape;
pub mod search;

pub use reasoner::PromptedReasoner;
pub use report::write_markdown;
pub use scrape::HttpScraper;
pub use search::HttpSearchEngine;
