//! NOX CLI module
//!
//! # Commands
//!
//! - `run` - Run an investigation (refine, search, filter, scrape, summarize)
//! - `models` - List the models visible with the current credentials
//! - `resolve` - Show how a model name resolves
//! - `config` - Configuration (show, init)

pub mod commands;
pub mod context;
pub mod output;

pub use context::CliContext;
pub use output::{OutputFormat, OutputFormatter};
