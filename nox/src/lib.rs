// NOX Library
// Model resolution, streaming delivery and the staged investigation pipeline

pub mod config;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod research;
pub mod streaming;

#[cfg(feature = "cli")]
pub mod cli;

pub use crate::config::{CredentialSet, Settings};
pub use crate::llm::{ClientFactory, LlmHandle};
pub use crate::models::{ModelCatalog, ModelResolver, ResolvedBackend};
pub use crate::pipeline::{RunState, StageRunner};
