//! CLI commands module

pub mod config;
pub mod models;
pub mod resolve;
pub mod run;

use thiserror::Error;

/// A failure the command has already shown to the operator; the binary
/// only turns it into a non-zero exit code.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct Reported(pub String);
