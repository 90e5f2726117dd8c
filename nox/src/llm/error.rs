use crate::models::CredentialKey;
use thiserror::Error;

/// The resolved configuration cannot be turned into a client
#[derive(Debug, Error)]
pub enum BackendConstructionError {
    #[error("model '{model}' requires {credential} to be set to a real value")]
    MissingCredential {
        model: String,
        credential: CredentialKey,
    },

    #[error("model '{model}' is missing required parameter '{parameter}'")]
    MissingParameter {
        model: String,
        parameter: &'static str,
    },

    #[error("failed to create HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Failure while talking to a model backend. Messages always name the provider.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{provider} request failed: {message}")]
    Transport { provider: String, message: String },

    #[error("{provider} API error (HTTP {status}): {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{provider} stream error: {message}")]
    Stream { provider: String, message: String },
}

impl BackendError {
    pub fn transport(provider: &str, message: impl ToString) -> Self {
        Self::Transport {
            provider: provider.to_string(),
            message: message.to_string(),
        }
    }

    pub fn stream(provider: &str, message: impl ToString) -> Self {
        Self::Stream {
            provider: provider.to_string(),
            message: message.to_string(),
        }
    }

    pub fn provider(&self) -> &str {
        match self {
            BackendError::Transport { provider, .. }
            | BackendError::Status { provider, .. }
            | BackendError::Stream { provider, .. } => provider,
        }
    }
}
