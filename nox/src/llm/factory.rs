use super::anthropic::{AnthropicTransport, DEFAULT_ANTHROPIC_BASE_URL};
use super::error::BackendConstructionError;
use super::handle::LlmHandle;
use super::ollama::OllamaTransport;
use super::openai::{OpenAiTransport, DEFAULT_OPENAI_BASE_URL, GEMINI_OPENAI_BASE_URL};
use super::transport::ChatTransport;
use super::types::GenerationSettings;
use crate::config::Settings;
use crate::models::{ApiKey, BackendKind, ResolvedBackend};
use crate::streaming::{ConsoleSink, SharedSink};
use std::sync::Arc;
use std::time::Duration;

/// Builds [`LlmHandle`]s from resolved backends.
///
/// Every handle gets the same generation settings (zero temperature,
/// streaming) and the factory's sinks. By default that is a stdout console
/// sink.
///
/// `idle_timeout` bounds the connect phase and each silent gap in a streamed
/// reply. A reply that keeps producing text may take as long as it needs.
#[derive(Clone)]
pub struct ClientFactory {
    settings: GenerationSettings,
    idle_timeout: Duration,
    sinks: Vec<SharedSink>,
}

impl ClientFactory {
    pub fn new(settings: GenerationSettings, idle_timeout: Duration) -> Self {
        Self {
            settings,
            idle_timeout,
            sinks: vec![Arc::new(ConsoleSink::stdout())],
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            GenerationSettings {
                buffer_limit: settings.pipeline.stream_buffer_limit,
                ..GenerationSettings::default()
            },
            Duration::from_secs(settings.pipeline.stream_idle_timeout_secs),
        )
    }

    /// Replace the default sinks.
    pub fn with_sinks(mut self, sinks: Vec<SharedSink>) -> Self {
        self.sinks = sinks;
        self
    }

    pub fn build(
        &self,
        resolved: &ResolvedBackend,
    ) -> Result<LlmHandle, BackendConstructionError> {
        if let Some(credential) = resolved.missing_credentials.first() {
            return Err(BackendConstructionError::MissingCredential {
                model: resolved.id.clone(),
                credential: *credential,
            });
        }
        if resolved.model.trim().is_empty() {
            return Err(missing(resolved, "model"));
        }

        // No total deadline: long generations are legitimate, stalls are
        // caught per chunk by the transports.
        let client = reqwest::Client::builder()
            .connect_timeout(self.idle_timeout)
            .build()
            .map_err(BackendConstructionError::HttpClient)?;
        let idle = self.idle_timeout;

        let transport: Arc<dyn ChatTransport> = match resolved.kind {
            BackendKind::OpenAi => Arc::new(
                OpenAiTransport::new(
                    client,
                    "openai",
                    base_or(resolved, DEFAULT_OPENAI_BASE_URL),
                    api_key(resolved)?,
                )
                .with_idle_timeout(idle),
            ),
            BackendKind::Gemini => Arc::new(
                OpenAiTransport::new(
                    client,
                    "gemini",
                    base_or(resolved, GEMINI_OPENAI_BASE_URL),
                    api_key(resolved)?,
                )
                .with_idle_timeout(idle),
            ),
            BackendKind::OpenAiCompatible => {
                let base_url = required_base(resolved)?;
                let provider = if base_url.contains("openrouter") {
                    "openrouter"
                } else {
                    "llama.cpp"
                };
                Arc::new(
                    OpenAiTransport::new(client, provider, base_url, api_key(resolved)?)
                        .with_idle_timeout(idle),
                )
            }
            BackendKind::Anthropic => Arc::new(
                AnthropicTransport::new(
                    client,
                    base_or(resolved, DEFAULT_ANTHROPIC_BASE_URL),
                    api_key(resolved)?,
                )
                .with_idle_timeout(idle),
            ),
            BackendKind::Ollama => Arc::new(
                OllamaTransport::new(client, required_base(resolved)?).with_idle_timeout(idle),
            ),
        };

        tracing::debug!(
            model = %resolved.id,
            provider = transport.provider(),
            "constructed model client"
        );
        Ok(LlmHandle::new(
            resolved.id.clone(),
            resolved.model.clone(),
            transport,
            self.settings.clone(),
            self.sinks.clone(),
        ))
    }
}

fn missing(resolved: &ResolvedBackend, parameter: &'static str) -> BackendConstructionError {
    BackendConstructionError::MissingParameter {
        model: resolved.id.clone(),
        parameter,
    }
}

fn base_or(resolved: &ResolvedBackend, default: &str) -> String {
    resolved
        .base_url
        .clone()
        .unwrap_or_else(|| default.to_string())
}

fn required_base(resolved: &ResolvedBackend) -> Result<String, BackendConstructionError> {
    resolved
        .base_url
        .clone()
        .filter(|b| !b.trim().is_empty())
        .ok_or_else(|| missing(resolved, "base_url"))
}

fn api_key(resolved: &ResolvedBackend) -> Result<ApiKey, BackendConstructionError> {
    resolved.api_key.clone().ok_or_else(|| missing(resolved, "api_key"))
}
