//! OpenAI chat-completions streaming, shared by every backend that speaks the
//! same protocol (OpenAI proper, Gemini's compatibility endpoint, OpenRouter,
//! llama.cpp server).

use super::error::BackendError;
use super::sse::{decode_json, error_message, read_event_stream, SseControl};
use super::transport::{join_endpoint, ChatTransport, DEFAULT_IDLE_TIMEOUT};
use super::types::ChatRequest;
use crate::models::ApiKey;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const GEMINI_OPENAI_BASE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/openai";

const DONE_SENTINEL: &str = "[DONE]";

pub struct OpenAiTransport {
    client: Client,
    provider: String,
    base_url: String,
    api_key: ApiKey,
    idle_timeout: Duration,
}

impl OpenAiTransport {
    pub fn new(
        client: Client,
        provider: impl Into<String>,
        base_url: impl Into<String>,
        api_key: ApiKey,
    ) -> Self {
        Self {
            client,
            provider: provider.into(),
            base_url: base_url.into(),
            api_key,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_body(request: &ChatRequest) -> serde_json::Value {
        let mut body = json!({
            "model": request.model,
            "messages": request.messages,
            "stream": true,
        });
        if accepts_temperature(&request.model) {
            body["temperature"] = json!(request.temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        body
    }
}

/// The gpt-5 reasoning family rejects any temperature but the default, so the
/// field is left out for them. Their `-chat` variants and routed ids such as
/// `openai/gpt-5` keep it.
fn accepts_temperature(model: &str) -> bool {
    !(model.starts_with("gpt-5") && !model.contains("chat"))
}

#[async_trait]
impl ChatTransport for OpenAiTransport {
    fn provider(&self) -> &str {
        &self.provider
    }

    async fn stream_chat(
        &self,
        request: &ChatRequest,
        on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send),
    ) -> Result<(), BackendError> {
        let url = join_endpoint(&self.base_url, "chat/completions");
        tracing::debug!(
            provider = %self.provider,
            url = %url,
            model = %request.model,
            "opening completion stream"
        );

        let builder = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .json(&Self::request_body(request));

        let provider = self.provider.as_str();
        read_event_stream(provider, builder, self.idle_timeout, |data| {
            if data == DONE_SENTINEL {
                return Ok(SseControl::Done);
            }
            let value = decode_json(provider, data)?;
            // OpenRouter reports upstream failures in-band
            if let Some(message) = error_message(&value) {
                return Err(BackendError::stream(provider, message));
            }
            if let Some(text) = value["choices"][0]["delta"]["content"].as_str() {
                on_chunk(text);
            }
            Ok(SseControl::Continue)
        })
        .await
    }
}
