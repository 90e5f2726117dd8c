use super::error::BackendError;
use super::sse::{decode_json, error_message, read_event_stream, SseControl};
use super::transport::{join_endpoint, ChatTransport, DEFAULT_IDLE_TIMEOUT};
use super::types::{ChatRequest, ChatRole};
use crate::models::ApiKey;
use async_trait::async_trait;
use itertools::Itertools;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The messages API requires an explicit output cap
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

const PROVIDER: &str = "anthropic";

pub struct AnthropicTransport {
    client: Client,
    base_url: String,
    api_key: ApiKey,
    idle_timeout: Duration,
}

impl AnthropicTransport {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: ApiKey) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// System prompts travel in a top-level field, not in `messages`.
    fn request_body(request: &ChatRequest) -> serde_json::Value {
        let system = request
            .messages
            .iter()
            .filter(|m| m.role == ChatRole::System)
            .map(|m| m.content.as_str())
            .join("\n\n");
        let messages: Vec<_> = request
            .messages
            .iter()
            .filter(|m| m.role != ChatRole::System)
            .collect();

        let mut body = json!({
            "model": request.model,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "stream": true,
        });
        if !system.is_empty() {
            body["system"] = json!(system);
        }
        body
    }
}

#[async_trait]
impl ChatTransport for AnthropicTransport {
    fn provider(&self) -> &str {
        PROVIDER
    }

    async fn stream_chat(
        &self,
        request: &ChatRequest,
        on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send),
    ) -> Result<(), BackendError> {
        let url = join_endpoint(&self.base_url, "messages");
        tracing::debug!(
            provider = PROVIDER,
            url = %url,
            model = %request.model,
            "opening completion stream"
        );

        let builder = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&Self::request_body(request));

        read_event_stream(PROVIDER, builder, self.idle_timeout, |data| {
            let value = decode_json(PROVIDER, data)?;
            match value["type"].as_str() {
                Some("content_block_delta") => {
                    if let Some(text) = value["delta"]["text"].as_str() {
                        on_chunk(text);
                    }
                    Ok(SseControl::Continue)
                }
                Some("message_stop") => Ok(SseControl::Done),
                Some("error") => Err(BackendError::stream(
                    PROVIDER,
                    error_message(&value).unwrap_or_else(|| value.to_string()),
                )),
                // message_start, content_block_start/stop, message_delta, ping
                _ => Ok(SseControl::Continue),
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::ChatMessage;

    #[test]
    fn test_system_prompt_lifted_out_of_messages() {
        let request = ChatRequest {
            model: "claude-sonnet-4-5".to_string(),
            messages: vec![ChatMessage::system("You are terse."), ChatMessage::user("hello")],
            temperature: 0.0,
            max_tokens: None,
        };
        let body = AnthropicTransport::request_body(&request);
        assert_eq!(body["system"], json!("You are terse."));
        assert_eq!(body["messages"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["messages"][0]["role"], json!("user"));
        assert_eq!(body["max_tokens"], json!(DEFAULT_MAX_TOKENS));
    }
}
