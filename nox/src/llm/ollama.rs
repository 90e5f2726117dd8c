use super::error::BackendError;
use super::transport::{join_endpoint, next_within, ChatTransport, DEFAULT_IDLE_TIMEOUT};
use super::types::ChatRequest;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const PROVIDER: &str = "ollama";

/// Ollama's native `/api/chat`, which streams one JSON object per line.
pub struct OllamaTransport {
    client: Client,
    base_url: String,
    idle_timeout: Duration,
}

impl OllamaTransport {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    fn request_body(request: &ChatRequest) -> Value {
        let mut options = json!({ "temperature": request.temperature });
        if let Some(max_tokens) = request.max_tokens {
            options["num_predict"] = json!(max_tokens);
        }
        json!({
            "model": request.model,
            "messages": request.messages,
            "stream": true,
            "options": options,
        })
    }
}

/// Handle one NDJSON line. Returns true once the server marks the reply done.
fn handle_line(
    line: &[u8],
    on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send),
) -> Result<bool, BackendError> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim();
    if line.is_empty() {
        return Ok(false);
    }
    let value: Value = serde_json::from_str(line)
        .map_err(|e| BackendError::stream(PROVIDER, format!("malformed stream line: {}", e)))?;
    if let Some(error) = value.get("error").and_then(|e| e.as_str()) {
        return Err(BackendError::stream(PROVIDER, error));
    }
    if let Some(text) = value["message"]["content"].as_str() {
        if !text.is_empty() {
            on_chunk(text);
        }
    }
    Ok(value["done"].as_bool().unwrap_or(false))
}

#[async_trait]
impl ChatTransport for OllamaTransport {
    fn provider(&self) -> &str {
        PROVIDER
    }

    async fn stream_chat(
        &self,
        request: &ChatRequest,
        on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send),
    ) -> Result<(), BackendError> {
        let url = join_endpoint(&self.base_url, "api/chat");
        tracing::debug!(
            provider = PROVIDER,
            url = %url,
            model = %request.model,
            "opening completion stream"
        );

        // Loading a model can hold the response headers back, so the first
        // reply is bounded by the same silence limit as every later chunk.
        let send = self.client.post(&url).json(&Self::request_body(request)).send();
        let response = tokio::time::timeout(self.idle_timeout, send)
            .await
            .map_err(|_| {
                BackendError::transport(
                    PROVIDER,
                    format!("no response received for {:?}", self.idle_timeout),
                )
            })?
            .map_err(|e| BackendError::transport(PROVIDER, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        // Lines may straddle network chunks; keep raw bytes until a newline
        // arrives so multi-byte characters are never split.
        let mut pending: Vec<u8> = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = next_within(PROVIDER, self.idle_timeout, &mut stream).await? {
            let chunk = chunk.map_err(|e| BackendError::transport(PROVIDER, e))?;
            pending.extend_from_slice(&chunk);
            while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = pending.drain(..=pos).collect();
                if handle_line(&line, on_chunk)? {
                    return Ok(());
                }
            }
        }
        handle_line(&pending, on_chunk)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(lines: &[&str]) -> (String, Result<bool, BackendError>) {
        let mut out = String::new();
        let mut sink = |text: &str| out.push_str(text);
        let mut last = Ok(false);
        for line in lines {
            last = handle_line(line.as_bytes(), &mut sink);
            if !matches!(last, Ok(false)) {
                break;
            }
        }
        (out, last)
    }

    #[test]
    fn test_lines_accumulate_until_done() {
        let (text, last) = collect(&[
            r#"{"message":{"role":"assistant","content":"Hel"},"done":false}"#,
            "",
            r#"{"message":{"role":"assistant","content":"lo"},"done":false}"#,
            r#"{"message":{"role":"assistant","content":""},"done":true}"#,
        ]);
        assert_eq!(text, "Hello");
        assert!(matches!(last, Ok(true)));
    }

    #[test]
    fn test_error_line_names_provider() {
        let (_, last) = collect(&[r#"{"error":"model 'nope' not found"}"#]);
        let err = last.expect_err("error line must fail");
        assert!(err.to_string().starts_with("ollama"));
        assert!(err.to_string().contains("model 'nope' not found"));
    }

    #[test]
    fn test_request_body_sets_temperature_option() {
        let request = ChatRequest {
            model: "llama3.2:latest".to_string(),
            messages: vec![],
            temperature: 0.0,
            max_tokens: Some(128),
        };
        let body = OllamaTransport::request_body(&request);
        assert_eq!(body["options"]["temperature"], json!(0.0));
        assert_eq!(body["options"]["num_predict"], json!(128));
        assert_eq!(body["stream"], json!(true));
    }
}
