use super::error::BackendError;
use super::transport::ChatTransport;
use super::types::{ChatMessage, ChatRequest, GenerationSettings};
use crate::streaming::{SharedSink, StreamingBuffer};
use std::fmt;
use std::sync::Arc;

/// A ready-to-use model client.
///
/// Each completion streams through a fresh [`StreamingBuffer`] attached to
/// the handle's sinks and returns the full generated text once the stream
/// ends. Handles are cheap to clone.
#[derive(Clone)]
pub struct LlmHandle {
    id: String,
    model: String,
    transport: Arc<dyn ChatTransport>,
    settings: GenerationSettings,
    sinks: Vec<SharedSink>,
}

impl LlmHandle {
    pub fn new(
        id: impl Into<String>,
        model: impl Into<String>,
        transport: Arc<dyn ChatTransport>,
        settings: GenerationSettings,
        sinks: Vec<SharedSink>,
    ) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            transport,
            settings,
            sinks,
        }
    }

    /// Identifier the operator selected
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Model name sent on the wire
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider(&self) -> &str {
        self.transport.provider()
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Same backend, one more sink. The original handle is unchanged.
    pub fn with_sink(&self, sink: SharedSink) -> Self {
        let mut handle = self.clone();
        handle.sinks.push(sink);
        handle
    }

    pub async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, BackendError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let mut buffer = StreamingBuffer::new(self.settings.buffer_limit, self.sinks.clone());
        let mut output = String::new();
        let mut on_chunk = |chunk: &str| {
            output.push_str(chunk);
            buffer.push(chunk);
        };
        let result = self.transport.stream_chat(&request, &mut on_chunk).await;
        // whatever arrived before a failure is still delivered
        buffer.finish();

        result?;
        tracing::debug!(
            provider = self.provider(),
            model = %self.model,
            chars = output.chars().count(),
            "completion finished"
        );
        Ok(output)
    }

    /// System + user prompt convenience over [`complete`](Self::complete).
    pub async fn prompt(&self, system: &str, user: &str) -> Result<String, BackendError> {
        self.complete(vec![ChatMessage::system(system), ChatMessage::user(user)])
            .await
    }
}

impl fmt::Debug for LlmHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmHandle")
            .field("id", &self.id)
            .field("model", &self.model)
            .field("provider", &self.transport.provider())
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedTransport;
    use crate::streaming::CollectingSink;

    fn handle(transport: ScriptedTransport, sink: Arc<CollectingSink>) -> LlmHandle {
        LlmHandle::new(
            "test-model",
            "test-model",
            Arc::new(transport),
            GenerationSettings::default(),
            vec![sink],
        )
    }

    #[tokio::test]
    async fn test_complete_returns_full_text_and_streams() {
        let sink = Arc::new(CollectingSink::new());
        let transport =
            ScriptedTransport::new("scripted").reply(&["Hello", ", ", "world\n", "bye"]);
        let llm = handle(transport, sink.clone());

        let text = llm.prompt("sys", "hi").await.unwrap();
        assert_eq!(text, "Hello, world\nbye");
        assert_eq!(sink.flushes(), vec!["Hello, world\n", "bye"]);
    }

    #[tokio::test]
    async fn test_partial_output_flushed_before_error() {
        let sink = Arc::new(CollectingSink::new());
        let transport = ScriptedTransport::new("scripted").fail_after(&["partial"], "boom");
        let llm = handle(transport, sink.clone());

        let err = llm.prompt("sys", "hi").await.unwrap_err();
        assert!(err.to_string().contains("scripted"));
        assert_eq!(sink.text(), "partial");
    }

    #[tokio::test]
    async fn test_with_sink_leaves_original_untouched() {
        let console = Arc::new(CollectingSink::new());
        let ui = Arc::new(CollectingSink::new());
        let transport = ScriptedTransport::new("scripted")
            .reply(&["first"])
            .reply(&["second"]);
        let base = handle(transport, console.clone());
        let extended = base.with_sink(ui.clone());

        extended.prompt("s", "u").await.unwrap();
        base.prompt("s", "u").await.unwrap();

        assert_eq!(console.flushes(), vec!["first", "second"]);
        assert_eq!(ui.flushes(), vec!["first"]);
    }

    #[tokio::test]
    async fn test_request_carries_zero_temperature() {
        let sink = Arc::new(CollectingSink::new());
        let transport = Arc::new(ScriptedTransport::new("scripted").reply(&["ok"]));
        let llm = LlmHandle::new(
            "m",
            "wire-model",
            transport.clone(),
            GenerationSettings::default(),
            vec![sink],
        );
        llm.prompt("system text", "user text").await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "wire-model");
        assert_eq!(requests[0].temperature, 0.0);
        assert_eq!(requests[0].messages[1], ChatMessage::user("user text"));
    }
}
