use super::error::BackendError;
use super::transport::ChatTransport;
use super::types::ChatRequest;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

enum Script {
    Reply(Vec<String>),
    Fail { chunks: Vec<String>, message: String },
}

/// In-process transport that replays canned replies in order.
///
/// Used for offline runs and tests. Every request is recorded.
pub struct ScriptedTransport {
    provider: String,
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedTransport {
    pub fn new(provider: &str) -> Self {
        Self {
            provider: provider.to_string(),
            scripts: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a reply streamed as the given chunks.
    pub fn reply(self, chunks: &[&str]) -> Self {
        self.push(Script::Reply(chunks.iter().map(|c| c.to_string()).collect()))
    }

    /// Queue a reply that emits `chunks` and then fails with `message`.
    pub fn fail_after(self, chunks: &[&str], message: &str) -> Self {
        self.push(Script::Fail {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            message: message.to_string(),
        })
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(self, script: Script) -> Self {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(script);
        self
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    fn provider(&self) -> &str {
        &self.provider
    }

    async fn stream_chat(
        &self,
        request: &ChatRequest,
        on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send),
    ) -> Result<(), BackendError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        let next = self
            .scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match next {
            Some(Script::Reply(chunks)) => {
                chunks.iter().for_each(|c| on_chunk(c.as_str()));
                Ok(())
            }
            Some(Script::Fail { chunks, message }) => {
                chunks.iter().for_each(|c| on_chunk(c.as_str()));
                Err(BackendError::stream(&self.provider, message))
            }
            None => Err(BackendError::stream(&self.provider, "no scripted reply left")),
        }
    }
}
