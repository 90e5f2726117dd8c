use super::error::BackendError;
use super::types::ChatRequest;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::time::Duration;

/// Longest silence tolerated while waiting on a streamed reply
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Wire protocol of one backend family.
///
/// A transport sends a single streaming completion and forwards each text
/// chunk, in arrival order, to `on_chunk`. Buffering and sink delivery live
/// in [`LlmHandle`](super::LlmHandle), not here.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Provider label used in logs and error messages.
    fn provider(&self) -> &str;

    /// `on_chunk` is higher-ranked so transports can hand it text borrowed
    /// from each decoded event.
    async fn stream_chat(
        &self,
        request: &ChatRequest,
        on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send),
    ) -> Result<(), BackendError>;
}

/// Next item of `stream`, or a transport error once the backend has been
/// silent for `idle`. There is no bound on the length of the whole reply.
pub(crate) async fn next_within<S>(
    provider: &str,
    idle: Duration,
    stream: &mut S,
) -> Result<Option<S::Item>, BackendError>
where
    S: Stream + Unpin,
{
    tokio::time::timeout(idle, stream.next())
        .await
        .map_err(|_| BackendError::transport(provider, format!("no data received for {:?}", idle)))
}

pub(crate) fn join_endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
