use super::error::BackendError;
use super::transport::next_within;
use reqwest::RequestBuilder;
use reqwest_eventsource::{Error as EventSourceError, Event, EventSource};
use std::time::Duration;

/// What the per-event handler wants the reader to do next
pub(crate) enum SseControl {
    Continue,
    Done,
}

/// Drive an SSE request to completion, handing each non-empty `data` payload
/// to `on_data`. Fails when no event arrives for `idle`. The event source is
/// always closed before returning so it never reconnects on its own.
pub(crate) async fn read_event_stream<F>(
    provider: &str,
    request: RequestBuilder,
    idle: Duration,
    mut on_data: F,
) -> Result<(), BackendError>
where
    F: FnMut(&str) -> Result<SseControl, BackendError> + Send,
{
    let mut source =
        EventSource::new(request).map_err(|e| BackendError::transport(provider, e))?;
    let result = drain(provider, &mut source, idle, &mut on_data).await;
    source.close();
    result
}

async fn drain<F>(
    provider: &str,
    source: &mut EventSource,
    idle: Duration,
    on_data: &mut F,
) -> Result<(), BackendError>
where
    F: FnMut(&str) -> Result<SseControl, BackendError> + Send,
{
    while let Some(event) = next_within(provider, idle, source).await? {
        match event {
            Ok(Event::Open) => continue,
            Ok(Event::Message(message)) => {
                let data = message.data.trim();
                if data.is_empty() {
                    continue;
                }
                if let SseControl::Done = on_data(data)? {
                    return Ok(());
                }
            }
            Err(EventSourceError::StreamEnded) => return Ok(()),
            Err(EventSourceError::InvalidStatusCode(status, response)) => {
                let body = response.text().await.unwrap_or_default();
                return Err(BackendError::Status {
                    provider: provider.to_string(),
                    status: status.as_u16(),
                    body,
                });
            }
            Err(EventSourceError::Transport(e)) => {
                return Err(BackendError::transport(provider, e))
            }
            Err(other) => return Err(BackendError::stream(provider, other)),
        }
    }
    Ok(())
}

pub(crate) fn decode_json(provider: &str, data: &str) -> Result<serde_json::Value, BackendError> {
    serde_json::from_str(data).map_err(|e| {
        BackendError::stream(provider, format!("malformed event payload: {}", e))
    })
}

/// Pull a human-readable message out of an `{"error": ...}` payload, if present.
pub(crate) fn error_message(value: &serde_json::Value) -> Option<String> {
    let error = value.get("error")?;
    Some(
        error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
    )
}
