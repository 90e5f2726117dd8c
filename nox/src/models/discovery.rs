//! Local model discovery
//!
//! Probes local inference servers for installed models. Failure policy is
//! uniform: `try_discover` reports what went wrong, `discover` collapses any
//! error to an empty list so resolution never aborts on an unreachable server.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const OLLAMA_TAGS_PATH: &str = "api/tags";
pub const OPENAI_MODELS_PATH: &str = "v1/models";
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(3);

/// Which protocol a discovered model came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscoverySource {
    /// Ollama-style `GET /api/tags`
    OllamaTags,
    /// OpenAI-style `GET /v1/models` (llama.cpp server)
    OpenAiModels,
}

impl std::fmt::Display for DiscoverySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoverySource::OllamaTags => write!(f, "ollama"),
            DiscoverySource::OpenAiModels => write!(f, "llama.cpp"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredModel {
    pub id: String,
    pub source: DiscoverySource,
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("discovery base URL not configured")]
    NotConfigured,

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed response from {url}: {reason}")]
    Malformed { url: String, reason: String },
}

#[async_trait]
pub trait DiscoveryProbe: Send + Sync {
    fn source(&self) -> DiscoverySource;

    /// Base URL that resolved backends for this probe point at.
    fn base_url(&self) -> Option<&str>;

    /// One probe round trip, with the failure reason preserved.
    async fn try_discover(&self) -> Result<Vec<String>, DiscoveryError>;

    /// Model ids, or an empty list on any failure. Never cached.
    async fn discover(&self) -> Vec<String> {
        match self.try_discover().await {
            Ok(models) => models,
            Err(DiscoveryError::NotConfigured) => Vec::new(),
            Err(e) => {
                debug!("{} discovery unavailable: {}", self.source(), e);
                Vec::new()
            }
        }
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

fn normalize_base(base_url: Option<String>) -> Option<String> {
    base_url
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
}

async fn fetch_json(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<Value, DiscoveryError> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|source| DiscoveryError::Transport {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(DiscoveryError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|source| DiscoveryError::Transport {
            url: url.to_string(),
            source,
        })?;
    serde_json::from_str(&body).map_err(|e| DiscoveryError::Malformed {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Extract model names from an `/api/tags` body; each entry offers `name`, else `model`.
pub fn parse_tags_body(body: &Value) -> Result<Vec<String>, String> {
    let obj = body.as_object().ok_or("expected a JSON object")?;
    let models = match obj.get("models") {
        Some(models) => models.as_array().ok_or("`models` is not an array")?,
        None => return Ok(Vec::new()),
    };
    Ok(models
        .iter()
        .filter_map(|m| non_empty_str(m.get("name")).or_else(|| non_empty_str(m.get("model"))))
        .map(String::from)
        .collect())
}

/// Extract ids from a `/v1/models` body, skipping entries without one.
pub fn parse_models_body(body: &Value) -> Result<Vec<String>, String> {
    let obj = body.as_object().ok_or("expected a JSON object")?;
    let data = match obj.get("data") {
        Some(data) => data.as_array().ok_or("`data` is not an array")?,
        None => return Ok(Vec::new()),
    };
    Ok(data
        .iter()
        .filter_map(|m| non_empty_str(m.get("id")))
        .map(String::from)
        .collect())
}

/// Probe A: Ollama tags API
pub struct OllamaTagsProbe {
    base_url: Option<String>,
    client: reqwest::Client,
    timeout: Duration,
}

impl OllamaTagsProbe {
    pub fn new(base_url: Option<String>, timeout: Duration) -> Self {
        Self {
            base_url: normalize_base(base_url),
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl DiscoveryProbe for OllamaTagsProbe {
    fn source(&self) -> DiscoverySource {
        DiscoverySource::OllamaTags
    }

    fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    async fn try_discover(&self) -> Result<Vec<String>, DiscoveryError> {
        let base = self.base_url.as_deref().ok_or(DiscoveryError::NotConfigured)?;
        let url = join_url(base, OLLAMA_TAGS_PATH);
        let body = fetch_json(&self.client, &url, self.timeout).await?;
        parse_tags_body(&body).map_err(|reason| DiscoveryError::Malformed { url, reason })
    }
}

/// Probe B: OpenAI-compatible model listing
pub struct OpenAiModelsProbe {
    base_url: Option<String>,
    client: reqwest::Client,
    timeout: Duration,
}

impl OpenAiModelsProbe {
    pub fn new(base_url: Option<String>, timeout: Duration) -> Self {
        Self {
            base_url: normalize_base(base_url),
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl DiscoveryProbe for OpenAiModelsProbe {
    fn source(&self) -> DiscoverySource {
        DiscoverySource::OpenAiModels
    }

    fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    async fn try_discover(&self) -> Result<Vec<String>, DiscoveryError> {
        let base = self.base_url.as_deref().ok_or(DiscoveryError::NotConfigured)?;
        let url = join_url(base, OPENAI_MODELS_PATH);
        let body = fetch_json(&self.client, &url, self.timeout).await?;
        parse_models_body(&body).map_err(|reason| DiscoveryError::Malformed { url, reason })
    }
}

/// Probe with a fixed answer, counting how often it is asked.
pub struct StaticProbe {
    source: DiscoverySource,
    base_url: Option<String>,
    models: Option<Vec<String>>,
    calls: AtomicUsize,
}

impl StaticProbe {
    pub fn new(source: DiscoverySource, base_url: &str, models: &[&str]) -> Self {
        Self {
            source,
            base_url: Some(base_url.to_string()),
            models: Some(models.iter().map(|m| m.to_string()).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// A probe whose every call fails as if the server were malformed.
    pub fn failing(source: DiscoverySource, base_url: &str) -> Self {
        Self {
            source,
            base_url: Some(base_url.to_string()),
            models: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// A probe with no base URL configured.
    pub fn unconfigured(source: DiscoverySource) -> Self {
        Self {
            source,
            base_url: None,
            models: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DiscoveryProbe for StaticProbe {
    fn source(&self) -> DiscoverySource {
        self.source
    }

    fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    async fn try_discover(&self) -> Result<Vec<String>, DiscoveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let base = self.base_url.as_deref().ok_or(DiscoveryError::NotConfigured)?;
        self.models.clone().ok_or_else(|| DiscoveryError::Malformed {
            url: base.to_string(),
            reason: "static failure".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_tags_prefers_name_then_model() {
        let body = json!({
            "models": [
                {"name": "llama3.2:latest", "model": "ignored"},
                {"model": "mistral:7b"},
                {"name": "", "model": "gemma3:latest"},
                {"size": 42}
            ]
        });
        assert_eq!(
            parse_tags_body(&body).unwrap(),
            vec!["llama3.2:latest", "mistral:7b", "gemma3:latest"]
        );
    }

    #[test]
    fn test_parse_tags_missing_key_is_empty() {
        assert!(parse_tags_body(&json!({"other": []})).unwrap().is_empty());
        assert!(parse_tags_body(&json!([1, 2])).is_err());
        assert!(parse_tags_body(&json!({"models": "nope"})).is_err());
    }

    #[test]
    fn test_parse_models_skips_entries_without_id() {
        let body = json!({"data": [{"id": "qwen2.5-7b"}, {"object": "model"}, {"id": 7}]});
        assert_eq!(parse_models_body(&body).unwrap(), vec!["qwen2.5-7b"]);
        assert!(parse_models_body(&json!({})).unwrap().is_empty());
    }

    #[test]
    fn test_join_url_handles_trailing_slash() {
        assert_eq!(join_url("http://h:1/", OLLAMA_TAGS_PATH), "http://h:1/api/tags");
        assert_eq!(join_url("http://h:1", OPENAI_MODELS_PATH), "http://h:1/v1/models");
    }

    #[tokio::test]
    async fn test_unconfigured_probe_is_empty_without_network() {
        let probe = OllamaTagsProbe::new(Some("   ".to_string()), DEFAULT_DISCOVERY_TIMEOUT);
        assert!(probe.base_url().is_none());
        assert!(matches!(
            probe.try_discover().await,
            Err(DiscoveryError::NotConfigured)
        ));
        assert!(probe.discover().await.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_server_degrades_to_empty() {
        // Port 9 (discard) on loopback is not expected to run an HTTP server.
        let probe = OpenAiModelsProbe::new(
            Some("http://127.0.0.1:9".to_string()),
            Duration::from_millis(500),
        );
        assert!(probe.try_discover().await.is_err());
        assert!(probe.discover().await.is_empty());
    }

    #[tokio::test]
    async fn test_static_probe_counts_calls() {
        let probe = StaticProbe::new(DiscoverySource::OllamaTags, "http://local", &["a"]);
        assert_eq!(probe.discover().await, vec!["a"]);
        assert_eq!(probe.discover().await, vec!["a"]);
        assert_eq!(probe.calls(), 2);

        let failing = StaticProbe::failing(DiscoverySource::OpenAiModels, "http://local");
        assert!(failing.discover().await.is_empty());
    }
}
