use crate::models::credentials::{is_usable, CredentialKey};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "gpt-5-mini";

/// Top-level configuration loaded from `nox.toml` plus environment overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub credentials: CredentialSet,
    pub pipeline: PipelineConfig,
    pub search: SearchConfig,
    pub scrape: ScrapeConfig,
}

/// API keys and base URLs, read once at startup and never mutated afterwards
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialSet {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub openrouter_api_key: Option<String>,
    pub openrouter_base_url: Option<String>,
    pub ollama_base_url: Option<String>,
    pub llama_cpp_base_url: Option<String>,
}

impl Default for CredentialSet {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            anthropic_api_key: None,
            google_api_key: None,
            openrouter_api_key: None,
            openrouter_base_url: Some(DEFAULT_OPENROUTER_BASE_URL.to_string()),
            ollama_base_url: None,
            llama_cpp_base_url: None,
        }
    }
}

impl CredentialSet {
    /// An empty set: no keys, no base URLs, not even the OpenRouter default.
    pub fn empty() -> Self {
        Self {
            openrouter_base_url: None,
            ..Self::default()
        }
    }

    /// Raw configured value, usable or not.
    pub fn get(&self, key: CredentialKey) -> Option<&str> {
        let slot = match key {
            CredentialKey::OpenAiApiKey => &self.openai_api_key,
            CredentialKey::AnthropicApiKey => &self.anthropic_api_key,
            CredentialKey::GoogleApiKey => &self.google_api_key,
            CredentialKey::OpenRouterApiKey => &self.openrouter_api_key,
            CredentialKey::OpenRouterBaseUrl => &self.openrouter_base_url,
            CredentialKey::OllamaBaseUrl => &self.ollama_base_url,
            CredentialKey::LlamaCppBaseUrl => &self.llama_cpp_base_url,
        };
        slot.as_deref()
    }

    /// Value that passes the credential gate, trimmed.
    pub fn usable(&self, key: CredentialKey) -> Option<&str> {
        let value = self.get(key);
        if is_usable(value) {
            value.map(str::trim)
        } else {
            None
        }
    }

    pub fn is_usable(&self, key: CredentialKey) -> bool {
        self.usable(key).is_some()
    }

    pub fn set(&mut self, key: CredentialKey, value: Option<String>) {
        let slot = match key {
            CredentialKey::OpenAiApiKey => &mut self.openai_api_key,
            CredentialKey::AnthropicApiKey => &mut self.anthropic_api_key,
            CredentialKey::GoogleApiKey => &mut self.google_api_key,
            CredentialKey::OpenRouterApiKey => &mut self.openrouter_api_key,
            CredentialKey::OpenRouterBaseUrl => &mut self.openrouter_base_url,
            CredentialKey::OllamaBaseUrl => &mut self.ollama_base_url,
            CredentialKey::LlamaCppBaseUrl => &mut self.llama_cpp_base_url,
        };
        *slot = value;
    }

    /// Overlay values from an environment lookup; absent variables keep the file value.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for key in CredentialKey::ALL {
            if let Some(value) = lookup(key.env_var()) {
                self.set(key, Some(value));
            }
        }
    }
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("CredentialSet");
        for key in CredentialKey::ALL {
            let shown = match (key.is_secret(), self.get(key)) {
                (_, None) => "unset".to_string(),
                (true, Some(_)) => "***".to_string(),
                (false, Some(v)) => v.to_string(),
            };
            dbg.field(key.env_var(), &shown);
        }
        dbg.finish()
    }
}

/// Pipeline tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Model used when the operator does not pick one
    pub default_model: String,
    /// Concurrency handed to the search and scrape collaborators
    pub threads: usize,
    /// Lifetime of cached search and scrape results
    pub cache_ttl_secs: u64,
    /// Streaming buffer flush threshold in characters
    pub stream_buffer_limit: usize,
    /// Timeout for local model discovery probes
    pub discovery_timeout_secs: u64,
    /// Longest silence tolerated from a model backend, while connecting or
    /// between streamed chunks. Replies that keep streaming are not cut off.
    pub stream_idle_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_model: DEFAULT_MODEL.to_string(),
            threads: 5,
            cache_ttl_secs: 200,
            stream_buffer_limit: 60,
            discovery_timeout_secs: 3,
            stream_idle_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Search URL templates; `{query}` is replaced by the encoded query
    pub engines: Vec<String>,
    /// Proxy for all search requests, e.g. `socks5h://127.0.0.1:9050`
    pub proxy: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            engines: vec!["https://ahmia.fi/search/?q={query}".to_string()],
            proxy: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub proxy: Option<String>,
    pub timeout_secs: u64,
    /// Characters kept per scraped document
    pub max_chars: usize,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            timeout_secs: 30,
            max_chars: 2000,
        }
    }
}
