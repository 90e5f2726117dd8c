//! Configuration module
//!
//! Settings come from an optional TOML file; credentials can be overridden
//! from the environment. Everything here is read once at startup.

pub mod types;

pub use types::*;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding both the search and the scrape proxy
pub const ENV_PROXY: &str = "NOX_PROXY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Paths probed when no explicit config file is given
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["nox.toml", "config/nox.toml"];

/// First default config path that exists
pub fn find_default_config() -> Option<PathBuf> {
    DEFAULT_CONFIG_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

impl Settings {
    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path` (or the first default path that exists), then apply
    /// environment overrides. No file at all yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => match find_default_config() {
                Some(found) => Self::from_file(&found)?,
                None => Self::default(),
            },
        };
        settings.apply_env(|name| std::env::var(name).ok());
        Ok(settings)
    }

    /// Overlay environment values on top of file values
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        self.credentials.apply_env(&lookup);
        if let Some(proxy) = lookup(ENV_PROXY).filter(|p| !p.trim().is_empty()) {
            self.search.proxy = Some(proxy.clone());
            self.scrape.proxy = Some(proxy);
        }
    }

    /// Commented template written by `nox config init`
    pub fn template() -> &'static str {
        r#"# NOX configuration
# Environment variables (OPENAI_API_KEY, ANTHROPIC_API_KEY, GOOGLE_API_KEY,
# OPENROUTER_API_KEY, OPENROUTER_BASE_URL, OLLAMA_BASE_URL, LLAMA_CPP_BASE_URL,
# NOX_PROXY) take precedence over values in this file.

[credentials]
# openai_api_key = "your_openai_key"
# anthropic_api_key = "your_anthropic_key"
# google_api_key = "your_google_key"
# openrouter_api_key = "your_openrouter_key"
openrouter_base_url = "https://openrouter.ai/api/v1"
# ollama_base_url = "http://127.0.0.1:11434"
# llama_cpp_base_url = "http://127.0.0.1:8080"

[pipeline]
default_model = "gpt-5-mini"
threads = 5
cache_ttl_secs = 200
stream_buffer_limit = 60
discovery_timeout_secs = 3
stream_idle_timeout_secs = 120

[search]
engines = ["https://ahmia.fi/search/?q={query}"]
# proxy = "socks5h://127.0.0.1:9050"
timeout_secs = 30

[scrape]
# proxy = "socks5h://127.0.0.1:9050"
timeout_secs = 30
max_chars = 2000
"#
    }
}
