//! Credential gate
//!
//! Decides whether a configured credential or base URL can actually be used.
//! Shared by the resolver (catalog visibility) and by resolution of local
//! gateway keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Substring that marks a value copied verbatim from an example config.
pub const PLACEHOLDER_MARKER: &str = "your_";

/// Key sent to OpenAI-compatible local servers when no real key is usable.
pub const LOCAL_SENTINEL_KEY: &str = "sk-local";

/// A value is usable when it is present, non-blank and not a template placeholder.
pub fn is_usable(value: Option<&str>) -> bool {
    match value {
        Some(v) => !v.trim().is_empty() && !v.contains(PLACEHOLDER_MARKER),
        None => false,
    }
}

/// Named credential or endpoint value read from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKey {
    OpenAiApiKey,
    AnthropicApiKey,
    GoogleApiKey,
    OpenRouterApiKey,
    OpenRouterBaseUrl,
    OllamaBaseUrl,
    LlamaCppBaseUrl,
}

impl CredentialKey {
    pub const ALL: [CredentialKey; 7] = [
        CredentialKey::OpenAiApiKey,
        CredentialKey::AnthropicApiKey,
        CredentialKey::GoogleApiKey,
        CredentialKey::OpenRouterApiKey,
        CredentialKey::OpenRouterBaseUrl,
        CredentialKey::OllamaBaseUrl,
        CredentialKey::LlamaCppBaseUrl,
    ];

    /// Environment variable that overrides this value.
    pub fn env_var(&self) -> &'static str {
        match self {
            CredentialKey::OpenAiApiKey => "OPENAI_API_KEY",
            CredentialKey::AnthropicApiKey => "ANTHROPIC_API_KEY",
            CredentialKey::GoogleApiKey => "GOOGLE_API_KEY",
            CredentialKey::OpenRouterApiKey => "OPENROUTER_API_KEY",
            CredentialKey::OpenRouterBaseUrl => "OPENROUTER_BASE_URL",
            CredentialKey::OllamaBaseUrl => "OLLAMA_BASE_URL",
            CredentialKey::LlamaCppBaseUrl => "LLAMA_CPP_BASE_URL",
        }
    }

    /// Whether the value is a secret that must never be printed.
    pub fn is_secret(&self) -> bool {
        matches!(
            self,
            CredentialKey::OpenAiApiKey
                | CredentialKey::AnthropicApiKey
                | CredentialKey::GoogleApiKey
                | CredentialKey::OpenRouterApiKey
        )
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.env_var())
    }
}

/// API key wrapper that keeps the secret out of `Debug` output and logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_values() {
        assert!(is_usable(Some("sk-abc123")));
        assert!(is_usable(Some("  padded-key  ")));
    }

    #[test]
    fn test_unusable_values() {
        assert!(!is_usable(None));
        assert!(!is_usable(Some("")));
        assert!(!is_usable(Some("   \t")));
        assert!(!is_usable(Some("your_openai_key_here")));
        assert!(!is_usable(Some("sk-your_key")));
    }

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::new("sk-secret");
        assert_eq!(format!("{:?}", key), "ApiKey(***)");
        assert_eq!(key.expose(), "sk-secret");
    }

    #[test]
    fn test_env_var_names() {
        assert_eq!(CredentialKey::OpenRouterBaseUrl.env_var(), "OPENROUTER_BASE_URL");
        assert_eq!(CredentialKey::LlamaCppBaseUrl.to_string(), "LLAMA_CPP_BASE_URL");
        assert!(CredentialKey::GoogleApiKey.is_secret());
        assert!(!CredentialKey::OllamaBaseUrl.is_secret());
    }
}
