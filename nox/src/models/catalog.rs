//! Model catalog
//!
//! Static registry of known cloud models. Built once, shared behind an `Arc`
//! and never mutated; tests build alternate catalogs with [`ModelCatalog::new`].

use super::credentials::CredentialKey;
use super::normalize_model_name;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Category of provider integration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// OpenAI chat completions
    OpenAi,
    /// Anthropic messages API
    Anthropic,
    /// Google Gemini
    Gemini,
    /// Any OpenAI wire-compatible gateway (OpenRouter, llama.cpp)
    OpenAiCompatible,
    /// Ollama local inference server
    Ollama,
}

impl BackendKind {
    pub fn is_cloud(&self) -> bool {
        !matches!(self, BackendKind::Ollama)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::OpenAi => "openai",
            BackendKind::Anthropic => "anthropic",
            BackendKind::Gemini => "gemini",
            BackendKind::OpenAiCompatible => "openai-compatible",
            BackendKind::Ollama => "ollama",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A constructor parameter: either fixed, or looked up in the credential set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Literal(String),
    Credential(CredentialKey),
}

/// Fixed connection parameters of a catalog entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    /// Model name sent on the wire
    pub model: String,
    pub base_url: Option<ParamValue>,
    pub api_key: Option<ParamValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    /// Operator-facing identifier; its casing is what gets displayed
    pub id: String,
    pub kind: BackendKind,
    pub params: ConnectionParams,
}

impl ModelDescriptor {
    /// Direct vendor model: the wire name is the id, the key comes from `key`.
    pub fn vendor(id: &str, kind: BackendKind, key: CredentialKey) -> Self {
        Self {
            id: id.to_string(),
            kind,
            params: ConnectionParams {
                model: id.to_string(),
                base_url: None,
                api_key: Some(ParamValue::Credential(key)),
            },
        }
    }

    /// Model routed through the OpenRouter gateway.
    pub fn openrouter(id: &str, upstream_model: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: BackendKind::OpenAiCompatible,
            params: ConnectionParams {
                model: upstream_model.to_string(),
                base_url: Some(ParamValue::Credential(CredentialKey::OpenRouterBaseUrl)),
                api_key: Some(ParamValue::Credential(CredentialKey::OpenRouterApiKey)),
            },
        }
    }

    /// Credentials referenced by this entry's parameters.
    pub fn required_credentials(&self) -> Vec<CredentialKey> {
        [&self.params.base_url, &self.params.api_key]
            .into_iter()
            .filter_map(|p| match p {
                Some(ParamValue::Credential(key)) => Some(*key),
                _ => None,
            })
            .collect()
    }
}

/// Ordered, case-insensitive registry of model descriptors
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    entries: Vec<ModelDescriptor>,
    index: HashMap<String, usize>,
}

impl ModelCatalog {
    /// Build a catalog; a later entry whose normalized id repeats an earlier one is dropped.
    pub fn new(descriptors: Vec<ModelDescriptor>) -> Self {
        let mut entries = Vec::with_capacity(descriptors.len());
        let mut index = HashMap::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let key = normalize_model_name(&descriptor.id);
            if index.contains_key(&key) {
                warn!("Duplicate catalog entry '{}' ignored", descriptor.id);
                continue;
            }
            index.insert(key, entries.len());
            entries.push(descriptor);
        }
        Self { entries, index }
    }

    /// The cloud models this tool ships with.
    pub fn builtin() -> Self {
        use BackendKind::*;
        use CredentialKey::*;

        Self::new(vec![
            ModelDescriptor::vendor("gpt-4.1", OpenAi, OpenAiApiKey),
            ModelDescriptor::vendor("gpt-5.2", OpenAi, OpenAiApiKey),
            ModelDescriptor::vendor("gpt-5.1", OpenAi, OpenAiApiKey),
            ModelDescriptor::vendor("gpt-5-mini", OpenAi, OpenAiApiKey),
            ModelDescriptor::vendor("gpt-5-nano", OpenAi, OpenAiApiKey),
            ModelDescriptor::vendor("claude-sonnet-4-5", Anthropic, AnthropicApiKey),
            ModelDescriptor::vendor("claude-sonnet-4-0", Anthropic, AnthropicApiKey),
            ModelDescriptor::vendor("gemini-2.5-flash", Gemini, GoogleApiKey),
            ModelDescriptor::vendor("gemini-2.5-flash-lite", Gemini, GoogleApiKey),
            ModelDescriptor::vendor("gemini-2.5-pro", Gemini, GoogleApiKey),
            ModelDescriptor::openrouter(
                "qwen3-80b-openrouter",
                "qwen/qwen3-next-80b-a3b-instruct:free",
            ),
            ModelDescriptor::openrouter(
                "nemotron-nano-9b-openrouter",
                "nvidia/nemotron-nano-9b-v2:free",
            ),
            ModelDescriptor::openrouter("gpt-oss-120b-openrouter", "openai/gpt-oss-120b:free"),
            ModelDescriptor::openrouter("gpt-5.1-openrouter", "openai/gpt-5.1"),
            ModelDescriptor::openrouter("gpt-5-mini-openrouter", "openai/gpt-5-mini"),
            ModelDescriptor::openrouter(
                "claude-sonnet-4.5-openrouter",
                "anthropic/claude-sonnet-4.5",
            ),
            ModelDescriptor::openrouter("grok-4.1-fast-openrouter", "x-ai/grok-4.1-fast"),
        ])
    }

    /// Entries in insertion order.
    pub fn all_entries(&self) -> &[ModelDescriptor] {
        &self.entries
    }

    /// Case-insensitive lookup; trims and lowercases `id` before matching.
    pub fn lookup(&self, id: &str) -> Option<&ModelDescriptor> {
        self.index
            .get(&normalize_model_name(id))
            .map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_preserves_insertion_order() {
        let catalog = ModelCatalog::builtin();
        let ids: Vec<&str> = catalog.all_entries().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids.first(), Some(&"gpt-4.1"));
        assert_eq!(ids.last(), Some(&"grok-4.1-fast-openrouter"));
        assert_eq!(catalog.len(), 17);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let catalog = ModelCatalog::builtin();
        let a = catalog.lookup("GPT-5-MINI").unwrap();
        let b = catalog.lookup("  gpt-5-mini ").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.kind, BackendKind::OpenAi);
        assert!(catalog.lookup("gpt-3").is_none());
    }

    #[test]
    fn test_openrouter_entries_reference_gateway_credentials() {
        let catalog = ModelCatalog::builtin();
        let entry = catalog.lookup("qwen3-80b-openrouter").unwrap();
        assert_eq!(entry.kind, BackendKind::OpenAiCompatible);
        assert_eq!(entry.params.model, "qwen/qwen3-next-80b-a3b-instruct:free");
        assert_eq!(
            entry.required_credentials(),
            vec![CredentialKey::OpenRouterBaseUrl, CredentialKey::OpenRouterApiKey]
        );
    }

    #[test]
    fn test_duplicate_ids_keep_first_entry() {
        let catalog = ModelCatalog::new(vec![
            ModelDescriptor::vendor("Model-X", BackendKind::OpenAi, CredentialKey::OpenAiApiKey),
            ModelDescriptor::vendor(
                "model-x",
                BackendKind::Anthropic,
                CredentialKey::AnthropicApiKey,
            ),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.lookup("MODEL-X").unwrap().id, "Model-X");
        assert_eq!(catalog.lookup("model-x").unwrap().kind, BackendKind::OpenAi);
    }

    #[test]
    fn test_only_ollama_is_local() {
        assert!(BackendKind::OpenAi.is_cloud());
        assert!(BackendKind::OpenAiCompatible.is_cloud());
        assert!(!BackendKind::Ollama.is_cloud());
    }
}
