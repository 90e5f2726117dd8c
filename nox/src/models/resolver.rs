use super::catalog::{BackendKind, ModelCatalog, ModelDescriptor, ParamValue};
use super::credentials::{ApiKey, CredentialKey, LOCAL_SENTINEL_KEY};
use super::discovery::{DiscoveredModel, DiscoveryProbe, OllamaTagsProbe, OpenAiModelsProbe};
use super::normalize_model_name;
use crate::config::{CredentialSet, Settings};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("model '{0}' not found")]
    ModelNotFound(String),
}

/// Backend kind plus final constructor parameters, owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBackend {
    /// Identifier as displayed (catalog casing, or as the server reported it)
    pub id: String,
    pub kind: BackendKind,
    /// Model name sent on the wire
    pub model: String,
    pub base_url: Option<String>,
    pub api_key: Option<ApiKey>,
    /// Credentials the descriptor references that failed the gate
    pub missing_credentials: Vec<CredentialKey>,
}

pub struct ModelResolver {
    catalog: Arc<ModelCatalog>,
    credentials: Arc<CredentialSet>,
    tags_probe: Arc<dyn DiscoveryProbe>,
    models_probe: Arc<dyn DiscoveryProbe>,
}

impl ModelResolver {
    pub fn new(
        catalog: Arc<ModelCatalog>,
        credentials: Arc<CredentialSet>,
        tags_probe: Arc<dyn DiscoveryProbe>,
        models_probe: Arc<dyn DiscoveryProbe>,
    ) -> Self {
        Self {
            catalog,
            credentials,
            tags_probe,
            models_probe,
        }
    }

    /// Builtin catalog plus HTTP probes pointed at the configured local servers.
    pub fn from_settings(settings: &Settings) -> Self {
        let credentials = Arc::new(settings.credentials.clone());
        let timeout = Duration::from_secs(settings.pipeline.discovery_timeout_secs);
        let ollama = credentials
            .usable(CredentialKey::OllamaBaseUrl)
            .map(String::from);
        let llama_cpp = credentials
            .usable(CredentialKey::LlamaCppBaseUrl)
            .map(String::from);

        Self::new(
            Arc::new(ModelCatalog::builtin()),
            credentials,
            Arc::new(OllamaTagsProbe::new(ollama, timeout)),
            Arc::new(OpenAiModelsProbe::new(llama_cpp, timeout)),
        )
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn credentials(&self) -> &CredentialSet {
        &self.credentials
    }

    /// Local entries are always visible; cloud entries need every referenced credential.
    pub fn is_visible(&self, descriptor: &ModelDescriptor) -> bool {
        if !descriptor.kind.is_cloud() {
            return true;
        }
        descriptor
            .required_credentials()
            .iter()
            .all(|key| self.credentials.is_usable(*key))
    }

    /// Catalog ids that pass the gate, in catalog order.
    pub fn gated_base(&self) -> Vec<String> {
        self.catalog
            .all_entries()
            .iter()
            .filter(|d| self.is_visible(d))
            .map(|d| d.id.clone())
            .collect()
    }

    /// Run both probes; tags results first, then model-listing results.
    pub async fn discover_all(&self) -> Vec<DiscoveredModel> {
        let (tags, listed) = tokio::join!(self.tags_probe.discover(), self.models_probe.discover());
        let tag_source = self.tags_probe.source();
        let list_source = self.models_probe.source();
        tags.into_iter()
            .map(|id| DiscoveredModel {
                id,
                source: tag_source,
            })
            .chain(listed.into_iter().map(|id| DiscoveredModel {
                id,
                source: list_source,
            }))
            .collect()
    }

    /// Gated catalog ids, followed by novel discovered ids sorted by normalized form.
    pub async fn list_visible(&self) -> Vec<String> {
        let base = self.gated_base();
        let mut seen: HashSet<String> = base.iter().map(|id| normalize_model_name(id)).collect();

        let mut novel: Vec<String> = Vec::new();
        for discovered in self.discover_all().await {
            if seen.insert(normalize_model_name(&discovered.id)) {
                novel.push(discovered.id);
            }
        }
        novel.sort_by_cached_key(|id| normalize_model_name(id));

        debug!(
            "{} catalog models visible, {} discovered locally",
            base.len(),
            novel.len()
        );
        base.into_iter().chain(novel).collect()
    }

    /// Catalog first, then the OpenAI-compatible listing, then the tags API.
    /// Probes are re-run on every call so freshly installed models resolve.
    pub async fn resolve(&self, name: &str) -> Option<ResolvedBackend> {
        let wanted = normalize_model_name(name);

        if let Some(descriptor) = self.catalog.lookup(&wanted) {
            return Some(self.resolve_descriptor(descriptor));
        }

        let listed = self.models_probe.discover().await;
        if let Some(id) = listed.into_iter().find(|m| normalize_model_name(m) == wanted) {
            let api_key = self
                .credentials
                .usable(CredentialKey::OpenAiApiKey)
                .unwrap_or(LOCAL_SENTINEL_KEY);
            return Some(ResolvedBackend {
                model: id.clone(),
                id,
                kind: BackendKind::OpenAiCompatible,
                base_url: self.models_probe.base_url().map(String::from),
                api_key: Some(ApiKey::new(api_key)),
                missing_credentials: Vec::new(),
            });
        }

        let tags = self.tags_probe.discover().await;
        if let Some(id) = tags.into_iter().find(|m| normalize_model_name(m) == wanted) {
            return Some(ResolvedBackend {
                model: id.clone(),
                id,
                kind: BackendKind::Ollama,
                base_url: self.tags_probe.base_url().map(String::from),
                api_key: None,
                missing_credentials: Vec::new(),
            });
        }

        None
    }

    pub async fn resolve_required(&self, name: &str) -> Result<ResolvedBackend, ResolveError> {
        self.resolve(name)
            .await
            .ok_or_else(|| ResolveError::ModelNotFound(name.trim().to_string()))
    }

    fn resolve_descriptor(&self, descriptor: &ModelDescriptor) -> ResolvedBackend {
        let mut missing = Vec::new();
        let mut substitute = |param: &Option<ParamValue>| -> Option<String> {
            match param {
                None => None,
                Some(ParamValue::Literal(value)) => Some(value.clone()),
                Some(ParamValue::Credential(key)) => match self.credentials.usable(*key) {
                    Some(value) => Some(value.to_string()),
                    None => {
                        missing.push(*key);
                        None
                    }
                },
            }
        };
        let base_url = substitute(&descriptor.params.base_url);
        let api_key = substitute(&descriptor.params.api_key).map(ApiKey::new);

        ResolvedBackend {
            id: descriptor.id.clone(),
            kind: descriptor.kind,
            model: descriptor.params.model.clone(),
            base_url,
            api_key,
            missing_credentials: missing,
        }
    }

    /// `preferred` when it is among `visible` (case-insensitively), else the first visible model.
    pub fn default_model(visible: &[String], preferred: &str) -> Option<String> {
        let wanted = normalize_model_name(preferred);
        visible
            .iter()
            .find(|id| normalize_model_name(id) == wanted)
            .or_else(|| visible.first())
            .cloned()
    }
}
