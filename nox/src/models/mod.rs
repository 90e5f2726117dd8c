//! Model resolution
//!
//! Turns an operator-supplied model name into a fully parameterized backend
//! configuration. Static catalog entries are gated on credentials; local
//! servers are probed at runtime and unioned in at resolution time.

pub mod catalog;
pub mod credentials;
pub mod discovery;
pub mod resolver;

pub use catalog::{BackendKind, ConnectionParams, ModelCatalog, ModelDescriptor, ParamValue};
pub use credentials::{is_usable, ApiKey, CredentialKey};
pub use discovery::{
    DiscoveredModel, DiscoveryError, DiscoveryProbe, DiscoverySource, OllamaTagsProbe,
    OpenAiModelsProbe, StaticProbe,
};
pub use resolver::{ModelResolver, ResolveError, ResolvedBackend};

/// Canonical comparison form of a model identifier.
pub fn normalize_model_name(name: &str) -> String {
    name.trim().to_lowercase()
}
