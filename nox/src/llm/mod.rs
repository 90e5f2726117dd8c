//! Model clients
//!
//! [`ClientFactory`] turns a [`ResolvedBackend`](crate::models::ResolvedBackend)
//! into an [`LlmHandle`]. Each backend family has its own [`ChatTransport`];
//! OpenAI, Gemini, OpenRouter and llama.cpp share the chat-completions one.

pub mod anthropic;
pub mod error;
pub mod factory;
pub mod handle;
pub mod ollama;
pub mod openai;
pub mod scripted;
mod sse;
pub mod transport;
pub mod types;

pub use anthropic::AnthropicTransport;
pub use error::{BackendConstructionError, BackendError};
pub use factory::ClientFactory;
pub use handle::LlmHandle;
pub use ollama::OllamaTransport;
pub use openai::OpenAiTransport;
pub use scripted::ScriptedTransport;
pub use transport::{ChatTransport, DEFAULT_IDLE_TIMEOUT};
pub use types::{ChatMessage, ChatRequest, ChatRole, GenerationSettings};
