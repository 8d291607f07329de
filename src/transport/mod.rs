//! Boundary to the remote responder: one chat round trip per call, plus the
//! read-only model and template catalogs.
//!
//! A call either yields exactly one assistant message or an error. There is
//! no retry, backoff, streaming, or timeout here; callers decide whether to
//! send again.

pub mod factory;
pub mod http;
pub mod mock;

use crate::core::{AIModel, AetherError, ChatMessage, ModelParameters, PromptTemplate};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use factory::BackendFactory;
pub use http::HttpBackend;
pub use mock::MockBackend;

/// Conversation snapshot sent to the responder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub parameters: ModelParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: ChatMessage,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelCatalog {
    pub models: Vec<AIModel>,
    pub total: usize,
}

impl ModelCatalog {
    pub fn find(&self, id: &str) -> Option<&AIModel> {
        self.models.iter().find(|m| m.id == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateCatalog {
    pub templates: Vec<PromptTemplate>,
    pub total: usize,
}

impl TemplateCatalog {
    pub fn find(&self, id: &str) -> Option<&PromptTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends the conversation and waits for the single assistant reply.
    async fn send(&self, request: &ChatRequest) -> Result<ChatMessage, AetherError>;
}

#[async_trait]
pub trait Catalog: Send + Sync {
    async fn models(&self) -> Result<ModelCatalog, AetherError>;
    async fn templates(&self) -> Result<TemplateCatalog, AetherError>;
}

/// Everything the client needs from a responder.
pub trait Backend: ChatTransport + Catalog {}

impl<T: ChatTransport + Catalog> Backend for T {}
