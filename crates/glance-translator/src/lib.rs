use std::time::Duration;

use glance_types::{ModelConfig, SamplingOptions};

mod client;
mod ollama;
mod prompt;

pub use client::{Translation, TranslationClient, TranslationRequest};
pub use ollama::OllamaBackend;
pub use prompt::{build_prompt, clean_response};

/// Local inference service interface
#[async_trait::async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Run one non-streaming completion
    async fn generate(&self, request: &InferenceRequest) -> Result<String, InferenceError>;

    /// Whether the service answers at all
    async fn health_check(&self) -> bool;

    /// Provider metadata
    fn metadata(&self) -> ProviderMetadata;
}

#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRequest {
    pub model_id: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub sampling: Option<SamplingOptions>,
    /// Prompt is already templated, bypass the server's chat template
    pub raw: bool,
}

impl InferenceRequest {
    pub fn new(model: &ModelConfig, prompt: String, raw: bool) -> Self {
        Self {
            model_id: model.model_id.clone(),
            prompt,
            temperature: model.temperature,
            max_tokens: model.max_tokens,
            sampling: model.sampling,
            raw,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderMetadata {
    pub name: String,
    pub endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InferenceError {
    #[error("Service unreachable: {0}")]
    Unreachable(String),

    #[error("Model error: {0}")]
    Model(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslateError {
    #[error("Translation service unreachable: {0}")]
    ServiceUnreachable(String),

    #[error("Model error: {0}")]
    ModelError(String),

    #[error("Translation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Translation cancelled")]
    Cancelled,
}

impl From<InferenceError> for TranslateError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::Unreachable(msg) => TranslateError::ServiceUnreachable(msg),
            InferenceError::Model(msg) => TranslateError::ModelError(msg),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("Invalid endpoint URL '{url}': {reason}")]
    Invalid { url: String, reason: String },

    #[error("Endpoint '{0}' is not on the local host")]
    NotLocal(String),
}
