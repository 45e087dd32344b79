//! Provider trait — the abstraction over the language-model backend.
//!
//! A Provider knows how to send an ordered prompt to an LLM and get
//! text back, and how to turn a batch of strings into embedding
//! vectors. Implementations: OpenAI-compatible endpoints (OpenRouter,
//! OpenAI, Ollama, vLLM, ...).

use crate::error::ProviderError;
use crate::prompt::PromptMessage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A chat-completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g., "meta-llama/llama-3.1-8b-instruct:free")
    pub model: String,

    /// The ordered prompt
    pub messages: Vec<PromptMessage>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.3
}

/// A completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The generated text
    pub content: String,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// An embedding request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// The model to use for embeddings (e.g., "BAAI/bge-small-en-v1.5").
    pub model: String,

    /// The texts to embed.
    pub inputs: Vec<String>,
}

/// An embedding response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// The embedding vectors, one per input text.
    pub embeddings: Vec<Vec<f32>>,

    /// Which model was used.
    pub model: String,
}

/// The core Provider trait.
///
/// The pipeline calls `complete()` and `embed()` without knowing which
/// backend is configured — pure polymorphism.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openrouter").
    fn name(&self) -> &str;

    /// Send a prompt and get a complete response.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError>;

    /// Generate embeddings for the given texts.
    ///
    /// Default implementation reports embeddings as unsupported.
    async fn embed(
        &self,
        _request: EmbeddingRequest,
    ) -> std::result::Result<EmbeddingResponse, ProviderError> {
        Err(ProviderError::NotConfigured(format!(
            "Provider '{}' does not support embeddings",
            self.name()
        )))
    }

    /// Health check — can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::PromptMessage;

    #[test]
    fn completion_request_serializes_messages() {
        let req = CompletionRequest {
            model: "test-model".into(),
            messages: vec![
                PromptMessage::system("You are Heron"),
                PromptMessage::user("hi"),
            ],
            temperature: default_temperature(),
            max_tokens: Some(512),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"role\":\"system\""));
        assert!(json.contains("\"max_tokens\":512"));
        assert!((req.temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn max_tokens_omitted_when_none() {
        let req = CompletionRequest {
            model: "m".into(),
            messages: vec![],
            temperature: 0.3,
            max_tokens: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("max_tokens"));
    }
}
