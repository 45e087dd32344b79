//! Memory retrieval — embed the inbound text, run vector search, and
//! keep only rows above the similarity threshold.
//!
//! Retrieval is best-effort enrichment: any failure (embedding call,
//! search call) degrades to an empty result and the reply pipeline
//! continues without memory.

use heron_core::memory::{MemoryItem, VectorSearch};
use heron_core::provider::{EmbeddingRequest, Provider};
use std::sync::Arc;
use tracing::{debug, warn};

/// Retrieves relevant prior facts for a sender's message.
pub struct MemoryRetriever {
    provider: Arc<dyn Provider>,
    search: Arc<dyn VectorSearch>,
    embed_model: String,
    top_k: usize,
    min_score: f32,
}

impl MemoryRetriever {
    pub fn new(
        provider: Arc<dyn Provider>,
        search: Arc<dyn VectorSearch>,
        embed_model: impl Into<String>,
        top_k: usize,
        min_score: f32,
    ) -> Self {
        Self {
            provider,
            search,
            embed_model: embed_model.into(),
            top_k,
            min_score,
        }
    }

    /// Fetch up to `top_k` memory items relevant to `text`, filtered by
    /// the similarity threshold and sorted highest score first. Never
    /// fails; empty means "no usable memory".
    pub async fn retrieve(&self, sender_id: &str, text: &str) -> Vec<MemoryItem> {
        let request = EmbeddingRequest {
            model: self.embed_model.clone(),
            inputs: vec![text.to_string()],
        };
        let vector = match self.provider.embed(request).await {
            Ok(response) => match response.embeddings.into_iter().next() {
                Some(v) if !v.is_empty() => v,
                _ => {
                    warn!(sender_id = %sender_id, "Embedding response was empty");
                    return Vec::new();
                }
            },
            Err(e) => {
                warn!(sender_id = %sender_id, error = %e, "Embedding failed, skipping retrieval");
                return Vec::new();
            }
        };

        let mut items = match self.search.search(sender_id, &vector, self.top_k).await {
            Ok(items) => items,
            Err(e) => {
                warn!(
                    backend = %self.search.name(),
                    sender_id = %sender_id,
                    error = %e,
                    "Vector search failed, continuing without memory"
                );
                return Vec::new();
            }
        };

        items.retain(|item| item.score >= self.min_score);
        // Backends should already order by score; enforce it anyway.
        items.sort_by(|a, b| b.score.total_cmp(&a.score));

        debug!(
            sender_id = %sender_id,
            kept = items.len(),
            "Memory retrieval complete"
        );
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use heron_core::error::{ProviderError, StorageError};
    use heron_core::provider::{CompletionRequest, CompletionResponse, EmbeddingResponse};

    struct FixedEmbedder;

    #[async_trait]
    impl Provider for FixedEmbedder {
        fn name(&self) -> &str {
            "fixed"
        }
        async fn complete(
            &self,
            _: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            unreachable!("retriever never calls complete")
        }
        async fn embed(
            &self,
            request: EmbeddingRequest,
        ) -> Result<EmbeddingResponse, ProviderError> {
            Ok(EmbeddingResponse {
                embeddings: vec![vec![0.1; 4]; request.inputs.len()],
                model: request.model,
            })
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Provider for FailingEmbedder {
        fn name(&self) -> &str {
            "failing"
        }
        async fn complete(
            &self,
            _: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            unreachable!()
        }
        async fn embed(&self, _: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
            Err(ProviderError::Network("embed endpoint down".into()))
        }
    }

    struct FixedSearch {
        items: Vec<MemoryItem>,
    }

    #[async_trait]
    impl VectorSearch for FixedSearch {
        fn name(&self) -> &str {
            "fixed"
        }
        async fn search(
            &self,
            _: &str,
            _: &[f32],
            _: usize,
        ) -> Result<Vec<MemoryItem>, StorageError> {
            Ok(self.items.clone())
        }
    }

    struct FailingSearch;

    #[async_trait]
    impl VectorSearch for FailingSearch {
        fn name(&self) -> &str {
            "failing"
        }
        async fn search(
            &self,
            _: &str,
            _: &[f32],
            _: usize,
        ) -> Result<Vec<MemoryItem>, StorageError> {
            Err(StorageError::QueryFailed("rpc error".into()))
        }
    }

    fn item(content: &str, score: f32) -> MemoryItem {
        MemoryItem {
            content: content.into(),
            score,
        }
    }

    #[tokio::test]
    async fn filters_below_threshold_and_sorts() {
        let retriever = MemoryRetriever::new(
            Arc::new(FixedEmbedder),
            Arc::new(FixedSearch {
                items: vec![
                    item("weak", 0.4),
                    item("strong", 0.9),
                    item("ok", 0.7),
                ],
            }),
            "embed-model",
            8,
            0.65,
        );
        let items = retriever.retrieve("u", "what do I like?").await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].content, "strong");
        assert_eq!(items[1].content, "ok");
    }

    #[tokio::test]
    async fn embedding_failure_degrades_to_empty() {
        let retriever = MemoryRetriever::new(
            Arc::new(FailingEmbedder),
            Arc::new(FixedSearch {
                items: vec![item("never seen", 0.99)],
            }),
            "embed-model",
            8,
            0.65,
        );
        assert!(retriever.retrieve("u", "hello").await.is_empty());
    }

    #[tokio::test]
    async fn search_failure_degrades_to_empty() {
        let retriever =
            MemoryRetriever::new(Arc::new(FixedEmbedder), Arc::new(FailingSearch), "m", 8, 0.65);
        assert!(retriever.retrieve("u", "hello").await.is_empty());
    }
}
