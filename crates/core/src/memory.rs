//! Memory retrieval and persistence traits.
//!
//! Retrieval is best-effort context enrichment: the vector-search
//! collaborator may fail or return nothing, and the reply pipeline
//! carries on without it. The message log is append-only and also
//! best-effort.

use crate::error::StorageError;
use crate::prompt::Role;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A retrieved prior fact or summary, ranked by similarity.
///
/// Read-only: sourced externally and consumed once to build a prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryItem {
    /// The stored content.
    pub content: String,

    /// Cosine similarity score in [0, 1], highest = most relevant.
    #[serde(default)]
    pub score: f32,
}

/// Capability: similarity search over a sender's stored memory vectors.
#[async_trait]
pub trait VectorSearch: Send + Sync {
    /// The backend name (e.g., "supabase", "noop").
    fn name(&self) -> &str;

    /// Return up to `k` rows for `sender_id` ordered by descending
    /// score. An empty vec is a valid answer, not an error.
    async fn search(
        &self,
        sender_id: &str,
        vector: &[f32],
        k: usize,
    ) -> std::result::Result<Vec<MemoryItem>, StorageError>;
}

/// Capability: append-only persistence of exchanged messages.
#[async_trait]
pub trait MessageLog: Send + Sync {
    /// Append one message row `{sender_id, role, content}`.
    async fn append(
        &self,
        sender_id: &str,
        role: Role,
        content: &str,
    ) -> std::result::Result<(), StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_item_deserializes_with_default_score() {
        let item: MemoryItem = serde_json::from_str(r#"{"content":"likes tea"}"#).unwrap();
        assert_eq!(item.content, "likes tea");
        assert_eq!(item.score, 0.0);
    }

    #[test]
    fn memory_item_roundtrip() {
        let item = MemoryItem {
            content: "likes trà đá".into(),
            score: 0.9,
        };
        let json = serde_json::to_string(&item).unwrap();
        let back: MemoryItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back.content, item.content);
        assert!((back.score - 0.9).abs() < f32::EPSILON);
    }
}
