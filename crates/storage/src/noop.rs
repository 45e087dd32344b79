//! No-op storage backend — disables persistence entirely.

use async_trait::async_trait;
use heron_core::error::StorageError;
use heron_core::memory::{MemoryItem, MessageLog, VectorSearch};
use heron_core::prompt::Role;

/// A storage backend that stores nothing and finds nothing.
pub struct NoopStore;

#[async_trait]
impl VectorSearch for NoopStore {
    fn name(&self) -> &str {
        "noop"
    }

    async fn search(
        &self,
        _sender_id: &str,
        _vector: &[f32],
        _k: usize,
    ) -> Result<Vec<MemoryItem>, StorageError> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl MessageLog for NoopStore {
    async fn append(
        &self,
        _sender_id: &str,
        _role: Role,
        _content: &str,
    ) -> Result<(), StorageError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn search_returns_nothing() {
        let store = NoopStore;
        let rows = store.search("u", &[0.1], 8).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn append_succeeds_silently() {
        let store = NoopStore;
        store.append("u", Role::User, "hi").await.unwrap();
    }
}
