//! Supabase REST/RPC client.
//!
//! Three tables back the bot's memory:
//! - `messages` — append-only conversation log `{user_id, role, content}`
//! - `memory_facts` — durable facts seeded per user
//! - `memory_vectors` — embedding rows the `memory_search` RPC scans

use async_trait::async_trait;
use heron_core::error::StorageError;
use heron_core::memory::{MemoryItem, MessageLog, VectorSearch};
use heron_core::prompt::Role;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// A Supabase project accessed with the service-role key.
pub struct SupabaseStore {
    base_url: String,
    service_key: String,
    client: reqwest::Client,
}

impl SupabaseStore {
    /// Create a store against `base_url` (the project URL, without
    /// `/rest/v1`).
    pub fn new(
        base_url: impl Into<String>,
        service_key: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| StorageError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
            client,
        })
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
            .header("Content-Type", "application/json")
    }

    /// Insert a row and return the `id` column of the created record.
    async fn insert_returning_id(
        &self,
        table: &str,
        row: serde_json::Value,
    ) -> Result<i64, StorageError> {
        let response = self
            .post(&format!("/rest/v1/{table}"))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await
            .map_err(|e| StorageError::InsertFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::InsertFailed(format!(
                "{table} insert returned {status}: {body}"
            )));
        }

        let rows: Vec<InsertedRow> = response
            .json()
            .await
            .map_err(|e| StorageError::InsertFailed(format!("parse insert response: {e}")))?;
        rows.first()
            .map(|r| r.id)
            .ok_or_else(|| StorageError::InsertFailed(format!("{table} insert returned no rows")))
    }

    /// Seed a durable fact for a user: insert the fact row, then the
    /// embedding row the `memory_search` RPC scans.
    pub async fn add_fact(
        &self,
        user_id: &str,
        content: &str,
        embedding: &[f32],
    ) -> Result<i64, StorageError> {
        let fact_id = self
            .insert_returning_id(
                "memory_facts",
                serde_json::json!({
                    "user_id": user_id,
                    "content": content,
                    "meta": {"weight": 1.0},
                }),
            )
            .await?;

        self.insert_returning_id(
            "memory_vectors",
            serde_json::json!({
                "user_id": user_id,
                "ref_type": "fact",
                "ref_id": fact_id,
                "content": content,
                "embedding": embedding,
            }),
        )
        .await?;

        debug!(user_id = %user_id, fact_id, "Seeded memory fact");
        Ok(fact_id)
    }
}

#[async_trait]
impl VectorSearch for SupabaseStore {
    fn name(&self) -> &str {
        "supabase"
    }

    async fn search(
        &self,
        sender_id: &str,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<MemoryItem>, StorageError> {
        let response = self
            .post("/rest/v1/rpc/memory_search")
            .json(&serde_json::json!({
                "u": sender_id,
                "q": vector,
                "k": k,
            }))
            .send()
            .await
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::QueryFailed(format!(
                "memory_search returned {status}: {body}"
            )));
        }

        let rows: Vec<MemoryItem> = response
            .json()
            .await
            .map_err(|e| StorageError::QueryFailed(format!("parse memory_search rows: {e}")))?;
        Ok(rows)
    }
}

#[async_trait]
impl MessageLog for SupabaseStore {
    async fn append(
        &self,
        sender_id: &str,
        role: Role,
        content: &str,
    ) -> Result<(), StorageError> {
        let response = self
            .post("/rest/v1/messages")
            .header("Prefer", "return=minimal")
            .json(&serde_json::json!({
                "user_id": sender_id,
                "role": role.as_str(),
                "content": content,
            }))
            .send()
            .await
            .map_err(|e| StorageError::InsertFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::InsertFailed(format!(
                "messages insert returned {status}: {body}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct InsertedRow {
    id: i64,
}
