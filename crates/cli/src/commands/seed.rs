//! `heron seed` — embed a fact and store it for a user.

use anyhow::{Context, bail};
use heron_config::AppConfig;
use heron_core::provider::{EmbeddingRequest, Provider};
use heron_providers::OpenAiCompatProvider;
use heron_storage::SupabaseStore;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub async fn run(config_path: Option<&Path>, user: &str, text: &str) -> anyhow::Result<()> {
    let config = AppConfig::load(config_path).context("loading configuration")?;
    if config.llm.api_key.is_empty() {
        bail!("llm.api_key is required to embed the fact");
    }
    if !config.storage_enabled() {
        bail!("Supabase must be configured to seed memory (supabase.url, supabase.service_role_key)");
    }

    let provider = OpenAiCompatProvider::new(
        "openrouter",
        config.llm.base_url.clone(),
        config.llm.api_key.clone(),
        Duration::from_secs(config.llm.request_timeout_secs),
    )
    .context("building LLM provider")?;

    let response = provider
        .embed(EmbeddingRequest {
            model: config.llm.embed_model.clone(),
            inputs: vec![text.to_string()],
        })
        .await
        .context("embedding the fact")?;
    let Some(embedding) = response.embeddings.into_iter().next() else {
        bail!("embedding response contained no vectors");
    };

    let store = SupabaseStore::new(
        config.supabase.url.clone(),
        config.supabase.service_role_key.clone(),
    )
    .context("building Supabase store")?;
    let fact_id = store
        .add_fact(user, text, &embedding)
        .await
        .context("storing the fact")?;

    info!(user = %user, fact_id, "Fact stored");
    println!("Stored fact {fact_id} for user {user}");
    Ok(())
}
