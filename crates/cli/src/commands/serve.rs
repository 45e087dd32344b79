//! `heron serve` — build the object graph and run the gateway.

use anyhow::Context;
use heron_agent::Dispatcher;
use heron_config::AppConfig;
use heron_core::memory::{MessageLog, VectorSearch};
use heron_core::provider::Provider;
use heron_core::ChatTransport;
use heron_providers::OpenAiCompatProvider;
use heron_storage::{NoopStore, SupabaseStore};
use heron_telegram::{TelegramConfig, TelegramTransport};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub async fn run(config_path: Option<&Path>, port: Option<u16>) -> anyhow::Result<()> {
    let mut config = AppConfig::load(config_path).context("loading configuration")?;
    if let Some(port) = port {
        config.gateway.port = port;
    }
    config.validate().context("validating configuration")?;

    let provider: Arc<dyn Provider> = Arc::new(
        OpenAiCompatProvider::new(
            "openrouter",
            config.llm.base_url.clone(),
            config.llm.api_key.clone(),
            Duration::from_secs(config.llm.request_timeout_secs),
        )
        .context("building LLM provider")?,
    );

    let (search, log): (Arc<dyn VectorSearch>, Arc<dyn MessageLog>) = if config.storage_enabled() {
        let store = Arc::new(
            SupabaseStore::new(
                config.supabase.url.clone(),
                config.supabase.service_role_key.clone(),
            )
            .context("building Supabase store")?,
        );
        (store.clone(), store)
    } else {
        warn!("Supabase is not configured; running without long-term memory");
        (Arc::new(NoopStore), Arc::new(NoopStore))
    };

    let transport: Arc<dyn ChatTransport> = Arc::new(
        TelegramTransport::new(TelegramConfig {
            bot_token: config.telegram.bot_token.clone(),
            api_base: config.telegram.api_base.clone(),
        })
        .context("building Telegram transport")?,
    );

    info!(
        model = %config.llm.model,
        memory = search.name(),
        "Starting Heron"
    );

    let dispatcher = Arc::new(Dispatcher::new(&config, provider, search, log, transport));
    heron_gateway::serve(&config, dispatcher)
        .await
        .context("gateway server")?;
    Ok(())
}
