//! Configuration loading and validation for Heron.
//!
//! Loads an optional TOML file, then applies environment-variable
//! overrides for the secrets and endpoints that deployment platforms
//! inject (`TELEGRAM_TOKEN`, `LLM_API_KEY`, `SUPABASE_URL`, ...).
//! All values pulled from the environment are cleaned of BOM and
//! surrounding whitespace — secret managers are fond of trailing
//! newlines.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// The root configuration structure.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub memory: MemoryConfig,

    #[serde(default)]
    pub admission: AdmissionConfig,

    #[serde(default)]
    pub supabase: SupabaseConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    /// The fixed persona instruction prepended to every prompt.
    #[serde(default = "default_persona")]
    pub persona: String,
}

fn default_persona() -> String {
    "You are Heron, an honest, concise assistant. Explain jargon the first \
     time it appears and keep answers short, clear, and step by step when needed."
        .into()
}

/// Redact a secret string for Debug output.
fn redact(s: &str) -> &'static str {
    if s.is_empty() { "\"\"" } else { "[REDACTED]" }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("telegram", &self.telegram)
            .field("llm", &self.llm)
            .field("memory", &self.memory)
            .field("admission", &self.admission)
            .field("supabase", &self.supabase)
            .field("gateway", &self.gateway)
            .field("persona_len", &self.persona.len())
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    #[serde(default)]
    pub bot_token: String,

    /// Shared secret expected in the webhook secret header.
    #[serde(default)]
    pub secret_token: String,

    /// Bot API base URL (overridable for tests and proxies).
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".into()
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            secret_token: String::new(),
            api_base: default_telegram_api_base(),
        }
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &redact(&self.bot_token))
            .field("secret_token", &redact(&self.secret_token))
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_embed_model")]
    pub embed_model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,

    /// Hard per-attempt timeout for completion calls.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Total attempts before degrading (1 = no retry).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay for exponential backoff between attempts.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

fn default_llm_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_llm_model() -> String {
    "meta-llama/llama-3.1-8b-instruct:free".into()
}
fn default_embed_model() -> String {
    "BAAI/bge-small-en-v1.5".into()
}
fn default_max_tokens() -> u32 {
    512
}
fn default_llm_temperature() -> f32 {
    0.3
}
fn default_request_timeout_secs() -> u64 {
    60
}
fn default_max_attempts() -> u32 {
    3
}
fn default_backoff_base_ms() -> u64 {
    500
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            embed_model: default_embed_model(),
            max_tokens: default_max_tokens(),
            temperature: default_llm_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("embed_model", &self.embed_model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// How many rows to request from vector search.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Similarity threshold below which rows are discarded.
    #[serde(default = "default_min_score")]
    pub min_score: f32,

    /// Character budget for the rendered memory block.
    #[serde(default = "default_context_max_chars")]
    pub context_max_chars: usize,
}

fn default_top_k() -> usize {
    8
}
fn default_min_score() -> f32 {
    0.65
}
fn default_context_max_chars() -> usize {
    1200
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_score: default_min_score(),
            context_max_chars: default_context_max_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Capacity of the recent-event dedup window.
    #[serde(default = "default_dedup_capacity")]
    pub dedup_capacity: usize,

    /// Token bucket capacity per sender.
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,

    /// Tokens refilled per window.
    #[serde(default = "default_rate_refill")]
    pub rate_refill: u32,

    /// Refill window in seconds.
    #[serde(default = "default_rate_window_secs")]
    pub rate_window_secs: u64,
}

fn default_dedup_capacity() -> usize {
    512
}
fn default_rate_limit() -> u32 {
    12
}
fn default_rate_refill() -> u32 {
    12
}
fn default_rate_window_secs() -> u64 {
    60
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            dedup_capacity: default_dedup_capacity(),
            rate_limit: default_rate_limit(),
            rate_refill: default_rate_refill(),
            rate_window_secs: default_rate_window_secs(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SupabaseConfig {
    /// Project REST URL. Empty = storage disabled (noop backend).
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub service_role_key: String,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("service_role_key", &redact(&self.service_role_key))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Clean a value taken from the environment: strip a UTF-8 BOM and
/// surrounding whitespace (including `\r`/`\n` that secret managers
/// append).
fn clean(val: &str) -> String {
    val.trim_start_matches('\u{feff}').trim().to_string()
}

impl AppConfig {
    /// Load configuration from an optional TOML file, then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p).map_err(|source| ConfigError::Io {
                    path: p.display().to_string(),
                    source,
                })?;
                toml::from_str(&raw)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply the environment variables the original deployment platform
    /// injects. Unset variables leave the file/default value in place.
    pub fn apply_env_overrides(&mut self) {
        let mut set = |target: &mut String, key: &str| {
            if let Ok(val) = std::env::var(key) {
                let val = clean(&val);
                if !val.is_empty() {
                    *target = val;
                }
            }
        };
        set(&mut self.telegram.bot_token, "TELEGRAM_TOKEN");
        set(&mut self.telegram.secret_token, "TELEGRAM_SECRET_TOKEN");
        set(&mut self.llm.api_key, "LLM_API_KEY");
        set(&mut self.llm.base_url, "LLM_BASE_URL");
        set(&mut self.llm.model, "LLM_MODEL");
        set(&mut self.llm.embed_model, "EMBED_MODEL");
        set(&mut self.supabase.url, "SUPABASE_URL");
        set(
            &mut self.supabase.service_role_key,
            "SUPABASE_SERVICE_ROLE_KEY",
        );
    }

    /// Validate settings required to serve traffic.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.api_key.is_empty() {
            return Err(ConfigError::Invalid("llm.api_key is required".into()));
        }
        if self.telegram.secret_token.is_empty() {
            return Err(ConfigError::Invalid(
                "telegram.secret_token is required".into(),
            ));
        }
        if self.llm.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "llm.max_attempts must be at least 1".into(),
            ));
        }
        if self.admission.rate_window_secs == 0 {
            return Err(ConfigError::Invalid(
                "admission.rate_window_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Whether the Supabase backend is configured.
    pub fn storage_enabled(&self) -> bool {
        !self.supabase.url.is_empty() && !self.supabase.service_role_key.is_empty()
    }
}
