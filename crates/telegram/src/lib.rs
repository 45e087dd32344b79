//! Telegram Bot API transport.
//!
//! Sends replies with Markdown formatting; when the Bot API rejects a
//! message over formatting (a 4xx with a parse-entities description),
//! the send is retried exactly once with formatting stripped.

use async_trait::async_trait;
use heron_core::error::TransportError;
use heron_core::transport::ChatTransport;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Telegram transport configuration.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    pub bot_token: String,
    /// Bot API base URL (overridable for tests and proxies).
    pub api_base: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Telegram chat transport.
pub struct TelegramTransport {
    config: TelegramConfig,
    client: reqwest::Client,
}

impl TelegramTransport {
    pub fn new(config: TelegramConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| TransportError::NotConfigured(format!("HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token,
            method
        )
    }

    async fn call(
        &self,
        method: &str,
        payload: &serde_json::Value,
    ) -> Result<(), TransportError> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(payload)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body: ApiError = response.json().await.unwrap_or_default();
        let reason = body.description.unwrap_or_else(|| status.to_string());
        if status.as_u16() == 400 && reason.to_ascii_lowercase().contains("parse") {
            Err(TransportError::BadFormatting(reason))
        } else {
            Err(TransportError::DeliveryFailed {
                chat_id: payload["chat_id"].to_string(),
                reason,
            })
        }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), TransportError> {
        let formatted = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });

        match self.call("sendMessage", &formatted).await {
            Ok(()) => Ok(()),
            Err(TransportError::BadFormatting(reason)) => {
                // Model output is not guaranteed to be valid Markdown;
                // retry once with formatting stripped.
                debug!(chat_id = %chat_id, reason = %reason, "Retrying send with plain formatting");
                let plain = serde_json::json!({
                    "chat_id": chat_id,
                    "text": text,
                });
                self.call("sendMessage", &plain).await
            }
            Err(e) => {
                warn!(chat_id = %chat_id, error = %e, "Telegram send failed");
                Err(e)
            }
        }
    }

    async fn send_typing(&self, chat_id: &str) -> Result<(), TransportError> {
        let payload = serde_json::json!({
            "chat_id": chat_id,
            "action": "typing",
        });
        self.call("sendChatAction", &payload).await
    }
}

#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default)]
    description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> TelegramTransport {
        TelegramTransport::new(TelegramConfig {
            bot_token: "123:abc".into(),
            api_base: "https://api.telegram.org".into(),
        })
        .unwrap()
    }

    #[test]
    fn method_url_embeds_token() {
        let t = transport();
        assert_eq!(
            t.method_url("sendMessage"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn api_base_trailing_slash_tolerated() {
        let t = TelegramTransport::new(TelegramConfig {
            bot_token: "t".into(),
            api_base: "http://localhost:9000/".into(),
        })
        .unwrap();
        assert_eq!(t.method_url("sendChatAction"), "http://localhost:9000/bott/sendChatAction");
    }

    #[test]
    fn debug_redacts_token() {
        let t = transport();
        let rendered = format!("{:?}", t.config);
        assert!(!rendered.contains("123:abc"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn api_error_parses_description() {
        let err: ApiError = serde_json::from_str(
            r#"{"ok":false,"error_code":400,"description":"Bad Request: can't parse entities"}"#,
        )
        .unwrap();
        assert!(err.description.unwrap().contains("parse entities"));
    }
}
