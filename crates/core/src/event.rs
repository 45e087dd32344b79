//! Inbound event domain type and webhook payload parsing.
//!
//! One `InboundEvent` is created per HTTP delivery and discarded after
//! handling; only the derived user/assistant messages are persisted.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A parsed inbound chat event.
///
/// Immutable once parsed. `event_id` is the delivery system's stable
/// update identifier and drives deduplication; `sender_id` is the chat
/// the reply goes back to and drives rate limiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub event_id: String,
    pub sender_id: String,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

impl InboundEvent {
    /// Parse a Telegram-style update body.
    ///
    /// Returns `Err` only for malformed JSON (a hard client error).
    /// Structurally valid JSON that lacks the minimal fields (update id,
    /// chat id, text) yields `Ok(None)` — such deliveries are
    /// acknowledged as no-ops so the delivery system does not retry
    /// them (service messages, stickers, channel posts, ...).
    pub fn from_update_bytes(body: &[u8]) -> Result<Option<Self>, serde_json::Error> {
        let update: TelegramUpdate = serde_json::from_slice(body)?;
        Ok(Self::from_update(update))
    }

    fn from_update(update: TelegramUpdate) -> Option<Self> {
        let event_id = update.update_id?.to_string();
        // Edited messages carry the same shape under a different key.
        let msg = update.message.or(update.edited_message)?;
        let sender_id = msg.chat?.id?.to_string();
        let text = msg.text?;
        if text.is_empty() {
            return None;
        }
        Some(Self {
            event_id,
            sender_id,
            text,
            received_at: Utc::now(),
        })
    }
}

// --- Wire types (internal) ---

#[derive(Debug, Deserialize)]
struct TelegramUpdate {
    #[serde(default)]
    update_id: Option<i64>,
    #[serde(default)]
    message: Option<TelegramMessage>,
    #[serde(default)]
    edited_message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
struct TelegramMessage {
    #[serde(default)]
    chat: Option<TelegramChat>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramChat {
    #[serde(default)]
    id: Option<i64>,
}
