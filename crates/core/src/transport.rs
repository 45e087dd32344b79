//! Chat transport trait — outbound side of the conversation.

use crate::error::TransportError;
use async_trait::async_trait;

/// Capability: deliver text and typing indicators to a chat.
///
/// Implementations must carry their own request timeouts; nothing in
/// the pipeline may block indefinitely on a send.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// The transport name (e.g., "telegram").
    fn name(&self) -> &str;

    /// Send a text message to `chat_id`.
    ///
    /// Implementations should tolerate formatting-related rejections by
    /// retrying once with plain formatting before reporting failure.
    async fn send_text(
        &self,
        chat_id: &str,
        text: &str,
    ) -> std::result::Result<(), TransportError>;

    /// Best-effort typing indicator; callers ignore failures.
    async fn send_typing(&self, chat_id: &str) -> std::result::Result<(), TransportError>;
}
