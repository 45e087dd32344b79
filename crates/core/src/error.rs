//! Error types for the Heron domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Heron operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Transport errors ---
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    // --- Storage errors ---
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures from the language-model backend.
///
/// The variants exist for observability; the retry loop treats
/// `Timeout`, `Network`, `ApiError`, and `BadResponse` identically.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Response missing expected fields: {0}")]
    BadResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Short label used in structured log fields when an upstream
    /// attempt fails.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::BadResponse(_) => "bad_response_shape",
            _ => "transport_error",
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Message delivery failed to {chat_id}: {reason}")]
    DeliveryFailed { chat_id: String, reason: String },

    #[error("Transport rejected formatting: {0}")]
    BadFormatting(String),

    #[error("Transport not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Insert failed: {0}")]
    InsertFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Storage not configured: {0}")]
    NotConfigured(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn provider_error_kinds() {
        assert_eq!(ProviderError::Timeout("60s".into()).kind(), "timeout");
        assert_eq!(
            ProviderError::BadResponse("no choices".into()).kind(),
            "bad_response_shape"
        );
        assert_eq!(
            ProviderError::Network("conn refused".into()).kind(),
            "transport_error"
        );
    }

    #[test]
    fn transport_error_displays_chat_id() {
        let err = TransportError::DeliveryFailed {
            chat_id: "12345".into(),
            reason: "timeout".into(),
        };
        assert!(err.to_string().contains("12345"));
    }
}
