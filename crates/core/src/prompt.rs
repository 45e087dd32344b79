//! Prompt value objects.
//!
//! A `Prompt` is the ordered message sequence handed to the language
//! model: constructed fresh per request, never mutated after
//! construction.

use serde::{Deserialize, Serialize};

/// The role of a message in a prompt or in the persisted message log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (persona, injected memory)
    System,
    /// The end user
    User,
    /// The bot's reply
    Assistant,
}

impl Role {
    /// Wire name used by the completion API and the message-log store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single entry in a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// An ordered prompt, system entries first.
pub type Prompt = Vec<PromptMessage>;
