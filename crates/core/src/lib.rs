//! # Heron Core
//!
//! Domain types, collaborator traits, and error definitions for the Heron
//! conversational-bot backend. This crate has **zero framework
//! dependencies** — it defines the domain model the other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (language model, vector search, message
//! log, chat transport) is a narrow capability trait here. Implementations
//! live in their respective crates. This enables:
//! - Swapping backends via configuration
//! - Easy testing with hand-rolled mock implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod event;
pub mod memory;
pub mod prompt;
pub mod provider;
pub mod transport;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, StorageError, TransportError};
pub use event::InboundEvent;
pub use memory::{MemoryItem, MessageLog, VectorSearch};
pub use prompt::{Prompt, PromptMessage, Role};
pub use provider::{
    CompletionRequest, CompletionResponse, EmbeddingRequest, EmbeddingResponse, Provider,
};
pub use transport::ChatTransport;
