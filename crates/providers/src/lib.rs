//! Language-model backends for Heron.
//!
//! `OpenAiCompatProvider` talks to any OpenAI-compatible endpoint
//! (OpenRouter, OpenAI, Ollama, vLLM, ...). `UpstreamCaller` wraps a
//! provider with per-attempt timeouts, bounded exponential backoff,
//! and a degraded-service floor so the reply pipeline always gets
//! text back.

pub mod openai_compat;
pub mod retry;

pub use openai_compat::OpenAiCompatProvider;
pub use retry::{RetryPolicy, UpstreamCaller, DEGRADED_REPLY};
