//! The dispatcher — one admitted delivery in, one reply out.
//!
//! Owns the pipeline ordering: admission, typing indicator, fast-path
//! commands, retrieval, assembly, upstream call, delivery, and the
//! best-effort message log. Every step past admission degrades rather
//! than fails: the sender always gets a reply for an accepted event.

use heron_admission::{Admission, AdmissionGuard, NoOpReason, RejectReason};
use heron_config::AppConfig;
use heron_core::memory::MessageLog;
use heron_core::prompt::Role;
use heron_core::provider::Provider;
use heron_core::{ChatTransport, InboundEvent, VectorSearch};
use heron_providers::{RetryPolicy, UpstreamCaller};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::assembler::PromptAssembler;
use crate::commands::fast_reply;
use crate::retriever::MemoryRetriever;

/// What the gateway should tell the delivery system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Event accepted and a reply was produced (200).
    Handled,
    /// Delivery acknowledged without processing (200).
    NoOp(NoOpReason),
    /// Delivery rejected (4xx); the reason maps to the status code.
    Rejected(RejectReason),
}

/// Orchestrates one webhook delivery end to end.
pub struct Dispatcher {
    guard: AdmissionGuard,
    transport: Arc<dyn ChatTransport>,
    retriever: MemoryRetriever,
    assembler: PromptAssembler,
    caller: UpstreamCaller,
    log: Arc<dyn MessageLog>,
}

impl Dispatcher {
    pub fn new(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        search: Arc<dyn VectorSearch>,
        log: Arc<dyn MessageLog>,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        let guard = AdmissionGuard::new(config, transport.clone());
        let retriever = MemoryRetriever::new(
            provider.clone(),
            search,
            config.llm.embed_model.clone(),
            config.memory.top_k,
            config.memory.min_score,
        );
        let assembler = PromptAssembler::new(
            config.persona.clone(),
            config.memory.context_max_chars,
        );
        let caller = UpstreamCaller::new(
            provider,
            RetryPolicy {
                max_attempts: config.llm.max_attempts,
                base_delay: Duration::from_millis(config.llm.backoff_base_ms),
                per_attempt_timeout: Duration::from_secs(config.llm.request_timeout_secs),
            },
            config.llm.model.clone(),
            config.llm.max_tokens,
            config.llm.temperature,
        );
        Self {
            guard,
            transport,
            retriever,
            assembler,
            caller,
            log,
        }
    }

    /// Handle one delivery. Admission failures are reported to the
    /// caller; everything after admission resolves to `Handled`.
    pub async fn dispatch(
        &self,
        content_type: Option<&str>,
        secret_header: Option<&str>,
        body: &[u8],
    ) -> DispatchOutcome {
        let started = Instant::now();
        let event = match self.guard.admit(content_type, secret_header, body) {
            Admission::Accept(event) => event,
            Admission::NoOp(reason) => {
                debug!(reason = reason.as_str(), "Delivery acknowledged as no-op");
                return DispatchOutcome::NoOp(reason);
            }
            Admission::Reject(reason) => return DispatchOutcome::Rejected(reason),
        };

        // Typing indicator is cosmetic; ignore delivery problems.
        if let Err(e) = self.transport.send_typing(&event.sender_id).await {
            debug!(sender_id = %event.sender_id, error = %e, "Typing indicator failed");
        }

        let reply = match fast_reply(&event.text) {
            Some(canned) => canned.to_string(),
            None => self.generate_reply(&event).await,
        };

        if let Err(e) = self.transport.send_text(&event.sender_id, &reply).await {
            warn!(sender_id = %event.sender_id, error = %e, "Reply delivery failed");
        }
        self.record_exchange(&event, &reply).await;

        info!(
            event_id = %event.event_id,
            sender_id = %event.sender_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Delivery handled"
        );
        DispatchOutcome::Handled
    }

    /// The full generation path: retrieval, assembly, upstream call.
    async fn generate_reply(&self, event: &InboundEvent) -> String {
        let memories = self.retriever.retrieve(&event.sender_id, &event.text).await;
        let prompt = self.assembler.assemble(&memories, &event.text);
        self.caller.complete_text(prompt).await
    }

    /// Best-effort persistence of the exchange. Log failures must never
    /// reach the sender.
    async fn record_exchange(&self, event: &InboundEvent, reply: &str) {
        if let Err(e) = self.log.append(&event.sender_id, Role::User, &event.text).await {
            warn!(sender_id = %event.sender_id, error = %e, "Failed to log user message");
        }
        if let Err(e) = self.log.append(&event.sender_id, Role::Assistant, reply).await {
            warn!(sender_id = %event.sender_id, error = %e, "Failed to log reply");
        }
    }
}
