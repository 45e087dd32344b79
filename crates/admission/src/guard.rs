//! The admission decision: compose authentication, content-type
//! validation, payload parsing, deduplication, and rate limiting.
//!
//! The ordering of checks is load-bearing: cheap rejections first, and
//! anything past authentication that cannot be processed is
//! acknowledged as a no-op rather than rejected, so a delivery system
//! that retries on non-2xx does not produce retry storms.

use heron_config::AppConfig;
use heron_core::{ChatTransport, InboundEvent};
use sha2::{Digest, Sha256};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::dedup::RecentEventSet;
use crate::rate::TokenBucketLimiter;

/// Notice sent (fire-and-forget) to a throttled sender.
const THROTTLE_NOTICE: &str =
    "You're sending messages a bit fast — give me a moment and try again.";

/// The admission decision for one delivery.
#[derive(Debug)]
pub enum Admission {
    /// Process the event through the reply pipeline.
    Accept(InboundEvent),
    /// Acknowledge the delivery (200) but do no further work.
    NoOp(NoOpReason),
    /// Reject with a client-error status; never retried internally.
    Reject(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    /// Valid JSON without the minimal event fields.
    Incomplete,
    /// Event id already handled within the dedup window.
    Duplicate,
    /// Sender's token bucket is empty.
    Throttled,
}

impl NoOpReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incomplete => "incomplete",
            Self::Duplicate => "duplicate",
            Self::Throttled => "throttled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Content type does not declare JSON (415).
    UnsupportedMediaType,
    /// Secret header missing or wrong (401).
    Unauthorized,
    /// Body is not valid JSON (400).
    BadRequest,
}

/// Process-local admission state plus the checks that guard the
/// pipeline. Constructed once at startup and shared across all
/// in-flight deliveries.
pub struct AdmissionGuard {
    secret: String,
    dedup: Mutex<RecentEventSet>,
    limiter: TokenBucketLimiter,
    transport: Arc<dyn ChatTransport>,
}

impl AdmissionGuard {
    pub fn new(config: &AppConfig, transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            secret: config.telegram.secret_token.clone(),
            dedup: Mutex::new(RecentEventSet::new(config.admission.dedup_capacity)),
            limiter: TokenBucketLimiter::new(
                config.admission.rate_limit,
                config.admission.rate_refill,
                config.admission.rate_window_secs,
            ),
            transport,
        }
    }

    /// Run the admission checks, in order, short-circuiting on the
    /// first failure. Mutations of the dedup set and rate bucket are
    /// atomic with the check that triggered them.
    pub fn admit(
        &self,
        content_type: Option<&str>,
        secret_header: Option<&str>,
        body: &[u8],
    ) -> Admission {
        // 1. Content type must declare JSON.
        if !declares_json(content_type) {
            return Admission::Reject(RejectReason::UnsupportedMediaType);
        }

        // 2. Shared secret, compared in constant time.
        let provided = secret_header.unwrap_or("").trim();
        if !constant_time_eq(provided, self.secret.trim()) {
            return Admission::Reject(RejectReason::Unauthorized);
        }

        // 3. Parse. Malformed JSON is a hard client error; valid JSON
        // lacking the minimal fields is acknowledged as a no-op.
        let event = match InboundEvent::from_update_bytes(body) {
            Err(e) => {
                debug!(error = %e, "Webhook body is not valid JSON");
                return Admission::Reject(RejectReason::BadRequest);
            }
            Ok(None) => return Admission::NoOp(NoOpReason::Incomplete),
            Ok(Some(event)) => event,
        };

        // 4. Dedup (check-then-insert under one lock).
        {
            let mut dedup = self.dedup.lock().unwrap_or_else(|e| e.into_inner());
            if !dedup.insert(&event.event_id) {
                debug!(event_id = %event.event_id, "Duplicate delivery suppressed");
                return Admission::NoOp(NoOpReason::Duplicate);
            }
        }

        // 5. Rate limit (check-then-consume under one lock).
        if !self.limiter.check(&event.sender_id) {
            self.notify_throttled(&event.sender_id);
            return Admission::NoOp(NoOpReason::Throttled);
        }

        Admission::Accept(event)
    }

    /// Fire-and-forget throttle notice. Failure to notify must not
    /// affect the admission decision.
    fn notify_throttled(&self, sender_id: &str) {
        warn!(sender_id = %sender_id, "Sender throttled");
        let transport = self.transport.clone();
        let chat_id = sender_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = transport.send_text(&chat_id, THROTTLE_NOTICE).await {
                warn!(chat_id = %chat_id, error = %e, "Failed to deliver throttle notice");
            }
        });
    }
}

/// Does the Content-Type header declare a JSON body?
/// Accepts parameters such as `; charset=utf-8`.
fn declares_json(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|v| v.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}

/// Constant-time string comparison via SHA-256 digests.
///
/// The header carries a plain shared secret, so both sides are hashed
/// and the fixed-length digests compared without early exit.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let da = Sha256::digest(a.as_bytes());
    let db = Sha256::digest(b.as_bytes());
    da.iter()
        .zip(db.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use heron_core::error::TransportError;

    struct NullTransport;

    #[async_trait]
    impl ChatTransport for NullTransport {
        fn name(&self) -> &str {
            "null"
        }
        async fn send_text(&self, _: &str, _: &str) -> Result<(), TransportError> {
            Ok(())
        }
        async fn send_typing(&self, _: &str) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn guard() -> AdmissionGuard {
        let mut config = AppConfig::default();
        config.telegram.secret_token = "s3cret".into();
        AdmissionGuard::new(&config, Arc::new(NullTransport))
    }

    fn update(id: i64, text: &str) -> Vec<u8> {
        format!(r#"{{"update_id":{id},"message":{{"chat":{{"id":777}},"text":"{text}"}}}}"#)
            .into_bytes()
    }

    #[test]
    fn declares_json_variants() {
        assert!(declares_json(Some("application/json")));
        assert!(declares_json(Some("application/json; charset=utf-8")));
        assert!(declares_json(Some("Application/JSON")));
        assert!(!declares_json(Some("text/plain")));
        assert!(!declares_json(None));
    }

    #[test]
    fn constant_time_eq_basic() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "abcd"));
        assert!(constant_time_eq("", ""));
    }

    #[tokio::test]
    async fn rejects_wrong_content_type() {
        let g = guard();
        let admission = g.admit(Some("text/plain"), Some("s3cret"), &update(1, "hi"));
        assert!(matches!(
            admission,
            Admission::Reject(RejectReason::UnsupportedMediaType)
        ));
    }

    #[tokio::test]
    async fn rejects_bad_secret() {
        let g = guard();
        let admission = g.admit(Some("application/json"), Some("wrong"), &update(1, "hi"));
        assert!(matches!(
            admission,
            Admission::Reject(RejectReason::Unauthorized)
        ));
        let admission = g.admit(Some("application/json"), None, &update(1, "hi"));
        assert!(matches!(
            admission,
            Admission::Reject(RejectReason::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn secret_tolerates_surrounding_whitespace() {
        // Secret managers append newlines; both sides are trimmed.
        let g = guard();
        let admission = g.admit(Some("application/json"), Some(" s3cret\n"), &update(1, "hi"));
        assert!(matches!(admission, Admission::Accept(_)));
    }

    #[tokio::test]
    async fn rejects_malformed_json() {
        let g = guard();
        let admission = g.admit(Some("application/json"), Some("s3cret"), b"{nope");
        assert!(matches!(
            admission,
            Admission::Reject(RejectReason::BadRequest)
        ));
    }

    #[tokio::test]
    async fn incomplete_payload_is_noop() {
        let g = guard();
        let admission = g.admit(
            Some("application/json"),
            Some("s3cret"),
            br#"{"update_id": 9}"#,
        );
        assert!(matches!(
            admission,
            Admission::NoOp(NoOpReason::Incomplete)
        ));
    }

    #[tokio::test]
    async fn duplicate_event_is_noop() {
        let g = guard();
        let body = update(42, "hello");
        assert!(matches!(
            g.admit(Some("application/json"), Some("s3cret"), &body),
            Admission::Accept(_)
        ));
        assert!(matches!(
            g.admit(Some("application/json"), Some("s3cret"), &body),
            Admission::NoOp(NoOpReason::Duplicate)
        ));
    }

    #[tokio::test]
    async fn throttled_sender_is_noop() {
        let mut config = AppConfig::default();
        config.telegram.secret_token = "s3cret".into();
        config.admission.rate_limit = 2;
        config.admission.rate_refill = 2;
        config.admission.rate_window_secs = 60;
        let g = AdmissionGuard::new(&config, Arc::new(NullTransport));

        for id in 0..2 {
            assert!(matches!(
                g.admit(Some("application/json"), Some("s3cret"), &update(id, "hi")),
                Admission::Accept(_)
            ));
        }
        assert!(matches!(
            g.admit(Some("application/json"), Some("s3cret"), &update(99, "hi")),
            Admission::NoOp(NoOpReason::Throttled)
        ));
    }

    #[test]
    fn concurrent_duplicate_deliveries_accept_exactly_once() {
        let g = Arc::new(guard());
        let body = update(7, "hello");
        let mut handles = Vec::new();
        for _ in 0..8 {
            let g = g.clone();
            let body = body.clone();
            handles.push(std::thread::spawn(move || {
                matches!(
                    g.admit(Some("application/json"), Some("s3cret"), &body),
                    Admission::Accept(_)
                )
            }));
        }
        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&accepted| accepted)
            .count();
        assert_eq!(accepted, 1);
    }

    #[tokio::test]
    async fn distinct_events_from_distinct_senders_accepted() {
        let g = guard();
        let a = g.admit(
            Some("application/json"),
            Some("s3cret"),
            br#"{"update_id":1,"message":{"chat":{"id":1},"text":"hi"}}"#,
        );
        let b = g.admit(
            Some("application/json"),
            Some("s3cret"),
            br#"{"update_id":2,"message":{"chat":{"id":2},"text":"hi"}}"#,
        );
        assert!(matches!(a, Admission::Accept(_)));
        assert!(matches!(b, Admission::Accept(_)));
    }
}
