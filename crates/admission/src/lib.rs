//! Admission control for inbound webhook deliveries.
//!
//! Composes authentication, content-type validation, payload parsing,
//! deduplication, and per-sender rate limiting into a single
//! accept / no-op / reject decision per delivery.
//!
//! All admission state is process-local by design: under horizontal
//! scaling, dedup and rate limiting are approximate per instance. There
//! is no cross-process coordination.

pub mod dedup;
pub mod guard;
pub mod rate;

pub use dedup::RecentEventSet;
pub use guard::{Admission, AdmissionGuard, NoOpReason, RejectReason};
pub use rate::TokenBucketLimiter;
