//! Per-sender token bucket rate limiter.
//!
//! Capacity refills continuously at `refill` tokens per `window`
//! seconds. Arithmetic is fixed-point (milli-tokens over integer
//! seconds) so refill accrual is deterministic and testable with a
//! simulated clock: `check_at` takes an explicit timestamp, `check`
//! reads the wall clock.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

const MILLI: u64 = 1000;

/// Eviction threshold for the bucket map. Full, idle buckets hold no
/// state a fresh one wouldn't, so they can be dropped once the map
/// grows past this.
const CLEANUP_THRESHOLD: usize = 10_000;

/// One sender's bucket. Mutated only inside a single admission check,
/// under the limiter's lock.
#[derive(Debug, Clone)]
struct Bucket {
    milli_tokens: u64,
    last_refill_secs: u64,
}

/// Token bucket limiter keyed by sender id.
///
/// Thread-safe via `std::sync::Mutex` (non-async, held briefly); the
/// check-then-consume step is atomic with respect to concurrent
/// deliveries from the same sender.
pub struct TokenBucketLimiter {
    limit: u64,
    refill: u64,
    window_secs: u64,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl TokenBucketLimiter {
    /// Create a limiter with `limit` bucket capacity and `refill`
    /// tokens per `window_secs` seconds. `window_secs` must be
    /// positive (validated at config load).
    pub fn new(limit: u32, refill: u32, window_secs: u64) -> Self {
        Self {
            limit: u64::from(limit),
            refill: u64::from(refill),
            window_secs: window_secs.max(1),
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Check whether `sender_id` may proceed now. Returns `true` and
    /// consumes one token if available.
    pub fn check(&self, sender_id: &str) -> bool {
        self.check_at(sender_id, unix_secs())
    }

    /// Clock-injected variant of [`check`](Self::check).
    pub fn check_at(&self, sender_id: &str, now_secs: u64) -> bool {
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());

        if buckets.len() > CLEANUP_THRESHOLD {
            // Refill only happens inside a check, so an idle bucket's
            // stored count lags what it has logically accrued. Evict
            // buckets that would refill to capacity if touched now.
            let limit_milli = self.limit * MILLI;
            let refill = self.refill;
            let window = self.window_secs;
            buckets.retain(|_, b| {
                let elapsed = now_secs.saturating_sub(b.last_refill_secs);
                b.milli_tokens + elapsed * refill * MILLI / window < limit_milli
            });
        }

        let bucket = buckets.entry(sender_id.to_string()).or_insert(Bucket {
            // New senders start with a full bucket.
            milli_tokens: self.limit * MILLI,
            last_refill_secs: now_secs,
        });

        let elapsed = now_secs.saturating_sub(bucket.last_refill_secs);
        if elapsed > 0 {
            let refilled = elapsed * self.refill * MILLI / self.window_secs;
            bucket.milli_tokens = (bucket.milli_tokens + refilled).min(self.limit * MILLI);
            bucket.last_refill_secs = now_secs;
        }

        if bucket.milli_tokens >= MILLI {
            bucket.milli_tokens -= MILLI;
            true
        } else {
            false
        }
    }

    /// Whole tokens currently available for `sender_id` (rounded down),
    /// without consuming. Exposed for tests and diagnostics.
    pub fn available_at(&self, sender_id: &str, now_secs: u64) -> u64 {
        let buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());
        match buckets.get(sender_id) {
            None => self.limit,
            Some(bucket) => {
                let elapsed = now_secs.saturating_sub(bucket.last_refill_secs);
                let refilled = elapsed * self.refill * MILLI / self.window_secs;
                (bucket.milli_tokens + refilled).min(self.limit * MILLI) / MILLI
            }
        }
    }

    /// Number of tracked sender buckets.
    pub fn tracked_senders(&self) -> usize {
        self.buckets.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

fn unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_up_to_limit_then_denied() {
        let limiter = TokenBucketLimiter::new(12, 12, 60);
        for i in 0..12 {
            assert!(limiter.check_at("alice", 100), "check {i} should pass");
        }
        assert!(!limiter.check_at("alice", 100), "13th check must fail");
    }

    #[test]
    fn refill_follows_elapsed_times_rate() {
        // One token per second: refill = window.
        let limiter = TokenBucketLimiter::new(12, 60, 60);
        for _ in 0..12 {
            assert!(limiter.check_at("alice", 100));
        }
        assert!(!limiter.check_at("alice", 100));
        assert_eq!(limiter.available_at("alice", 105), 5);
    }

    #[test]
    fn fractional_refill_rounds_down() {
        // 12 tokens per 60 s = 0.2 tokens/s; 5 s accrues exactly 1.
        let limiter = TokenBucketLimiter::new(12, 12, 60);
        for _ in 0..12 {
            assert!(limiter.check_at("alice", 100));
        }
        assert_eq!(limiter.available_at("alice", 105), 1);
        assert!(limiter.check_at("alice", 105));
        assert!(!limiter.check_at("alice", 105));
    }

    #[test]
    fn refill_caps_at_limit() {
        let limiter = TokenBucketLimiter::new(3, 3, 1);
        assert!(limiter.check_at("bob", 100));
        // A long idle period never exceeds capacity.
        assert_eq!(limiter.available_at("bob", 100_000), 3);
    }

    #[test]
    fn senders_are_independent() {
        let limiter = TokenBucketLimiter::new(1, 1, 60);
        assert!(limiter.check_at("alice", 100));
        assert!(!limiter.check_at("alice", 100));
        assert!(limiter.check_at("bob", 100));
    }

    #[test]
    fn concurrent_checks_consume_exactly_limit() {
        use std::sync::Arc;
        let limiter = Arc::new(TokenBucketLimiter::new(10, 10, 60));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let limiter = limiter.clone();
            handles.push(std::thread::spawn(move || {
                (0..10).filter(|_| limiter.check_at("alice", 100)).count()
            }));
        }
        let allowed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(allowed, 10);
    }

    #[test]
    fn cleanup_evicts_logically_full_buckets() {
        let limiter = TokenBucketLimiter::new(5, 5, 60);
        for i in 0..=CLEANUP_THRESHOLD {
            assert!(limiter.check_at(&format!("sender{i}"), 100));
        }
        assert!(limiter.tracked_senders() > CLEANUP_THRESHOLD);

        // One sender is still measurably below capacity at cleanup
        // time; everyone else has been idle long enough to be full.
        assert!(limiter.check_at("active", 999_999));
        assert!(limiter.check_at("late", 1_000_000));
        assert_eq!(limiter.tracked_senders(), 2);
        assert!(limiter.available_at("active", 1_000_000) < 5);
    }

    #[test]
    fn tracks_one_bucket_per_sender() {
        let limiter = TokenBucketLimiter::new(5, 5, 60);
        limiter.check_at("a", 1);
        limiter.check_at("b", 1);
        limiter.check_at("a", 2);
        assert_eq!(limiter.tracked_senders(), 2);
    }
}
