//! Bounded recency set of event ids.
//!
//! Delivery systems retry on non-2xx and occasionally double-deliver;
//! this window suppresses reprocessing of recently seen event ids.
//! Best-effort only: ids older than the window are forgotten.

use std::collections::{HashSet, VecDeque};

/// Fixed-capacity FIFO of event ids with O(1) membership.
///
/// Insertion evicts the oldest id when full; the capacity bound is set
/// at construction and never exceeded.
#[derive(Debug)]
pub struct RecentEventSet {
    capacity: usize,
    seen: HashSet<String>,
    order: VecDeque<String>,
}

impl RecentEventSet {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            seen: HashSet::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    /// Record `event_id` as seen. Returns `true` if it was new, `false`
    /// if it was already present (a duplicate delivery).
    pub fn insert(&mut self, event_id: &str) -> bool {
        if self.seen.contains(event_id) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.seen.insert(event_id.to_string());
        self.order.push_back(event_id.to_string());
        true
    }

    pub fn contains(&self, event_id: &str) -> bool {
        self.seen.contains(event_id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_insert_is_new() {
        let mut set = RecentEventSet::new(4);
        assert!(set.insert("e1"));
        assert!(set.contains("e1"));
    }

    #[test]
    fn second_insert_is_duplicate() {
        let mut set = RecentEventSet::new(4);
        assert!(set.insert("e1"));
        assert!(!set.insert("e1"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let mut set = RecentEventSet::new(3);
        set.insert("e1");
        set.insert("e2");
        set.insert("e3");
        set.insert("e4"); // evicts e1
        assert_eq!(set.len(), 3);
        assert!(!set.contains("e1"));
        assert!(set.contains("e2"));
        assert!(set.contains("e4"));
        // Evicted ids are treated as new again (window semantics).
        assert!(set.insert("e1"));
    }

    #[test]
    fn capacity_never_exceeded() {
        let mut set = RecentEventSet::new(8);
        for i in 0..100 {
            set.insert(&format!("e{i}"));
            assert!(set.len() <= 8);
        }
        assert_eq!(set.len(), 8);
    }

    #[test]
    fn zero_capacity_clamped_to_one() {
        let mut set = RecentEventSet::new(0);
        assert!(set.insert("e1"));
        assert!(!set.insert("e1"));
    }
}
