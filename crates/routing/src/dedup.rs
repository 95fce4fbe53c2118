use std::{
    collections::{HashSet, VecDeque},
    sync::Mutex,
};

/// Entries kept before eviction kicks in.
const CAPACITY: usize = 1000;

/// Oldest entries dropped when over capacity.
const EVICT_COUNT: usize = 500;

struct Inner {
    seen: HashSet<String>,
    order: VecDeque<String>,
}

/// Bounded set of recently processed event keys.
///
/// Guards at-most-once side effects under at-least-once upstream delivery.
/// Keys are marked before workflow dispatch, so a redelivery racing an
/// in-flight invocation counts as already handled. Eviction drops the
/// oldest half in insertion order, an approximation of LRU that only has
/// to bound the suppression window, not track true recency.
pub struct DedupCache {
    capacity: usize,
    evict_count: usize,
    inner: Mutex<Inner>,
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DedupCache {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(CAPACITY, EVICT_COUNT)
    }

    fn with_capacity(capacity: usize, evict_count: usize) -> Self {
        Self {
            capacity,
            evict_count,
            inner: Mutex::new(Inner {
                seen: HashSet::new(),
                order: VecDeque::new(),
            }),
        }
    }

    #[must_use]
    pub fn seen(&self, key: &str) -> bool {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.seen.contains(key)
    }

    pub fn mark_seen(&self, key: &str) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Self::insert(&mut inner, key, self.capacity, self.evict_count);
    }

    /// Atomic check-then-set: true exactly once per key. Two concurrent
    /// calls for the same key let exactly one caller proceed.
    #[must_use]
    pub fn first_encounter(&self, key: &str) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.seen.contains(key) {
            return false;
        }
        Self::insert(&mut inner, key, self.capacity, self.evict_count);
        true
    }

    fn insert(inner: &mut Inner, key: &str, capacity: usize, evict_count: usize) {
        if !inner.seen.insert(key.to_string()) {
            return;
        }
        inner.order.push_back(key.to_string());
        if inner.order.len() > capacity {
            for _ in 0..evict_count {
                if let Some(old) = inner.order.pop_front() {
                    inner.seen.remove(&old);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unseen_then_marked_then_seen() {
        let cache = DedupCache::new();
        assert!(!cache.seen("C1:1.0"));
        cache.mark_seen("C1:1.0");
        assert!(cache.seen("C1:1.0"));
    }

    #[test]
    fn first_encounter_is_true_exactly_once() {
        let cache = DedupCache::new();
        assert!(cache.first_encounter("C1:1.0"));
        assert!(!cache.first_encounter("C1:1.0"));
    }

    #[test]
    fn concurrent_first_encounters_admit_one_caller() {
        use std::sync::{Arc, Barrier, atomic::{AtomicUsize, Ordering}};

        let cache = Arc::new(DedupCache::new());
        let barrier = Arc::new(Barrier::new(8));
        let admitted = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                let admitted = Arc::clone(&admitted);
                std::thread::spawn(move || {
                    barrier.wait();
                    if cache.first_encounter("C1:race") {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            let _ = handle.join();
        }

        assert_eq!(admitted.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn overflow_evicts_the_oldest_half() {
        let cache = DedupCache::with_capacity(10, 5);
        for i in 0..11 {
            cache.mark_seen(&format!("C1:{i}"));
        }

        // 0..=4 evicted, 5..=10 retained.
        for i in 0..5 {
            assert!(!cache.seen(&format!("C1:{i}")), "key {i} should be evicted");
        }
        for i in 5..11 {
            assert!(cache.seen(&format!("C1:{i}")), "key {i} should remain");
        }
    }

    #[test]
    fn remarking_does_not_duplicate_order_entries() {
        let cache = DedupCache::with_capacity(10, 5);
        for _ in 0..20 {
            cache.mark_seen("C1:same");
        }
        assert!(cache.seen("C1:same"));
    }
}
