//! Bounded, TTL-aware evaluation cache keyed by address.
//!
//! An RCU-style copy-on-write snapshot would let readers never block a
//! writer mid-swap, but a `parking_lot::Mutex` around an `lru::LruCache`
//! gives the same bounded memory and recency behavior with far less code,
//! at the cost of briefly serializing concurrent cache lookups -- a
//! deliberate simplification, not an oversight.

use crate::rule_engine::types::RuleMatchResult;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

struct Entry {
    results: Vec<RuleMatchResult>,
    inserted_at: Instant,
}

pub struct EvaluationCache {
    inner: Mutex<LruCache<String, Entry>>,
    ttl: Option<Duration>,
}

impl EvaluationCache {
    pub fn new(capacity: usize, ttl_ms: u32) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        EvaluationCache {
            inner: Mutex::new(LruCache::new(capacity)),
            ttl: if ttl_ms == 0 {
                None
            } else {
                Some(Duration::from_millis(ttl_ms as u64))
            },
        }
    }

    pub fn get(&self, address: &str) -> Option<Vec<RuleMatchResult>> {
        let mut cache = self.inner.lock();
        let entry = cache.get(address)?;
        if let Some(ttl) = self.ttl {
            if entry.inserted_at.elapsed() > ttl {
                cache.pop(address);
                return None;
            }
        }
        Some(entry.results.clone())
    }

    pub fn put(&self, address: String, results: Vec<RuleMatchResult>) {
        self.inner.lock().put(
            address,
            Entry {
                results,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Evicts every cached address whose stored results reference
    /// `pattern` through a matched rule id in `rule_ids`.
    pub fn invalidate_matching(&self, rule_ids: &[u32]) {
        let mut cache = self.inner.lock();
        let stale: Vec<String> = cache
            .iter()
            .filter(|(_, entry)| entry.results.iter().any(|r| rule_ids.contains(&r.rule_id)))
            .map(|(addr, _)| addr.clone())
            .collect();
        for addr in stale {
            cache.pop(&addr);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let cache = EvaluationCache::new(4, 0);
        cache.put("a".into(), vec![RuleMatchResult::no_match(1)]);
        assert!(cache.get("a").is_some());
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache = EvaluationCache::new(4, 10);
        cache.put("a".into(), vec![]);
        std::thread::sleep(Duration::from_millis(30));
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn capacity_evicts_least_recently_used() {
        let cache = EvaluationCache::new(1, 0);
        cache.put("a".into(), vec![]);
        cache.put("b".into(), vec![]);
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
    }
}
