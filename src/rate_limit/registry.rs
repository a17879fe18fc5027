//! Process-wide named rate limiter registry.

use super::config::RateLimitConfig;
use super::token_bucket::TokenBucket;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

#[derive(Default)]
pub struct RateLimiterRegistry {
    limiters: Mutex<HashMap<String, Arc<TokenBucket>>>,
}

impl RateLimiterRegistry {
    /// The process-wide singleton, lazily initialized on first use.
    pub fn instance() -> &'static RateLimiterRegistry {
        static INSTANCE: OnceLock<RateLimiterRegistry> = OnceLock::new();
        INSTANCE.get_or_init(RateLimiterRegistry::default)
    }

    pub fn register(&self, name: impl Into<String>, config: RateLimitConfig) {
        self.limiters
            .lock()
            .insert(name.into(), Arc::new(TokenBucket::new(config)));
    }

    pub fn get_or_create(&self, name: &str, config: RateLimitConfig) -> Arc<TokenBucket> {
        let mut limiters = self.limiters.lock();
        limiters
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(TokenBucket::new(config)))
            .clone()
    }

    /// A named limiter that was never registered imposes no limit.
    pub fn try_acquire(&self, name: &str, count: usize) -> bool {
        let limiters = self.limiters.lock();
        match limiters.get(name) {
            Some(bucket) => bucket.try_acquire(count),
            None => true,
        }
    }

    pub fn remove(&self, name: &str) {
        self.limiters.lock().remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_name_imposes_no_limit() {
        let registry = RateLimiterRegistry::default();
        for _ in 0..1000 {
            assert!(registry.try_acquire("unknown", 1));
        }
    }

    #[test]
    fn registered_name_enforces_its_own_limit() {
        let registry = RateLimiterRegistry::default();
        registry.register("ingest", RateLimitConfig::strict(1000.0));
        assert!(registry.try_acquire("ingest", 1));
        assert!(!registry.try_acquire("ingest", 1));
    }

    #[test]
    fn get_or_create_reuses_existing_limiter() {
        let registry = RateLimiterRegistry::default();
        let a = registry.get_or_create("x", RateLimitConfig::default());
        let b = registry.get_or_create("x", RateLimitConfig::strict(1.0));
        assert!(Arc::ptr_eq(&a, &b));
    }
}
