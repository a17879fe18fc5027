//! Hierarchical rate limiter: a global bucket plus optional
//! per-source buckets, both of which must admit a request.
//!
//! Matches the original's "best effort" framing: if the source-level
//! bucket rejects after the global bucket already admitted, the global
//! token is *not* refunded. This under-counts the global budget slightly
//! under sustained per-source throttling but keeps the fast path free of
//! a second CAS loop.

use super::config::RateLimitConfig;
use super::stats::RateLimiterStats;
use super::token_bucket::TokenBucket;
use parking_lot::RwLock;
use std::collections::HashMap;

pub struct HierarchicalRateLimiter {
    global: TokenBucket,
    sources: RwLock<HashMap<String, TokenBucket>>,
}

impl HierarchicalRateLimiter {
    pub fn new(global_config: RateLimitConfig) -> Self {
        HierarchicalRateLimiter {
            global: TokenBucket::new(global_config),
            sources: RwLock::new(HashMap::new()),
        }
    }

    pub fn add_source_limit(&self, source_id: impl Into<String>, config: RateLimitConfig) {
        self.sources
            .write()
            .insert(source_id.into(), TokenBucket::new(config));
    }

    /// `source_id` of `None` checks only the global limit.
    pub fn try_acquire(&self, source_id: Option<&str>) -> bool {
        if !self.global.try_acquire(1) {
            return false;
        }

        if let Some(source_id) = source_id {
            let sources = self.sources.read();
            if let Some(bucket) = sources.get(source_id) {
                if !bucket.try_acquire(1) {
                    return false;
                }
            }
        }

        true
    }

    pub fn global_stats(&self) -> &RateLimiterStats {
        self.global.stats()
    }

    pub fn source_stats(&self, source_id: &str) -> Option<RateLimiterStats> {
        self.sources.read().get(source_id).map(|b| {
            let snap = b.stats().snapshot();
            let stats = RateLimiterStats::new();
            stats.requests.store(snap.requests, std::sync::atomic::Ordering::Relaxed);
            stats.allowed.store(snap.allowed, std::sync::atomic::Ordering::Relaxed);
            stats.rejected.store(snap.rejected, std::sync::atomic::Ordering::Relaxed);
            stats.throttled_ns.store(snap.throttled_ns, std::sync::atomic::Ordering::Relaxed);
            stats
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_levels_must_admit() {
        let limiter = HierarchicalRateLimiter::new(RateLimitConfig {
            rate_per_second: 1000.0,
            burst_size: 10,
            ..Default::default()
        });
        limiter.add_source_limit(
            "device-1",
            RateLimitConfig::strict(1000.0),
        );
        assert!(limiter.try_acquire(Some("device-1")));
        assert!(!limiter.try_acquire(Some("device-1")));
    }

    #[test]
    fn unknown_source_only_checked_at_global_level() {
        let limiter = HierarchicalRateLimiter::new(RateLimitConfig {
            rate_per_second: 1000.0,
            burst_size: 2,
            ..Default::default()
        });
        assert!(limiter.try_acquire(Some("unregistered")));
        assert!(limiter.try_acquire(Some("unregistered")));
        assert!(!limiter.try_acquire(Some("unregistered")));
    }

    #[test]
    fn global_exhaustion_rejects_regardless_of_source() {
        let limiter = HierarchicalRateLimiter::new(RateLimitConfig::strict(1000.0));
        limiter.add_source_limit("device-1", RateLimitConfig::unlimited());
        assert!(limiter.try_acquire(Some("device-1")));
        assert!(!limiter.try_acquire(Some("device-1")));
    }
}
