//! Shared counters for every rate limiter variant.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct RateLimiterStats {
    pub requests: AtomicU64,
    pub allowed: AtomicU64,
    pub rejected: AtomicU64,
    pub throttled_ns: AtomicU64,
}

impl RateLimiterStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_rate(&self) -> f64 {
        let total = self.requests.load(Ordering::Relaxed);
        let ok = self.allowed.load(Ordering::Relaxed);
        if total > 0 {
            ok as f64 / total as f64 * 100.0
        } else {
            100.0
        }
    }

    pub fn reset(&self) {
        self.requests.store(0, Ordering::Relaxed);
        self.allowed.store(0, Ordering::Relaxed);
        self.rejected.store(0, Ordering::Relaxed);
        self.throttled_ns.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RateLimiterStatsSnapshot {
        RateLimiterStatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            allowed: self.allowed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            throttled_ns: self.throttled_ns.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimiterStatsSnapshot {
    pub requests: u64,
    pub allowed: u64,
    pub rejected: u64,
    pub throttled_ns: u64,
}
