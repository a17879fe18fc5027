//! Adaptive rate limiter: wraps a token bucket and retunes its
//! rate every 100ms from an externally-reported load figure.

use super::config::RateLimitConfig;
use super::stats::RateLimiterStats;
use super::token_bucket::TokenBucket;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{Duration, Instant};

const UPDATE_INTERVAL_NS: i64 = 100_000_000;
const LOAD_EMA_ALPHA: f64 = 0.1;

pub struct AdaptiveRateLimiter {
    config: RateLimitConfig,
    bucket: TokenBucket,
    current_rate_bits: AtomicU64,
    load_factor_bits: AtomicU64,
    last_update_ns: AtomicI64,
    start: Instant,
}

impl AdaptiveRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let current_rate = config.rate_per_second;
        let bucket = TokenBucket::new(config.clone());
        AdaptiveRateLimiter {
            config,
            bucket,
            current_rate_bits: AtomicU64::new(current_rate.to_bits()),
            load_factor_bits: AtomicU64::new(0.0_f64.to_bits()),
            last_update_ns: AtomicI64::new(0),
            start: Instant::now(),
        }
    }

    fn now_ns(&self) -> i64 {
        self.start.elapsed().as_nanos() as i64
    }

    pub fn try_acquire(&self, count: usize) -> bool {
        self.update_rate();
        self.bucket.try_acquire(count)
    }

    pub fn report_load(&self, load: f64) {
        let current = f64::from_bits(self.load_factor_bits.load(Ordering::Relaxed));
        let updated = LOAD_EMA_ALPHA * load + (1.0 - LOAD_EMA_ALPHA) * current;
        self.load_factor_bits
            .store(updated.to_bits(), Ordering::Relaxed);
    }

    pub fn current_rate(&self) -> f64 {
        f64::from_bits(self.current_rate_bits.load(Ordering::Relaxed))
    }

    pub fn stats(&self) -> &RateLimiterStats {
        self.bucket.stats()
    }

    fn update_rate(&self) {
        let now_ns = self.now_ns();
        let last = self.last_update_ns.load(Ordering::Relaxed);
        if now_ns - last < UPDATE_INTERVAL_NS {
            return;
        }
        if self
            .last_update_ns
            .compare_exchange(last, now_ns, Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            return;
        }

        let load = f64::from_bits(self.load_factor_bits.load(Ordering::Relaxed));
        let rate_factor = (1.0 - load * 0.8).clamp(0.1, 1.0);
        let new_rate = (self.config.max_rate * rate_factor).clamp(self.config.min_rate, self.config.max_rate);

        self.current_rate_bits
            .store(new_rate.to_bits(), Ordering::Relaxed);
        self.bucket.set_rate(new_rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_reported_load_lowers_effective_rate_after_interval() {
        let limiter = AdaptiveRateLimiter::new(RateLimitConfig {
            rate_per_second: 1000.0,
            burst_size: 10,
            adaptive: true,
            min_rate: 10.0,
            max_rate: 1000.0,
            ..Default::default()
        });
        for _ in 0..50 {
            limiter.report_load(1.0);
        }
        std::thread::sleep(Duration::from_millis(110));
        limiter.try_acquire(1);
        assert!(limiter.current_rate() < 1000.0);
        assert!(limiter.current_rate() >= 10.0);
    }

    #[test]
    fn zero_load_keeps_rate_at_max() {
        let limiter = AdaptiveRateLimiter::new(RateLimitConfig {
            rate_per_second: 500.0,
            max_rate: 500.0,
            min_rate: 10.0,
            ..Default::default()
        });
        std::thread::sleep(Duration::from_millis(110));
        limiter.try_acquire(1);
        assert_eq!(limiter.current_rate(), 500.0);
    }
}
