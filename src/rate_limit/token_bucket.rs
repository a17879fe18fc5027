//! Token bucket rate limiter: lock-free fast path, fixed-point
//! token accounting at `PRECISION` to avoid floating-point CAS.

use super::config::RateLimitConfig;
use super::stats::RateLimiterStats;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

const PRECISION: i64 = 1_000_000;

pub struct TokenBucket {
    config: parking_lot::RwLock<RateLimitConfig>,
    tokens: AtomicI64,
    last_refill_ns: AtomicI64,
    start: Instant,
    stats: RateLimiterStats,
}

impl TokenBucket {
    pub fn new(config: RateLimitConfig) -> Self {
        let start = Instant::now();
        let tokens = config.burst_size as i64 * PRECISION;
        TokenBucket {
            config: parking_lot::RwLock::new(config),
            tokens: AtomicI64::new(tokens),
            last_refill_ns: AtomicI64::new(0),
            start,
            stats: RateLimiterStats::new(),
        }
    }

    fn now_ns(&self) -> i64 {
        self.start.elapsed().as_nanos() as i64
    }

    pub fn try_acquire(&self, count: usize) -> bool {
        self.stats.requests.fetch_add(1, Ordering::Relaxed);
        self.refill();

        let needed = count as i64 * PRECISION;
        let mut current = self.tokens.load(Ordering::Relaxed);
        while current >= needed {
            match self.tokens.compare_exchange_weak(
                current,
                current - needed,
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    self.stats.allowed.fetch_add(1, Ordering::Relaxed);
                    return true;
                }
                Err(actual) => current = actual,
            }
        }

        self.stats.rejected.fetch_add(1, Ordering::Relaxed);
        false
    }

    /// Blocks (spin for sub-microsecond waits, sleep otherwise) until
    /// tokens are available or `timeout` elapses.
    pub fn acquire(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;

        while !self.try_acquire(count) {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }

            let mut wait_ns = self.wait_time_ns(count);
            let remaining = (deadline - now).as_nanos() as i64;
            if wait_ns > remaining {
                wait_ns = remaining;
            }

            if wait_ns > 0 {
                self.stats
                    .throttled_ns
                    .fetch_add(wait_ns as u64, Ordering::Relaxed);
                if wait_ns < 1000 {
                    let spin_until = now + Duration::from_nanos(wait_ns as u64);
                    while Instant::now() < spin_until {
                        std::hint::spin_loop();
                    }
                } else {
                    std::thread::sleep(Duration::from_nanos(wait_ns as u64));
                }
            }
        }

        true
    }

    pub fn wait_time_ns(&self, count: usize) -> i64 {
        let current = self.tokens.load(Ordering::Relaxed);
        let needed = count as i64 * PRECISION;
        if current >= needed {
            return 0;
        }
        let deficit = needed - current;
        let tokens_per_ns = self.config.read().rate_per_second / 1e9;
        if tokens_per_ns <= 0.0 {
            return i64::MAX;
        }
        (deficit as f64 / PRECISION as f64 / tokens_per_ns) as i64
    }

    pub fn available_tokens(&self) -> f64 {
        self.tokens.load(Ordering::Relaxed) as f64 / PRECISION as f64
    }

    pub fn set_rate(&self, rate_per_second: f64) {
        self.config.write().rate_per_second = rate_per_second;
    }

    pub fn set_burst(&self, burst_size: usize) {
        self.config.write().burst_size = burst_size;
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config.read().clone()
    }

    pub fn stats(&self) -> &RateLimiterStats {
        &self.stats
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    fn refill(&self) {
        let now_ns = self.now_ns();
        let last_ns = self.last_refill_ns.load(Ordering::Relaxed);
        let elapsed_ns = now_ns - last_ns;
        if elapsed_ns <= 0 {
            return;
        }

        let tokens_per_ns = self.config.read().rate_per_second / 1e9;
        let new_tokens = (elapsed_ns as f64 * tokens_per_ns * PRECISION as f64) as i64;
        if new_tokens <= 0 {
            return;
        }

        if self
            .last_refill_ns
            .compare_exchange(last_ns, now_ns, Ordering::Release, Ordering::Relaxed)
            .is_err()
        {
            return;
        }

        let max_tokens = self.config.read().burst_size as i64 * PRECISION;
        let current = self.tokens.load(Ordering::Relaxed);
        let target = (current + new_tokens).min(max_tokens);
        self.tokens.store(target, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_allows_up_to_capacity_then_rejects() {
        let bucket = TokenBucket::new(RateLimitConfig {
            rate_per_second: 10.0,
            burst_size: 3,
            ..Default::default()
        });
        assert!(bucket.try_acquire(1));
        assert!(bucket.try_acquire(1));
        assert!(bucket.try_acquire(1));
        assert!(!bucket.try_acquire(1));
        assert_eq!(bucket.stats().snapshot().rejected, 1);
    }

    #[test]
    fn strict_config_allows_no_burst() {
        let bucket = TokenBucket::new(RateLimitConfig::strict(1000.0));
        assert!(bucket.try_acquire(1));
        assert!(!bucket.try_acquire(1));
    }

    #[test]
    fn unlimited_config_never_rejects() {
        let bucket = TokenBucket::new(RateLimitConfig::unlimited());
        for _ in 0..1000 {
            assert!(bucket.try_acquire(1));
        }
    }

    #[test]
    fn acquire_blocks_until_refill_or_timeout() {
        let bucket = TokenBucket::new(RateLimitConfig {
            rate_per_second: 1_000_000.0,
            burst_size: 1,
            ..Default::default()
        });
        assert!(bucket.try_acquire(1));
        assert!(bucket.acquire(1, Duration::from_millis(100)));
    }

    #[test]
    fn acquire_times_out_when_rate_too_low() {
        let bucket = TokenBucket::new(RateLimitConfig {
            rate_per_second: 0.001,
            burst_size: 1,
            ..Default::default()
        });
        assert!(bucket.try_acquire(1));
        assert!(!bucket.acquire(1, Duration::from_millis(20)));
    }
}
