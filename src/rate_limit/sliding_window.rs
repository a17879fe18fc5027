//! Sliding window rate limiter: 60 one-second slots, more
//! accurate than a token bucket at the cost of tracking recent history.

use super::stats::RateLimiterStats;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Instant;

pub const WINDOW_SLOTS: usize = 60;

pub struct SlidingWindowLimiter {
    rate_per_second: f64,
    slot_duration_ns: i64,
    slots: [AtomicU64; WINDOW_SLOTS],
    last_clear_ns: AtomicI64,
    start: Instant,
    stats: RateLimiterStats,
}

impl SlidingWindowLimiter {
    pub fn new(rate_per_second: f64) -> Self {
        SlidingWindowLimiter {
            rate_per_second,
            slot_duration_ns: 1_000_000_000 / WINDOW_SLOTS as i64,
            slots: std::array::from_fn(|_| AtomicU64::new(0)),
            last_clear_ns: AtomicI64::new(0),
            start: Instant::now(),
            stats: RateLimiterStats::new(),
        }
    }

    fn now_ns(&self) -> i64 {
        self.start.elapsed().as_nanos() as i64
    }

    pub fn try_acquire(&self) -> bool {
        self.stats.requests.fetch_add(1, Ordering::Relaxed);

        let now_ns = self.now_ns();
        let current_slot = (now_ns / self.slot_duration_ns) as usize % WINDOW_SLOTS;

        self.clear_old_slots(now_ns);

        let total: u64 = self.slots.iter().map(|s| s.load(Ordering::Relaxed)).sum();
        if total >= self.rate_per_second as u64 {
            self.stats.rejected.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        self.slots[current_slot].fetch_add(1, Ordering::Relaxed);
        self.stats.allowed.fetch_add(1, Ordering::Relaxed);
        true
    }

    pub fn current_rate(&self) -> f64 {
        self.slots.iter().map(|s| s.load(Ordering::Relaxed)).sum::<u64>() as f64
    }

    pub fn limit(&self) -> f64 {
        self.rate_per_second
    }

    pub fn stats(&self) -> &RateLimiterStats {
        &self.stats
    }

    fn clear_old_slots(&self, now_ns: i64) {
        let last_clear = self.last_clear_ns.load(Ordering::Relaxed);
        let elapsed = now_ns - last_clear;
        if elapsed < self.slot_duration_ns {
            return;
        }

        let slots_to_clear = ((elapsed / self.slot_duration_ns) as usize).min(WINDOW_SLOTS);
        let start_slot = ((last_clear / self.slot_duration_ns) + 1) as usize % WINDOW_SLOTS;

        for i in 0..slots_to_clear {
            let slot = (start_slot + i) % WINDOW_SLOTS;
            self.slots[slot].store(0, Ordering::Relaxed);
        }

        self.last_clear_ns.store(now_ns, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_rate_within_window() {
        let limiter = SlidingWindowLimiter::new(5.0);
        for _ in 0..5 {
            assert!(limiter.try_acquire());
        }
        assert!(!limiter.try_acquire());
        assert_eq!(limiter.stats().snapshot().rejected, 1);
    }

    #[test]
    fn current_rate_reflects_recorded_requests() {
        let limiter = SlidingWindowLimiter::new(100.0);
        limiter.try_acquire();
        limiter.try_acquire();
        assert_eq!(limiter.current_rate(), 2.0);
    }
}
