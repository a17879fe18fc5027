//! Rate limit: a token bucket of rate=100/s, burst=10 admits exactly the
//! burst up front, then refills at the configured rate.

use ipb_core::rate_limit::{RateLimitConfig, TokenBucket};

#[test]
fn burst_then_refill_at_the_configured_rate() {
    let bucket = TokenBucket::new(RateLimitConfig {
        rate_per_second: 100.0,
        burst_size: 10,
        ..RateLimitConfig::default()
    });

    let first_round: Vec<bool> = (0..20).map(|_| bucket.try_acquire(1)).collect();
    assert_eq!(first_round.iter().filter(|ok| **ok).count(), 10);
    assert!(first_round[..10].iter().all(|ok| *ok));
    assert!(first_round[10..].iter().all(|ok| !ok));

    std::thread::sleep(std::time::Duration::from_millis(100));
    let second_round: Vec<bool> = (0..10).map(|_| bucket.try_acquire(1)).collect();
    let refilled = second_round.iter().filter(|ok| **ok).count();
    // ~10 tokens expected after 100ms at 100/s; allow generous scheduling
    // slack rather than a tight 10% margin, since this runs on a shared CI
    // machine with no real-time guarantees.
    assert!((8..=10).contains(&refilled), "refilled = {refilled}");
}
