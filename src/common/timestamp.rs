//! Monotonic timestamp.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Nanosecond-precision timestamp backed by a monotonic clock.
///
/// All deadline, EMA, and rate-limiter arithmetic in this crate goes through
/// `Timestamp` rather than `Instant`/`SystemTime` directly so there is a
/// single place that defines "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    ns_since_epoch: i64,
}

impl Timestamp {
    /// A timestamp at the origin of whatever clock produced it (0 ns).
    pub const ZERO: Timestamp = Timestamp { ns_since_epoch: 0 };

    /// Construct directly from a nanosecond count since an arbitrary epoch.
    pub const fn from_nanos(ns: i64) -> Self {
        Timestamp { ns_since_epoch: ns }
    }

    /// Current time from the monotonic clock, relative to a fixed process
    /// start instant. Used for deadlines, pressure EMAs, and rate-limiter
    /// refills.
    pub fn now() -> Self {
        static START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
        let start = *START.get_or_init(Instant::now);
        let elapsed = start.elapsed();
        Timestamp {
            ns_since_epoch: elapsed.as_nanos() as i64,
        }
    }

    /// Current wall-clock time since the Unix epoch. Only used at source
    /// ingest for user-visible timestamps; never for deadline arithmetic.
    pub fn from_system_time() -> Self {
        let ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        Timestamp {
            ns_since_epoch: ns as i64,
        }
    }

    pub const fn nanoseconds(self) -> i64 {
        self.ns_since_epoch
    }

    pub const fn microseconds(self) -> i64 {
        self.ns_since_epoch / 1_000
    }

    pub const fn milliseconds(self) -> i64 {
        self.ns_since_epoch / 1_000_000
    }

    pub const fn seconds(self) -> i64 {
        self.ns_since_epoch / 1_000_000_000
    }

    pub fn checked_add(self, duration: Duration) -> Self {
        Timestamp {
            ns_since_epoch: self.ns_since_epoch.saturating_add(duration.as_nanos() as i64),
        }
    }

    /// Signed difference `self - other`, positive if `self` is later.
    pub fn saturating_duration_since(self, other: Timestamp) -> Duration {
        let diff = self.ns_since_epoch - other.ns_since_epoch;
        Duration::from_nanos(diff.max(0) as u64)
    }
}

impl std::ops::Add<Duration> for Timestamp {
    type Output = Timestamp;
    fn add(self, rhs: Duration) -> Timestamp {
        self.checked_add(rhs)
    }
}

impl std::ops::Sub for Timestamp {
    type Output = i64;
    fn sub(self, rhs: Timestamp) -> i64 {
        self.ns_since_epoch - rhs.ns_since_epoch
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ns", self.ns_since_epoch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_total() {
        let a = Timestamp::from_nanos(10);
        let b = Timestamp::from_nanos(20);
        assert!(a < b);
        assert_eq!(b - a, 10);
    }

    #[test]
    fn now_is_monotonic_non_decreasing() {
        let a = Timestamp::now();
        let b = Timestamp::now();
        assert!(b >= a);
    }

    #[test]
    fn checked_add_advances_by_duration() {
        let a = Timestamp::from_nanos(100);
        let b = a + Duration::from_nanos(50);
        assert_eq!(b.nanoseconds(), 150);
    }
}
