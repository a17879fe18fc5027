//! Health state machine shared by the sink and scoop registries: three
//! consecutive failures mark an entry UNHEALTHY; a success from UNHEALTHY
//! restores it to DEGRADED; `recovery_threshold` further consecutive
//! successes restore it to HEALTHY.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HealthState {
    Healthy = 0,
    Degraded = 1,
    Unhealthy = 2,
    Disconnected = 3,
    Unknown = 4,
}

impl HealthState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => HealthState::Healthy,
            1 => HealthState::Degraded,
            2 => HealthState::Unhealthy,
            3 => HealthState::Disconnected,
            _ => HealthState::Unknown,
        }
    }
}

#[derive(Debug)]
pub struct HealthTracker {
    state: AtomicU8,
    consecutive_failures: AtomicU32,
    consecutive_successes: AtomicU32,
    unhealthy_threshold: u32,
    recovery_threshold: u32,
}

impl HealthTracker {
    pub fn new(unhealthy_threshold: u32, recovery_threshold: u32) -> Self {
        HealthTracker {
            state: AtomicU8::new(HealthState::Unknown as u8),
            consecutive_failures: AtomicU32::new(0),
            consecutive_successes: AtomicU32::new(0),
            unhealthy_threshold: unhealthy_threshold.max(1),
            recovery_threshold: recovery_threshold.max(1),
        }
    }

    pub fn state(&self) -> HealthState {
        HealthState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Entries not UNHEALTHY or DISCONNECTED are eligible for selection.
    /// UNKNOWN (never probed) and DEGRADED (recovering) are still used.
    pub fn is_eligible(&self) -> bool {
        !matches!(
            self.state(),
            HealthState::Unhealthy | HealthState::Disconnected
        )
    }

    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        match self.state() {
            HealthState::Unhealthy => {
                self.state
                    .store(HealthState::Degraded as u8, Ordering::Release);
                self.consecutive_successes.store(1, Ordering::Relaxed);
            }
            HealthState::Degraded => {
                let successes = self.consecutive_successes.fetch_add(1, Ordering::Relaxed) + 1;
                if successes >= self.recovery_threshold {
                    self.state
                        .store(HealthState::Healthy as u8, Ordering::Release);
                }
            }
            _ => {
                self.state
                    .store(HealthState::Healthy as u8, Ordering::Release);
            }
        }
    }

    pub fn record_failure(&self) {
        self.consecutive_successes.store(0, Ordering::Relaxed);
        // A failure while still proving recovery forfeits the streak
        // immediately rather than requiring the full threshold again.
        if self.state() == HealthState::Degraded {
            self.state
                .store(HealthState::Unhealthy as u8, Ordering::Release);
            self.consecutive_failures
                .store(self.unhealthy_threshold, Ordering::Relaxed);
            return;
        }
        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= self.unhealthy_threshold {
            self.state
                .store(HealthState::Unhealthy as u8, Ordering::Release);
        }
    }

    pub fn mark_unhealthy(&self) {
        self.state
            .store(HealthState::Unhealthy as u8, Ordering::Release);
        self.consecutive_failures
            .store(self.unhealthy_threshold, Ordering::Relaxed);
    }

    pub fn mark_healthy(&self) {
        self.state
            .store(HealthState::Healthy as u8, Ordering::Release);
        self.consecutive_failures.store(0, Ordering::Relaxed);
        self.consecutive_successes.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_consecutive_failures_mark_unhealthy() {
        let h = HealthTracker::new(3, 2);
        h.record_failure();
        h.record_failure();
        assert_eq!(h.state(), HealthState::Unknown);
        h.record_failure();
        assert_eq!(h.state(), HealthState::Unhealthy);
        assert!(!h.is_eligible());
    }

    #[test]
    fn recovery_passes_through_degraded() {
        let h = HealthTracker::new(3, 2);
        for _ in 0..3 {
            h.record_failure();
        }
        assert_eq!(h.state(), HealthState::Unhealthy);
        h.record_success();
        assert_eq!(h.state(), HealthState::Degraded);
        assert!(h.is_eligible());
        h.record_success();
        assert_eq!(h.state(), HealthState::Healthy);
    }

    #[test]
    fn a_single_failure_during_recovery_resets_success_streak() {
        let h = HealthTracker::new(3, 3);
        for _ in 0..3 {
            h.record_failure();
        }
        h.record_success();
        h.record_success();
        h.record_failure();
        assert_eq!(h.state(), HealthState::Unhealthy);
    }
}
