//! Backpressure controller: turns a sensed pressure level into
//! an accept/drop/throttle decision per the configured strategy.

use super::config::{BackpressureConfig, BackpressureStrategy, PressureLevel};
use super::sensor::PressureSensor;
use super::stats::BackpressureStats;
use std::sync::atomic::{AtomicI64, AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, Instant};

pub type DropCallback = Box<dyn Fn(usize) + Send + Sync>;
pub type PressureCallback = Box<dyn Fn(PressureLevel) + Send + Sync>;

fn level_from_u8(v: u8) -> PressureLevel {
    match v {
        0 => PressureLevel::None,
        1 => PressureLevel::Low,
        2 => PressureLevel::Medium,
        3 => PressureLevel::High,
        _ => PressureLevel::Critical,
    }
}

pub struct BackpressureController {
    config: BackpressureConfig,
    sensor: PressureSensor,
    stats: BackpressureStats,
    current_level: AtomicU8,
    sample_counter: AtomicU64,
    throttle_ns: AtomicI64,
    last_level_change_ns: AtomicI64,
    start: Instant,
    drop_callback: Option<DropCallback>,
    pressure_callback: Option<PressureCallback>,
}

impl BackpressureController {
    pub fn new(config: BackpressureConfig) -> Self {
        let sensor = PressureSensor::new(config.clone());
        BackpressureController {
            config,
            sensor,
            stats: BackpressureStats::new(),
            current_level: AtomicU8::new(PressureLevel::None as u8),
            sample_counter: AtomicU64::new(0),
            throttle_ns: AtomicI64::new(0),
            last_level_change_ns: AtomicI64::new(0),
            start: Instant::now(),
            drop_callback: None,
            pressure_callback: None,
        }
    }

    fn now_ns(&self) -> i64 {
        self.start.elapsed().as_nanos() as i64
    }

    pub fn set_drop_callback(&mut self, callback: DropCallback) {
        self.drop_callback = Some(callback);
    }

    pub fn set_pressure_callback(&mut self, callback: PressureCallback) {
        self.pressure_callback = Some(callback);
    }

    pub fn should_accept(&self) -> bool {
        self.stats.items_received.fetch_add(1, Ordering::Relaxed);

        let new_level = self.sensor.level();
        self.update_pressure_level(new_level);

        match self.config.strategy {
            BackpressureStrategy::DropOldest => true,
            BackpressureStrategy::DropNewest => self.handle_drop_newest(new_level),
            BackpressureStrategy::Block => self.handle_block(),
            BackpressureStrategy::Sample => self.handle_sample(new_level),
            BackpressureStrategy::Throttle => self.handle_throttle(new_level),
        }
    }

    pub fn item_processed(&self) {
        self.stats.items_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn item_dropped(&self) {
        self.stats.items_dropped.fetch_add(1, Ordering::Relaxed);
        if let Some(cb) = &self.drop_callback {
            cb(1);
        }
    }

    pub fn update_queue(&self, current: usize, capacity: usize) {
        self.sensor.update_queue_fill(current, capacity);
    }

    pub fn update_latency(&self, latency_ns: i64) {
        self.sensor.update_latency(latency_ns);
    }

    pub fn update_memory(&self, bytes: u64) {
        self.sensor.update_memory(bytes);
    }

    pub fn pressure_level(&self) -> PressureLevel {
        level_from_u8(self.current_level.load(Ordering::Relaxed))
    }

    pub fn throttle_delay_ns(&self) -> i64 {
        self.throttle_ns.load(Ordering::Relaxed)
    }

    pub fn config(&self) -> &BackpressureConfig {
        &self.config
    }

    pub fn stats(&self) -> &BackpressureStats {
        &self.stats
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    /// Level increases apply immediately; level *decreases* are held back
    /// for `hysteresis_ns` after the last change to avoid oscillation.
    fn update_pressure_level(&self, new_level: PressureLevel) {
        let old_level = level_from_u8(self.current_level.load(Ordering::Relaxed));
        if new_level == old_level {
            return;
        }

        let now_ns = self.now_ns();
        let last_change = self.last_level_change_ns.load(Ordering::Relaxed);
        if now_ns - last_change < self.config.hysteresis_ns && new_level <= old_level {
            return;
        }

        if self
            .current_level
            .compare_exchange(
                old_level as u8,
                new_level as u8,
                Ordering::SeqCst,
                Ordering::Relaxed,
            )
            .is_ok()
        {
            self.last_level_change_ns.store(now_ns, Ordering::Relaxed);
            self.stats.pressure_changes.fetch_add(1, Ordering::Relaxed);
            if let Some(cb) = &self.pressure_callback {
                cb(new_level);
            }
        }
    }

    fn handle_drop_newest(&self, level: PressureLevel) -> bool {
        if level >= PressureLevel::Critical {
            self.stats.items_dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    fn handle_block(&self) -> bool {
        if self.sensor.level() < PressureLevel::High {
            return true;
        }

        self.stats.block_events.fetch_add(1, Ordering::Relaxed);
        let start = Instant::now();
        let max_block_ns = self.config.max_throttle_ns as u64;

        while self.sensor.level() >= PressureLevel::High {
            let elapsed_ns = start.elapsed().as_nanos() as u64;
            if elapsed_ns >= max_block_ns {
                self.stats.items_dropped.fetch_add(1, Ordering::Relaxed);
                self.stats
                    .total_block_ns
                    .fetch_add(elapsed_ns, Ordering::Relaxed);
                return false;
            }
            std::thread::sleep(Duration::from_micros(100));
        }

        self.stats
            .total_block_ns
            .fetch_add(start.elapsed().as_nanos() as u64, Ordering::Relaxed);
        true
    }

    fn handle_sample(&self, level: PressureLevel) -> bool {
        if level < PressureLevel::Medium {
            return true;
        }

        let mut rate = self.config.sample_rate;
        if level >= PressureLevel::Critical {
            rate *= 4;
        } else if level >= PressureLevel::High {
            rate *= 2;
        }

        let count = self.sample_counter.fetch_add(1, Ordering::Relaxed);
        if rate == 0 || count % rate != 0 {
            self.stats.items_sampled_out.fetch_add(1, Ordering::Relaxed);
            self.stats.items_dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        true
    }

    fn handle_throttle(&self, level: PressureLevel) -> bool {
        let mut delay_ns = match level {
            PressureLevel::None => 0,
            PressureLevel::Low => self.config.throttle_step_ns,
            PressureLevel::Medium => self.config.throttle_step_ns * 4,
            PressureLevel::High => self.config.throttle_step_ns * 16,
            PressureLevel::Critical => self.config.max_throttle_ns,
        };
        delay_ns = delay_ns.min(self.config.max_throttle_ns);
        self.throttle_ns.store(delay_ns, Ordering::Relaxed);

        if delay_ns > 0 {
            self.stats.throttle_events.fetch_add(1, Ordering::Relaxed);
            self.stats
                .total_throttle_ns
                .fetch_add(delay_ns as u64, Ordering::Relaxed);

            if delay_ns < 10_000 {
                let deadline = Instant::now() + Duration::from_nanos(delay_ns as u64);
                while Instant::now() < deadline {
                    std::hint::spin_loop();
                }
            } else {
                std::thread::sleep(Duration::from_nanos(delay_ns as u64));
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_newest_rejects_only_at_critical() {
        let mut config = BackpressureConfig::default();
        config.strategy = BackpressureStrategy::DropNewest;
        let controller = BackpressureController::new(config);
        controller.update_queue(96, 100);
        assert!(!controller.should_accept());
        assert_eq!(controller.stats().items_dropped.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn sample_strategy_keeps_roughly_one_in_rate() {
        let mut config = BackpressureConfig::default();
        config.strategy = BackpressureStrategy::Sample;
        config.sample_rate = 4;
        let controller = BackpressureController::new(config);
        controller.update_queue(60, 100);
        let accepted = (0..8).filter(|_| controller.should_accept()).count();
        assert_eq!(accepted, 2);
    }

    #[test]
    fn throttle_strategy_always_accepts_but_records_delay() {
        let config = BackpressureConfig::default();
        let controller = BackpressureController::new(config);
        controller.update_queue(60, 100);
        assert!(controller.should_accept());
        assert!(controller.throttle_delay_ns() > 0);
    }

    #[test]
    fn hysteresis_blocks_downward_transition_immediately_after_upward_one() {
        let mut config = BackpressureConfig::default();
        config.hysteresis_ns = 1_000_000_000;
        let controller = BackpressureController::new(config);
        controller.update_queue(96, 100);
        controller.should_accept();
        assert_eq!(controller.pressure_level(), PressureLevel::Critical);

        controller.update_queue(0, 100);
        controller.should_accept();
        assert_eq!(controller.pressure_level(), PressureLevel::Critical);
    }
}
