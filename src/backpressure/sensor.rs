//! Multi-signal pressure sensor: queue fill, latency EMA, and
//! memory usage each map independently to a [`PressureLevel`]; the sensor
//! reports the maximum across the three.

use super::config::{BackpressureConfig, PressureLevel};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

pub struct PressureSensor {
    config: BackpressureConfig,
    queue_fill_bits: AtomicU64,
    latency_ema_ns: AtomicI64,
    memory_bytes: AtomicU64,
}

impl PressureSensor {
    pub fn new(config: BackpressureConfig) -> Self {
        PressureSensor {
            config,
            queue_fill_bits: AtomicU64::new(0.0_f64.to_bits()),
            latency_ema_ns: AtomicI64::new(0),
            memory_bytes: AtomicU64::new(0),
        }
    }

    pub fn update_queue_fill(&self, current: usize, capacity: usize) {
        if capacity == 0 {
            return;
        }
        let fill = current as f64 / capacity as f64;
        self.queue_fill_bits.store(fill.to_bits(), Ordering::Relaxed);
    }

    pub fn update_latency(&self, latency_ns: i64) {
        let current = self.latency_ema_ns.load(Ordering::Relaxed);
        let updated = (0.1 * latency_ns as f64 + 0.9 * current as f64) as i64;
        self.latency_ema_ns.store(updated, Ordering::Relaxed);
    }

    pub fn update_memory(&self, bytes: u64) {
        self.memory_bytes.store(bytes, Ordering::Relaxed);
    }

    pub fn level(&self) -> PressureLevel {
        let fill = f64::from_bits(self.queue_fill_bits.load(Ordering::Relaxed));
        let latency = self.latency_ema_ns.load(Ordering::Relaxed);
        let memory = self.memory_bytes.load(Ordering::Relaxed);

        let queue_pressure = if fill >= self.config.critical_watermark {
            PressureLevel::Critical
        } else if fill >= self.config.high_watermark {
            PressureLevel::High
        } else if fill >= self.config.low_watermark {
            PressureLevel::Medium
        } else if fill > 0.25 {
            PressureLevel::Low
        } else {
            PressureLevel::None
        };

        let latency_pressure = if latency >= self.config.max_latency_ns {
            PressureLevel::Critical
        } else if latency >= self.config.max_latency_ns * 3 / 4 {
            PressureLevel::High
        } else if latency >= self.config.target_latency_ns * 2 {
            PressureLevel::Medium
        } else if latency >= self.config.target_latency_ns {
            PressureLevel::Low
        } else {
            PressureLevel::None
        };

        let memory_pressure = if self.config.max_memory_bytes > 0 {
            let ratio = memory as f64 / self.config.max_memory_bytes as f64;
            if ratio >= 0.95 {
                PressureLevel::Critical
            } else if ratio >= 0.80 {
                PressureLevel::High
            } else if ratio >= 0.60 {
                PressureLevel::Medium
            } else if ratio >= 0.40 {
                PressureLevel::Low
            } else {
                PressureLevel::None
            }
        } else {
            PressureLevel::None
        };

        queue_pressure.max(latency_pressure).max(memory_pressure)
    }

    pub fn pressure_value(&self) -> f64 {
        self.level().as_value()
    }

    pub fn config(&self) -> &BackpressureConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_fill_alone_drives_level() {
        let sensor = PressureSensor::new(BackpressureConfig::default());
        sensor.update_queue_fill(96, 100);
        assert_eq!(sensor.level(), PressureLevel::Critical);
    }

    #[test]
    fn sensor_reports_max_across_signals() {
        let sensor = PressureSensor::new(BackpressureConfig::default());
        sensor.update_queue_fill(10, 100);
        sensor.update_latency(20_000_000);
        assert_eq!(sensor.level(), PressureLevel::Critical);
    }

    #[test]
    fn idle_sensor_reports_none() {
        let sensor = PressureSensor::new(BackpressureConfig::default());
        assert_eq!(sensor.level(), PressureLevel::None);
    }
}
