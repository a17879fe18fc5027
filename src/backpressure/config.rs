//! Backpressure configuration and the pressure strategy/level enums
//!.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackpressureStrategy {
    DropOldest,
    DropNewest,
    Block,
    Sample,
    Throttle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PressureLevel {
    None = 0,
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
}

impl PressureLevel {
    pub fn as_value(self) -> f64 {
        match self {
            PressureLevel::None => 0.0,
            PressureLevel::Low => 0.25,
            PressureLevel::Medium => 0.5,
            PressureLevel::High => 0.75,
            PressureLevel::Critical => 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackpressureConfig {
    pub strategy: BackpressureStrategy,
    pub low_watermark: f64,
    pub high_watermark: f64,
    pub critical_watermark: f64,
    pub target_latency_ns: i64,
    pub max_latency_ns: i64,
    pub target_memory_bytes: u64,
    pub max_memory_bytes: u64,
    pub sample_rate: u64,
    pub min_throughput_factor: f64,
    pub throttle_step_ns: i64,
    pub max_throttle_ns: i64,
    pub recovery_factor: f64,
    pub hysteresis_ns: i64,
}

impl Default for BackpressureConfig {
    fn default() -> Self {
        BackpressureConfig {
            strategy: BackpressureStrategy::Throttle,
            low_watermark: 0.5,
            high_watermark: 0.8,
            critical_watermark: 0.95,
            target_latency_ns: 1_000_000,
            max_latency_ns: 10_000_000,
            target_memory_bytes: 0,
            max_memory_bytes: 0,
            sample_rate: 10,
            min_throughput_factor: 0.1,
            throttle_step_ns: 100_000,
            max_throttle_ns: 100_000_000,
            recovery_factor: 0.9,
            hysteresis_ns: 1_000_000_000,
        }
    }
}
