//! Rate limiter configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub rate_per_second: f64,
    pub burst_size: usize,
    pub fair_queuing: bool,
    pub adaptive: bool,
    pub min_rate: f64,
    pub max_rate: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        RateLimitConfig {
            rate_per_second: 1000.0,
            burst_size: 100,
            fair_queuing: false,
            adaptive: false,
            min_rate: 10.0,
            max_rate: 100_000.0,
        }
    }
}

impl RateLimitConfig {
    pub fn unlimited() -> Self {
        RateLimitConfig {
            rate_per_second: 1e12,
            burst_size: usize::MAX / 2,
            ..Default::default()
        }
    }

    pub fn strict(rate: f64) -> Self {
        RateLimitConfig {
            rate_per_second: rate,
            burst_size: 1,
            ..Default::default()
        }
    }
}
