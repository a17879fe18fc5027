//! Router configuration.

use crate::backpressure::BackpressureConfig;
use crate::rate_limit::RateLimitConfig;
use crate::registry::{ScoopRegistryConfig, SinkRegistryConfig};
use crate::rule_engine::RuleEngineConfig;
use crate::scheduler::SchedulerConfig;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub instance_id: String,
    pub watchdog_enabled: bool,
    pub watchdog_timeout: Duration,
    /// If a sink send fails, whether the failure is swallowed (forwarding
    /// continues for the rest of the process) or surfaced to the caller via
    /// an error-rate-visible stats bump. Either way the message is not
    /// retried by the router itself -- that is the sink strategy's job.
    pub drop_on_sink_error: bool,
    /// Capacity the backpressure sensor measures the scheduler's pending
    /// queue depth against.
    pub queue_capacity: usize,
    pub scheduler: SchedulerConfig,
    pub rate_limit: RateLimitConfig,
    pub backpressure: BackpressureConfig,
    pub rule_engine: RuleEngineConfig,
    pub sink_registry: SinkRegistryConfig,
    pub scoop_registry: ScoopRegistryConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            instance_id: "bridge-0".to_string(),
            watchdog_enabled: false,
            watchdog_timeout: Duration::from_secs(5),
            drop_on_sink_error: true,
            queue_capacity: 65_536,
            scheduler: SchedulerConfig::default(),
            rate_limit: RateLimitConfig::default(),
            backpressure: BackpressureConfig::default(),
            rule_engine: RuleEngineConfig::default(),
            sink_registry: SinkRegistryConfig::default(),
            scoop_registry: ScoopRegistryConfig::default(),
        }
    }
}
