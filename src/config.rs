//! External, serde-driven configuration surface.
//!
//! `BridgeConfig` is the JSON-shaped document an external loader hands the
//! binary; `router::RouterConfig` (and the component configs it holds) is
//! the internal, non-serializable shape the `Router` is actually built
//! from. The `TryFrom` impls here are the seam between the two.

use crate::backpressure::{BackpressureConfig, BackpressureStrategy};
use crate::common::Quality;
use crate::error::{BridgeError, Result};
use crate::rate_limit::RateLimitConfig;
use crate::router::RouterConfig;
use crate::rule_engine::{CompareOp, RuleEngineConfig, RulePriority, RuleType, ValueCondition};
use crate::scheduler::SchedulerConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchdogSettings {
    pub enabled: bool,
    pub timeout_ms: u64,
}

impl Default for WatchdogSettings {
    fn default() -> Self {
        WatchdogSettings {
            enabled: false,
            timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardingSettings {
    pub round_robin: bool,
    pub drop_on_sink_error: bool,
}

impl Default for ForwardingSettings {
    fn default() -> Self {
        ForwardingSettings {
            round_robin: true,
            drop_on_sink_error: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitSettings {
    pub max_sources: usize,
    pub max_sinks: usize,
    pub max_queue_size: usize,
}

impl Default for LimitSettings {
    fn default() -> Self {
        LimitSettings {
            max_sources: 256,
            max_sinks: 256,
            max_queue_size: 65_536,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSettings {
    pub worker_threads: usize,
    pub realtime_priority: Option<i32>,
    pub cpu_affinity: Option<Vec<usize>>,
    pub default_deadline_offset_ns: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        let defaults = SchedulerConfig::default();
        SchedulerSettings {
            worker_threads: defaults.worker_count,
            realtime_priority: None,
            cpu_affinity: None,
            default_deadline_offset_ns: defaults.default_deadline_offset.as_nanos() as u64,
        }
    }
}

impl From<SchedulerSettings> for SchedulerConfig {
    fn from(s: SchedulerSettings) -> Self {
        let defaults = SchedulerConfig::default();
        SchedulerConfig {
            worker_count: s.worker_threads.max(1),
            default_deadline_offset: Duration::from_nanos(s.default_deadline_offset_ns),
            cpu_affinity: s.cpu_affinity,
            realtime_priority: s.realtime_priority,
            ..defaults
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitStrategyKind {
    Fixed,
    Adaptive,
    FairQueuing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub rate_per_second: f64,
    pub burst_size: usize,
    pub strategy: RateLimitStrategyKind,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        let defaults = RateLimitConfig::default();
        RateLimitSettings {
            rate_per_second: defaults.rate_per_second,
            burst_size: defaults.burst_size,
            strategy: RateLimitStrategyKind::Fixed,
        }
    }
}

impl From<RateLimitSettings> for RateLimitConfig {
    fn from(s: RateLimitSettings) -> Self {
        let defaults = RateLimitConfig::default();
        RateLimitConfig {
            rate_per_second: s.rate_per_second,
            burst_size: s.burst_size,
            fair_queuing: matches!(s.strategy, RateLimitStrategyKind::FairQueuing),
            adaptive: matches!(s.strategy, RateLimitStrategyKind::Adaptive),
            ..defaults
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackpressureSettings {
    pub strategy: BackpressureStrategy,
    pub low_wm: f64,
    pub high_wm: f64,
    pub critical_wm: f64,
    pub target_latency_ns: i64,
    pub max_latency_ns: i64,
    pub sample_rate: u64,
    pub min_throughput_factor: f64,
    pub throttle_step_ns: i64,
    pub max_throttle_ns: i64,
    pub hysteresis_ns: i64,
}

impl Default for BackpressureSettings {
    fn default() -> Self {
        let defaults = BackpressureConfig::default();
        BackpressureSettings {
            strategy: defaults.strategy,
            low_wm: defaults.low_watermark,
            high_wm: defaults.high_watermark,
            critical_wm: defaults.critical_watermark,
            target_latency_ns: defaults.target_latency_ns,
            max_latency_ns: defaults.max_latency_ns,
            sample_rate: defaults.sample_rate,
            min_throughput_factor: defaults.min_throughput_factor,
            throttle_step_ns: defaults.throttle_step_ns,
            max_throttle_ns: defaults.max_throttle_ns,
            hysteresis_ns: defaults.hysteresis_ns,
        }
    }
}

impl From<BackpressureSettings> for BackpressureConfig {
    fn from(s: BackpressureSettings) -> Self {
        let defaults = BackpressureConfig::default();
        BackpressureConfig {
            strategy: s.strategy,
            low_watermark: s.low_wm,
            high_watermark: s.high_wm,
            critical_watermark: s.critical_wm,
            target_latency_ns: s.target_latency_ns,
            max_latency_ns: s.max_latency_ns,
            sample_rate: s.sample_rate,
            min_throughput_factor: s.min_throughput_factor,
            throttle_step_ns: s.throttle_step_ns,
            max_throttle_ns: s.max_throttle_ns,
            hysteresis_ns: s.hysteresis_ns,
            ..defaults
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleCacheSettings {
    pub enabled: bool,
    pub size: usize,
    pub ttl_ms: u32,
}

impl Default for RuleCacheSettings {
    fn default() -> Self {
        let defaults = RuleEngineConfig::default();
        RuleCacheSettings {
            enabled: defaults.enable_cache,
            size: defaults.cache_size,
            ttl_ms: defaults.cache_ttl_ms,
        }
    }
}

/// A numeric threshold condition for a [`Route`]; restricted to `f64` so
/// the whole document round-trips through JSON without a tagged-union
/// payload. String/Binary value comparisons are still available to rules
/// built programmatically via `RuleBuilder`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueConditionSettings {
    pub op: CompareOp,
    pub reference: f64,
    pub reference_high: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteFilter {
    pub pattern: Option<String>,
    #[serde(default)]
    pub quality_levels: Vec<Quality>,
    #[serde(default)]
    pub protocol_ids: Vec<u16>,
}

/// The externally configured rule: a `Route` becomes a `RoutingRule` in
/// the engine via [`Route::into_rule`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: Option<u32>,
    pub name: Option<String>,
    pub priority: u8,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub filter: RouteFilter,
    pub value_condition: Option<ValueConditionSettings>,
    pub sinks: Vec<String>,
}

fn default_true() -> bool {
    true
}

/// Maps the external `u8` priority onto the engine's discrete
/// [`RulePriority`] bands, rounding down to the nearest defined level.
fn priority_from_u8(value: u8) -> RulePriority {
    match value {
        255 => RulePriority::Highest,
        192..=254 => RulePriority::High,
        128..=191 => RulePriority::Normal,
        64..=127 => RulePriority::Low,
        _ => RulePriority::Lowest,
    }
}

impl Route {
    /// Builds a [`crate::rule_engine::RoutingRule`] for this route.
    /// `RuleType::Composite` is always used since a `Route`'s filter may
    /// combine a pattern with quality/protocol/value dimensions, all of
    /// which the engine's composite evaluator ANDs together.
    pub fn into_rule(self) -> Result<crate::rule_engine::RoutingRule> {
        if self.sinks.is_empty() {
            return Err(BridgeError::InvalidArgument(format!(
                "route {:?} has no target sinks",
                self.name
            )));
        }
        let value_condition = match self.value_condition {
            Some(v) => Some(ValueCondition {
                op: v.op,
                reference: crate::common::Value::F64(v.reference),
                reference_high: v.reference_high.map(crate::common::Value::F64),
            }),
            None => None,
        };
        Ok(crate::rule_engine::RoutingRule {
            id: self.id.unwrap_or(0),
            name: self.name.unwrap_or_default(),
            rule_type: RuleType::Composite,
            priority: priority_from_u8(self.priority),
            enabled: self.enabled,
            address_pattern: self.filter.pattern,
            protocol_ids: self.filter.protocol_ids,
            quality_levels: self.filter.quality_levels,
            value_condition,
            target_sink_ids: self.sinks,
            ..Default::default()
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterSettings {
    pub routing_table_size: usize,
    #[serde(default)]
    pub routes: Vec<Route>,
    pub enable_zero_copy: bool,
}

impl Default for RouterSettings {
    fn default() -> Self {
        RouterSettings {
            routing_table_size: RuleEngineConfig::default().max_rules,
            routes: Vec::new(),
            enable_zero_copy: false,
        }
    }
}

/// The document shape handed to the core by an external configuration
/// loader (out of scope here). `serde`-round-trips to/from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub instance_id: String,
    #[serde(default)]
    pub watchdog: WatchdogSettings,
    #[serde(default)]
    pub forwarding: ForwardingSettings,
    #[serde(default)]
    pub limits: LimitSettings,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    #[serde(default)]
    pub router: RouterSettings,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    #[serde(default)]
    pub backpressure: BackpressureSettings,
    #[serde(default)]
    pub rule_cache: RuleCacheSettings,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            instance_id: "bridge-0".to_string(),
            watchdog: WatchdogSettings::default(),
            forwarding: ForwardingSettings::default(),
            limits: LimitSettings::default(),
            scheduler: SchedulerSettings::default(),
            router: RouterSettings::default(),
            rate_limit: RateLimitSettings::default(),
            backpressure: BackpressureSettings::default(),
            rule_cache: RuleCacheSettings::default(),
        }
    }
}

impl BridgeConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| BridgeError::ConfigParseError(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| BridgeError::ConfigParseError(e.to_string()))
    }

    /// Splits this document into a `RouterConfig` (used to build the
    /// `Router`) and the routes to register on it afterward -- rules
    /// aren't part of `RouterConfig` itself since they're registered
    /// dynamically via `Router::add_rule`, not fixed at construction.
    pub fn into_router_parts(self) -> Result<(RouterConfig, Vec<Route>)> {
        let rule_engine = RuleEngineConfig {
            max_rules: self.router.routing_table_size,
            enable_cache: self.rule_cache.enabled,
            cache_size: self.rule_cache.size,
            cache_ttl_ms: self.rule_cache.ttl_ms,
        };
        let router_config = RouterConfig {
            instance_id: self.instance_id,
            watchdog_enabled: self.watchdog.enabled,
            watchdog_timeout: Duration::from_millis(self.watchdog.timeout_ms),
            drop_on_sink_error: self.forwarding.drop_on_sink_error,
            queue_capacity: self.limits.max_queue_size,
            scheduler: self.scheduler.into(),
            rate_limit: self.rate_limit.into(),
            backpressure: self.backpressure.into(),
            rule_engine,
            ..RouterConfig::default()
        };
        Ok((router_config, self.router.routes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_json() {
        let config = BridgeConfig::default();
        let json = config.to_json_pretty().unwrap();
        let parsed = BridgeConfig::from_json(&json).unwrap();
        assert_eq!(parsed.instance_id, config.instance_id);
    }

    #[test]
    fn route_without_sinks_is_rejected() {
        let route = Route {
            id: None,
            name: Some("broken".to_string()),
            priority: 128,
            enabled: true,
            filter: RouteFilter::default(),
            value_condition: None,
            sinks: Vec::new(),
        };
        assert!(route.into_rule().is_err());
    }

    #[test]
    fn route_builds_a_composite_rule_with_multiple_filter_dimensions() {
        let route = Route {
            id: None,
            name: Some("hot-sensors".to_string()),
            priority: 200,
            enabled: true,
            filter: RouteFilter {
                pattern: Some("sensors/*".to_string()),
                quality_levels: vec![Quality::Good],
                protocol_ids: vec![7],
            },
            value_condition: Some(ValueConditionSettings {
                op: CompareOp::Gt,
                reference: 50.0,
                reference_high: None,
            }),
            sinks: vec!["alert".to_string()],
        };
        let rule = route.into_rule().unwrap();
        assert_eq!(rule.rule_type, RuleType::Composite);
        assert_eq!(rule.priority, RulePriority::High);
        assert_eq!(rule.target_sink_ids, vec!["alert".to_string()]);
    }

    #[test]
    fn minimal_json_document_fills_in_defaults() {
        let parsed = BridgeConfig::from_json(r#"{"instance_id": "bridge-1"}"#).unwrap();
        assert_eq!(parsed.instance_id, "bridge-1");
        assert_eq!(parsed.limits.max_sinks, LimitSettings::default().max_sinks);
    }
}
