//! Rule types, priorities, and value conditions.

use crate::common::{DataPoint, Quality, Timestamp, Value};
use crate::pattern::{self, MatcherType, PatternMatcher};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum RulePriority {
    Lowest = 0,
    Low = 64,
    Normal = 128,
    High = 192,
    Realtime = 254,
    Highest = 255,
}

impl Default for RulePriority {
    fn default() -> Self {
        RulePriority::Normal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleType {
    Static,
    Pattern,
    Protocol,
    Quality,
    Value,
    Timestamp,
    Composite,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Between,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueCondition {
    pub op: CompareOp,
    pub reference: Value,
    pub reference_high: Option<Value>,
}

impl ValueCondition {
    pub fn new(op: CompareOp, reference: Value) -> Self {
        ValueCondition {
            op,
            reference,
            reference_high: None,
        }
    }

    pub fn between(low: Value, high: Value) -> Self {
        ValueCondition {
            op: CompareOp::Between,
            reference: low,
            reference_high: Some(high),
        }
    }

    pub fn evaluate(&self, value: &Value) -> bool {
        use std::cmp::Ordering as O;

        if self.op == CompareOp::Between {
            let Some(high) = &self.reference_high else {
                return false;
            };
            let Some(low_ord) = value.partial_compare(&self.reference) else {
                return false;
            };
            let Some(high_ord) = value.partial_compare(high) else {
                return false;
            };
            return low_ord != O::Less && high_ord != O::Greater;
        }

        let Some(ord) = value.partial_compare(&self.reference) else {
            return matches!(self.op, CompareOp::Ne);
        };

        match self.op {
            CompareOp::Eq => ord == O::Equal,
            CompareOp::Ne => ord != O::Equal,
            CompareOp::Lt => ord == O::Less,
            CompareOp::Le => ord != O::Greater,
            CompareOp::Gt => ord == O::Greater,
            CompareOp::Ge => ord != O::Less,
            CompareOp::Between => unreachable!("handled above"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleMatchResult {
    pub matched: bool,
    pub rule_id: u32,
    pub priority: Option<RulePriority>,
    pub target_ids: Vec<String>,
    pub captured_groups: Vec<String>,
}

impl RuleMatchResult {
    pub fn no_match(rule_id: u32) -> Self {
        RuleMatchResult {
            rule_id,
            ..Default::default()
        }
    }
}

impl From<&RuleMatchResult> for bool {
    fn from(r: &RuleMatchResult) -> bool {
        r.matched
    }
}

/// A routing rule. Per-rule counters are atomics so concurrent readers can
/// observe live evaluation statistics without locking the rule itself.
pub struct RoutingRule {
    pub id: u32,
    pub name: String,
    pub rule_type: RuleType,
    pub priority: RulePriority,
    pub enabled: bool,
    pub source_addresses: Vec<String>,
    pub address_pattern: Option<String>,
    pub protocol_ids: Vec<u16>,
    pub quality_levels: Vec<Quality>,
    pub value_condition: Option<ValueCondition>,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    pub target_sink_ids: Vec<String>,
    pub custom_predicate: Option<Box<dyn Fn(&DataPoint) -> bool + Send + Sync>>,
    pub match_count: AtomicU64,
    pub eval_count: AtomicU64,
    pub total_eval_time_ns: AtomicI64,
    /// Lazily- or eagerly-populated compiled form of `address_pattern`.
    /// `Some(None)` means compilation was attempted and failed (an invalid
    /// regex pattern, say); evaluation then treats the rule as never
    /// matching on address rather than recompiling every call.
    compiled_pattern: OnceLock<Option<Arc<dyn PatternMatcher>>>,
}

impl fmt::Debug for RoutingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingRule")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("rule_type", &self.rule_type)
            .field("priority", &self.priority)
            .field("enabled", &self.enabled)
            .field("source_addresses", &self.source_addresses)
            .field("address_pattern", &self.address_pattern)
            .field("protocol_ids", &self.protocol_ids)
            .field("quality_levels", &self.quality_levels)
            .field("value_condition", &self.value_condition)
            .field("start_time", &self.start_time)
            .field("end_time", &self.end_time)
            .field("target_sink_ids", &self.target_sink_ids)
            .field(
                "custom_predicate",
                &self.custom_predicate.as_ref().map(|_| "<fn>"),
            )
            .field("match_count", &self.match_count)
            .field("eval_count", &self.eval_count)
            .field("total_eval_time_ns", &self.total_eval_time_ns)
            .field(
                "compiled_pattern",
                &self.compiled_pattern.get().map(|p| p.is_some()),
            )
            .finish()
    }
}

impl Default for RoutingRule {
    fn default() -> Self {
        RoutingRule {
            id: 0,
            name: String::new(),
            rule_type: RuleType::Static,
            priority: RulePriority::default(),
            enabled: true,
            source_addresses: Vec::new(),
            address_pattern: None,
            protocol_ids: Vec::new(),
            quality_levels: Vec::new(),
            value_condition: None,
            start_time: None,
            end_time: None,
            target_sink_ids: Vec::new(),
            custom_predicate: None,
            match_count: AtomicU64::new(0),
            eval_count: AtomicU64::new(0),
            total_eval_time_ns: AtomicI64::new(0),
            compiled_pattern: OnceLock::new(),
        }
    }
}

impl RoutingRule {
    /// Compiles `address_pattern` now rather than on first evaluation.
    /// Idempotent: a rule that already has a compiled (or failed) pattern
    /// is left untouched.
    pub fn precompile(&self) {
        self.compiled_pattern();
    }

    /// The compiled form of `address_pattern`, building and caching it on
    /// first call if `precompile` was never invoked. Returns `None` when
    /// there is no address pattern on this rule, or compilation failed.
    pub fn compiled_pattern(&self) -> Option<&Arc<dyn PatternMatcher>> {
        self.compiled_pattern
            .get_or_init(|| {
                self.address_pattern.as_deref().and_then(|p| {
                    pattern::create(p, MatcherType::Auto)
                        .ok()
                        .map(Arc::from)
                })
            })
            .as_ref()
    }

    pub fn avg_eval_time_ns(&self) -> f64 {
        let count = self.eval_count.load(Ordering::Relaxed);
        if count > 0 {
            self.total_eval_time_ns.load(Ordering::Relaxed) as f64 / count as f64
        } else {
            0.0
        }
    }

    /// References time, value, or quality cannot be served from the
    /// address-keyed evaluation cache: the same address can produce a
    /// different verdict on every call.
    pub fn bypasses_cache(&self) -> bool {
        matches!(
            self.rule_type,
            RuleType::Value | RuleType::Timestamp | RuleType::Quality | RuleType::Custom
        )
    }
}
