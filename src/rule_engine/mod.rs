//! Rule engine: priority-ordered routing rules with an
//! optional bounded evaluation cache.

pub mod builder;
pub mod cache;
pub mod config;
pub mod engine;
pub mod stats;
pub mod types;

pub use builder::RuleBuilder;
pub use config::RuleEngineConfig;
pub use engine::{RuleEngine, RuleSummary};
pub use stats::RuleEngineStats;
pub use types::{
    CompareOp, RoutingRule, RuleMatchResult, RulePriority, RuleType, ValueCondition,
};
