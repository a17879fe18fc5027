//! # Industrial protocol bridge
//!
//! A message routing and dispatch engine for bridging industrial protocol
//! sources (`DataSource`/`Scoop` producers) to arbitrary sinks, gated by
//! rate limiting and backpressure and scheduled earliest-deadline-first.

pub mod backpressure;
pub mod cli;
pub mod common;
pub mod config;
pub mod drivers;
pub mod error;
pub mod interfaces;
pub mod logging;
pub mod pattern;
pub mod pool;
pub mod queue;
pub mod rate_limit;
pub mod registry;
pub mod router;
pub mod rule_engine;
pub mod scheduler;

pub use common::{DataPoint, Quality, RawMessage, StatsSnapshot, Timestamp, Value};
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use interfaces::{DataSink, DataSource};
pub use registry::{Scoop, ScoopRegistry, SinkRegistry};
pub use router::{Router, RouterConfig, RouterState};
pub use rule_engine::{RoutingRule, RuleBuilder, RuleEngine};

/// The current version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
