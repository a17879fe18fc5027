//! Registries that hold the router's sink- and scoop-side fan-out state,
//! plus the health state machine they share.

pub mod health;
pub mod scoop;
pub mod sink;

pub use health::{HealthState, HealthTracker};
pub use scoop::{AggregatedSubscription, ReadStrategy, Scoop, ScoopRegistry, ScoopRegistryConfig, ScoopRegistryStats};
pub use sink::{SinkRegistry, SinkRegistryConfig, SinkRegistryStats, SinkStrategy};
