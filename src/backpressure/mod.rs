//! Backpressure: a multi-signal pressure sensor, a strategy
//! controller (drop-oldest/drop-newest/block/sample/throttle), a
//! backpressure-wrapped stage wrapper, and cross-stage pressure
//! propagation.

pub mod config;
pub mod controller;
pub mod propagator;
pub mod sensor;
pub mod stage;
pub mod stats;

pub use config::{BackpressureConfig, BackpressureStrategy, PressureLevel};
pub use controller::BackpressureController;
pub use propagator::PressurePropagator;
pub use sensor::PressureSensor;
pub use stage::BackpressureStage;
pub use stats::BackpressureStats;
