//! C1: the tagged-union value type and the timestamped, quality-tagged,
//! addressed `DataPoint` record that flows through every other component.

pub mod data_point;
pub mod stats;
pub mod timestamp;
pub mod value;

pub use data_point::{DataPoint, Quality, RawMessage};
pub use stats::{StatsCounters, StatsSnapshot};
pub use timestamp::Timestamp;
pub use value::{Value, ValueType, INLINE_SIZE};
