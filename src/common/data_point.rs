//! DataPoint, Quality, and RawMessage.

use super::timestamp::Timestamp;
use super::value::Value;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Quality indicator for a data point. Ordering matters only for "quality
/// >= X" style filters; the numeric order below follows the original
/// enumeration exactly so such filters behave identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Quality {
    Good = 0,
    Uncertain = 1,
    Bad = 2,
    Stale = 3,
    CommFailure = 4,
    ConfigError = 5,
    NotConnected = 6,
    DeviceFailure = 7,
    SensorFailure = 8,
    LastKnown = 9,
    Initial = 10,
    Forced = 11,
}

impl Default for Quality {
    fn default() -> Self {
        Quality::Initial
    }
}

/// The atomic unit of data flow through the bridge.
///
/// A `DataPoint` is exclusively owned by one holder at a time as it moves
/// producer -> queue -> worker -> sink; it is never shared mutably between
/// threads, so this type derives neither `Copy` nor interior mutability.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    address: String,
    value: Value,
    timestamp: Timestamp,
    protocol_id: u16,
    quality: Quality,
    sequence: u32,
}

impl DataPoint {
    pub fn new(address: impl Into<String>, value: Value) -> Self {
        DataPoint {
            address: address.into(),
            value,
            timestamp: Timestamp::from_system_time(),
            protocol_id: 0,
            quality: Quality::Good,
            sequence: 0,
        }
    }

    pub fn with_protocol(address: impl Into<String>, value: Value, protocol_id: u16) -> Self {
        let mut dp = Self::new(address, value);
        dp.protocol_id = protocol_id;
        dp
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn set_address(&mut self, address: impl Into<String>) {
        self.address = address.into();
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn set_value(&mut self, value: Value) {
        self.value = value;
        self.timestamp = Timestamp::from_system_time();
        self.quality = Quality::Good;
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, ts: Timestamp) {
        self.timestamp = ts;
    }

    pub fn protocol_id(&self) -> u16 {
        self.protocol_id
    }

    pub fn set_protocol_id(&mut self, id: u16) {
        self.protocol_id = id;
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn set_quality(&mut self, q: Quality) {
        self.quality = q;
    }

    pub fn sequence_number(&self) -> u32 {
        self.sequence
    }

    pub fn set_sequence_number(&mut self, seq: u32) {
        self.sequence = seq;
    }

    /// `GOOD` or `UNCERTAIN` readings are considered valid for routing
    /// purposes; anything worse should generally be filtered upstream.
    pub fn is_valid(&self) -> bool {
        matches!(self.quality, Quality::Good | Quality::Uncertain)
    }

    pub fn is_stale(&self, current_time: Timestamp, max_age: std::time::Duration) -> bool {
        current_time.saturating_duration_since(self.timestamp) > max_age
    }

    /// `hash(address) XOR (hash(protocol_id) << 1)`.
    pub fn hash_key(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.address.hash(&mut hasher);
        let addr_hash = hasher.finish();

        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.protocol_id.hash(&mut hasher);
        let proto_hash = hasher.finish();

        addr_hash ^ (proto_hash << 1)
    }
}

/// Opaque byte span used on the source-ingest boundary before decoding into
/// `DataPoint`s.
#[derive(Debug, Clone)]
pub struct RawMessage {
    data: Vec<u8>,
    protocol_id: u16,
    timestamp: Timestamp,
    owns_data: bool,
}

impl RawMessage {
    pub fn owned(data: Vec<u8>, protocol_id: u16) -> Self {
        RawMessage {
            data,
            protocol_id,
            timestamp: Timestamp::from_system_time(),
            owns_data: true,
        }
    }

    pub fn borrowed(data: &[u8], protocol_id: u16) -> Self {
        RawMessage {
            data: data.to_vec(),
            protocol_id,
            timestamp: Timestamp::from_system_time(),
            owns_data: false,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn protocol_id(&self) -> u16 {
        self.protocol_id
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn owns_data(&self) -> bool {
        self.owns_data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_ordering_matches_spec_enumeration() {
        assert!(Quality::Good < Quality::Uncertain);
        assert!(Quality::Uncertain < Quality::Bad);
        assert!(Quality::LastKnown < Quality::Forced);
    }

    #[test]
    fn new_datapoint_is_good_quality() {
        let dp = DataPoint::new("sensors/temp", Value::F64(25.5));
        assert_eq!(dp.quality(), Quality::Good);
        assert!(dp.is_valid());
    }

    #[test]
    fn hash_key_distinguishes_protocol_id() {
        let a = DataPoint::with_protocol("x", Value::Empty, 1);
        let b = DataPoint::with_protocol("x", Value::Empty, 2);
        assert_ne!(a.hash_key(), b.hash_key());
    }

    #[test]
    fn staleness_uses_monotonic_difference() {
        let mut dp = DataPoint::new("x", Value::Empty);
        dp.set_timestamp(Timestamp::from_nanos(0));
        let now = Timestamp::from_nanos(2_000_000_000);
        assert!(dp.is_stale(now, std::time::Duration::from_secs(1)));
        assert!(!dp.is_stale(now, std::time::Duration::from_secs(3)));
    }
}
