//! Sensor readings and the per-tick snapshot.
//!
//! A `Snapshot` is built fresh on every tick by the collector, then handed
//! read-only to the dispatcher and the display. Nothing outlives the tick.

use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One named metric with a pre-formatted value.
///
/// Names are namespaced (`"gas.oxidised"`, `"pm.P25"`). Values are text
/// because each probe knows its own natural precision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorReading {
    name: String,
    value: String,
}

impl SensorReading {
    /// Creates a reading. Returns `None` for an empty name.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name,
            value: value.into(),
        })
    }

    /// Reading for a static metric name known to be non-empty.
    pub(crate) fn metric(name: &'static str, value: String) -> Self {
        debug_assert!(!name.is_empty());
        Self {
            name: name.to_string(),
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Insertion-ordered mapping from metric name to value for a single tick.
///
/// Inserting a name that already exists replaces the value in place, so
/// every name appears at most once.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    timestamp: DateTime<Utc>,
    readings: Vec<SensorReading>,
}

impl Snapshot {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            readings: Vec::new(),
        }
    }

    /// Time the tick that produced this snapshot started.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Adds a reading; last write wins on a name collision.
    pub fn insert(&mut self, reading: SensorReading) {
        match self.readings.iter_mut().find(|r| r.name == reading.name) {
            Some(existing) => existing.value = reading.value,
            None => self.readings.push(reading),
        }
    }

    /// Merges a batch of readings in order.
    pub fn extend(&mut self, readings: impl IntoIterator<Item = SensorReading>) {
        for reading in readings {
            self.insert(reading);
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.readings
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.readings
            .iter()
            .map(|r| (r.name.as_str(), r.value.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.readings.iter().map(|r| r.name.as_str())
    }
}

/// Serialised as a flat JSON object keyed by metric name.
impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.readings.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
