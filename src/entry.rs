//! Log entry and severity level types
//!
//! `Entry` is the unit that flows through the system: one structured log
//! record with a wall-clock timestamp, an ordered severity level, message
//! text, and a flat field map. Entries are immutable once built; the hub
//! and all selector queues share them through `Arc`, so a consumer's view
//! can never be mutated by later producers.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::error::UnknownLevel;

#[cfg(test)]
#[path = "entry_test.rs"]
mod tests;

/// Log severity levels, ordered from least to most severe
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
    Panic = 6,
}

impl Level {
    /// All levels, in ascending severity order
    pub const ALL: [Level; 7] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
        Level::Panic,
    ];

    /// Ordinal rank of this level (0 = trace, 6 = panic)
    #[inline]
    pub const fn rank(self) -> u8 {
        self as u8
    }

    /// Get string representation
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
            Self::Panic => "panic",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Level {
    type Err = UnknownLevel;

    /// Parse a level name, case-insensitively. `warning` is accepted as an
    /// alias for `warn`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "fatal" => Ok(Self::Fatal),
            "panic" => Ok(Self::Panic),
            _ => Err(UnknownLevel(s.to_string())),
        }
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Self::Trace,
            tracing::Level::DEBUG => Self::Debug,
            tracing::Level::INFO => Self::Info,
            tracing::Level::WARN => Self::Warn,
            tracing::Level::ERROR => Self::Error,
        }
    }
}

/// One structured log record
///
/// Field keys are unique; insertion order is irrelevant. Values are
/// arbitrary JSON scalars (or anything a producer chose to store) and are
/// only interpreted lazily, by the coercion rules in [`crate::value`],
/// when a filter expression references them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    time: DateTime<Utc>,
    level: Level,
    message: String,
    fields: BTreeMap<String, Json>,
}

impl Entry {
    /// Create an entry timestamped now, with no fields
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            time: Utc::now(),
            level,
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Override the timestamp
    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }

    /// Add a single field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Json>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Replace the whole field map
    pub fn with_fields(mut self, fields: BTreeMap<String, Json>) -> Self {
        self.fields = fields;
        self
    }

    /// Entry timestamp
    #[inline]
    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    /// Severity level
    #[inline]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Message text
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Look up a field by name
    #[inline]
    pub fn field(&self, name: &str) -> Option<&Json> {
        self.fields.get(name)
    }

    /// Check whether a field is present
    #[inline]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// The full field map
    #[inline]
    pub fn fields(&self) -> &BTreeMap<String, Json> {
        &self.fields
    }
}
