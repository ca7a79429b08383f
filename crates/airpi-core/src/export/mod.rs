//! Event envelope and exporters.
//!
//! A dispatched snapshot is wrapped in an [`Event`] carrying fixed routing
//! tags and the dispatch time, then handed to an [`Exporter`]. Exporters are
//! fire-and-forget: an error is reported to the caller once and never retried.

mod hec;

pub use hec::{ConfigError, HecConfig, HecExporter};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::fmt::epoch_seconds;
use crate::model::Snapshot;

/// Fixed routing metadata attached to every event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTags {
    pub index: String,
    pub sourcetype: String,
    pub source: String,
    pub host: Option<String>,
}

impl Default for EventTags {
    fn default() -> Self {
        Self {
            index: "air".to_string(),
            sourcetype: "pyair".to_string(),
            source: "pi".to_string(),
            host: None,
        }
    }
}

/// One exported snapshot, serialised in the HEC JSON event format.
#[derive(Debug, Clone, Serialize)]
pub struct Event<'a> {
    pub index: &'a str,
    pub sourcetype: &'a str,
    pub source: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<&'a str>,
    /// Epoch seconds with millisecond precision.
    pub time: String,
    pub event: &'a Snapshot,
}

impl<'a> Event<'a> {
    pub fn new(tags: &'a EventTags, time: DateTime<Utc>, snapshot: &'a Snapshot) -> Self {
        Self {
            index: &tags.index,
            sourcetype: &tags.sourcetype,
            source: &tags.source,
            host: tags.host.as_deref(),
            time: epoch_seconds(time),
            event: snapshot,
        }
    }
}

/// Error from a single export attempt.
#[derive(Debug)]
pub enum ExportError {
    /// Event could not be serialised.
    Encode(String),
    /// Connection, TLS or timeout failure.
    Transport(String),
    /// Collector answered with a non-success status.
    Status(u16, String),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Encode(msg) => write!(f, "failed to encode event: {}", msg),
            ExportError::Transport(msg) => write!(f, "transport error: {}", msg),
            ExportError::Status(code, body) if body.is_empty() => {
                write!(f, "collector returned HTTP {}", code)
            }
            ExportError::Status(code, body) => {
                write!(f, "collector returned HTTP {}: {}", code, body)
            }
        }
    }
}

impl std::error::Error for ExportError {}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        ExportError::Encode(e.to_string())
    }
}

/// Sends events to a remote collector.
pub trait Exporter {
    fn send(&mut self, event: &Event<'_>) -> Result<(), ExportError>;
}

/// Dry-run exporter that logs each event instead of sending it.
#[derive(Debug, Default)]
pub struct LogExporter {
    sent: u64,
}

impl LogExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events logged so far.
    pub fn sent(&self) -> u64 {
        self.sent
    }
}

impl Exporter for LogExporter {
    fn send(&mut self, event: &Event<'_>) -> Result<(), ExportError> {
        let body = serde_json::to_string(event)?;
        self.sent += 1;
        info!("event #{}: {}", self.sent, body);
        Ok(())
    }
}
