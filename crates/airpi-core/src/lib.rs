//! airpi-core: shared library for the airpi station daemon.
//!
//! Provides:
//! - `model`: sensor readings and per-tick snapshots
//! - `collector`: sensor sources, hardware seams and the snapshot aggregator
//! - `dispatch`: rate-limited hand-off of snapshots to an exporter
//! - `export`: event envelope and exporters (Splunk HEC, dry-run log)
//! - `display`: status line rendering for the local panel
//! - `daemon`: the tick loop tying everything together
//! - `fmt`: value formatting helpers

pub mod collector;
pub mod daemon;
pub mod dispatch;
pub mod display;
pub mod export;
pub mod fmt;
pub mod model;

/// Crate version, reported by the daemon at startup.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
