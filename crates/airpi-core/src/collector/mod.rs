//! Sensor collection for the air-quality station.
//!
//! This module turns a set of independently failing sensors into one
//! snapshot per tick. A source that errors contributes nothing for that tick;
//! it never stops the other sources or the loop.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Collector                           │
//! │   Weather ──► Light ──► Gas ──► Particulate   (fixed order)  │
//! │      │          │        │           │                       │
//! │      └────┬─────┘        │           │      SensorSource     │
//! │           │              │           │        (trait)        │
//! │   ┌───────▼───────┐ ┌────▼────┐ ┌────▼────────────┐          │
//! │   │ WeatherDriver │ │GasDriver│ │ParticulateDriver│ (traits) │
//! │   └───────┬───────┘ └────┬────┘ └────┬────────────┘          │
//! └───────────┼──────────────┼───────────┼───────────────────────┘
//!             │              │           │
//!      ┌──────▼──────┐ ┌─────▼─────┐ ┌───▼─────────┐
//!      │  Iio* (sysfs│ │   Mock*   │ │  Scenarios  │
//!      │  via RealFs)│ │ (Testing) │ │  (Fixtures) │
//!      └─────────────┘ └───────────┘ └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use airpi_core::collector::Collector;
//! use airpi_core::collector::mock::scenarios;
//!
//! let mut collector = scenarios::typical_station();
//! let snapshot = collector.collect_snapshot(chrono::Utc::now());
//! assert!(snapshot.contains("pm.P25"));
//! ```

#[allow(clippy::module_inception)]
mod collector;
pub mod drivers;
pub mod iio;
pub mod mock;
pub mod sources;
pub mod traits;

pub use collector::{Collector, CollectorTiming, SourceTiming};
pub use drivers::{
    CpuTemperature, GasDriver, GasReading, ParticulateDriver, ParticulateReading, SensorError,
    WeatherDriver,
};
pub use mock::MockFs;
pub use sources::{GasSource, LightSource, ParticulateSource, SensorSource, WeatherSource};
pub use traits::{FileSystem, RealFs};
