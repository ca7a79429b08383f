//! Test doubles for the collector.
//!
//! `MockFs` stands in for sysfs, the scripted drivers stand in for real
//! sensors, and `scenarios` assembles both into ready-made stations.

mod filesystem;
pub mod scenarios;
mod sensors;

pub use filesystem::MockFs;
pub use sensors::{MockCpu, MockGas, MockParticulate, MockWeather, Script};
