//! Particulate matter with a single reset-and-retry on timeout.

use tracing::{debug, warn};

use crate::collector::drivers::{
    COUNT_SIZES, MASS_SIZES, ParticulateDriver, ParticulateReading, SensorError,
};
use crate::collector::sources::SensorSource;
use crate::fmt::plain;
use crate::model::SensorReading;

/// Metric names for [`MASS_SIZES`].
const MASS_METRICS: [&str; 3] = ["pm.P1", "pm.P25", "pm.P10"];

/// Metric names for [`COUNT_SIZES`].
const COUNT_METRICS: [&str; 6] = [
    "pm.per_1l_air_0.3",
    "pm.per_1l_air_0.5",
    "pm.per_1l_air_1",
    "pm.per_1l_air_2.5",
    "pm.per_1l_air_5",
    "pm.per_1l_air_10",
];

/// Emits `pm.P1`, `pm.P25`, `pm.P10` and the six `pm.per_1l_air_*` counts.
///
/// A timed-out read triggers one sensor reset and one more read. When that
/// retry succeeds only the mass concentrations are reported. Any other error,
/// or a failed retry, yields no readings.
pub struct ParticulateSource<P> {
    driver: P,
}

impl<P: ParticulateDriver> ParticulateSource<P> {
    pub fn new(driver: P) -> Self {
        Self { driver }
    }

    pub fn driver(&self) -> &P {
        &self.driver
    }

    fn retry_after_reset(&mut self) -> Result<ParticulateReading, SensorError> {
        if let Err(e) = self.driver.reset() {
            warn!("particulate: reset failed: {}", e);
        }
        self.driver.read()
    }
}

impl<P: ParticulateDriver> SensorSource for ParticulateSource<P> {
    fn name(&self) -> &'static str {
        "particulate"
    }

    fn sample(&mut self) -> Result<Vec<SensorReading>, SensorError> {
        match self.driver.read() {
            Ok(reading) => {
                let mut readings = mass_readings(&reading)?;
                readings.extend(count_readings(&reading));
                Ok(readings)
            }
            Err(SensorError::Timeout) => {
                debug!("particulate: read timed out, resetting sensor");
                let reading = self.retry_after_reset()?;
                mass_readings(&reading)
            }
            Err(e) => Err(e),
        }
    }
}

fn mass_readings(reading: &ParticulateReading) -> Result<Vec<SensorReading>, SensorError> {
    MASS_SIZES
        .iter()
        .zip(MASS_METRICS)
        .map(|(&size, name)| {
            reading
                .mass_concentration(size)
                .map(|v| SensorReading::metric(name, plain(v)))
                .ok_or_else(|| SensorError::Unavailable(format!("{} missing from frame", name)))
        })
        .collect()
}

fn count_readings(reading: &ParticulateReading) -> impl Iterator<Item = SensorReading> + '_ {
    COUNT_SIZES
        .iter()
        .zip(COUNT_METRICS)
        .filter_map(|(&size, name)| {
            reading
                .count_per_volume(size)
                .map(|v| SensorReading::metric(name, plain(v)))
        })
}
