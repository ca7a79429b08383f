//! Temperature, pressure and humidity with CPU-heat compensation.

use std::sync::Arc;

use crate::collector::drivers::{CpuTemperature, SensorError, WeatherDriver};
use crate::collector::sources::SensorSource;
use crate::fmt::fixed2;
use crate::model::SensorReading;

/// Default divisor for the CPU heat correction.
pub const DEFAULT_COMP_FACTOR: f64 = 2.25;

/// Ambient temperature corrected for heat leaking from the SoC.
///
/// `raw - (cpu - raw) / factor`
pub fn compensated_temperature(cpu_temp: f64, raw_temp: f64, comp_factor: f64) -> f64 {
    raw_temp - ((cpu_temp - raw_temp) / comp_factor)
}

/// Emits `cpu_temp`, `raw_temp`, `comp_temp`, `pressure` and `humidity`.
///
/// Pressure is reported in Pa (driver hPa × 100). Any failed sub-read drops
/// the whole batch.
pub struct WeatherSource<C, W> {
    cpu: C,
    sensor: Arc<W>,
    comp_factor: f64,
}

impl<C: CpuTemperature, W: WeatherDriver> WeatherSource<C, W> {
    pub fn new(cpu: C, sensor: Arc<W>) -> Self {
        Self {
            cpu,
            sensor,
            comp_factor: DEFAULT_COMP_FACTOR,
        }
    }

    /// Overrides the compensation factor.
    pub fn with_comp_factor(mut self, comp_factor: f64) -> Self {
        self.comp_factor = comp_factor;
        self
    }
}

impl<C: CpuTemperature, W: WeatherDriver> SensorSource for WeatherSource<C, W> {
    fn name(&self) -> &'static str {
        "weather"
    }

    fn sample(&mut self) -> Result<Vec<SensorReading>, SensorError> {
        let cpu_temp = self.cpu.read_cpu_temp()?;
        let raw_temp = self.sensor.get_temperature()?;
        let comp_temp = compensated_temperature(cpu_temp, raw_temp, self.comp_factor);
        let pressure = self.sensor.get_pressure()? * 100.0;
        let humidity = self.sensor.get_humidity()?;

        Ok(vec![
            SensorReading::metric("cpu_temp", fixed2(cpu_temp)),
            SensorReading::metric("raw_temp", fixed2(raw_temp)),
            SensorReading::metric("comp_temp", fixed2(comp_temp)),
            SensorReading::metric("pressure", fixed2(pressure)),
            SensorReading::metric("humidity", fixed2(humidity)),
        ])
    }
}
