use std::path::Path;

use crate::collector::drivers::{SensorError, WeatherDriver};
use crate::collector::iio::IioDevice;
use crate::collector::traits::FileSystem;

/// BME280 environment sensor plus an optional LTR-559 light sensor.
///
/// Kernel units: temperature in m°C, pressure in kPa, humidity in m%RH,
/// illuminance in lux.
pub struct IioWeather<F> {
    env: IioDevice<F>,
    light: Option<IioDevice<F>>,
}

impl<F: FileSystem + Clone> IioWeather<F> {
    pub const ENV_NAMES: &'static [&'static str] = &["bme280", "bmp280"];
    pub const LIGHT_NAMES: &'static [&'static str] = &["ltr559", "ltr501"];

    pub fn new(env: IioDevice<F>, light: Option<IioDevice<F>>) -> Self {
        Self { env, light }
    }

    /// Finds both devices by name. A missing light sensor is not an error;
    /// lux reads will fail on their own.
    pub fn discover(fs: F, root: &Path) -> Result<Self, SensorError> {
        let env = IioDevice::discover(fs.clone(), root, Self::ENV_NAMES)?;
        let light = IioDevice::discover(fs, root, Self::LIGHT_NAMES).ok();
        Ok(Self::new(env, light))
    }
}

impl<F: FileSystem> WeatherDriver for IioWeather<F> {
    fn get_temperature(&self) -> Result<f64, SensorError> {
        Ok(self.env.read_f64("in_temp_input")? / 1000.0)
    }

    fn get_pressure(&self) -> Result<f64, SensorError> {
        Ok(self.env.read_f64("in_pressure_input")? * 10.0)
    }

    fn get_humidity(&self) -> Result<f64, SensorError> {
        Ok(self.env.read_f64("in_humidityrelative_input")? / 1000.0)
    }

    fn get_lux(&self) -> Result<f64, SensorError> {
        match &self.light {
            Some(light) => light.read_f64("in_illuminance_input"),
            None => Err(SensorError::Unavailable("no light sensor found".into())),
        }
    }
}
