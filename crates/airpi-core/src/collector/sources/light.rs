use std::sync::Arc;

use crate::collector::drivers::{SensorError, WeatherDriver};
use crate::collector::sources::SensorSource;
use crate::fmt::fixed2;
use crate::model::SensorReading;

/// Ambient light from the shared weather peripheral, read on its own so a
/// failing light channel does not take temperature down with it.
pub struct LightSource<W> {
    sensor: Arc<W>,
}

impl<W: WeatherDriver> LightSource<W> {
    pub fn new(sensor: Arc<W>) -> Self {
        Self { sensor }
    }
}

impl<W: WeatherDriver> SensorSource for LightSource<W> {
    fn name(&self) -> &'static str {
        "light"
    }

    fn sample(&mut self) -> Result<Vec<SensorReading>, SensorError> {
        let lux = self.sensor.get_lux()?;
        Ok(vec![SensorReading::metric("light", fixed2(lux))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockWeather;

    #[test]
    fn test_light_sample() {
        let mut source = LightSource::new(Arc::new(MockWeather::new(20.0, 1000.0, 40.0, 87.126)));
        let readings = source.sample().unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].name(), "light");
        assert_eq!(readings[0].value(), "87.13");
    }

    #[test]
    fn test_light_fails_independently() {
        let weather = Arc::new(
            MockWeather::new(20.0, 1000.0, 40.0, 0.0)
                .fail_lux(SensorError::Unavailable("ltr559 absent".into())),
        );
        let mut light = LightSource::new(weather.clone());
        assert!(light.sample().is_err());
        assert_eq!(weather.get_temperature(), Ok(20.0));
    }
}
