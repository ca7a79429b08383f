use crate::collector::drivers::{GasDriver, SensorError};
use crate::collector::sources::SensorSource;
use crate::fmt::fixed2;
use crate::model::SensorReading;

/// Emits `gas.oxidised`, `gas.reducing` and `gas.nh3`, scaled by 1/1000.
pub struct GasSource<G> {
    driver: G,
}

impl<G: GasDriver> GasSource<G> {
    pub fn new(driver: G) -> Self {
        Self { driver }
    }
}

impl<G: GasDriver> SensorSource for GasSource<G> {
    fn name(&self) -> &'static str {
        "gas"
    }

    fn sample(&mut self) -> Result<Vec<SensorReading>, SensorError> {
        let gas = self.driver.read_all()?;
        Ok(vec![
            SensorReading::metric("gas.oxidised", fixed2(gas.oxidising / 1000.0)),
            SensorReading::metric("gas.reducing", fixed2(gas.reducing / 1000.0)),
            SensorReading::metric("gas.nh3", fixed2(gas.nh3 / 1000.0)),
        ])
    }
}
