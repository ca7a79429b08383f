use std::path::Path;

use crate::collector::drivers::{GasDriver, GasReading, SensorError};
use crate::collector::iio::IioDevice;
use crate::collector::traits::FileSystem;

/// Supply voltage of the MICS6814 heater/divider circuit.
const SUPPLY_VOLTS: f64 = 3.3;

/// Load resistor in series with each sensing element, Ohm.
const LOAD_OHMS: f64 = 56_000.0;

/// Sensor resistance from the divider voltage; 0 once the divider saturates.
fn resistance(volts: f64) -> f64 {
    if volts >= SUPPLY_VOLTS {
        return 0.0;
    }
    (volts * LOAD_OHMS) / (SUPPLY_VOLTS - volts)
}

/// MICS6814 gas sensor sampled through an ADS1015 ADC.
///
/// Channels are single-ended ADC inputs for oxidising, reducing and NH3.
pub struct IioGas<F> {
    adc: IioDevice<F>,
    channels: [u8; 3],
}

impl<F: FileSystem> IioGas<F> {
    pub const NAMES: &'static [&'static str] = &["ads1015"];
    pub const DEFAULT_CHANNELS: [u8; 3] = [0, 1, 2];

    pub fn new(adc: IioDevice<F>) -> Self {
        Self {
            adc,
            channels: Self::DEFAULT_CHANNELS,
        }
    }

    pub fn discover(fs: F, root: &Path) -> Result<Self, SensorError> {
        IioDevice::discover(fs, root, Self::NAMES).map(Self::new)
    }

    /// Overrides the oxidising/reducing/NH3 channel numbers.
    pub fn with_channels(mut self, channels: [u8; 3]) -> Self {
        self.channels = channels;
        self
    }

    fn volts(&self, channel: u8) -> Result<f64, SensorError> {
        let raw = self.adc.read_f64(&format!("in_voltage{}_raw", channel))?;
        let scale_mv = self.adc.read_f64(&format!("in_voltage{}_scale", channel))?;
        Ok(raw * scale_mv / 1000.0)
    }
}

impl<F: FileSystem> GasDriver for IioGas<F> {
    fn read_all(&mut self) -> Result<GasReading, SensorError> {
        let [ox, red, nh3] = self.channels;
        Ok(GasReading {
            oxidising: resistance(self.volts(ox)?),
            reducing: resistance(self.volts(red)?),
            nh3: resistance(self.volts(nh3)?),
        })
    }
}
