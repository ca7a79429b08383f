use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::collector::drivers::{ParticulateDriver, ParticulateReading, SensorError};
use crate::collector::iio::IioDevice;
use crate::collector::traits::FileSystem;

/// PMS5003/PMS7003 particulate sensor via the kernel `pms7003` driver.
///
/// The kernel reports mass concentrations only, so readings carry no
/// particle counts. A stalled serial link surfaces as `ETIMEDOUT`, which maps
/// to [`SensorError::Timeout`]. Reset pulses the sensor's RESET line through
/// a sysfs GPIO `value` file, when one is configured.
pub struct IioParticulate<F> {
    dev: IioDevice<F>,
    reset_gpio: Option<PathBuf>,
    reset_pulse: Duration,
}

impl<F: FileSystem> IioParticulate<F> {
    pub const NAMES: &'static [&'static str] = &["pms7003", "pms5003"];

    pub fn new(dev: IioDevice<F>) -> Self {
        Self {
            dev,
            reset_gpio: None,
            reset_pulse: Duration::from_millis(100),
        }
    }

    pub fn discover(fs: F, root: &Path) -> Result<Self, SensorError> {
        IioDevice::discover(fs, root, Self::NAMES).map(Self::new)
    }

    /// Sets the GPIO `value` file wired to the sensor's RESET pin.
    pub fn with_reset_gpio(mut self, value_path: impl Into<PathBuf>) -> Self {
        self.reset_gpio = Some(value_path.into());
        self
    }

    /// How long RESET is held low.
    pub fn with_reset_pulse(mut self, pulse: Duration) -> Self {
        self.reset_pulse = pulse;
        self
    }
}

impl<F: FileSystem> ParticulateDriver for IioParticulate<F> {
    fn read(&mut self) -> Result<ParticulateReading, SensorError> {
        let pm1 = self.dev.read_f64("in_massconcentration_pm1_input")?;
        let pm25 = self.dev.read_f64("in_massconcentration_pm2p5_input")?;
        let pm10 = self.dev.read_f64("in_massconcentration_pm10_input")?;
        Ok(ParticulateReading::new(pm1, pm25, pm10))
    }

    fn reset(&mut self) -> Result<(), SensorError> {
        let Some(gpio) = &self.reset_gpio else {
            return Err(SensorError::Unavailable("no reset line configured".into()));
        };
        self.dev.fs().write(gpio, "0")?;
        if !self.reset_pulse.is_zero() {
            std::thread::sleep(self.reset_pulse);
        }
        self.dev.fs().write(gpio, "1")?;
        Ok(())
    }
}
