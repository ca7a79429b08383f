//! Hardware seams used by the sensor sources.
//!
//! Each trait is the narrow surface a source needs from one physical sensor.
//! Implementations live in [`super::iio`] (Linux sysfs) and [`super::mock`]
//! (tests, hardware-less runs).

/// Error raised by a driver read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    /// Bus or communication failure, or unparsable data.
    Unavailable(String),
    /// The read did not complete in time.
    Timeout,
}

impl std::fmt::Display for SensorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorError::Unavailable(msg) => write!(f, "sensor unavailable: {}", msg),
            SensorError::Timeout => write!(f, "sensor read timed out"),
        }
    }
}

impl std::error::Error for SensorError {}

impl From<std::io::Error> for SensorError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::TimedOut {
            SensorError::Timeout
        } else {
            SensorError::Unavailable(e.to_string())
        }
    }
}

/// Source of the SoC temperature used for ambient compensation.
pub trait CpuTemperature {
    /// Degrees Celsius.
    fn read_cpu_temp(&self) -> Result<f64, SensorError>;
}

impl<T: CpuTemperature + ?Sized> CpuTemperature for Box<T> {
    fn read_cpu_temp(&self) -> Result<f64, SensorError> {
        (**self).read_cpu_temp()
    }
}

/// Combined temperature/pressure/humidity/light peripheral.
///
/// Methods take `&self` so the Weather and Light sources can share one
/// driver; every call may fail on its own.
pub trait WeatherDriver {
    /// Degrees Celsius.
    fn get_temperature(&self) -> Result<f64, SensorError>;
    /// Hectopascal.
    fn get_pressure(&self) -> Result<f64, SensorError>;
    /// Relative humidity, percent.
    fn get_humidity(&self) -> Result<f64, SensorError>;
    /// Ambient light, lux.
    fn get_lux(&self) -> Result<f64, SensorError>;
}

/// One sample of the three gas-sensing channels (sensor resistance, Ohm).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasReading {
    pub oxidising: f64,
    pub reducing: f64,
    pub nh3: f64,
}

pub trait GasDriver {
    fn read_all(&mut self) -> Result<GasReading, SensorError>;
}

/// Particle sizes (µm) with a mass concentration.
pub const MASS_SIZES: [f64; 3] = [1.0, 2.5, 10.0];

/// Particle size cutoffs (µm) with a particle count per volume of air.
pub const COUNT_SIZES: [f64; 6] = [0.3, 0.5, 1.0, 2.5, 5.0, 10.0];

/// One frame from a particulate sensor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParticulateReading {
    /// µg/m³, indexed like [`MASS_SIZES`].
    mass: [Option<f64>; 3],
    /// Counts, indexed like [`COUNT_SIZES`].
    counts: [Option<f64>; 6],
}

impl ParticulateReading {
    /// Reading with PM1.0, PM2.5 and PM10 mass concentrations.
    pub fn new(pm1: f64, pm25: f64, pm10: f64) -> Self {
        Self {
            mass: [Some(pm1), Some(pm25), Some(pm10)],
            counts: [None; 6],
        }
    }

    /// Adds particle counts, ordered like [`COUNT_SIZES`].
    pub fn with_counts(mut self, counts: [f64; 6]) -> Self {
        self.counts = counts.map(Some);
        self
    }

    /// Mass concentration for a size in [`MASS_SIZES`].
    pub fn mass_concentration(&self, size_um: f64) -> Option<f64> {
        position(&MASS_SIZES, size_um).and_then(|i| self.mass[i])
    }

    /// Particle count for a cutoff in [`COUNT_SIZES`], when the driver reports it.
    pub fn count_per_volume(&self, size_um: f64) -> Option<f64> {
        position(&COUNT_SIZES, size_um).and_then(|i| self.counts[i])
    }
}

fn position(sizes: &[f64], size_um: f64) -> Option<usize> {
    sizes.iter().position(|s| (s - size_um).abs() < 1e-9)
}

pub trait ParticulateDriver {
    fn read(&mut self) -> Result<ParticulateReading, SensorError>;
    /// Hardware reset, used once after a timed-out read.
    fn reset(&mut self) -> Result<(), SensorError>;
}
