//! Sensor sources: one per physical failure domain.
//!
//! A source reads its whole set of metrics as a unit and returns either all
//! of them or an error. Formatting to text happens here, since each sensor
//! has its own natural precision.

mod gas;
mod light;
mod particulate;
mod weather;

pub use gas::GasSource;
pub use light::LightSource;
pub use particulate::ParticulateSource;
pub use weather::{DEFAULT_COMP_FACTOR, WeatherSource, compensated_temperature};

use crate::collector::drivers::SensorError;
use crate::model::SensorReading;

/// A probe that produces a batch of readings per tick.
pub trait SensorSource {
    /// Short name used in logs and timing reports.
    fn name(&self) -> &'static str;

    /// Reads every metric of this source.
    ///
    /// An `Err` means the source contributes nothing this tick.
    fn sample(&mut self) -> Result<Vec<SensorReading>, SensorError>;
}
