//! Linux adapters for the station sensors.
//!
//! The kernel already drives the sensors (bmp280, ltr501, ti-ads1015,
//! pms7003 IIO drivers); these adapters only read the processed values the
//! kernel exposes under `/sys/bus/iio/devices/iio:deviceN/` and convert units.

mod cpu;
mod gas;
mod particulate;
mod weather;

pub use cpu::{DEFAULT_THERMAL_ZONE, ThermalZone, Vcgencmd, parse_vcgencmd};
pub use gas::IioGas;
pub use particulate::IioParticulate;
pub use weather::IioWeather;

use std::path::{Path, PathBuf};

use crate::collector::drivers::SensorError;
use crate::collector::traits::FileSystem;

/// Default sysfs location of IIO devices.
pub const DEFAULT_IIO_PATH: &str = "/sys/bus/iio/devices";

/// Finds the first device directory under `root` whose `name` matches one of `names`.
///
/// Directories are scanned in sorted order so discovery is deterministic.
pub fn find_device<F: FileSystem>(fs: &F, root: &Path, names: &[&str]) -> Option<PathBuf> {
    let mut entries = fs.read_dir(root).ok()?;
    entries.sort();
    entries.into_iter().find(|dir| {
        fs.read_to_string(&dir.join("name"))
            .map(|name| names.contains(&name.trim()))
            .unwrap_or(false)
    })
}

/// One IIO device directory.
#[derive(Debug, Clone)]
pub struct IioDevice<F> {
    fs: F,
    dir: PathBuf,
}

impl<F: FileSystem> IioDevice<F> {
    pub fn new(fs: F, dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            dir: dir.into(),
        }
    }

    /// Looks up a device by its driver name under `root`.
    pub fn discover(fs: F, root: &Path, names: &[&str]) -> Result<Self, SensorError> {
        match find_device(&fs, root, names) {
            Some(dir) => Ok(Self::new(fs, dir)),
            None => Err(SensorError::Unavailable(format!(
                "no IIO device named {} under {}",
                names.join("/"),
                root.display()
            ))),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Reads a numeric channel attribute such as `in_temp_input`.
    pub fn read_f64(&self, attr: &str) -> Result<f64, SensorError> {
        let path = self.dir.join(attr);
        let raw = self.fs.read_to_string(&path)?;
        raw.trim().parse::<f64>().map_err(|_| {
            SensorError::Unavailable(format!("{}: invalid value {:?}", path.display(), raw.trim()))
        })
    }
}
