//! SoC temperature sources.

use std::path::PathBuf;
use std::process::Command;

use crate::collector::drivers::{CpuTemperature, SensorError};
use crate::collector::traits::FileSystem;

/// Parses `vcgencmd measure_temp` output such as `temp=48.3'C`.
pub fn parse_vcgencmd(output: &str) -> Result<f64, SensorError> {
    let invalid = || SensorError::Unavailable(format!("unexpected vcgencmd output {:?}", output));
    let start = output.find('=').ok_or_else(invalid)? + 1;
    let end = output.rfind('\'').ok_or_else(invalid)?;
    if end < start {
        return Err(invalid());
    }
    output[start..end].trim().parse().map_err(|_| invalid())
}

/// Raspberry Pi firmware query via `vcgencmd measure_temp`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Vcgencmd;

impl CpuTemperature for Vcgencmd {
    fn read_cpu_temp(&self) -> Result<f64, SensorError> {
        let output = Command::new("vcgencmd")
            .arg("measure_temp")
            .output()
            .map_err(|e| SensorError::Unavailable(format!("vcgencmd: {}", e)))?;
        if !output.status.success() {
            return Err(SensorError::Unavailable(format!(
                "vcgencmd exited with {}",
                output.status
            )));
        }
        parse_vcgencmd(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Usual thermal zone of the SoC on Raspberry Pi OS.
pub const DEFAULT_THERMAL_ZONE: &str = "/sys/class/thermal/thermal_zone0/temp";

/// Kernel thermal zone reporting millidegrees Celsius.
#[derive(Debug, Clone)]
pub struct ThermalZone<F> {
    fs: F,
    path: PathBuf,
}

impl<F: FileSystem> ThermalZone<F> {
    pub fn new(fs: F, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }
}

impl<F: FileSystem> CpuTemperature for ThermalZone<F> {
    fn read_cpu_temp(&self) -> Result<f64, SensorError> {
        let raw = self.fs.read_to_string(&self.path)?;
        raw.trim()
            .parse::<f64>()
            .map(|milli| milli / 1000.0)
            .map_err(|_| {
                SensorError::Unavailable(format!(
                    "{}: invalid value {:?}",
                    self.path.display(),
                    raw.trim()
                ))
            })
    }
}
