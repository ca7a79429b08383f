//! Status line for the station's small panel.
//!
//! Rendering pixels is left to whatever drives the panel; this module builds
//! the text and hands it to a [`StatusDisplay`].

use std::path::PathBuf;

use tracing::debug;

use crate::collector::traits::FileSystem;
use crate::model::Snapshot;

/// Placeholder shown when a value is missing this tick.
const MISSING: &str = "--";

/// Builds the two-line status message.
///
/// Falls back to the PM2.5-only form when no compensated temperature was
/// read this tick. Never fails.
pub fn status_message(snapshot: &Snapshot) -> String {
    let pm25 = snapshot.get("pm.P25").unwrap_or(MISSING);
    match snapshot.get("comp_temp") {
        Some(temp) => format!("\nTemp: {}\nPM25: {}", temp, pm25),
        None => format!("PM25: {}", pm25),
    }
}

#[derive(Debug)]
pub struct DisplayError(pub String);

impl std::fmt::Display for DisplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "display error: {}", self.0)
    }
}

impl std::error::Error for DisplayError {}

/// Something that can show a status message.
pub trait StatusDisplay {
    fn render(&mut self, message: &str) -> Result<(), DisplayError>;
}

/// Writes the message to the log at debug level.
#[derive(Debug, Default)]
pub struct LogDisplay;

impl StatusDisplay for LogDisplay {
    fn render(&mut self, message: &str) -> Result<(), DisplayError> {
        debug!("display: {}", message.trim().replace('\n', " | "));
        Ok(())
    }
}

/// Writes the message to a file read by an external panel renderer.
pub struct StatusFileDisplay<F> {
    fs: F,
    path: PathBuf,
}

impl<F: FileSystem> StatusFileDisplay<F> {
    pub fn new(fs: F, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }
}

impl<F: FileSystem> StatusDisplay for StatusFileDisplay<F> {
    fn render(&mut self, message: &str) -> Result<(), DisplayError> {
        self.fs
            .write(&self.path, message)
            .map_err(|e| DisplayError(format!("{}: {}", self.path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;
    use crate::model::SensorReading;
    use chrono::Utc;
    use std::path::Path;

    fn snapshot(readings: &[(&str, &str)]) -> Snapshot {
        let mut snapshot = Snapshot::new(Utc::now());
        for (name, value) in readings {
            snapshot.insert(SensorReading::new(*name, *value).unwrap());
        }
        snapshot
    }

    #[test]
    fn test_status_with_temperature() {
        let snapshot = snapshot(&[("comp_temp", "19.82"), ("pm.P25", "4")]);
        assert_eq!(status_message(&snapshot), "\nTemp: 19.82\nPM25: 4");
    }

    #[test]
    fn test_status_falls_back_to_pm25() {
        let snapshot = snapshot(&[("light", "10.00"), ("pm.P25", "12.34")]);
        assert_eq!(status_message(&snapshot), "PM25: 12.34");
    }

    #[test]
    fn test_status_without_any_data() {
        assert_eq!(status_message(&snapshot(&[])), "PM25: --");
        assert_eq!(
            status_message(&snapshot(&[("comp_temp", "20.00")])),
            "\nTemp: 20.00\nPM25: --"
        );
    }

    #[test]
    fn test_status_file_display() {
        let mut fs = MockFs::new();
        fs.add_dir("/run/airpi");
        let handle = fs.clone();
        let mut display = StatusFileDisplay::new(fs, "/run/airpi/status");

        display.render("PM25: 4").unwrap();
        assert_eq!(
            handle
                .read_to_string(Path::new("/run/airpi/status"))
                .unwrap(),
            "PM25: 4"
        );
    }

    #[test]
    fn test_status_file_display_error() {
        let mut display = StatusFileDisplay::new(MockFs::new(), "/missing/status");
        assert!(display.render("PM25: 4").is_err());
    }

    #[test]
    fn test_log_display_never_fails() {
        assert!(LogDisplay.render("\nTemp: 1\nPM25: 2").is_ok());
    }
}
