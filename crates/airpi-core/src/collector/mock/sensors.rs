//! Scripted sensor drivers for tests and hardware-less runs.
//!
//! Each driver replays a queue of results; once the queue is down to its
//! last entry that entry repeats forever.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::collector::drivers::{
    CpuTemperature, GasDriver, GasReading, ParticulateDriver, ParticulateReading, SensorError,
    WeatherDriver,
};

/// Replays scripted results, repeating the last one.
#[derive(Debug)]
pub struct Script<T> {
    queue: Mutex<VecDeque<Result<T, SensorError>>>,
    calls: AtomicUsize,
}

impl<T: Clone> Script<T> {
    pub fn new(results: Vec<Result<T, SensorError>>) -> Self {
        Self {
            queue: Mutex::new(results.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always(result: Result<T, SensorError>) -> Self {
        Self::new(vec![result])
    }

    /// Returns the next scripted result.
    pub fn next_result(&self) -> Result<T, SensorError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        if queue.len() > 1
            && let Some(result) = queue.pop_front()
        {
            return result;
        }
        queue
            .front()
            .cloned()
            .unwrap_or_else(|| Err(SensorError::Unavailable("script is empty".into())))
    }

    /// Number of results handed out so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

/// CPU thermometer with a scripted value.
#[derive(Debug)]
pub struct MockCpu(Script<f64>);

impl MockCpu {
    pub fn new(celsius: f64) -> Self {
        Self(Script::always(Ok(celsius)))
    }

    pub fn failing(error: SensorError) -> Self {
        Self(Script::always(Err(error)))
    }
}

impl CpuTemperature for MockCpu {
    fn read_cpu_temp(&self) -> Result<f64, SensorError> {
        self.0.next_result()
    }
}

/// Weather peripheral where each channel can be scripted on its own.
#[derive(Debug)]
pub struct MockWeather {
    temperature: Script<f64>,
    pressure: Script<f64>,
    humidity: Script<f64>,
    lux: Script<f64>,
}

impl MockWeather {
    /// Temperature in °C, pressure in hPa, humidity in %, light in lux.
    pub fn new(temperature: f64, pressure: f64, humidity: f64, lux: f64) -> Self {
        Self {
            temperature: Script::always(Ok(temperature)),
            pressure: Script::always(Ok(pressure)),
            humidity: Script::always(Ok(humidity)),
            lux: Script::always(Ok(lux)),
        }
    }

    pub fn fail_temperature(mut self, error: SensorError) -> Self {
        self.temperature = Script::always(Err(error));
        self
    }

    pub fn fail_pressure(mut self, error: SensorError) -> Self {
        self.pressure = Script::always(Err(error));
        self
    }

    pub fn fail_humidity(mut self, error: SensorError) -> Self {
        self.humidity = Script::always(Err(error));
        self
    }

    pub fn fail_lux(mut self, error: SensorError) -> Self {
        self.lux = Script::always(Err(error));
        self
    }
}

impl WeatherDriver for MockWeather {
    fn get_temperature(&self) -> Result<f64, SensorError> {
        self.temperature.next_result()
    }

    fn get_pressure(&self) -> Result<f64, SensorError> {
        self.pressure.next_result()
    }

    fn get_humidity(&self) -> Result<f64, SensorError> {
        self.humidity.next_result()
    }

    fn get_lux(&self) -> Result<f64, SensorError> {
        self.lux.next_result()
    }
}

/// Gas sensor with scripted readings.
#[derive(Debug)]
pub struct MockGas(Script<GasReading>);

impl MockGas {
    pub fn new(reading: GasReading) -> Self {
        Self(Script::always(Ok(reading)))
    }

    pub fn failing(error: SensorError) -> Self {
        Self(Script::always(Err(error)))
    }

    pub fn scripted(results: Vec<Result<GasReading, SensorError>>) -> Self {
        Self(Script::new(results))
    }
}

impl GasDriver for MockGas {
    fn read_all(&mut self) -> Result<GasReading, SensorError> {
        self.0.next_result()
    }
}

/// Particulate sensor with scripted frames and a reset counter.
#[derive(Debug)]
pub struct MockParticulate {
    reads: Script<ParticulateReading>,
    reset_result: Result<(), SensorError>,
    resets: usize,
}

impl MockParticulate {
    pub fn new(reading: ParticulateReading) -> Self {
        Self::scripted(vec![Ok(reading)])
    }

    pub fn scripted(results: Vec<Result<ParticulateReading, SensorError>>) -> Self {
        Self {
            reads: Script::new(results),
            reset_result: Ok(()),
            resets: 0,
        }
    }

    /// Makes every reset report `error` (the reset is still counted).
    pub fn fail_reset(mut self, error: SensorError) -> Self {
        self.reset_result = Err(error);
        self
    }

    pub fn reads(&self) -> usize {
        self.reads.calls()
    }

    pub fn resets(&self) -> usize {
        self.resets
    }
}

impl ParticulateDriver for MockParticulate {
    fn read(&mut self) -> Result<ParticulateReading, SensorError> {
        self.reads.next_result()
    }

    fn reset(&mut self) -> Result<(), SensorError> {
        self.resets += 1;
        self.reset_result.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_repeats_last() {
        let script = Script::new(vec![Err(SensorError::Timeout), Ok(1.0), Ok(2.0)]);
        assert_eq!(script.next_result(), Err(SensorError::Timeout));
        assert_eq!(script.next_result(), Ok(1.0));
        assert_eq!(script.next_result(), Ok(2.0));
        assert_eq!(script.next_result(), Ok(2.0));
        assert_eq!(script.calls(), 4);
    }

    #[test]
    fn test_empty_script_is_unavailable() {
        let script: Script<f64> = Script::new(Vec::new());
        assert!(matches!(script.next_result(), Err(SensorError::Unavailable(_))));
    }

    #[test]
    fn test_mock_weather_channels_independent() {
        let weather = MockWeather::new(20.0, 1000.0, 40.0, 5.0).fail_pressure(SensorError::Timeout);
        assert_eq!(weather.get_temperature(), Ok(20.0));
        assert_eq!(weather.get_pressure(), Err(SensorError::Timeout));
        assert_eq!(weather.get_lux(), Ok(5.0));
    }
}
