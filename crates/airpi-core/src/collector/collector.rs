//! Aggregator that merges every sensor source into one snapshot.
//!
//! The `Collector` never fails: a source that errors is logged and skipped,
//! so a disconnected sensor degrades completeness, never availability.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::collector::sources::SensorSource;
use crate::model::Snapshot;

/// Timing and outcome of one source within the last collection.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTiming {
    pub name: &'static str,
    pub elapsed: Duration,
    /// Number of readings on success, error text on failure.
    pub result: Result<usize, String>,
}

/// Timing information for the last `collect_snapshot` call.
#[derive(Debug, Clone, Default)]
pub struct CollectorTiming {
    /// Total snapshot collection time.
    pub total: Duration,
    /// One entry per source, in collection order.
    pub sources: Vec<SourceTiming>,
}

impl CollectorTiming {
    /// Number of sources that failed in the last collection.
    pub fn failed(&self) -> usize {
        self.sources.iter().filter(|s| s.result.is_err()).count()
    }
}

/// Samples each source in order and merges the results.
#[derive(Default)]
pub struct Collector {
    sources: Vec<Box<dyn SensorSource>>,
    last_timing: Option<CollectorTiming>,
}

impl Collector {
    /// Creates a collector with no sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collector in the station order: weather, light, gas, particulate.
    pub fn station(
        weather: impl SensorSource + 'static,
        light: impl SensorSource + 'static,
        gas: impl SensorSource + 'static,
        particulate: impl SensorSource + 'static,
    ) -> Self {
        Self::new()
            .with_source(Box::new(weather))
            .with_source(Box::new(light))
            .with_source(Box::new(gas))
            .with_source(Box::new(particulate))
    }

    /// Appends a source; sources are sampled in insertion order.
    pub fn with_source(mut self, source: Box<dyn SensorSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Names of the configured sources, in sampling order.
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Returns timing information from the last collect_snapshot call.
    pub fn last_timing(&self) -> Option<&CollectorTiming> {
        self.last_timing.as_ref()
    }

    /// Collects one snapshot stamped with `now`.
    ///
    /// Later sources overwrite earlier ones on a name collision.
    pub fn collect_snapshot(&mut self, now: DateTime<Utc>) -> Snapshot {
        let total_start = Instant::now();
        let mut timing = CollectorTiming::default();
        let mut snapshot = Snapshot::new(now);

        for source in &mut self.sources {
            let start = Instant::now();
            let result = match source.sample() {
                Ok(readings) => {
                    let count = readings.len();
                    debug!("{}: {} readings", source.name(), count);
                    snapshot.extend(readings);
                    Ok(count)
                }
                Err(e) => {
                    warn!("{}: skipped this tick ({})", source.name(), e);
                    Err(e.to_string())
                }
            };
            timing.sources.push(SourceTiming {
                name: source.name(),
                elapsed: start.elapsed(),
                result,
            });
        }

        timing.total = total_start.elapsed();
        self.last_timing = Some(timing);

        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::drivers::{GasReading, ParticulateReading, SensorError};
    use crate::collector::mock::{MockCpu, MockGas, MockParticulate, MockWeather, scenarios};
    use crate::collector::sources::{GasSource, LightSource, ParticulateSource, WeatherSource};
    use crate::model::SensorReading;
    use std::sync::Arc;

    struct Fixed(&'static str, Vec<(&'static str, &'static str)>);

    impl SensorSource for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        fn sample(&mut self) -> Result<Vec<SensorReading>, SensorError> {
            Ok(self
                .1
                .iter()
                .filter_map(|(n, v)| SensorReading::new(*n, *v))
                .collect())
        }
    }

    fn unavailable() -> SensorError {
        SensorError::Unavailable("bus error".into())
    }

    #[test]
    fn test_collect_snapshot_typical_station() {
        let mut collector = scenarios::typical_station();
        let snapshot = collector.collect_snapshot(Utc::now());

        for name in [
            "cpu_temp",
            "raw_temp",
            "comp_temp",
            "pressure",
            "humidity",
            "light",
            "gas.oxidised",
            "gas.reducing",
            "gas.nh3",
            "pm.P1",
            "pm.P25",
            "pm.P10",
            "pm.per_1l_air_0.3",
            "pm.per_1l_air_10",
        ] {
            assert!(snapshot.contains(name), "missing {}", name);
        }
        assert_eq!(snapshot.len(), 18);
    }

    #[test]
    fn test_station_order() {
        let collector = scenarios::typical_station();
        assert_eq!(
            collector.source_names(),
            vec!["weather", "light", "gas", "particulate"]
        );
    }

    #[test]
    fn test_all_sources_failing_yields_empty_snapshot() {
        let weather = Arc::new(
            MockWeather::new(0.0, 0.0, 0.0, 0.0)
                .fail_temperature(unavailable())
                .fail_lux(unavailable()),
        );
        let mut collector = Collector::station(
            WeatherSource::new(MockCpu::failing(unavailable()), weather.clone()),
            LightSource::new(weather),
            GasSource::new(MockGas::failing(unavailable())),
            ParticulateSource::new(MockParticulate::scripted(vec![
                Err(SensorError::Timeout),
                Err(SensorError::Timeout),
            ])),
        );

        let now = Utc::now();
        let snapshot = collector.collect_snapshot(now);
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.timestamp(), now);

        let timing = collector.last_timing().unwrap();
        assert_eq!(timing.sources.len(), 4);
        assert_eq!(timing.failed(), 4);
    }

    #[test]
    fn test_one_failing_source_does_not_block_others() {
        let weather = Arc::new(MockWeather::new(21.0, 1000.0, 50.0, 10.0));
        let mut collector = Collector::station(
            WeatherSource::new(MockCpu::new(55.0), weather.clone()),
            LightSource::new(weather),
            GasSource::new(MockGas::failing(unavailable())),
            ParticulateSource::new(MockParticulate::new(ParticulateReading::new(1.0, 2.0, 3.0))),
        );

        let snapshot = collector.collect_snapshot(Utc::now());
        assert!(snapshot.contains("comp_temp"));
        assert!(snapshot.contains("light"));
        assert!(!snapshot.contains("gas.nh3"));
        assert_eq!(snapshot.get("pm.P25"), Some("2"));

        let timing = collector.last_timing().unwrap();
        assert_eq!(timing.failed(), 1);
        assert_eq!(timing.sources[2].name, "gas");
        assert_eq!(timing.sources[3].result, Ok(3));
    }

    #[test]
    fn test_particulate_double_timeout_keeps_other_readings() {
        let weather = Arc::new(MockWeather::new(21.0, 1000.0, 50.0, 10.0));
        let mut collector = Collector::station(
            WeatherSource::new(MockCpu::new(55.0), weather.clone()),
            LightSource::new(weather),
            GasSource::new(MockGas::new(GasReading {
                oxidising: 1000.0,
                reducing: 2000.0,
                nh3: 3000.0,
            })),
            ParticulateSource::new(MockParticulate::scripted(vec![
                Err(SensorError::Timeout),
                Err(unavailable()),
            ])),
        );

        let snapshot = collector.collect_snapshot(Utc::now());
        assert_eq!(snapshot.len(), 9);
        assert!(snapshot.names().all(|n| !n.starts_with("pm.")));
    }

    #[test]
    fn test_later_source_wins_on_collision() {
        let mut collector = Collector::new()
            .with_source(Box::new(Fixed("a", vec![("x", "1"), ("y", "2")])))
            .with_source(Box::new(Fixed("b", vec![("x", "3")])));

        let snapshot = collector.collect_snapshot(Utc::now());
        assert_eq!(snapshot.get("x"), Some("3"));
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_no_sources() {
        let mut collector = Collector::new();
        assert!(collector.collect_snapshot(Utc::now()).is_empty());
        assert!(collector.last_timing().unwrap().sources.is_empty());
    }
}
