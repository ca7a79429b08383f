//! The station main loop.
//!
//! Every tick runs collect → dispatch → display. A tick that fails, or
//! panics, is logged and the loop moves on; only the shutdown flag stops it.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::collector::Collector;
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::display::{DisplayError, StatusDisplay, status_message};
use crate::export::Exporter;

/// Ticks between two periodic summary log lines.
const SUMMARY_EVERY: u64 = 600;

/// Granularity of the pacing sleep, so shutdown stays responsive.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Result of one successful tick.
#[derive(Debug)]
pub struct TickReport {
    /// Number of readings in the tick's snapshot.
    pub readings: usize,
    pub dispatch: DispatchOutcome,
}

/// Anything that escaped a tick.
#[derive(Debug)]
pub enum TickError {
    Display(DisplayError),
    /// A sensor driver or collaborator panicked.
    Panicked(String),
}

impl std::fmt::Display for TickError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TickError::Display(e) => write!(f, "{}", e),
            TickError::Panicked(msg) => write!(f, "panic: {}", msg),
        }
    }
}

impl std::error::Error for TickError {}

/// Counters since startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DaemonStats {
    pub ticks: u64,
    pub failed_ticks: u64,
    pub dispatches: u64,
    pub failed_dispatches: u64,
}

pub struct Daemon {
    collector: Collector,
    dispatcher: Dispatcher,
    exporter: Box<dyn Exporter>,
    display: Box<dyn StatusDisplay>,
    stats: DaemonStats,
}

impl Daemon {
    pub fn new(
        collector: Collector,
        dispatcher: Dispatcher,
        exporter: Box<dyn Exporter>,
        display: Box<dyn StatusDisplay>,
    ) -> Self {
        Self {
            collector,
            dispatcher,
            exporter,
            display,
            stats: DaemonStats::default(),
        }
    }

    pub fn stats(&self) -> DaemonStats {
        self.stats
    }

    pub fn collector(&self) -> &Collector {
        &self.collector
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Runs one tick: aggregate, maybe export, refresh the display.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<TickReport, TickError> {
        let snapshot = self.collector.collect_snapshot(now);

        let dispatch = self
            .dispatcher
            .maybe_dispatch(now, &snapshot, self.exporter.as_mut());
        match dispatch {
            DispatchOutcome::Skipped => {}
            DispatchOutcome::Sent => self.stats.dispatches += 1,
            DispatchOutcome::Failed(_) => {
                self.stats.dispatches += 1;
                self.stats.failed_dispatches += 1;
            }
        }

        self.display
            .render(&status_message(&snapshot))
            .map_err(TickError::Display)?;

        Ok(TickReport {
            readings: snapshot.len(),
            dispatch,
        })
    }

    /// Runs one tick behind an error boundary.
    ///
    /// Errors and panics are logged and counted; `None` means the tick failed.
    pub fn run_tick(&mut self, now: DateTime<Utc>) -> Option<TickReport> {
        self.stats.ticks += 1;
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.tick(now)))
            .unwrap_or_else(|payload| Err(TickError::Panicked(panic_message(payload.as_ref()))));

        match result {
            Ok(report) => Some(report),
            Err(e) => {
                self.stats.failed_ticks += 1;
                error!("tick #{} failed: {}", self.stats.ticks, e);
                None
            }
        }
    }

    /// Ticks until `running` is cleared.
    ///
    /// With a zero `pacing` the next tick starts immediately and the cadence
    /// is set by sensor latency; otherwise each tick is stretched to `pacing`.
    pub fn run(&mut self, running: &AtomicBool, pacing: Duration) {
        info!(
            "Starting collection loop (sources: {})",
            self.collector.source_names().join(", ")
        );

        while running.load(Ordering::SeqCst) {
            let started = Instant::now();
            self.run_tick(Utc::now());

            if self.stats.ticks.is_multiple_of(SUMMARY_EVERY) {
                self.log_summary();
            }

            let mut remaining = pacing.saturating_sub(started.elapsed());
            while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
                let sleep_time = remaining.min(SLEEP_SLICE);
                std::thread::sleep(sleep_time);
                remaining = remaining.saturating_sub(sleep_time);
            }
        }

        self.log_summary();
    }

    fn log_summary(&self) {
        let s = &self.stats;
        info!(
            "Ticks: {} ({} failed), dispatches: {} ({} failed)",
            s.ticks, s.failed_ticks, s.dispatches, s.failed_dispatches
        );
        if let Some(timing) = self.collector.last_timing() {
            info!(
                "Last collection: {:?}, {} of {} sources failed",
                timing.total,
                timing.failed(),
                timing.sources.len()
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::drivers::{ParticulateReading, SensorError};
    use crate::collector::mock::{MockCpu, MockGas, MockParticulate, MockWeather, scenarios};
    use crate::collector::sources::{
        GasSource, LightSource, ParticulateSource, SensorSource, WeatherSource,
    };
    use crate::dispatch::DEFAULT_DISPATCH_INTERVAL;
    use crate::export::{Event, EventTags, ExportError};
    use crate::model::SensorReading;
    use chrono::TimeDelta;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedExporter(Arc<Mutex<Vec<String>>>);

    impl Exporter for SharedExporter {
        fn send(&mut self, event: &Event<'_>) -> Result<(), ExportError> {
            self.0.lock().unwrap().push(serde_json::to_string(event)?);
            Ok(())
        }
    }

    struct FailingExporter;

    impl Exporter for FailingExporter {
        fn send(&mut self, _event: &Event<'_>) -> Result<(), ExportError> {
            Err(ExportError::Transport("no route to host".into()))
        }
    }

    #[derive(Clone, Default)]
    struct SharedDisplay(Arc<Mutex<Vec<String>>>);

    impl StatusDisplay for SharedDisplay {
        fn render(&mut self, message: &str) -> Result<(), DisplayError> {
            self.0.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    struct BrokenDisplay;

    impl StatusDisplay for BrokenDisplay {
        fn render(&mut self, _message: &str) -> Result<(), DisplayError> {
            Err(DisplayError("spi write failed".into()))
        }
    }

    /// Display that clears the running flag after `limit` renders.
    struct StopAfter {
        running: Arc<AtomicBool>,
        renders: usize,
        limit: usize,
    }

    impl StatusDisplay for StopAfter {
        fn render(&mut self, _message: &str) -> Result<(), DisplayError> {
            self.renders += 1;
            if self.renders >= self.limit {
                self.running.store(false, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    /// Exporter that counts calls and then panics.
    struct PanickingExporter(Arc<AtomicUsize>);

    impl Exporter for PanickingExporter {
        fn send(&mut self, _event: &Event<'_>) -> Result<(), ExportError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            panic!("exporter bug");
        }
    }

    struct Panicking;

    impl SensorSource for Panicking {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn sample(&mut self) -> Result<Vec<SensorReading>, SensorError> {
            panic!("driver bug");
        }
    }

    fn daemon_at(
        start: DateTime<Utc>,
        collector: Collector,
        exporter: Box<dyn Exporter>,
        display: Box<dyn StatusDisplay>,
    ) -> Daemon {
        let dispatcher = Dispatcher::new(start, DEFAULT_DISPATCH_INTERVAL, EventTags::default());
        Daemon::new(collector, dispatcher, exporter, display)
    }

    #[test]
    fn test_first_tick_does_not_dispatch() {
        let start = Utc::now();
        let exporter = SharedExporter::default();
        let display = SharedDisplay::default();
        let mut daemon = daemon_at(
            start,
            scenarios::typical_station(),
            Box::new(exporter.clone()),
            Box::new(display.clone()),
        );

        let report = daemon.tick(start + TimeDelta::milliseconds(200)).unwrap();
        assert_eq!(report.readings, 18);
        assert!(!report.dispatch.attempted());
        assert!(exporter.0.lock().unwrap().is_empty());
        assert_eq!(display.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_display_every_tick_dispatch_rate_limited() {
        let start = Utc::now();
        let exporter = SharedExporter::default();
        let display = SharedDisplay::default();
        let mut daemon = daemon_at(
            start,
            scenarios::typical_station(),
            Box::new(exporter.clone()),
            Box::new(display.clone()),
        );

        for i in 1..=10 {
            daemon.run_tick(start + TimeDelta::milliseconds(300 * i));
        }

        assert_eq!(display.0.lock().unwrap().len(), 10);
        // 1.2 s, 2.4 s
        assert_eq!(exporter.0.lock().unwrap().len(), 2);
        assert_eq!(daemon.stats().dispatches, 2);
        assert_eq!(daemon.stats().ticks, 10);
    }

    #[test]
    fn test_particulate_double_failure_does_not_abort_tick() {
        let start = Utc::now();
        let weather = Arc::new(MockWeather::new(20.0, 1000.0, 40.0, 10.0));
        let collector = Collector::station(
            WeatherSource::new(MockCpu::new(60.0), weather.clone()),
            LightSource::new(weather),
            GasSource::new(MockGas::failing(SensorError::Unavailable("adc".into()))),
            ParticulateSource::new(MockParticulate::scripted(vec![
                Err(SensorError::Timeout),
                Err(SensorError::Timeout),
            ])),
        );
        let exporter = SharedExporter::default();
        let display = SharedDisplay::default();
        let mut daemon = daemon_at(
            start,
            collector,
            Box::new(exporter.clone()),
            Box::new(display.clone()),
        );

        let report = daemon.run_tick(start + TimeDelta::seconds(2)).unwrap();
        assert_eq!(report.readings, 6);
        assert!(matches!(report.dispatch, DispatchOutcome::Sent));

        let sent = exporter.0.lock().unwrap();
        let event: serde_json::Value = serde_json::from_str(&sent[0]).unwrap();
        assert_eq!(event["event"]["comp_temp"], "2.22");
        assert!(event["event"].get("pm.P25").is_none());

        assert_eq!(display.0.lock().unwrap()[0], "\nTemp: 2.22\nPM25: --");
    }

    #[test]
    fn test_display_fallback_without_temperature() {
        let start = Utc::now();
        let collector = Collector::new().with_source(Box::new(ParticulateSource::new(
            MockParticulate::new(ParticulateReading::new(8.0, 12.34, 15.0)),
        )));
        let display = SharedDisplay::default();
        let mut daemon = daemon_at(
            start,
            collector,
            Box::new(SharedExporter::default()),
            Box::new(display.clone()),
        );

        daemon.tick(start).unwrap();
        assert_eq!(display.0.lock().unwrap()[0], "PM25: 12.34");
    }

    #[test]
    fn test_failed_export_counts_as_attempt() {
        let start = Utc::now();
        let mut daemon = daemon_at(
            start,
            scenarios::typical_station(),
            Box::new(FailingExporter),
            Box::new(SharedDisplay::default()),
        );

        let report = daemon.run_tick(start + TimeDelta::seconds(2)).unwrap();
        assert!(matches!(report.dispatch, DispatchOutcome::Failed(_)));
        assert_eq!(daemon.dispatcher().last_sent(), start + TimeDelta::seconds(2));
        assert!(daemon.run_tick(start + TimeDelta::milliseconds(2500)).is_some());

        let stats = daemon.stats();
        assert_eq!(stats.failed_dispatches, 1);
        assert_eq!(stats.failed_ticks, 0);
    }

    #[test]
    fn test_display_error_is_tick_failure() {
        let start = Utc::now();
        let mut daemon = daemon_at(
            start,
            scenarios::typical_station(),
            Box::new(SharedExporter::default()),
            Box::new(BrokenDisplay),
        );

        assert!(matches!(daemon.tick(start), Err(TickError::Display(_))));
        assert!(daemon.run_tick(start).is_none());
        assert!(daemon.run_tick(start).is_none());
        assert_eq!(daemon.stats().failed_ticks, 2);
    }

    #[test]
    fn test_panicking_source_is_contained() {
        let start = Utc::now();
        let collector = Collector::new().with_source(Box::new(Panicking));
        let display = SharedDisplay::default();
        let mut daemon = daemon_at(
            start,
            collector,
            Box::new(SharedExporter::default()),
            Box::new(display.clone()),
        );

        assert!(daemon.run_tick(start).is_none());
        assert!(daemon.run_tick(start).is_none());
        assert_eq!(daemon.stats().failed_ticks, 2);
        assert!(display.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_panicking_exporter_stays_rate_limited() {
        let start = Utc::now();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut daemon = daemon_at(
            start,
            scenarios::typical_station(),
            Box::new(PanickingExporter(calls.clone())),
            Box::new(SharedDisplay::default()),
        );

        let first = start + TimeDelta::seconds(2);
        assert!(daemon.run_tick(first).is_none());
        assert_eq!(daemon.dispatcher().last_sent(), first);

        for i in 1..=5 {
            let now = first + TimeDelta::milliseconds(100 * i);
            assert!(daemon.run_tick(now).is_some());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(daemon.stats().failed_ticks, 1);
        assert_eq!(daemon.stats().ticks, 6);
    }

    #[test]
    fn test_run_stops_on_flag() {
        let running = Arc::new(AtomicBool::new(true));
        let display = StopAfter {
            running: running.clone(),
            renders: 0,
            limit: 5,
        };
        let mut daemon = daemon_at(
            Utc::now(),
            scenarios::typical_station(),
            Box::new(SharedExporter::default()),
            Box::new(display),
        );

        daemon.run(&running, Duration::ZERO);
        assert_eq!(daemon.stats().ticks, 5);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
