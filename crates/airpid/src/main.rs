//! airpid - air-quality station daemon.
//!
//! Samples the station sensors in a tight loop, shows a status line on the
//! local display and forwards readings to a Splunk HTTP Event Collector.

use std::path::Path;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use airpi_core::collector::iio::{
    DEFAULT_IIO_PATH, IioGas, IioParticulate, IioWeather, ThermalZone, Vcgencmd,
};
use airpi_core::collector::mock::scenarios;
use airpi_core::collector::sources::DEFAULT_COMP_FACTOR;
use airpi_core::collector::{
    Collector, CpuTemperature, GasSource, LightSource, ParticulateSource, RealFs, WeatherSource,
};
use airpi_core::daemon::Daemon;
use airpi_core::dispatch::Dispatcher;
use airpi_core::display::{LogDisplay, StatusDisplay, StatusFileDisplay};
use airpi_core::export::{ConfigError, EventTags, Exporter, HecConfig, HecExporter, LogExporter};

/// Air-quality station daemon.
#[derive(Parser, Debug)]
#[command(name = "airpid", about = "Air-quality station daemon", version)]
struct Args {
    /// HEC authentication token. Required unless --dry-run is given.
    #[arg(long, env = "HEC_TOKEN", hide_env_values = true)]
    hec_token: Option<String>,

    /// HEC host name or address.
    #[arg(long, env = "HEC_HOST", default_value = "192.168.99.60")]
    hec_host: String,

    /// HEC port.
    #[arg(long, env = "HEC_PORT", default_value_t = HecConfig::DEFAULT_PORT)]
    hec_port: u16,

    /// Use HTTPS for the HEC endpoint. Disable with --hec-tls=false.
    #[arg(long, env = "HEC_TLS", default_value_t = true, action = clap::ArgAction::Set)]
    hec_tls: bool,

    /// Accept the collector's certificate without verifying it (stock HEC
    /// installs use a self-signed one). Enable checks with --hec-insecure=false.
    #[arg(long, env = "HEC_INSECURE", default_value_t = true, action = clap::ArgAction::Set)]
    hec_insecure: bool,

    /// HEC request timeout in seconds.
    #[arg(long, default_value = "5")]
    hec_timeout: u64,

    /// Splunk index of the events.
    #[arg(long, default_value = "air")]
    index: String,

    /// Splunk sourcetype of the events.
    #[arg(long, default_value = "pyair")]
    sourcetype: String,

    /// Splunk source of the events.
    #[arg(long, default_value = "pi")]
    source: String,

    /// Host field of the events. Defaults to the machine hostname.
    #[arg(long)]
    event_host: Option<String>,

    /// Minimum seconds between two exports.
    #[arg(long, default_value = "1")]
    dispatch_interval: u64,

    /// CPU heat compensation factor for the ambient temperature.
    #[arg(long, default_value_t = DEFAULT_COMP_FACTOR)]
    comp_factor: f64,

    /// Minimum tick length in milliseconds. 0 runs ticks back to back when
    /// real sensors set the cadence; simulated or sensorless runs then use
    /// an idle pacing instead.
    #[arg(long, default_value = "0")]
    pacing_ms: u64,

    /// Path to the IIO devices directory (for testing/mocking).
    #[arg(long, default_value = DEFAULT_IIO_PATH)]
    iio_path: String,

    /// Read the CPU temperature from this thermal zone instead of vcgencmd.
    #[arg(long, value_name = "PATH")]
    thermal_zone: Option<String>,

    /// GPIO value file wired to the particulate sensor's RESET pin.
    #[arg(long, value_name = "PATH")]
    pms_reset_gpio: Option<String>,

    /// Write the status line to this file instead of the log.
    #[arg(long, value_name = "PATH")]
    status_file: Option<String>,

    /// Use simulated sensors instead of hardware.
    #[arg(long)]
    mock: bool,

    /// Log events instead of sending them.
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("airpid={}", level).parse().unwrap())
        .add_directive(format!("airpi_core={}", level).parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Tick length used when nothing on the bus slows the loop down.
const IDLE_PACING: Duration = Duration::from_millis(500);

/// Get machine hostname via the `hostname` command.
fn get_hostname() -> String {
    process::Command::new("hostname")
        .output()
        .ok()
        .and_then(|out| {
            if out.status.success() {
                String::from_utf8(out.stdout)
                    .ok()
                    .map(|s| s.trim().to_string())
            } else {
                None
            }
        })
        .unwrap_or_default()
}

/// Explicit `--event-host`, else the machine hostname; omitted when both are empty.
fn resolve_event_host(explicit: Option<&str>, hostname: impl FnOnce() -> String) -> Option<String> {
    let host = match explicit {
        Some(host) => host.trim().to_string(),
        None => hostname(),
    };
    (!host.is_empty()).then_some(host)
}

fn event_tags(args: &Args) -> EventTags {
    EventTags {
        index: args.index.clone(),
        sourcetype: args.sourcetype.clone(),
        source: args.source.clone(),
        host: resolve_event_host(args.event_host.as_deref(), get_hostname),
    }
}

/// Ticks without real sensors return instantly, so they fall back to
/// `IDLE_PACING` unless a pacing was given.
fn effective_pacing(pacing_ms: u64, simulated: bool) -> Duration {
    if pacing_ms == 0 && simulated {
        IDLE_PACING
    } else {
        Duration::from_millis(pacing_ms)
    }
}

/// Builds the exporter; a missing HEC token is fatal unless dry-running.
fn build_exporter(args: &Args) -> Result<Box<dyn Exporter>, ConfigError> {
    if args.dry_run {
        info!("Exporter: dry run, events are logged");
        return Ok(Box::new(LogExporter::new()));
    }

    let config = HecConfig::new(args.hec_token.as_deref(), &args.hec_host)?
        .port(args.hec_port)
        .tls(args.hec_tls)
        .verify_tls(!args.hec_insecure)
        .timeout(Duration::from_secs(args.hec_timeout));
    let exporter = HecExporter::new(&config)?;
    info!("Exporter: HEC at {}", exporter.endpoint());
    Ok(Box::new(exporter))
}

fn build_display(args: &Args) -> Box<dyn StatusDisplay> {
    match &args.status_file {
        Some(path) => {
            info!("Display: status file {}", path);
            Box::new(StatusFileDisplay::new(RealFs::new(), path))
        }
        None => Box::new(LogDisplay),
    }
}

/// Wires the station sources to the sensors found under the IIO root.
///
/// A sensor that cannot be found is left out with a warning; the station
/// keeps running with whatever remains.
fn build_station(args: &Args) -> Collector {
    let fs = RealFs::new();
    let root = Path::new(&args.iio_path);
    let mut collector = Collector::new();

    match IioWeather::discover(fs, root) {
        Ok(weather) => {
            let weather = Arc::new(weather);
            let cpu: Box<dyn CpuTemperature> = match &args.thermal_zone {
                Some(path) => Box::new(ThermalZone::new(fs, path)),
                None => Box::new(Vcgencmd),
            };
            collector = collector
                .with_source(Box::new(
                    WeatherSource::new(cpu, weather.clone()).with_comp_factor(args.comp_factor),
                ))
                .with_source(Box::new(LightSource::new(weather)));
        }
        Err(e) => warn!("Weather and light sensors: disabled ({})", e),
    }

    match IioGas::discover(fs, root) {
        Ok(gas) => collector = collector.with_source(Box::new(GasSource::new(gas))),
        Err(e) => warn!("Gas sensor: disabled ({})", e),
    }

    match IioParticulate::discover(fs, root) {
        Ok(mut pms) => {
            if let Some(gpio) = &args.pms_reset_gpio {
                pms = pms.with_reset_gpio(gpio);
            }
            collector = collector.with_source(Box::new(ParticulateSource::new(pms)));
        }
        Err(e) => warn!("Particulate sensor: disabled ({})", e),
    }

    collector
}

fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    info!("airpid {} starting", airpi_core::VERSION);
    info!(
        "Config: index={}, sourcetype={}, source={}, dispatch_interval={}s, pacing={}ms",
        args.index, args.sourcetype, args.source, args.dispatch_interval, args.pacing_ms
    );

    let exporter = match build_exporter(&args) {
        Ok(exporter) => exporter,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let collector = if args.mock {
        info!("Sensors: simulated");
        scenarios::typical_station()
    } else {
        info!("Sensors: IIO devices under {}", args.iio_path);
        build_station(&args)
    };
    let sensorless = collector.source_names().is_empty();
    if sensorless {
        warn!("No sensors found, only empty snapshots will be produced");
    }
    let pacing = effective_pacing(args.pacing_ms, args.mock || sensorless);

    let dispatcher = Dispatcher::new(
        Utc::now(),
        Duration::from_secs(args.dispatch_interval),
        event_tags(&args),
    );
    let mut daemon = Daemon::new(collector, dispatcher, exporter, build_display(&args));

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    daemon.run(&running, pacing);

    info!("Shutdown complete");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["airpid"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn dry_run_needs_no_token() {
        let args = parse(&["--dry-run", "--hec-token", ""]);
        assert!(build_exporter(&args).is_ok());
    }

    #[test]
    fn blank_token_is_fatal() {
        let args = parse(&["--hec-token", "  "]);
        assert!(matches!(
            build_exporter(&args),
            Err(ConfigError::Missing("HEC token"))
        ));
    }

    #[test]
    fn tags_from_args() {
        let args = parse(&["--index", "lab", "--event-host", "enviro-01"]);
        let tags = event_tags(&args);
        assert_eq!(tags.index, "lab");
        assert_eq!(tags.sourcetype, "pyair");
        assert_eq!(tags.source, "pi");
        assert_eq!(tags.host.as_deref(), Some("enviro-01"));
    }

    #[test]
    fn event_host_falls_back_to_hostname() {
        assert_eq!(
            resolve_event_host(None, || "enviro-01".to_string()),
            Some("enviro-01".to_string())
        );
        assert_eq!(
            resolve_event_host(Some("lab-pi"), || "enviro-01".to_string()),
            Some("lab-pi".to_string())
        );
        assert_eq!(resolve_event_host(None, String::new), None);
    }

    #[test]
    fn insecure_by_default() {
        let args = parse(&["--hec-token", "tok"]);
        assert!(args.hec_insecure);
        assert!(build_exporter(&args).is_ok());

        let args = parse(&["--hec-token", "tok", "--hec-insecure=false"]);
        assert!(!args.hec_insecure);
        assert!(build_exporter(&args).is_ok());
    }

    #[test]
    fn idle_pacing_without_real_sensors() {
        assert_eq!(effective_pacing(0, true), IDLE_PACING);
        assert_eq!(effective_pacing(0, false), Duration::ZERO);
        assert_eq!(effective_pacing(250, true), Duration::from_millis(250));
    }

    #[test]
    fn tls_can_be_disabled() {
        let args = parse(&["--hec-tls=false", "--comp-factor", "1.5"]);
        assert!(!args.hec_tls);
        assert_eq!(args.comp_factor, 1.5);
    }

    #[test]
    fn missing_iio_root_yields_empty_station() {
        let args = parse(&["--iio-path", "/nonexistent/iio/devices"]);
        assert!(build_station(&args).source_names().is_empty());
    }
}
