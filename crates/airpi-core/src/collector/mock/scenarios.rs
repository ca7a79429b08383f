//! Pre-built stations for tests and `--mock` runs.

use std::sync::Arc;

use super::filesystem::MockFs;
use super::sensors::{MockCpu, MockGas, MockParticulate, MockWeather};
use crate::collector::Collector;
use crate::collector::drivers::{GasReading, ParticulateReading};
use crate::collector::sources::{GasSource, LightSource, ParticulateSource, WeatherSource};

/// IIO root used by [`station_sysfs`].
pub const IIO_ROOT: &str = "/sys/bus/iio/devices";

/// Particulate sensor directory in [`station_sysfs`].
pub const PMS_DEVICE: &str = "/sys/bus/iio/devices/iio:device3";

/// GPIO value file wired to the particulate sensor RESET pin.
pub const PMS_RESET_GPIO: &str = "/sys/class/gpio/gpio27/value";

/// SoC thermal zone in [`station_sysfs`].
pub const THERMAL_ZONE: &str = "/sys/class/thermal/thermal_zone0/temp";

/// A healthy station built from scripted drivers, in station order.
///
/// Every source succeeds, producing 18 readings per tick.
pub fn typical_station() -> Collector {
    let weather = Arc::new(MockWeather::new(24.1, 1009.8, 41.3, 212.4));
    Collector::station(
        WeatherSource::new(MockCpu::new(52.6), weather.clone()),
        LightSource::new(weather),
        GasSource::new(MockGas::new(GasReading {
            oxidising: 17_820.0,
            reducing: 412_300.0,
            nh3: 98_450.0,
        })),
        ParticulateSource::new(MockParticulate::new(
            ParticulateReading::new(3.0, 5.0, 6.0)
                .with_counts([642.0, 188.0, 31.0, 3.0, 1.0, 0.0]),
        )),
    )
}

/// A sysfs tree with the four station sensors exposed by kernel IIO drivers.
pub fn station_sysfs() -> MockFs {
    let mut fs = MockFs::new();
    fs.add_file(THERMAL_ZONE, "52000\n");
    fs.add_file(PMS_RESET_GPIO, "1\n");
    fs.add_iio_device(
        "/sys/bus/iio/devices/iio:device0",
        "bme280",
        &[
            ("in_temp_input", "21500"),
            ("in_pressure_input", "101.25"),
            ("in_humidityrelative_input", "48250"),
        ],
    );
    fs.add_iio_device(
        "/sys/bus/iio/devices/iio:device1",
        "ltr559",
        &[("in_illuminance_input", "132.5")],
    );
    fs.add_iio_device(
        "/sys/bus/iio/devices/iio:device2",
        "ads1015",
        &[
            ("in_voltage0_raw", "550"),
            ("in_voltage0_scale", "2"),
            ("in_voltage1_raw", "825"),
            ("in_voltage1_scale", "2"),
            ("in_voltage2_raw", "400"),
            ("in_voltage2_scale", "2"),
        ],
    );
    fs.add_iio_device(
        PMS_DEVICE,
        "pms7003",
        &[
            ("in_massconcentration_pm1_input", "4"),
            ("in_massconcentration_pm2p5_input", "7"),
            ("in_massconcentration_pm10_input", "9"),
        ],
    );
    fs
}
