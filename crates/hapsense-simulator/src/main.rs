//! Desktop simulator for the hapsense accessory core.
//!
//! Plays the part of the accessory framework and of the Si7021: a sampler
//! thread publishes synthetic readings while the console issues controller
//! reads, identify requests and reset button gestures.
//!
//! # Commands
//!
//! | Command   | Action                                  |
//! |-----------|-----------------------------------------|
//! | t         | Controller reads CurrentTemperature     |
//! | h         | Controller reads CurrentRelativeHumidity|
//! | r <uuid>  | Controller reads an arbitrary type UUID |
//! | i         | Identify                                |
//! | n         | Press and release the reset button (3s) |
//! | f         | Hold the reset button (10s)             |
//! | s         | Show published readings                 |
//! | q         | Quit                                    |
//!
//! An optional TOML config file may be passed as the first argument.

use std::io::BufRead;
use std::sync::Mutex;
use std::time::{Duration as StdDuration, Instant as StdInstant};

use anyhow::Context;
use embassy_futures::{block_on, yield_now};
use embassy_time::{Duration, Instant};
use embedded_hal_async::delay::DelayNs;
use log::{error, info, warn};

use hapsense_core::accessory::{AccessoryDescriptor, CharacteristicType};
use hapsense_core::button::ResetButton;
use hapsense_core::config::Config;
use hapsense_core::handlers::{
    AccessoryCallbacks, AccessoryFramework, AccessoryHandlers, CharacteristicUpdate, ReadRequest,
};
use hapsense_core::readings::Readings;
use hapsense_core::sampler::{Sampler, StopSignal};
use hapsense_core::sensors::{SensorError, TemperatureHumiditySensor};
use hapsense_core::setup_payload::{Transport, setup_uri};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Controller id attached to console-issued reads.
const CONTROLLER_ID: &str = "simulated-controller";

const MOCK_SENSOR_NAME: &str = "mock";

/// Every Nth temperature measurement fails.
const TEMPERATURE_FAILURE_EVERY: usize = 7;

/// Every Nth humidity measurement fails.
const HUMIDITY_FAILURE_EVERY: usize = 5;

/// Longest single sleep inside the simulated delay.
const DELAY_SLICE: StdDuration = StdDuration::from_millis(20);

// ---------------------------------------------------------------------------
// Mock sensor
// ---------------------------------------------------------------------------

/// Generates synthetic readings that vary over time and fail now and then.
struct MockSensor {
    started: StdInstant,
    temperature_reads: usize,
    humidity_reads: usize,
}

impl MockSensor {
    fn new() -> Self {
        Self {
            started: StdInstant::now(),
            temperature_reads: 0,
            humidity_reads: 0,
        }
    }

    fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn should_fail(counter: &mut usize, every: usize) -> bool {
        *counter += 1;
        *counter % every == 0
    }
}

impl TemperatureHumiditySensor for MockSensor {
    fn name(&self) -> &'static str {
        MOCK_SENSOR_NAME
    }

    async fn measure_temperature(&mut self) -> Result<f32, SensorError> {
        if Self::should_fail(&mut self.temperature_reads, TEMPERATURE_FAILURE_EVERY) {
            return Err(SensorError::ReadFailed {
                sensor: MOCK_SENSOR_NAME,
                operation: "measure temperature",
                details: "simulated bus error",
            });
        }

        // Temperature: 20–26 °C sinusoidal with slow drift
        let t = self.elapsed_secs();
        Ok((23.0 + 3.0 * (t / 120.0).sin() + 0.5 * (t / 37.0).cos()) as f32)
    }

    async fn measure_humidity(&mut self) -> Result<f32, SensorError> {
        if Self::should_fail(&mut self.humidity_reads, HUMIDITY_FAILURE_EVERY) {
            return Err(SensorError::Timeout {
                sensor: MOCK_SENSOR_NAME,
                operation: "measure humidity",
            });
        }

        // Humidity: 40–60 % with different period
        let t = self.elapsed_secs();
        Ok((50.0 + 10.0 * (t / 180.0).sin() + 2.0 * (t / 23.0).cos()) as f32)
    }
}

/// Delay backed by the host clock.
///
/// Sleeps in short slices and yields in between, so a `select` against the
/// stop signal notices a stop request promptly.
struct StdDelay;

impl DelayNs for StdDelay {
    async fn delay_ns(&mut self, ns: u32) {
        let deadline = StdInstant::now() + StdDuration::from_nanos(ns as u64);
        loop {
            let now = StdInstant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep(DELAY_SLICE.min(deadline - now));
            yield_now().await;
        }
    }
}

// ---------------------------------------------------------------------------
// Simulated accessory framework
// ---------------------------------------------------------------------------

/// Stand-in for the accessory framework's admin state.
struct SimulatedFramework {
    paired_controllers: Mutex<Vec<String>>,
    network_provisioned: Mutex<bool>,
}

impl SimulatedFramework {
    fn new() -> Self {
        Self {
            paired_controllers: Mutex::new(vec![CONTROLLER_ID.to_owned()]),
            network_provisioned: Mutex::new(true),
        }
    }

    fn describe(&self) -> String {
        let controllers = self
            .paired_controllers
            .lock()
            .map(|c| c.len())
            .unwrap_or_default();
        let provisioned = self
            .network_provisioned
            .lock()
            .map(|p| *p)
            .unwrap_or_default();
        format!("{controllers} paired controller(s), network provisioned: {provisioned}")
    }
}

impl AccessoryFramework for SimulatedFramework {
    fn reset_network(&self) {
        if let Ok(mut provisioned) = self.network_provisioned.lock() {
            *provisioned = false;
        }
        warn!("Framework: network configuration erased ({})", self.describe());
    }

    fn reset_to_factory(&self) {
        if let Ok(mut controllers) = self.paired_controllers.lock() {
            controllers.clear();
        }
        if let Ok(mut provisioned) = self.network_provisioned.lock() {
            *provisioned = false;
        }
        warn!("Framework: factory reset ({})", self.describe());
    }
}

/// Value slot the framework hands to the read callback.
#[derive(Default)]
struct ResponseValue(Option<f32>);

impl CharacteristicUpdate for ResponseValue {
    fn update_float(&mut self, value: f32) {
        self.0 = Some(value);
    }
}

// ---------------------------------------------------------------------------
// Console
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Command<'a> {
    Read(&'a str),
    Identify,
    NetworkResetGesture,
    FactoryResetGesture,
    Show,
    Quit,
}

fn parse_command(line: &str) -> Option<Command<'_>> {
    let mut parts = line.split_whitespace();
    let command = match parts.next()? {
        "t" => Command::Read(CharacteristicType::CurrentTemperature.short_uuid()),
        "h" => Command::Read(CharacteristicType::CurrentRelativeHumidity.short_uuid()),
        "r" => Command::Read(parts.next()?),
        "i" => Command::Identify,
        "n" => Command::NetworkResetGesture,
        "f" => Command::FactoryResetGesture,
        "s" => Command::Show,
        "q" => Command::Quit,
        _ => return None,
    };
    Some(command)
}

/// Replay a button press of the given length through the gesture classifier.
fn simulate_press(
    button: &mut ResetButton,
    handlers: &impl AccessoryCallbacks,
    held_for: Duration,
) {
    let pressed = Instant::from_millis(0);
    let released = pressed + held_for;

    button.press(pressed);
    // Poll once per simulated second, as a button task would
    let mut now = pressed;
    while now < released {
        if let Some(gesture) = button.poll(now) {
            handlers.on_gesture(gesture);
        }
        now = now + Duration::from_secs(1);
    }
    if let Some(gesture) = button.release(released) {
        handlers.on_gesture(gesture);
    }
}

fn load_config(path: Option<&str>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("could not read {path}"))?;
            toml::from_str::<Config>(&text).with_context(|| format!("could not parse {path}"))?
        }
        None => Config::default(),
    };

    // ConfigError is a no_std error type, so it is carried by its message
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args().nth(1);
    let config = match load_config(path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("{e:#}");
            std::process::exit(1);
        }
    };

    let descriptor = AccessoryDescriptor::from_config(&config);
    info!(
        "Starting {} ({} by {}, firmware {})",
        descriptor.name, descriptor.model, descriptor.manufacturer, descriptor.firmware_revision
    );
    for service in &descriptor.services {
        info!(
            "Service {} \"{}\" exposes {:?}",
            service.service.short_uuid(),
            service.name,
            service.characteristics
        );
    }

    match setup_uri(
        &config.pairing.setup_code,
        &config.pairing.setup_id,
        descriptor.category,
        Transport::Ip,
    ) {
        Ok(uri) => info!("Setup code {} ({})", config.pairing.setup_code, uri),
        Err(e) => warn!("Could not build setup URI: {e}"),
    }
    info!("Commands: t=temp  h=humidity  r <uuid>  i=identify  n=net reset  f=factory reset  s=show  q=quit");

    let readings = Readings::new(
        config.sensor.initial_temperature,
        config.sensor.initial_humidity,
    );
    let stop = StopSignal::new();
    let framework = SimulatedFramework::new();

    std::thread::scope(|s| {
        s.spawn(|| {
            let mut sampler = Sampler::new(MockSensor::new(), StdDelay, &readings, &config.sensor);
            block_on(sampler.run(&stop));
        });

        let handlers = AccessoryHandlers::new(&readings, &framework);
        let mut button = ResetButton::new(&config.button);

        for line in std::io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    error!("Console read failed: {e}");
                    break;
                }
            };

            let Some(command) = parse_command(&line) else {
                if !line.trim().is_empty() {
                    warn!("Unknown command {:?}", line.trim());
                }
                continue;
            };

            match command {
                Command::Read(uuid) => {
                    let mut value = ResponseValue::default();
                    let request = ReadRequest {
                        characteristic_uuid: uuid,
                        controller_id: Some(CONTROLLER_ID),
                    };
                    let status = handlers.read(&request, &mut value);
                    match value.0 {
                        Some(v) => info!("Read {uuid} -> {v:.2} (status {})", status.code()),
                        None => info!("Read {uuid} -> no value (status {})", status.code()),
                    }
                }
                Command::Identify => {
                    let status = handlers.identify();
                    info!("Identify -> status {}", status.code());
                }
                Command::NetworkResetGesture => simulate_press(
                    &mut button,
                    &handlers,
                    config.button.network_reset_release(),
                ),
                Command::FactoryResetGesture => simulate_press(
                    &mut button,
                    &handlers,
                    config.button.factory_reset_hold(),
                ),
                Command::Show => {
                    let snapshot = readings.snapshot();
                    info!(
                        "Published: {:.2} °C, {:.2} %RH; {}",
                        snapshot.temperature,
                        snapshot.humidity,
                        framework.describe()
                    );
                }
                Command::Quit => break,
            }
        }

        stop.signal(());
    });

    info!("Simulator exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use hapsense_core::config::ConfigError;

    #[test]
    fn test_parse_commands() {
        assert!(matches!(parse_command("t"), Some(Command::Read("11"))));
        assert!(matches!(parse_command("h"), Some(Command::Read("10"))));
        assert!(matches!(parse_command(" r  8A "), Some(Command::Read("8A"))));
        assert!(matches!(parse_command("q"), Some(Command::Quit)));
        assert!(parse_command("r").is_none());
        assert!(parse_command("x").is_none());
        assert!(parse_command("").is_none());
    }

    #[test]
    fn test_partial_config_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [accessory]
            name = "Bedroom Sensor"

            [sensor]
            poll_interval_ms = 2000
            "#,
        )
        .unwrap();

        assert_eq!(config.accessory.name.as_str(), "Bedroom Sensor");
        assert_eq!(config.accessory.model.as_str(), "ESP-SI7021");
        assert_eq!(config.sensor.poll_interval_ms, 2000);
        assert_eq!(config.pairing.setup_id.as_str(), "ES32");
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_gestures_reach_framework() {
        let config = Config::default();
        let readings = Readings::default();
        let framework = SimulatedFramework::new();
        let handlers = AccessoryHandlers::new(&readings, &framework);
        let mut button = ResetButton::new(&config.button);

        simulate_press(&mut button, &handlers, config.button.network_reset_release());
        assert!(!*framework.network_provisioned.lock().unwrap());
        assert_eq!(framework.paired_controllers.lock().unwrap().len(), 1);

        simulate_press(&mut button, &handlers, config.button.factory_reset_hold());
        assert!(framework.paired_controllers.lock().unwrap().is_empty());
    }

    #[test]
    fn test_mock_sensor_fails_periodically() {
        let mut sensor = MockSensor::new();
        let results: Vec<_> = (0..HUMIDITY_FAILURE_EVERY)
            .map(|_| block_on(sensor.measure_humidity()))
            .collect();

        assert!(results[..HUMIDITY_FAILURE_EVERY - 1].iter().all(Result::is_ok));
        assert!(results[HUMIDITY_FAILURE_EVERY - 1].is_err());
    }

    #[test]
    fn test_config_errors_keep_their_source() {
        let dir = std::env::temp_dir().join(format!("hapsense-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let missing = dir.join("missing.toml");
        let err = load_config(missing.to_str()).unwrap_err();
        assert!(err.downcast_ref::<std::io::Error>().is_some());

        let malformed = dir.join("malformed.toml");
        std::fs::write(&malformed, "[sensor\npoll_interval_ms = ").unwrap();
        let err = load_config(malformed.to_str()).unwrap_err();
        assert!(err.downcast_ref::<toml::de::Error>().is_some());

        let invalid = dir.join("invalid.toml");
        std::fs::write(&invalid, "[sensor]\npoll_interval_ms = 0\n").unwrap();
        let err = load_config(invalid.to_str()).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("invalid configuration: {}", ConfigError::ZeroPollInterval)
        );

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_sample_config_file_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/accessory.toml");
        let config = load_config(Some(path)).unwrap();
        assert_eq!(config.sensor.poll_interval_ms, 2000);
        assert_eq!(config.pairing.setup_code.as_str(), "111-22-333");
    }
}
