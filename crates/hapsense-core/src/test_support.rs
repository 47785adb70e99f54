//! Test doubles shared by the unit tests

use std::collections::VecDeque;

use embedded_hal_async::delay::DelayNs;

use crate::sampler::StopSignal;
use crate::sensors::{SensorError, TemperatureHumiditySensor};

/// Delay that completes immediately.
pub struct NoDelay;

impl DelayNs for NoDelay {
    async fn delay_ns(&mut self, _ns: u32) {}
}

/// Delay that completes immediately but remembers how long it was asked to wait.
#[derive(Default)]
pub struct RecordingDelay {
    pub total_ns: u64,
    pub calls: usize,
}

impl DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
        self.calls += 1;
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.total_ns += ms as u64 * 1_000_000;
        self.calls += 1;
    }
}

pub const FAILED_READ: SensorError = SensorError::ReadFailed {
    sensor: "scripted",
    operation: "measure",
    details: "scripted failure",
};

/// Sensor that replays scripted results, one pair per sampling cycle.
///
/// Once the humidity script runs dry it raises `stop`, if one was given, so
/// a running sampler ends after the last scripted cycle.
pub struct ScriptedSensor<'a> {
    temperature: VecDeque<Result<f32, SensorError>>,
    humidity: VecDeque<Result<f32, SensorError>>,
    stop: Option<&'a StopSignal>,
    pub temperature_calls: usize,
    pub humidity_calls: usize,
}

impl<'a> ScriptedSensor<'a> {
    pub fn new(
        temperature: impl IntoIterator<Item = Result<f32, SensorError>>,
        humidity: impl IntoIterator<Item = Result<f32, SensorError>>,
    ) -> Self {
        Self {
            temperature: temperature.into_iter().collect(),
            humidity: humidity.into_iter().collect(),
            stop: None,
            temperature_calls: 0,
            humidity_calls: 0,
        }
    }

    pub fn stopping(mut self, stop: &'a StopSignal) -> Self {
        self.stop = Some(stop);
        self
    }
}

impl TemperatureHumiditySensor for ScriptedSensor<'_> {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn measure_temperature(&mut self) -> Result<f32, SensorError> {
        self.temperature_calls += 1;
        self.temperature.pop_front().unwrap_or(Err(FAILED_READ))
    }

    async fn measure_humidity(&mut self) -> Result<f32, SensorError> {
        self.humidity_calls += 1;
        let result = self.humidity.pop_front().unwrap_or(Err(FAILED_READ));
        if self.humidity.is_empty() {
            if let Some(stop) = self.stop {
                stop.signal(());
            }
        }
        result
    }
}
