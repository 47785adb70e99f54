//! Periodic sensor sampling
//!
//! The sampler owns the sensor and is the only writer of the published
//! [`Readings`]. Every cycle it attempts a temperature and then a humidity
//! measurement. A successful measurement replaces the published value; a
//! failed one is logged and leaves the previous value in place. Failures are
//! tolerated indefinitely: there is no retry within a cycle, no backoff and no
//! failure threshold.

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embedded_hal_async::delay::DelayNs;
use log::{error, info};

use crate::config::SensorConfig;
use crate::readings::{Metric, Readings};
use crate::sensors::{SensorError, TemperatureHumiditySensor};

/// Signal used to ask a running sampler to stop after its current cycle.
pub type StopSignal = Signal<CriticalSectionRawMutex, ()>;

/// Outcome of one sampling cycle, per metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    pub temperature: Result<f32, SensorError>,
    pub humidity: Result<f32, SensorError>,
}

pub struct Sampler<'a, S, D> {
    sensor: S,
    delay: D,
    readings: &'a Readings,
    poll_interval_ms: u32,
}

impl<'a, S, D> Sampler<'a, S, D>
where
    S: TemperatureHumiditySensor,
    D: DelayNs,
{
    pub fn new(sensor: S, delay: D, readings: &'a Readings, config: &SensorConfig) -> Self {
        Self {
            sensor,
            delay,
            readings,
            poll_interval_ms: config.poll_interval_ms,
        }
    }

    /// Run one sampling cycle: temperature first, then humidity.
    pub async fn sample_once(&mut self) -> CycleReport {
        let temperature = self.measure(Metric::Temperature).await;
        let humidity = self.measure(Metric::Humidity).await;

        CycleReport {
            temperature,
            humidity,
        }
    }

    /// Sample forever on the configured period until `stop` is signalled.
    ///
    /// The stop signal is only observed between cycles, so a cycle that has
    /// started always completes.
    pub async fn run(&mut self, stop: &StopSignal) {
        info!(
            "Sampler running, polling every {} ms",
            self.poll_interval_ms
        );

        loop {
            self.sample_once().await;

            match select(stop.wait(), self.delay.delay_ms(self.poll_interval_ms)).await {
                Either::First(()) => break,
                Either::Second(()) => {}
            }
        }

        info!("Sampler stopped");
    }

    async fn measure(&mut self, metric: Metric) -> Result<f32, SensorError> {
        let result = match metric {
            Metric::Temperature => self.sensor.measure_temperature().await,
            Metric::Humidity => self.sensor.measure_humidity().await,
        }
        .and_then(|value| {
            // Never publish NaN or infinities
            if value.is_finite() {
                Ok(value)
            } else {
                Err(SensorError::InvalidReading {
                    sensor: self.sensor.name(),
                    operation: metric.label(),
                })
            }
        });

        match result {
            Ok(value) => {
                self.readings.slot(metric).publish(value);
                info!("{}: {:.2}", metric.label(), value);
            }
            Err(e) => error!("Could not measure {}: {}", metric.label(), e),
        }

        result
    }
}
