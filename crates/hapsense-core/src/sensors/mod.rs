#[cfg(feature = "sensor-si7021")]
mod si7021;

use thiserror_no_std::Error;

#[cfg(feature = "sensor-si7021")]
pub use si7021::{SI7021_ADDRESS, Si7021Sensor};

/// Errors a sensor driver can report for a single measurement.
///
/// All of these are transient from the sampler's point of view: the failed
/// metric keeps its previous published value and the next cycle tries again.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("{sensor}: failed to {operation} ({details})")]
    ReadFailed {
        sensor: &'static str,
        operation: &'static str,
        details: &'static str,
    },
    #[error("{sensor}: checksum mismatch during {operation}")]
    CrcMismatch {
        sensor: &'static str,
        operation: &'static str,
    },
    #[error("{sensor}: {operation} produced an unusable value")]
    InvalidReading {
        sensor: &'static str,
        operation: &'static str,
    },
    #[error("{sensor}: timed out waiting to {operation}")]
    Timeout {
        sensor: &'static str,
        operation: &'static str,
    },
}

/// Trait for sensors that measure temperature and relative humidity.
///
/// The two measurements are independent calls so a failure in one never
/// prevents the other from being attempted.
pub trait TemperatureHumiditySensor {
    /// Name used as error and log context.
    fn name(&self) -> &'static str;

    /// Measure the temperature in degrees Celsius.
    fn measure_temperature(&mut self) -> impl Future<Output = Result<f32, SensorError>>;

    /// Measure the relative humidity in percent.
    fn measure_humidity(&mut self) -> impl Future<Output = Result<f32, SensorError>>;
}

impl<S> TemperatureHumiditySensor for &mut S
where
    S: TemperatureHumiditySensor,
{
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn measure_temperature(&mut self) -> impl Future<Output = Result<f32, SensorError>> {
        (**self).measure_temperature()
    }

    fn measure_humidity(&mut self) -> impl Future<Output = Result<f32, SensorError>> {
        (**self).measure_humidity()
    }
}
