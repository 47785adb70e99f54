use crate::sensors::SensorError;

use super::TemperatureHumiditySensor;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use log::error;

/// Fixed 7-bit I2C address of the Si7021.
pub const SI7021_ADDRESS: u8 = 0x40;

const SENSOR_NAME: &str = "Si7021";

// No-hold master mode: the sensor NACKs reads until the conversion is done
// instead of stretching the clock.
const CMD_MEASURE_HUMIDITY_NO_HOLD: u8 = 0xF5;
const CMD_MEASURE_TEMPERATURE_NO_HOLD: u8 = 0xF3;
const CMD_RESET: u8 = 0xFE;

// Worst-case conversion times at default resolution (RH 12 bit, T 14 bit).
// A humidity measurement also runs a temperature conversion.
const TEMPERATURE_CONVERSION_MS: u32 = 11;
const HUMIDITY_CONVERSION_MS: u32 = 23;
const RESET_MS: u32 = 15;

const READ_ATTEMPTS: u8 = 5;
const READ_RETRY_MS: u32 = 5;

/// Si7021 temperature/humidity sensor on an async I2C bus.
pub struct Si7021Sensor<I, D> {
    i2c: I,
    delay: D,
}

impl<I: I2c, D: DelayNs> Si7021Sensor<I, D> {
    pub fn new(i2c: I, delay: D) -> Self {
        Self { i2c, delay }
    }

    /// Soft-reset the sensor back to its power-on register defaults.
    pub async fn reset(&mut self) -> Result<(), SensorError> {
        self.i2c
            .write(SI7021_ADDRESS, &[CMD_RESET])
            .await
            .map_err(|e| {
                error!("Si7021 reset failed: {:?}", e);
                SensorError::ReadFailed {
                    sensor: SENSOR_NAME,
                    operation: "reset",
                    details: "I2C communication error or sensor not responding",
                }
            })?;

        self.delay.delay_ms(RESET_MS).await;
        Ok(())
    }

    /// Release the bus and delay back to the caller.
    pub fn release(self) -> (I, D) {
        (self.i2c, self.delay)
    }

    /// Start a conversion, wait for it and read back the raw 16-bit code.
    async fn measure_raw(
        &mut self,
        command: u8,
        conversion_ms: u32,
        operation: &'static str,
    ) -> Result<u16, SensorError> {
        self.i2c
            .write(SI7021_ADDRESS, &[command])
            .await
            .map_err(|e| {
                error!("Si7021 {} command failed: {:?}", operation, e);
                SensorError::ReadFailed {
                    sensor: SENSOR_NAME,
                    operation,
                    details: "I2C communication error or sensor not responding",
                }
            })?;

        self.delay.delay_ms(conversion_ms).await;

        let mut buffer = [0u8; 3];
        let mut attempts = 0;
        loop {
            match self.i2c.read(SI7021_ADDRESS, &mut buffer).await {
                Ok(()) => break,
                Err(_) if attempts + 1 < READ_ATTEMPTS => {
                    attempts += 1;
                    self.delay.delay_ms(READ_RETRY_MS).await;
                }
                Err(e) => {
                    error!(
                        "Si7021 {} result not ready after {} attempts: {:?}",
                        operation, READ_ATTEMPTS, e
                    );
                    return Err(SensorError::Timeout {
                        sensor: SENSOR_NAME,
                        operation,
                    });
                }
            }
        }

        if crc8(&buffer[..2]) != buffer[2] {
            error!("Si7021 {} checksum mismatch", operation);
            return Err(SensorError::CrcMismatch {
                sensor: SENSOR_NAME,
                operation,
            });
        }

        // The two low bits are status bits, not part of the measurement
        Ok(u16::from_be_bytes([buffer[0], buffer[1]]) & !0x0003)
    }
}

impl<I: I2c, D: DelayNs> TemperatureHumiditySensor for Si7021Sensor<I, D> {
    fn name(&self) -> &'static str {
        SENSOR_NAME
    }

    async fn measure_temperature(&mut self) -> Result<f32, SensorError> {
        let raw = self
            .measure_raw(
                CMD_MEASURE_TEMPERATURE_NO_HOLD,
                TEMPERATURE_CONVERSION_MS,
                "measure temperature",
            )
            .await?;

        Ok(temperature_from_raw(raw))
    }

    async fn measure_humidity(&mut self) -> Result<f32, SensorError> {
        let raw = self
            .measure_raw(
                CMD_MEASURE_HUMIDITY_NO_HOLD,
                HUMIDITY_CONVERSION_MS,
                "measure humidity",
            )
            .await?;

        Ok(humidity_from_raw(raw))
    }
}

fn temperature_from_raw(raw: u16) -> f32 {
    175.72 * raw as f32 / 65536.0 - 46.85
}

fn humidity_from_raw(raw: u16) -> f32 {
    // The transfer function can step slightly outside 0-100 %RH
    (125.0 * raw as f32 / 65536.0 - 6.0).clamp(0.0, 100.0)
}

/// CRC-8 with polynomial x^8 + x^5 + x^4 + 1 (0x31), initial value 0.
fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x31
            } else {
                crc << 1
            };
        }
    }
    crc
}
