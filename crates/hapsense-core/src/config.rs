//! Accessory configuration
//!
//! Everything the composition root needs to describe the accessory to the
//! framework and to drive the sampler and the reset button. Every section
//! has defaults, so a config file only needs the fields it overrides.

use core::str::FromStr;

use embassy_time::Duration;
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::setup_payload::{parse_setup_code, validate_setup_id};

/// Maximum length of free-form identity strings
pub const MAX_FIELD_LEN: usize = 64;

/// Product data is an opaque 8 byte identifier assigned to the product
pub const PRODUCT_DATA_LEN: usize = 8;

pub type FieldString = heapless::String<MAX_FIELD_LEN>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("accessory field `{0}` must not be empty")]
    EmptyField(&'static str),
    #[error("setup code must have the form DDD-DD-DDD")]
    MalformedSetupCode,
    #[error("setup code is too easy to guess")]
    TrivialSetupCode,
    #[error("setup id must be four uppercase letters or digits")]
    MalformedSetupId,
    #[error("product data must be exactly 8 bytes")]
    ProductDataLength,
    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,
    #[error("factory reset hold must be longer than the network reset release")]
    ButtonThresholds,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub accessory: AccessoryConfig,
    pub pairing: PairingConfig,
    pub sensor: SensorConfig,
    pub button: ButtonConfig,
}

impl Config {
    /// Check every section, reporting the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.accessory.validate()?;
        self.pairing.validate()?;
        self.sensor.validate()?;
        self.button.validate()
    }
}

/// Identity of the accessory as reported to controllers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AccessoryConfig {
    pub name: FieldString,
    pub manufacturer: FieldString,
    pub model: FieldString,
    pub serial_number: FieldString,
    pub firmware_revision: FieldString,
    pub hardware_revision: Option<FieldString>,
    pub protocol_version: FieldString,
    pub product_data: heapless::String<PRODUCT_DATA_LEN>,
    pub temperature_service_name: FieldString,
    pub humidity_service_name: FieldString,
}

impl AccessoryConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("name", &self.name),
            ("manufacturer", &self.manufacturer),
            ("model", &self.model),
            ("serial_number", &self.serial_number),
            ("firmware_revision", &self.firmware_revision),
            ("protocol_version", &self.protocol_version),
        ];

        if let Some((field, _)) = required.iter().find(|(_, value)| value.is_empty()) {
            return Err(ConfigError::EmptyField(*field));
        }

        if self.product_data.len() != PRODUCT_DATA_LEN {
            return Err(ConfigError::ProductDataLength);
        }

        Ok(())
    }
}

impl Default for AccessoryConfig {
    fn default() -> Self {
        Self {
            name: FromTruncated::from_truncated("ESP-SI7021"),
            manufacturer: FromTruncated::from_truncated("James Young"),
            model: FromTruncated::from_truncated("ESP-SI7021"),
            serial_number: FromTruncated::from_truncated("001122334455"),
            firmware_revision: FromTruncated::from_truncated("1.0.0"),
            hardware_revision: None,
            protocol_version: FromTruncated::from_truncated("1.1.0"),
            product_data: FromTruncated::from_truncated("ESP32HAP"),
            temperature_service_name: FromTruncated::from_truncated("Si7021 Temperature"),
            humidity_service_name: FromTruncated::from_truncated("Si7021 Humidity"),
        }
    }
}

/// Pairing credentials shown to the user and embedded in the setup URI.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PairingConfig {
    /// Eight digit code in `DDD-DD-DDD` form
    pub setup_code: heapless::String<10>,
    pub setup_id: heapless::String<4>,
}

impl PairingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        parse_setup_code(&self.setup_code)?;
        validate_setup_id(&self.setup_id)
    }
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            setup_code: FromTruncated::from_truncated("111-22-333"),
            setup_id: FromTruncated::from_truncated("ES32"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct SensorConfig {
    /// Pause between the end of one sampling cycle and the start of the next
    pub poll_interval_ms: u32,
    /// Published temperature before the first successful measurement
    pub initial_temperature: f32,
    /// Published humidity before the first successful measurement
    pub initial_humidity: f32,
}

impl SensorConfig {
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms as u64)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10_000,
            initial_temperature: 0.0,
            initial_humidity: 0.0,
        }
    }
}

/// Reset button gesture thresholds.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct ButtonConfig {
    /// Releasing after at least this long resets the network configuration
    pub network_reset_release_secs: u32,
    /// Holding for this long resets the accessory to factory settings
    pub factory_reset_hold_secs: u32,
}

impl ButtonConfig {
    pub const fn network_reset_release(&self) -> Duration {
        Duration::from_secs(self.network_reset_release_secs as u64)
    }

    pub const fn factory_reset_hold(&self) -> Duration {
        Duration::from_secs(self.factory_reset_hold_secs as u64)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.factory_reset_hold_secs <= self.network_reset_release_secs {
            return Err(ConfigError::ButtonThresholds);
        }
        Ok(())
    }
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            network_reset_release_secs: 3,
            factory_reset_hold_secs: 10,
        }
    }
}

/// Build a fixed-capacity string, dropping whatever does not fit.
pub trait FromTruncated<T> {
    fn from_truncated(value: T) -> Self;
}

impl<'a, const N: usize> FromTruncated<&'a str> for heapless::String<N> {
    fn from_truncated(value: &'a str) -> Self {
        let mut end = value.len().min(N);
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        // Cannot fail: the slice is at most N bytes long
        heapless::String::<N>::from_str(&value[..end]).unwrap_or_default()
    }
}
