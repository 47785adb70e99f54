//! Accessory, service and characteristic identifiers
//!
//! The accessory framework identifies characteristics and services by type
//! UUID. Apple-defined types are usually reported in their short form (`"11"`)
//! but the full 128-bit form is accepted as well.

use crate::config::Config;

/// Suffix shared by every Apple-defined 128-bit type UUID
const APPLE_UUID_SUFFIX: &str = "-0000-1000-8000-0026BB765291";

/// Reduce a type UUID to its short form, e.g.
/// `00000011-0000-1000-8000-0026BB765291` becomes `11`.
fn short_form(uuid: &str) -> &str {
    let head = match uuid.len().checked_sub(APPLE_UUID_SUFFIX.len()) {
        Some(split)
            if uuid.is_char_boundary(split)
                && uuid[split..].eq_ignore_ascii_case(APPLE_UUID_SUFFIX) =>
        {
            &uuid[..split]
        }
        _ => uuid,
    };
    head.trim_start_matches('0')
}

/// Characteristic types this accessory exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacteristicType {
    CurrentTemperature,
    CurrentRelativeHumidity,
    Name,
}

impl CharacteristicType {
    pub const fn short_uuid(self) -> &'static str {
        match self {
            Self::CurrentRelativeHumidity => "10",
            Self::CurrentTemperature => "11",
            Self::Name => "23",
        }
    }

    /// Identify a characteristic from the type UUID the framework reports.
    pub fn from_uuid(uuid: &str) -> Option<Self> {
        let short = short_form(uuid);
        [
            Self::CurrentTemperature,
            Self::CurrentRelativeHumidity,
            Self::Name,
        ]
        .into_iter()
        .find(|ty| short.eq_ignore_ascii_case(ty.short_uuid()))
    }
}

/// Service types this accessory exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceType {
    TemperatureSensor,
    HumiditySensor,
}

impl ServiceType {
    pub const fn short_uuid(self) -> &'static str {
        match self {
            Self::TemperatureSensor => "8A",
            Self::HumiditySensor => "82",
        }
    }

    /// The characteristic carrying this service's reading
    pub const fn primary_characteristic(self) -> CharacteristicType {
        match self {
            Self::TemperatureSensor => CharacteristicType::CurrentTemperature,
            Self::HumiditySensor => CharacteristicType::CurrentRelativeHumidity,
        }
    }
}

/// Accessory category, shown by controllers while pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessoryCategory {
    Bridge,
    Sensor,
}

impl AccessoryCategory {
    pub const fn code(self) -> u8 {
        match self {
            Self::Bridge => 2,
            Self::Sensor => 10,
        }
    }
}

/// A service together with the characteristics registered on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceDescriptor<'a> {
    pub service: ServiceType,
    pub name: &'a str,
    pub characteristics: [CharacteristicType; 2],
}

impl<'a> ServiceDescriptor<'a> {
    fn new(service: ServiceType, name: &'a str) -> Self {
        Self {
            service,
            name,
            characteristics: [service.primary_characteristic(), CharacteristicType::Name],
        }
    }
}

/// Everything the framework needs to register the accessory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessoryDescriptor<'a> {
    pub name: &'a str,
    pub manufacturer: &'a str,
    pub model: &'a str,
    pub serial_number: &'a str,
    pub firmware_revision: &'a str,
    pub hardware_revision: Option<&'a str>,
    pub protocol_version: &'a str,
    pub category: AccessoryCategory,
    pub product_data: &'a [u8],
    pub services: [ServiceDescriptor<'a>; 2],
}

impl<'a> AccessoryDescriptor<'a> {
    pub fn from_config(config: &'a Config) -> Self {
        let accessory = &config.accessory;
        Self {
            name: &accessory.name,
            manufacturer: &accessory.manufacturer,
            model: &accessory.model,
            serial_number: &accessory.serial_number,
            firmware_revision: &accessory.firmware_revision,
            hardware_revision: accessory.hardware_revision.as_deref(),
            protocol_version: &accessory.protocol_version,
            category: AccessoryCategory::Sensor,
            product_data: accessory.product_data.as_bytes(),
            services: [
                ServiceDescriptor::new(
                    ServiceType::TemperatureSensor,
                    &accessory.temperature_service_name,
                ),
                ServiceDescriptor::new(
                    ServiceType::HumiditySensor,
                    &accessory.humidity_service_name,
                ),
            ],
        }
    }

    /// Find the service that owns a characteristic type
    pub fn service_for(&self, characteristic: CharacteristicType) -> Option<&ServiceDescriptor<'a>> {
        self.services
            .iter()
            .find(|s| s.service.primary_characteristic() == characteristic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_uuids_are_recognised() {
        assert_eq!(
            CharacteristicType::from_uuid("11"),
            Some(CharacteristicType::CurrentTemperature)
        );
        assert_eq!(
            CharacteristicType::from_uuid("10"),
            Some(CharacteristicType::CurrentRelativeHumidity)
        );
        assert_eq!(CharacteristicType::from_uuid("23"), Some(CharacteristicType::Name));
    }

    #[test]
    fn test_full_uuids_are_recognised() {
        assert_eq!(
            CharacteristicType::from_uuid("00000011-0000-1000-8000-0026BB765291"),
            Some(CharacteristicType::CurrentTemperature)
        );
        assert_eq!(
            CharacteristicType::from_uuid("00000010-0000-1000-8000-0026bb765291"),
            Some(CharacteristicType::CurrentRelativeHumidity)
        );
    }

    #[test]
    fn test_unknown_uuids_are_rejected() {
        for uuid in ["", "0", "8A", "110", "00000011-0000-1000-8000-000000000000"] {
            assert_eq!(CharacteristicType::from_uuid(uuid), None, "{uuid}");
        }
    }

    #[test]
    fn test_descriptor_from_default_config() {
        let config = Config::default();
        let descriptor = AccessoryDescriptor::from_config(&config);

        assert_eq!(descriptor.name, "ESP-SI7021");
        assert_eq!(descriptor.category.code(), 10);
        assert_eq!(descriptor.product_data, b"ESP32HAP");
        assert_eq!(descriptor.hardware_revision, None);

        let temperature = descriptor
            .service_for(CharacteristicType::CurrentTemperature)
            .unwrap();
        assert_eq!(temperature.service, ServiceType::TemperatureSensor);
        assert_eq!(temperature.name, "Si7021 Temperature");

        let humidity = descriptor
            .service_for(CharacteristicType::CurrentRelativeHumidity)
            .unwrap();
        assert_eq!(humidity.service.short_uuid(), "82");
        assert_eq!(
            humidity.characteristics,
            [
                CharacteristicType::CurrentRelativeHumidity,
                CharacteristicType::Name
            ]
        );
    }
}
