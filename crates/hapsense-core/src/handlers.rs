//! Callbacks served to the accessory framework
//!
//! The framework calls into the accessory through [`AccessoryCallbacks`]:
//! identify requests, characteristic reads from controllers and the two reset
//! button gestures. [`AccessoryHandlers`] implements it on top of the shared
//! [`Readings`] and delegates admin actions back to the injected
//! [`AccessoryFramework`].

use log::{info, warn};

use crate::accessory::CharacteristicType;
use crate::button::ButtonGesture;
use crate::readings::{Metric, Readings};

/// Status reported back to the framework for a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapStatus {
    Success,
    /// The requested characteristic is not served by this accessory
    ResourceAbsent,
}

impl HapStatus {
    /// Numeric status as defined by the accessory protocol
    pub const fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::ResourceAbsent => -70409,
        }
    }
}

/// A controller's request for the current value of a characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRequest<'a> {
    /// Characteristic type UUID as reported by the framework
    pub characteristic_uuid: &'a str,
    /// Requesting controller, for diagnostics only
    pub controller_id: Option<&'a str>,
}

/// Sink the framework provides for writing a characteristic's new value.
pub trait CharacteristicUpdate {
    fn update_float(&mut self, value: f32);
}

/// Admin entry points of the accessory framework.
pub trait AccessoryFramework {
    /// Forget the network configuration and restart provisioning
    fn reset_network(&self);

    /// Erase pairings and network configuration
    fn reset_to_factory(&self);
}

impl<F: AccessoryFramework> AccessoryFramework for &F {
    fn reset_network(&self) {
        (**self).reset_network();
    }

    fn reset_to_factory(&self) {
        (**self).reset_to_factory();
    }
}

/// One method per callback the framework invokes.
pub trait AccessoryCallbacks {
    /// The accessory was asked to identify itself
    fn identify(&self) -> HapStatus;

    /// Serve the current value of a characteristic
    fn read(
        &self,
        request: &ReadRequest<'_>,
        update: &mut dyn CharacteristicUpdate,
    ) -> HapStatus;

    /// Reset button released after the network reset threshold
    fn reset_button_released(&self);

    /// Reset button held past the factory reset threshold
    fn reset_button_held(&self);

    /// Route a classified button gesture to its callback.
    fn on_gesture(&self, gesture: ButtonGesture) {
        match gesture {
            ButtonGesture::ReleasedAfter => self.reset_button_released(),
            ButtonGesture::HeldFor => self.reset_button_held(),
        }
    }
}

pub struct AccessoryHandlers<'a, F> {
    readings: &'a Readings,
    framework: F,
}

impl<'a, F: AccessoryFramework> AccessoryHandlers<'a, F> {
    pub fn new(readings: &'a Readings, framework: F) -> Self {
        Self {
            readings,
            framework,
        }
    }

    pub fn framework(&self) -> &F {
        &self.framework
    }
}

impl<F: AccessoryFramework> AccessoryCallbacks for AccessoryHandlers<'_, F> {
    fn identify(&self) -> HapStatus {
        info!("Accessory identified");
        HapStatus::Success
    }

    fn read(
        &self,
        request: &ReadRequest<'_>,
        update: &mut dyn CharacteristicUpdate,
    ) -> HapStatus {
        if let Some(controller) = request.controller_id {
            info!("Sensor received read from {}", controller);
        }

        let metric = match CharacteristicType::from_uuid(request.characteristic_uuid) {
            Some(CharacteristicType::CurrentTemperature) => Metric::Temperature,
            Some(CharacteristicType::CurrentRelativeHumidity) => Metric::Humidity,
            _ => {
                warn!(
                    "Read for unsupported characteristic {}",
                    request.characteristic_uuid
                );
                return HapStatus::ResourceAbsent;
            }
        };

        update.update_float(self.readings.slot(metric).get());
        HapStatus::Success
    }

    fn reset_button_released(&self) {
        info!("Reset button released, resetting network configuration");
        self.framework.reset_network();
    }

    fn reset_button_held(&self) {
        info!("Reset button held, resetting to factory settings");
        self.framework.reset_to_factory();
    }
}
