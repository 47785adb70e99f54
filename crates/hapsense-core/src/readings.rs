//! Published reading slots shared between the sampler and the read responder
//!
//! Each metric lives in its own single-value slot. The sampler is the only
//! writer; any number of responder invocations may read concurrently. A slot
//! is guarded by a critical-section mutex so a reader observes either the
//! value before a write or the value after it, never a mix of both.

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

/// A single latest-value-wins cache for one metric.
pub struct PublishedSlot {
    value: BlockingMutex<CriticalSectionRawMutex, Cell<f32>>,
}

impl PublishedSlot {
    /// Create a slot holding `initial` until the first publish.
    pub const fn new(initial: f32) -> Self {
        Self {
            value: BlockingMutex::new(Cell::new(initial)),
        }
    }

    /// Read the currently published value.
    #[inline]
    pub fn get(&self) -> f32 {
        self.value.lock(|cell| cell.get())
    }

    /// Replace the published value.
    #[inline]
    pub fn publish(&self, value: f32) {
        self.value.lock(|cell| cell.set(value));
    }
}

/// The metrics this accessory publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Temperature,
    Humidity,
}

impl Metric {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Temperature => "Temperature",
            Self::Humidity => "Humidity",
        }
    }
}

/// Point-in-time copy of both slots, for diagnostics.
///
/// The two values are read one after the other; they are not guaranteed to
/// come from the same sampling cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadingsSnapshot {
    pub temperature: f32,
    pub humidity: f32,
}

/// Shared state container for the published readings.
///
/// Owned by the composition root and lent by reference to the sampler and to
/// the accessory handlers.
pub struct Readings {
    temperature: PublishedSlot,
    humidity: PublishedSlot,
}

impl Readings {
    pub const fn new(initial_temperature: f32, initial_humidity: f32) -> Self {
        Self {
            temperature: PublishedSlot::new(initial_temperature),
            humidity: PublishedSlot::new(initial_humidity),
        }
    }

    pub fn slot(&self, metric: Metric) -> &PublishedSlot {
        match metric {
            Metric::Temperature => &self.temperature,
            Metric::Humidity => &self.humidity,
        }
    }

    /// Current temperature in degrees Celsius
    pub fn temperature(&self) -> f32 {
        self.temperature.get()
    }

    /// Current relative humidity in percent
    pub fn humidity(&self) -> f32 {
        self.humidity.get()
    }

    pub fn snapshot(&self) -> ReadingsSnapshot {
        ReadingsSnapshot {
            temperature: self.temperature(),
            humidity: self.humidity(),
        }
    }
}

impl Default for Readings {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}
