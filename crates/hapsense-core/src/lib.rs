//! Hardware-independent core library for hapsense
//!
//! This crate contains the platform-agnostic logic of a temperature/humidity
//! accessory: the periodic sampler, the published reading slots it feeds, the
//! accessory callbacks served to the external accessory framework, and the
//! configuration, descriptor and setup payload the composition root registers.
//!
//! It is `#![no_std]` so it compiles on both embedded targets and desktop
//! hosts (for the simulator and tests).

#![no_std]

#[cfg(test)]
extern crate std;

pub mod accessory;
pub mod button;
pub mod config;
pub mod handlers;
pub mod readings;
pub mod sampler;
pub mod sensors;
pub mod setup_payload;

#[cfg(test)]
mod test_support;
