//! Bell tower controller library.
//!
//! Exposes the pure-logic modules for integration testing and the device
//! binary. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod heating;
pub mod protection;
pub mod scheduler;
pub mod tower;

pub mod pins;

// Hardware-facing layers; the ESP-IDF parts are guarded by cfg attributes
// inside.
pub mod adapters;
pub mod drivers;

pub use error::{Error, Result};
