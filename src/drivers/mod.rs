//! Actuator drivers and peripheral helpers.

pub mod bell;
pub mod hw_init;
pub mod relay;
