//! Application core: pure domain logic, zero I/O.
//!
//! This module wires the alarm scheduler, the bell sequence engine and the
//! protection window together behind the [`TowerService`](service::TowerService).
//! All interaction with hardware and storage happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod actions;
pub mod events;
pub mod ports;
pub mod service;
