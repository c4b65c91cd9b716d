//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the clock, the bell bank and the heating relay, exposing them
//! through [`ClockSource`], [`BellPort`] and [`RelayPort`] so a single
//! `&mut` can be handed to [`TowerService::tick`](crate::app::service::TowerService::tick).
//! This is the only module in the system that touches actual hardware.

use crate::app::ports::{BellPort, ClockSource, RelayPort};
use crate::clock::WallClock;

/// Concrete adapter that combines all hardware behind port traits.
/// `R` is `None` on towers without heating.
pub struct HardwareAdapter<C, B, R> {
    clock: C,
    bells: B,
    relay: Option<R>,
}

impl<C, B, R> HardwareAdapter<C, B, R> {
    pub fn new(clock: C, bells: B, relay: Option<R>) -> Self {
        Self {
            clock,
            bells,
            relay,
        }
    }

    pub fn has_heating(&self) -> bool {
        self.relay.is_some()
    }

    pub fn bells(&self) -> &B {
        &self.bells
    }

    pub fn bells_mut(&mut self) -> &mut B {
        &mut self.bells
    }
}

// ── ClockSource implementation ────────────────────────────────

impl<C: ClockSource, B, R> ClockSource for HardwareAdapter<C, B, R> {
    fn now(&self) -> Option<WallClock> {
        self.clock.now()
    }

    fn monotonic_ms(&self) -> u64 {
        self.clock.monotonic_ms()
    }
}

// ── BellPort implementation ───────────────────────────────────

impl<C, B: BellPort, R> BellPort for HardwareAdapter<C, B, R> {
    fn bell_count(&self) -> usize {
        self.bells.bell_count()
    }

    fn strike(&mut self, index: usize) {
        self.bells.strike(index);
    }
}

// ── RelayPort implementation ──────────────────────────────────

impl<C, B, R: RelayPort> RelayPort for HardwareAdapter<C, B, R> {
    fn set_heating(&mut self, on: bool) {
        if let Some(relay) = self.relay.as_mut() {
            relay.set_heating(on);
        }
    }
}
