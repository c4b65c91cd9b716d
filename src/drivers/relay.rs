//! Heating relay driver.
//!
//! A single contactor relay on one GPIO, active HIGH.  The driver keeps the
//! commanded state so repeated commands don't toggle the pin needlessly.

use embedded_hal::digital::OutputPin;
use log::{info, warn};

use crate::app::ports::RelayPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Off,
    On,
}

pub struct HeatingRelay<P> {
    pin: P,
    state: RelayState,
}

impl<P: OutputPin> HeatingRelay<P> {
    /// Take the pin and force the relay off.
    pub fn new(mut pin: P) -> Self {
        if pin.set_low().is_err() {
            warn!("Relay: failed to force heating off at init");
        }
        Self {
            pin,
            state: RelayState::Off,
        }
    }

    pub fn state(&self) -> RelayState {
        self.state
    }
}

impl<P: OutputPin> RelayPort for HeatingRelay<P> {
    fn set_heating(&mut self, on: bool) {
        let target = if on { RelayState::On } else { RelayState::Off };
        if target == self.state {
            return;
        }
        let result = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        match result {
            Ok(()) => {
                self.state = target;
                info!("Relay: heating {:?}", target);
            }
            Err(_) => warn!("Relay: failed to switch heating {:?}", target),
        }
    }
}
