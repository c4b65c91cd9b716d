//! Bell striker driver.
//!
//! Each bell is a solenoid behind a relay on one GPIO.  A strike energises
//! the coil for a fixed pulse and releases it; the call blocks for the
//! pulse duration, which is the only blocking operation in the control
//! loop.
//!
//! ## Dual-target design
//!
//! Written against the `embedded-hal` 1.0 `OutputPin` and `DelayNs`
//! traits.  On ESP-IDF the pins are `PinDriver`s and the delay is
//! `FreeRtos`; on host/test any mock implementing the traits will do.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use heapless::Vec;
use log::warn;

use crate::app::ports::BellPort;

/// Most bells a single controller can drive.
pub const MAX_BELLS: usize = 4;

pub struct BellBank<P, D> {
    strikers: Vec<P, MAX_BELLS>,
    delay: D,
    pulse_ms: u32,
    strikes: u32,
}

impl<P: OutputPin, D: DelayNs> BellBank<P, D> {
    /// Build a bank from striker pins in bell-index order.  All coils are
    /// released first.  Pins past [`MAX_BELLS`] are dropped with a warning.
    pub fn new(pins: impl IntoIterator<Item = P>, delay: D, pulse_ms: u32) -> Self {
        let mut strikers = Vec::new();
        for mut pin in pins {
            if pin.set_low().is_err() {
                warn!("Bell: failed to release striker {}", strikers.len());
            }
            if strikers.push(pin).is_err() {
                warn!("Bell: more than {} strikers, extra ignored", MAX_BELLS);
                break;
            }
        }
        Self {
            strikers,
            delay,
            pulse_ms,
            strikes: 0,
        }
    }

    pub fn set_pulse_ms(&mut self, pulse_ms: u32) {
        self.pulse_ms = pulse_ms;
    }

    /// Strikes performed since boot.
    pub fn strike_count(&self) -> u32 {
        self.strikes
    }
}

impl<P: OutputPin, D: DelayNs> BellPort for BellBank<P, D> {
    fn bell_count(&self) -> usize {
        self.strikers.len()
    }

    fn strike(&mut self, index: usize) {
        let Some(pin) = self.strikers.get_mut(index) else {
            return;
        };
        if pin.set_high().is_err() {
            warn!("Bell: striker {} did not energise", index);
            return;
        }
        self.delay.delay_ms(self.pulse_ms);
        if pin.set_low().is_err() {
            warn!("Bell: striker {} did not release", index);
        }
        self.strikes = self.strikes.wrapping_add(1);
    }
}
