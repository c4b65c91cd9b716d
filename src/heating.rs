//! Heating auto-off timer.
//!
//! Tracks whether the heating relay should be energised and for how long.
//! All timing is measured on the wall clock so that the countdown survives
//! long loop stalls; every operation that needs the clock takes an
//! `Option<&WallClock>` and does nothing when it is `None`.

use log::{debug, info};

use crate::clock::WallClock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatingTimer {
    is_on: bool,
    on_since: i64,
    requested_minutes: u16,
    /// Remaining seconds at the last successful `check`.
    last_remaining: u32,
}

impl Default for HeatingTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl HeatingTimer {
    pub const fn new() -> Self {
        Self {
            is_on: false,
            on_since: 0,
            requested_minutes: 0,
            last_remaining: 0,
        }
    }

    /// Start a countdown of `minutes`.  Returns `false` (and stays off)
    /// when no synchronised wall-clock sample is available.
    pub fn turn_on(&mut self, minutes: u16, now: Option<&WallClock>) -> bool {
        let Some(now) = now else {
            debug!("Heating: turn_on ignored, clock unavailable");
            return false;
        };
        self.is_on = true;
        self.on_since = now.epoch;
        self.requested_minutes = minutes;
        self.last_remaining = u32::from(minutes) * 60;
        info!("Heating: on for {} min", minutes);
        true
    }

    pub fn turn_off(&mut self) {
        if self.is_on {
            info!("Heating: off");
        }
        self.is_on = false;
        self.last_remaining = 0;
    }

    /// Poll the countdown.  Returns the remaining seconds, or 0 once the
    /// timer has expired (in which case it has turned itself off).
    ///
    /// Without a clock sample the timer is left untouched and the last
    /// known remaining value is returned.
    pub fn check(&mut self, now: Option<&WallClock>) -> u32 {
        if !self.is_on {
            return 0;
        }
        let Some(now) = now else {
            return self.last_remaining;
        };
        let elapsed = now.epoch.saturating_sub(self.on_since).max(0);
        let total = i64::from(self.requested_minutes) * 60;
        if elapsed >= total {
            info!("Heating: {} min elapsed, auto-off", self.requested_minutes);
            self.turn_off();
            return 0;
        }
        self.last_remaining = (total - elapsed) as u32;
        self.last_remaining
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }

    pub fn requested_minutes(&self) -> u16 {
        self.requested_minutes
    }

    pub fn on_since(&self) -> Option<i64> {
        self.is_on.then_some(self.on_since)
    }
}
