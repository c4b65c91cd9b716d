//! Chime protection window.
//!
//! For a few minutes either side of :00 and :30 manual sequences are
//! refused so they never overlap an automatic chime.  [`is_protected`] is
//! a pure function of the minute; [`ProtectionMonitor`] turns it into
//! edge-triggered transitions for the control loop.

use log::info;

use crate::clock::WallClock;

pub const DEFAULT_MARGIN: u8 = 3;

/// Chime points the window is centred on.
const CHIME_MINUTES: [u8; 2] = [0, 30];

/// True when `minute` lies within `margin` minutes (inclusive) of :00 or
/// :30, wrapping through 59 → 0.
pub fn is_protected(minute: u8, margin: u8) -> bool {
    let minute = minute % 60;
    CHIME_MINUTES
        .iter()
        .any(|&target| circular_distance(minute, target) <= margin)
}

fn circular_distance(a: u8, b: u8) -> u8 {
    let d = (i16::from(a) - i16::from(b)).rem_euclid(60) as u8;
    d.min(60 - d)
}

/// Tracks the window state between ticks and reports changes once.
#[derive(Debug, Default)]
pub struct ProtectionMonitor {
    active: bool,
}

impl ProtectionMonitor {
    pub const fn new() -> Self {
        Self { active: false }
    }

    /// Re-evaluate against `now`.  Returns `Some(new_state)` only on a
    /// transition.  Without a clock the window counts as inactive.
    pub fn update(&mut self, now: Option<&WallClock>, margin: u8) -> Option<bool> {
        let protected = now.is_some_and(|n| is_protected(n.minute, margin));
        if protected == self.active {
            return None;
        }
        self.active = protected;
        match now {
            Some(now) => info!(
                "Protection: window {} at {:02}:{:02}",
                if protected { "entered" } else { "left" },
                now.hour,
                now.minute
            ),
            None => info!("Protection: clock lost, window cleared"),
        }
        Some(protected)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}
