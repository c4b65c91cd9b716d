//! Bell sequence engine.
//!
//! [`BellTower`] owns the flat strike timeline, the playback cursor, the
//! status bitmask and the heating timer.  Playback is non-blocking: the
//! control loop calls [`BellTower::advance`] every iteration and at most
//! one bell is struck per call.
//!
//! ```text
//!   start_named / start_hour / start_quarter / start_half_hour
//!                       │
//!                       ▼
//!        ┌──────┐  timeline non-empty  ┌─────────┐
//!        │ Idle │ ───────────────────▶ │ Playing │
//!        └──────┘ ◀─────────────────── └─────────┘
//!                 cursor at end / stop()
//! ```

pub mod sequence;
pub mod status;

use log::{debug, info, warn};

use crate::app::ports::{BellPort, RelayPort};
use crate::clock::WallClock;
use crate::error::{ActionError, SequenceError};
use crate::heating::HeatingTimer;

use sequence::{FlatStrike, NamedPattern, SequenceLibrary, Timeline};
use status::{StatusBits, StatusFlag};

/// Bell used for quarter and half-hour strikes.
pub const QUARTER_BELL: i32 = 1;
/// Bell used for the hour count.
pub const HOUR_BELL: i32 = 0;

const QUARTER_GAP_MS: u32 = 1000;
const HOUR_FIRST_GAP_MS: u32 = 3000;
const HOUR_GAP_AFTER_QUARTERS_MS: u32 = 1000;
const HOUR_GAP_MS: u32 = 2000;

/// What the engine is currently playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivePattern {
    Named(NamedPattern),
    Hour { hour: u8, with_quarters: bool },
    Quarter(u8),
    HalfHour,
}

/// The bell sequence engine.
pub struct BellTower {
    library: SequenceLibrary,
    timeline: Timeline,
    cursor: usize,
    last_strike_ms: Option<u64>,
    playing: bool,
    active: Option<ActivePattern>,
    status: StatusBits,
    /// 1-based index of the last bell struck, cleared by the reader.
    last_struck: Option<u8>,
    heating: Option<HeatingTimer>,
}

impl BellTower {
    /// `heating` is `None` when no relay is fitted; heating calls then
    /// report [`ActionError::NoHeating`].
    pub fn new(library: SequenceLibrary, heating: Option<HeatingTimer>) -> Self {
        Self {
            library,
            timeline: Timeline::new(),
            cursor: 0,
            last_strike_ms: None,
            playing: false,
            active: None,
            status: StatusBits::empty(),
            last_struck: None,
            heating,
        }
    }

    // ── Pattern triggers ──────────────────────────────────────

    /// Start one of the named library patterns.  Replaces whatever is
    /// playing.  Returns the number of strikes scheduled.
    pub fn start_named(&mut self, pattern: NamedPattern) -> Result<usize, SequenceError> {
        let timeline = sequence::expand(self.library.get(pattern))?;
        let n = timeline.len();
        self.begin(timeline, ActivePattern::Named(pattern), None);
        info!("Tower: {} started ({} strikes)", pattern.name(), n);
        Ok(n)
    }

    /// Chime the hour on a 12-hour dial (0 and 12 give twelve strikes).
    pub fn start_hour(&mut self, hour: u8, with_quarters: bool) {
        let count = match hour % 12 {
            0 => 12,
            h => h,
        };
        let mut timeline = Timeline::new();
        if with_quarters {
            for _ in 0..4 {
                let _ = timeline.push(FlatStrike {
                    bell_index: QUARTER_BELL,
                    interval_ms: QUARTER_GAP_MS,
                });
            }
        }
        let gap = if with_quarters {
            HOUR_GAP_AFTER_QUARTERS_MS
        } else {
            HOUR_GAP_MS
        };
        for i in 0..count {
            let _ = timeline.push(FlatStrike {
                bell_index: HOUR_BELL,
                interval_ms: if i == 0 { HOUR_FIRST_GAP_MS } else { gap },
            });
        }
        self.begin(
            timeline,
            ActivePattern::Hour { hour, with_quarters },
            Some(StatusFlag::HourChime),
        );
        info!("Tower: hour chime {} ({} strikes)", hour, count);
    }

    /// `n` strikes on the quarter bell.  `n == 0` leaves the engine idle.
    pub fn start_quarter(&mut self, n: u8) {
        let mut timeline = Timeline::new();
        for _ in 0..n {
            let _ = timeline.push(FlatStrike {
                bell_index: QUARTER_BELL,
                interval_ms: QUARTER_GAP_MS,
            });
        }
        if timeline.is_empty() {
            debug!("Tower: quarter chime with no strikes ignored");
            return;
        }
        self.begin(timeline, ActivePattern::Quarter(n), Some(StatusFlag::QuarterChime));
        info!("Tower: quarter chime ({} strikes)", n);
    }

    pub fn start_half_hour(&mut self) {
        let mut timeline = Timeline::new();
        let _ = timeline.push(FlatStrike {
            bell_index: QUARTER_BELL,
            interval_ms: QUARTER_GAP_MS,
        });
        self.begin(timeline, ActivePattern::HalfHour, Some(StatusFlag::HourChime));
        info!("Tower: half-hour chime");
    }

    /// Abort playback.  Safe to call when idle.
    pub fn stop(&mut self) {
        if self.playing {
            info!("Tower: sequence stopped at {}/{}", self.cursor, self.timeline.len());
        }
        self.reset_playback();
    }

    fn begin(&mut self, timeline: Timeline, pattern: ActivePattern, flag: Option<StatusFlag>) {
        self.reset_playback();
        self.timeline = timeline;
        self.playing = true;
        self.active = Some(pattern);
        self.status.set(StatusFlag::Sequence, true);
        if let Some(flag) = flag {
            self.status.set(flag, true);
        }
    }

    fn reset_playback(&mut self) {
        self.timeline.clear();
        self.cursor = 0;
        self.last_strike_ms = None;
        self.playing = false;
        self.active = None;
        self.status.clear_sequence();
    }

    // ── Playback ──────────────────────────────────────────────

    /// Strike the next bell if its gap has elapsed.  Returns the 1-based
    /// bell number struck, or 0.
    ///
    /// A strike whose bell index is out of range for `bells` is skipped
    /// but still consumes its slot in the timeline.
    pub fn advance(&mut self, now_ms: u64, bells: &mut impl BellPort) -> u8 {
        if !self.playing {
            return 0;
        }
        let Some(&entry) = self.timeline.get(self.cursor) else {
            self.finish();
            return 0;
        };
        if let Some(last) = self.last_strike_ms {
            if now_ms.saturating_sub(last) < u64::from(entry.interval_ms) {
                return 0;
            }
        }

        let struck = match usize::try_from(entry.bell_index) {
            Ok(index) if index < bells.bell_count() => {
                bells.strike(index);
                let number = (index + 1) as u8;
                self.last_struck = Some(number);
                number
            }
            _ => {
                warn!("Tower: bell {} not fitted, strike skipped", entry.bell_index);
                0
            }
        };

        self.last_strike_ms = Some(now_ms);
        self.cursor += 1;
        if self.cursor >= self.timeline.len() {
            self.finish();
        }
        struck
    }

    fn finish(&mut self) {
        debug!("Tower: sequence finished after {} strikes", self.cursor);
        self.reset_playback();
    }

    // ── Heating ───────────────────────────────────────────────

    pub fn heat_on(
        &mut self,
        minutes: u16,
        now: Option<&WallClock>,
        relay: &mut impl RelayPort,
    ) -> Result<(), ActionError> {
        let timer = self.heating.as_mut().ok_or(ActionError::NoHeating)?;
        if !timer.turn_on(minutes, now) {
            return Err(ActionError::ClockUnavailable);
        }
        relay.set_heating(true);
        self.status.set(StatusFlag::Heating, true);
        Ok(())
    }

    pub fn heat_off(&mut self, relay: &mut impl RelayPort) {
        let Some(timer) = self.heating.as_mut() else {
            return;
        };
        timer.turn_off();
        relay.set_heating(false);
        self.status.set(StatusFlag::Heating, false);
    }

    /// Poll the heating countdown; de-energises the relay on expiry.
    /// Returns the remaining seconds.
    pub fn heat_check(&mut self, now: Option<&WallClock>, relay: &mut impl RelayPort) -> u32 {
        let Some(timer) = self.heating.as_mut() else {
            return 0;
        };
        let was_on = timer.is_on();
        let remaining = timer.check(now);
        if was_on && !timer.is_on() {
            relay.set_heating(false);
            self.status.set(StatusFlag::Heating, false);
        }
        remaining
    }

    pub fn is_heating(&self) -> bool {
        self.heating.is_some_and(|t| t.is_on())
    }

    pub fn has_heating(&self) -> bool {
        self.heating.is_some()
    }

    pub fn heating(&self) -> Option<&HeatingTimer> {
        self.heating.as_ref()
    }

    // ── External status bits ──────────────────────────────────

    pub fn set_protection(&mut self, active: bool) {
        self.status.set(StatusFlag::Protection, active);
    }

    pub fn set_no_network(&mut self, offline: bool) {
        self.status.set(StatusFlag::NoNetwork, offline);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn status_bitmask(&self) -> u8 {
        self.status.bits()
    }

    pub fn status(&self) -> StatusBits {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn active_pattern(&self) -> Option<ActivePattern> {
        self.active
    }

    pub fn last_struck_bell(&self) -> Option<u8> {
        self.last_struck
    }

    pub fn clear_last_struck(&mut self) {
        self.last_struck = None;
    }

    /// Remaining strikes in the current timeline.
    pub fn remaining_strikes(&self) -> usize {
        self.timeline.len().saturating_sub(self.cursor)
    }

    pub fn timeline(&self) -> &[FlatStrike] {
        &self.timeline
    }

    pub fn library(&self) -> &SequenceLibrary {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut SequenceLibrary {
        &mut self.library
    }
}
