//! Alarm rule records and their matching logic.

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::app::actions::ActionCode;
use crate::clock::{MinuteStamp, WallClock};

/// Matches any hour or any minute.
pub const WILDCARD: u8 = 255;
/// Weekday mask selecting every day.
pub const ALL_DAYS: u8 = 0x7F;

pub const MAX_NAME_LEN: usize = 32;
pub const MAX_DESCRIPTION_LEN: usize = 64;

/// Mask bit for `weekday` (0 = Sunday).
pub const fn weekday_bit(weekday: u8) -> u8 {
    1 << (weekday % 7)
}

/// Closed set of tags a user-defined alarm may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Mass,
    Funeral,
    Festival,
    HourChime,
}

impl ActionKind {
    pub const ALL: [Self; 4] = [Self::Mass, Self::Funeral, Self::Festival, Self::HourChime];

    pub fn tag(self) -> &'static str {
        match self {
            Self::Mass => "MASS",
            Self::Funeral => "FUNERAL",
            Self::Festival => "FESTIVAL",
            Self::HourChime => "HOUR_CHIME",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }
}

/// Built-in tasks that take no parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemTask {
    HourChime,
    HalfHourChime,
    /// Strike count is derived from the minute (:15 → 1, :45 → 3).
    QuarterChime,
    SyncClock,
    RefreshDns,
}

/// What happens when a rule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmAction {
    /// Loaded from storage and not yet re-bound.
    Unbound,
    /// Dispatch an action code with the rule's parameter.
    Dispatch(ActionCode),
    /// Run a built-in task; the parameter is ignored.
    Invoke(SystemTask),
}

/// Default binding from a user tag to an action.
pub fn default_binding(kind: ActionKind) -> AlarmAction {
    match kind {
        ActionKind::Mass => AlarmAction::Dispatch(ActionCode::Mass),
        ActionKind::Funeral => AlarmAction::Dispatch(ActionCode::Funeral),
        ActionKind::Festival => AlarmAction::Dispatch(ActionCode::Festival),
        ActionKind::HourChime => AlarmAction::Invoke(SystemTask::HourChime),
    }
}

/// One scheduled rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmRule {
    pub enabled: bool,
    pub weekday_mask: u8,
    pub hour: u8,
    pub minute: u8,
    /// 0 = fixed-time rule.
    pub interval_minutes: u16,
    pub action: AlarmAction,
    pub parameter: u16,
    pub name: String<MAX_NAME_LEN>,
    pub description: String<MAX_DESCRIPTION_LEN>,
    pub kind: Option<ActionKind>,
    pub user_defined: bool,
    /// -1 for rules not visible to the management API.
    pub web_id: i32,
    last_fired: Option<MinuteStamp>,
    last_fired_epoch: Option<i64>,
}

impl AlarmRule {
    /// Fixed-time rule.  A zero weekday mask means every day.
    pub fn fixed(weekday_mask: u8, hour: u8, minute: u8, action: AlarmAction, parameter: u16) -> Self {
        Self {
            enabled: true,
            weekday_mask: normalize_mask(weekday_mask),
            hour,
            minute,
            interval_minutes: 0,
            action,
            parameter,
            name: String::new(),
            description: String::new(),
            kind: None,
            user_defined: false,
            web_id: -1,
            last_fired: None,
            last_fired_epoch: None,
        }
    }

    /// Periodic rule firing every `interval_minutes`.
    pub fn periodic(weekday_mask: u8, interval_minutes: u16, action: AlarmAction, parameter: u16) -> Self {
        let mut rule = Self::fixed(weekday_mask, WILDCARD, WILDCARD, action, parameter);
        rule.interval_minutes = interval_minutes;
        rule
    }

    /// Set the display name, truncated to fit.
    pub fn named(mut self, name: &str) -> Self {
        self.name = truncated(name);
        self
    }

    pub fn is_periodic(&self) -> bool {
        self.interval_minutes > 0
    }

    pub fn active_on(&self, weekday: u8) -> bool {
        self.weekday_mask & weekday_bit(weekday) != 0
    }

    /// Whether the rule qualifies at `now` and has not already fired for it.
    pub fn is_due(&self, now: &WallClock) -> bool {
        if !self.enabled || !self.active_on(now.weekday) {
            return false;
        }
        if self.is_periodic() {
            return match self.last_fired_epoch {
                None => true,
                Some(last) => now.epoch - last >= i64::from(self.interval_minutes) * 60,
            };
        }
        let hour_ok = self.hour == WILDCARD || self.hour == now.hour;
        let minute_ok = self.minute == WILDCARD || self.minute == now.minute;
        hour_ok && minute_ok && self.last_fired != Some(now.minute_stamp())
    }

    pub fn mark_fired(&mut self, now: &WallClock) {
        if self.is_periodic() {
            self.last_fired_epoch = Some(now.epoch);
        } else {
            self.last_fired = Some(now.minute_stamp());
        }
    }

    /// Forget when the rule last fired.
    pub fn reset_cache(&mut self) {
        self.last_fired = None;
        self.last_fired_epoch = None;
    }

    pub fn last_fired_epoch(&self) -> Option<i64> {
        self.last_fired_epoch
    }
}

fn normalize_mask(mask: u8) -> u8 {
    match mask & ALL_DAYS {
        0 => ALL_DAYS,
        m => m,
    }
}

/// Copy as much of `s` as fits, never splitting a character.
pub fn truncated<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
