//! Alarm scheduler.
//!
//! Holds up to [`MAX_ALARMS`] rules, built-in and user-defined sharing one
//! table, and on every [`AlarmScheduler::tick`] fires each rule that newly
//! qualifies.  Firing is delegated to an [`AlarmDelegate`] so the scheduler
//! knows nothing about bells, heating or notifications.
//!
//! ```text
//!  ┌──────────────────────────────────────────────────────────────┐
//!  │                       Alarm table (16)                        │
//!  │                                                               │
//!  │  ┌────────────┐ ┌────────────┐ ┌────────────┐ ┌────────────┐  │
//!  │  │ user rules │ │ hour chime │ │ half chime │ │ maintenance│  │
//!  │  │ (web ids)  │ │   *:00     │ │   *:30     │ │ 12:02/12:05│  │
//!  │  └─────┬──────┘ └─────┬──────┘ └─────┬──────┘ └─────┬──────┘  │
//!  │        └──────────────┴──────┬───────┴──────────────┘         │
//!  │                              ▼                                │
//!  │                      AlarmDelegate::on_alarm                  │
//!  └──────────────────────────────────────────────────────────────┘
//! ```

pub mod document;
pub mod management;
pub mod rule;

use heapless::Vec;
use log::{debug, info, warn};

use crate::app::ports::AlarmDelegate;
use crate::clock::WallClock;
use crate::error::{ActionError, AlarmError};

use rule::{ActionKind, AlarmAction, AlarmRule};

/// Capacity of the alarm table.
pub const MAX_ALARMS: usize = 16;

/// Re-binds the action of a user-defined rule from its tag.
pub type ActionBinder = fn(ActionKind) -> AlarmAction;

// ═══════════════════════════════════════════════════════════════
//  Night hours
// ═══════════════════════════════════════════════════════════════

/// Hours during which automatic chimes stay silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NightHours {
    /// Start hour (0-23 inclusive).  E.g. 23 = 11 PM.
    pub start_hour: u8,
    /// End hour (0-23, exclusive).  E.g. 7 = 7 AM.
    pub end_hour: u8,
}

impl NightHours {
    pub fn is_night(&self, hour: u8) -> bool {
        if self.start_hour <= self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            // wraps around midnight
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

pub struct AlarmScheduler {
    rules: Vec<AlarmRule, MAX_ALARMS>,
    /// Next web id to hand out.  Never decreases.
    next_web_id: i32,
    binder: Option<ActionBinder>,
}

impl Default for AlarmScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl AlarmScheduler {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            next_web_id: 1,
            binder: None,
        }
    }

    /// Insert a rule.  Returns its slot index.
    pub fn add(&mut self, rule: AlarmRule) -> Result<usize, AlarmError> {
        let slot = self.rules.len();
        let name = rule.name.clone();
        self.rules.push(rule).map_err(|_| {
            warn!("Scheduler: table full, '{}' not added", name);
            AlarmError::TableFull
        })?;
        debug!("Scheduler: added '{}' at slot {}", name, slot);
        Ok(slot)
    }

    pub fn add_fixed(
        &mut self,
        weekday_mask: u8,
        hour: u8,
        minute: u8,
        action: AlarmAction,
        parameter: u16,
    ) -> Result<usize, AlarmError> {
        self.add(AlarmRule::fixed(weekday_mask, hour, minute, action, parameter))
    }

    pub fn add_periodic(
        &mut self,
        weekday_mask: u8,
        interval_minutes: u16,
        action: AlarmAction,
        parameter: u16,
    ) -> Result<usize, AlarmError> {
        self.add(AlarmRule::periodic(weekday_mask, interval_minutes, action, parameter))
    }

    /// Evaluate every rule against `now` and fire those that qualify.
    /// Returns the number of rules that fired.
    ///
    /// A rule whose action comes back [`ActionError::Busy`] is not marked
    /// fired, so it is offered again on the next tick while it still
    /// qualifies.  With no clock (`None`) nothing fires.
    pub fn tick(&mut self, now: Option<&WallClock>, delegate: &mut impl AlarmDelegate) -> usize {
        let Some(now) = now else {
            return 0;
        };
        let mut fired = 0;
        for rule in &mut self.rules {
            if !rule.is_due(now) {
                continue;
            }
            let result = match rule.action {
                AlarmAction::Unbound => Err(ActionError::Unbound),
                action => delegate.on_alarm(action, rule.parameter, now),
            };
            if result == Err(ActionError::Busy) {
                continue;
            }
            rule.mark_fired(now);
            fired += 1;
            debug!(
                "Scheduler: '{}' fired at {:02}:{:02}",
                rule.name, now.hour, now.minute
            );
            if let Err(e) = result {
                warn!("Scheduler: '{}' action failed: {}", rule.name, e);
            }
        }
        fired
    }

    // ── Binding ───────────────────────────────────────────────

    /// Install the binder and re-bind every user-defined rule with it.
    pub fn set_binder(&mut self, binder: ActionBinder) {
        self.binder = Some(binder);
        let mut bound = 0;
        for rule in self.rules.iter_mut().filter(|r| r.user_defined) {
            if let Some(kind) = rule.kind {
                rule.action = binder(kind);
                bound += 1;
            }
        }
        info!("Scheduler: {} user alarms bound", bound);
    }

    pub(crate) fn bind(&self, kind: ActionKind) -> AlarmAction {
        self.binder.map_or(AlarmAction::Unbound, |b| b(kind))
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.rules.is_full()
    }

    pub fn capacity(&self) -> usize {
        MAX_ALARMS
    }

    pub fn get(&self, slot: usize) -> Option<&AlarmRule> {
        self.rules.get(slot)
    }

    pub fn rules(&self) -> &[AlarmRule] {
        &self.rules
    }

    pub fn next_web_id(&self) -> i32 {
        self.next_web_id
    }

    pub fn set_enabled_at(&mut self, slot: usize, enabled: bool) -> bool {
        let Some(rule) = self.rules.get_mut(slot) else {
            return false;
        };
        rule.enabled = enabled;
        rule.reset_cache();
        true
    }

    fn slot_of(&self, web_id: i32) -> Option<usize> {
        self.rules.iter().position(|r| r.web_id == web_id && web_id >= 0)
    }
}
