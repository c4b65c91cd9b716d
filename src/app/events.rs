//! Outbound application events.
//!
//! The [`TowerService`](super::service::TowerService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, push to the display
//! unit, send a notification, etc.

use crate::error::ActionError;
use crate::scheduler::rule::SystemTask;
use crate::tower::ActivePattern;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TowerEvent {
    /// The service has loaded its alarms and is running.
    Started {
        user_alarms: usize,
        system_alarms: usize,
    },

    /// A sequence or chime began playing.
    SequenceStarted(ActivePattern),

    /// The timeline played to its end.
    SequenceFinished,

    /// Playback was aborted by a stop action.
    SequenceStopped,

    /// A bell was struck (1-based bell number).
    BellStruck(u8),

    /// An action was refused.
    ActionBlocked(ActionError),

    /// The heating relay changed state.
    HeatingChanged { on: bool, minutes: u16 },

    /// The chime protection window was entered (`true`) or left.
    ProtectionChanged(bool),

    /// Network availability changed.
    NetworkChanged { available: bool },

    /// A maintenance alarm fired; the outer application performs the task.
    MaintenanceDue(SystemTask),
}
