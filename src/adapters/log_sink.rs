//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured tower events to the
//! ESP-IDF logger (which goes to UART in production).  A display-link or
//! notification adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::TowerEvent;
use crate::app::ports::EventSink;
use crate::tower::ActivePattern;

/// Adapter that logs every [`TowerEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &TowerEvent) {
        match event {
            TowerEvent::Started {
                user_alarms,
                system_alarms,
            } => {
                info!("START | alarms user={} system={}", user_alarms, system_alarms);
            }
            TowerEvent::SequenceStarted(pattern) => match pattern {
                ActivePattern::Named(p) => info!("SEQ   | {} started", p.name()),
                ActivePattern::Hour {
                    hour,
                    with_quarters,
                } => info!("SEQ   | hour {} (quarters={})", hour, with_quarters),
                ActivePattern::Quarter(n) => info!("SEQ   | quarter x{}", n),
                ActivePattern::HalfHour => info!("SEQ   | half hour"),
            },
            TowerEvent::SequenceFinished => info!("SEQ   | finished"),
            TowerEvent::SequenceStopped => info!("SEQ   | stopped"),
            TowerEvent::BellStruck(bell) => info!("BELL  | {}", bell),
            TowerEvent::ActionBlocked(reason) => warn!("BLOCK | {}", reason),
            TowerEvent::HeatingChanged { on: true, minutes } => {
                info!("HEAT  | on for {} min", minutes);
            }
            TowerEvent::HeatingChanged { on: false, .. } => info!("HEAT  | off"),
            TowerEvent::ProtectionChanged(active) => {
                info!("PROT  | {}", if *active { "active" } else { "clear" });
            }
            TowerEvent::NetworkChanged { available } => {
                info!("NET   | {}", if *available { "up" } else { "down" });
            }
            TowerEvent::MaintenanceDue(task) => info!("MAINT | {:?} due", task),
        }
    }
}
