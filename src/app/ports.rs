//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ TowerService (domain)
//! ```
//!
//! Driven adapters (clock, bell strikers, heating relay, event sinks,
//! document storage) implement these traits.  The
//! [`TowerService`](super::service::TowerService) consumes them via
//! generics, so the domain core never touches hardware directly.

use crate::clock::WallClock;
use crate::config::TowerConfig;
use crate::error::{ActionError, StoreError};
use crate::scheduler::rule::AlarmAction;

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: RTC / SNTP → domain)
// ───────────────────────────────────────────────────────────────

/// Time source for calendar matching and strike pacing.
pub trait ClockSource {
    /// Broken-down local time, or `None` until the clock is synchronised.
    fn now(&self) -> Option<WallClock>;

    /// Milliseconds since boot.  Never goes backwards.
    fn monotonic_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Actuator ports (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// The bank of bell strikers, indexed `0..bell_count()`.
pub trait BellPort {
    fn bell_count(&self) -> usize;

    /// Energise striker `index` for its pulse and release it.  Blocks for
    /// the pulse duration.  Out-of-range indices are ignored.
    fn strike(&mut self, index: usize);
}

/// The heating relay.
pub trait RelayPort {
    fn set_heating(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / notifications)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`TowerEvent`](super::events::TowerEvent)s
/// through this port.  Adapters decide where they go (serial log, display
/// link, push notifications, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::TowerEvent);
}

// ───────────────────────────────────────────────────────────────
// Document store port (driven adapter: domain ↔ flash filesystem)
// ───────────────────────────────────────────────────────────────

/// Named UTF-8 documents (`alarms.json`, `sequences.json`, `config.json`).
///
/// Writes replace the whole document.  Implementations should make them
/// atomic so a power cut leaves either the old or the new content.
pub trait DocumentStore {
    fn read(&self, name: &str) -> Result<String, StoreError>;

    fn write(&mut self, name: &str, contents: &str) -> Result<(), StoreError>;

    fn exists(&self, name: &str) -> bool;

    /// Returns `Ok(())` even if the document didn't exist.
    fn delete(&mut self, name: &str) -> Result<(), StoreError>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists [`TowerConfig`].
///
/// Implementations MUST validate before persisting and reject invalid
/// ranges with [`ConfigError::ValidationFailed`] rather than clamping.
pub trait ConfigPort {
    /// Returns [`TowerConfig::default()`] if no stored config exists.
    fn load_config(&self) -> Result<TowerConfig, ConfigError>;

    fn save_config(&mut self, config: &TowerConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Alarm delegate (decouples scheduler from the bell tower)
// ───────────────────────────────────────────────────────────────

/// Callback the [`AlarmScheduler`](crate::scheduler::AlarmScheduler)
/// invokes for every alarm that qualifies on a tick.
///
/// Errors are logged by the scheduler and otherwise ignored; they never
/// stop the remaining alarms from being evaluated.
pub trait AlarmDelegate {
    fn on_alarm(
        &mut self,
        action: AlarmAction,
        parameter: u16,
        now: &WallClock,
    ) -> Result<(), ActionError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<StoreError> for ConfigError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => Self::NotFound,
            StoreError::Corrupted | StoreError::Encode => Self::Corrupted,
            StoreError::Io => Self::IoError,
        }
    }
}
