//! Unified error types for the bell tower controller.
//!
//! Every subsystem has its own small `Copy` enum so errors can be returned
//! from the per-iteration `tick` / `advance` / `check` paths without
//! allocation.  All of them convert into the top-level [`Error`].

use core::fmt;

use crate::app::ports::ConfigError;

// ---------------------------------------------------------------------------
// Top-level controller error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Alarm table management failed.
    Alarm(AlarmError),
    /// A persisted document could not be read or written.
    Store(StoreError),
    /// A bell pattern could not be expanded.
    Sequence(SequenceError),
    /// An action could not be carried out.
    Action(ActionError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alarm(e) => write!(f, "alarm: {e}"),
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Sequence(e) => write!(f, "sequence: {e}"),
            Self::Action(e) => write!(f, "action: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Alarm errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmError {
    /// All 16 slots are in use.
    TableFull,
    /// A field failed validation; names the offending field.
    Invalid(&'static str),
    /// No rule carries this web id.
    NotFound(i32),
    /// The rule exists but is a built-in system rule.
    NotUserDefined(i32),
    /// Every web id has been handed out.
    IdsExhausted,
}

impl fmt::Display for AlarmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TableFull => write!(f, "alarm table full"),
            Self::Invalid(field) => write!(f, "invalid {field}"),
            Self::NotFound(id) => write!(f, "alarm {id} not found"),
            Self::NotUserDefined(id) => write!(f, "alarm {id} is a system alarm"),
            Self::IdsExhausted => write!(f, "no alarm ids left"),
        }
    }
}

impl From<AlarmError> for Error {
    fn from(e: AlarmError) -> Self {
        Self::Alarm(e)
    }
}

// ---------------------------------------------------------------------------
// Document store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// The named document does not exist.
    NotFound,
    /// The backing filesystem reported an error.
    Io,
    /// The document exists but does not parse or has the wrong version.
    Corrupted,
    /// The in-memory value could not be serialised.
    Encode,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "document not found"),
            Self::Io => write!(f, "I/O error"),
            Self::Corrupted => write!(f, "document corrupted"),
            Self::Encode => write!(f, "encode failed"),
        }
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Sequence errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceError {
    /// The pattern expands to zero strikes.
    Empty,
    /// The pattern expands past the 200-strike timeline.
    TooLong,
    /// A step names a negative bell index.
    InvalidBell,
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "pattern is empty"),
            Self::TooLong => write!(f, "pattern exceeds timeline capacity"),
            Self::InvalidBell => write!(f, "invalid bell index"),
        }
    }
}

impl From<SequenceError> for Error {
    fn from(e: SequenceError) -> Self {
        Self::Sequence(e)
    }
}

// ---------------------------------------------------------------------------
// Action errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionError {
    /// The alarm has no action bound to it.
    Unbound,
    /// A sequence is already playing.
    Busy,
    /// Manual sequences are refused around the chime points.
    ProtectionWindow,
    /// The wall clock is not synchronised.
    ClockUnavailable,
    /// No heating relay is fitted.
    NoHeating,
    /// The action code is not handled by the dispatcher.
    Unsupported,
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbound => write!(f, "no action bound"),
            Self::Busy => write!(f, "sequence already playing"),
            Self::ProtectionWindow => write!(f, "inside chime protection window"),
            Self::ClockUnavailable => write!(f, "clock not synchronised"),
            Self::NoHeating => write!(f, "no heating relay"),
            Self::Unsupported => write!(f, "unsupported action"),
        }
    }
}

impl From<ActionError> for Error {
    fn from(e: ActionError) -> Self {
        Self::Action(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
