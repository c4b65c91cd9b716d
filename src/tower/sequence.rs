//! Declarative bell patterns and their expansion into a flat timeline.
//!
//! A pattern is a short list of [`SequenceStep`]s; playback works on the
//! expanded [`Timeline`] where every strike is its own [`FlatStrike`].
//! Each strike's `interval_ms` is the gap *before* it; the first strike of
//! a timeline always sounds immediately.

use heapless::Vec;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::DocumentStore;
use crate::error::{SequenceError, StoreError};

/// Capacity of the playback timeline.
pub const MAX_FLAT_STRIKES: usize = 200;
/// Steps per named pattern.
pub const MAX_PATTERN_STEPS: usize = 32;

pub const SEQUENCES_DOCUMENT: &str = "sequences.json";
pub const SEQUENCE_DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceStep {
    pub bell_index: i32,
    pub repetitions: u16,
    pub interval_ms: u32,
}

impl SequenceStep {
    pub const fn new(bell_index: i32, repetitions: u16, interval_ms: u32) -> Self {
        Self {
            bell_index,
            repetitions,
            interval_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatStrike {
    pub bell_index: i32,
    pub interval_ms: u32,
}

pub type Pattern = Vec<SequenceStep, MAX_PATTERN_STEPS>;
pub type Timeline = Vec<FlatStrike, MAX_FLAT_STRIKES>;

/// Expand `steps` into one [`FlatStrike`] per repetition.
pub fn expand(steps: &[SequenceStep]) -> Result<Timeline, SequenceError> {
    let mut timeline = Timeline::new();
    append(&mut timeline, steps)?;
    if timeline.is_empty() {
        return Err(SequenceError::Empty);
    }
    Ok(timeline)
}

/// Append the expansion of `steps` to an existing timeline.
pub fn append(timeline: &mut Timeline, steps: &[SequenceStep]) -> Result<(), SequenceError> {
    for step in steps {
        if step.bell_index < 0 {
            return Err(SequenceError::InvalidBell);
        }
        let strike = FlatStrike {
            bell_index: step.bell_index,
            interval_ms: step.interval_ms,
        };
        for _ in 0..step.repetitions {
            timeline.push(strike).map_err(|_| SequenceError::TooLong)?;
        }
    }
    Ok(())
}

/// Total strikes a pattern expands to.
pub fn strike_count(steps: &[SequenceStep]) -> usize {
    steps.iter().map(|s| usize::from(s.repetitions)).sum()
}

// ═══════════════════════════════════════════════════════════════
//  Named patterns
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamedPattern {
    Funeral,
    Mass,
    Festival,
}

impl NamedPattern {
    pub const ALL: [Self; 3] = [Self::Funeral, Self::Mass, Self::Festival];

    pub fn name(self) -> &'static str {
        match self {
            Self::Funeral => "funeral",
            Self::Mass => "mass",
            Self::Festival => "festival",
        }
    }
}

/// Slow tolling on the large bell, closed by the small bell.
const DEFAULT_FUNERAL: &[SequenceStep] = &[
    SequenceStep::new(0, 10, 5000),
    SequenceStep::new(1, 1, 5000),
    SequenceStep::new(0, 10, 5000),
    SequenceStep::new(1, 1, 5000),
];

/// Three calls of three-and-one.
const DEFAULT_MASS: &[SequenceStep] = &[
    SequenceStep::new(0, 3, 2500),
    SequenceStep::new(1, 1, 2500),
    SequenceStep::new(0, 3, 2500),
    SequenceStep::new(1, 1, 2500),
    SequenceStep::new(0, 3, 2500),
    SequenceStep::new(1, 1, 2500),
];

/// Fast alternation of both bells.
const DEFAULT_FESTIVAL: &[SequenceStep] = &[
    SequenceStep::new(0, 2, 600),
    SequenceStep::new(1, 2, 600),
    SequenceStep::new(0, 2, 600),
    SequenceStep::new(1, 2, 600),
    SequenceStep::new(0, 2, 600),
    SequenceStep::new(1, 2, 600),
    SequenceStep::new(0, 2, 600),
    SequenceStep::new(1, 2, 600),
    SequenceStep::new(0, 4, 400),
    SequenceStep::new(1, 4, 400),
];

pub fn default_pattern(pattern: NamedPattern) -> &'static [SequenceStep] {
    match pattern {
        NamedPattern::Funeral => DEFAULT_FUNERAL,
        NamedPattern::Mass => DEFAULT_MASS,
        NamedPattern::Festival => DEFAULT_FESTIVAL,
    }
}

/// The three named patterns currently in force.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceLibrary {
    funeral: Pattern,
    mass: Pattern,
    festival: Pattern,
}

impl Default for SequenceLibrary {
    fn default() -> Self {
        Self::defaults()
    }
}

impl SequenceLibrary {
    /// Library holding the compiled-in patterns.
    pub fn defaults() -> Self {
        let from = |steps: &[SequenceStep]| Pattern::from_slice(steps).unwrap_or_default();
        Self {
            funeral: from(DEFAULT_FUNERAL),
            mass: from(DEFAULT_MASS),
            festival: from(DEFAULT_FESTIVAL),
        }
    }

    pub fn get(&self, pattern: NamedPattern) -> &[SequenceStep] {
        match pattern {
            NamedPattern::Funeral => &self.funeral,
            NamedPattern::Mass => &self.mass,
            NamedPattern::Festival => &self.festival,
        }
    }

    /// Replace a pattern.  The new steps must expand to a valid timeline.
    pub fn set(&mut self, pattern: NamedPattern, steps: &[SequenceStep]) -> Result<(), SequenceError> {
        let validated = validate_pattern(steps)?;
        match pattern {
            NamedPattern::Funeral => self.funeral = validated,
            NamedPattern::Mass => self.mass = validated,
            NamedPattern::Festival => self.festival = validated,
        }
        Ok(())
    }

    /// Whether `pattern` differs from its compiled default.
    pub fn is_overridden(&self, pattern: NamedPattern) -> bool {
        self.get(pattern) != default_pattern(pattern)
    }

    /// Load overrides from `sequences.json`.  A missing or unreadable
    /// document is replaced by one holding the defaults; a pattern that is
    /// absent or invalid falls back to its default individually.
    pub fn load_or_create(store: &mut impl DocumentStore) -> Self {
        let text = match store.read(SEQUENCES_DOCUMENT) {
            Ok(text) => text,
            Err(e) => {
                warn!("Sequences: {} unavailable ({}), writing defaults", SEQUENCES_DOCUMENT, e);
                let lib = Self::defaults();
                if let Err(e) = lib.save(store) {
                    warn!("Sequences: failed to write defaults: {}", e);
                }
                return lib;
            }
        };
        match parse_sequence_document(&text) {
            Ok(doc) => Self::from_document(&doc),
            Err(e) => {
                warn!("Sequences: {} is {}, writing defaults", SEQUENCES_DOCUMENT, e);
                let lib = Self::defaults();
                if let Err(e) = lib.save(store) {
                    warn!("Sequences: failed to write defaults: {}", e);
                }
                lib
            }
        }
    }

    pub fn from_document(doc: &SequenceDocument) -> Self {
        let mut lib = Self::defaults();
        for pattern in NamedPattern::ALL {
            let Some(steps) = doc.pattern(pattern) else {
                continue;
            };
            match lib.set(pattern, steps) {
                Ok(()) => info!(
                    "Sequences: {} override loaded ({} strikes)",
                    pattern.name(),
                    strike_count(steps)
                ),
                Err(e) => warn!("Sequences: {} override rejected: {}", pattern.name(), e),
            }
        }
        lib
    }

    pub fn to_document(&self) -> SequenceDocument {
        SequenceDocument {
            version: SEQUENCE_DOCUMENT_VERSION,
            funeral: Some(self.funeral.to_vec()),
            mass: Some(self.mass.to_vec()),
            festival: Some(self.festival.to_vec()),
        }
    }

    pub fn save(&self, store: &mut impl DocumentStore) -> Result<(), StoreError> {
        let text = serde_json::to_string(&self.to_document()).map_err(|_| StoreError::Encode)?;
        store.write(SEQUENCES_DOCUMENT, &text)
    }
}

fn validate_pattern(steps: &[SequenceStep]) -> Result<Pattern, SequenceError> {
    let pattern = Pattern::from_slice(steps).map_err(|()| SequenceError::TooLong)?;
    expand(&pattern)?;
    Ok(pattern)
}

// ═══════════════════════════════════════════════════════════════
//  Persisted document
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceDocument {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funeral: Option<std::vec::Vec<SequenceStep>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<std::vec::Vec<SequenceStep>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub festival: Option<std::vec::Vec<SequenceStep>>,
}

impl SequenceDocument {
    pub fn pattern(&self, pattern: NamedPattern) -> Option<&[SequenceStep]> {
        match pattern {
            NamedPattern::Funeral => self.funeral.as_deref(),
            NamedPattern::Mass => self.mass.as_deref(),
            NamedPattern::Festival => self.festival.as_deref(),
        }
    }
}

/// Parse and version-check a sequence document.
pub fn parse_sequence_document(text: &str) -> Result<SequenceDocument, StoreError> {
    let doc: SequenceDocument = serde_json::from_str(text).map_err(|_| StoreError::Corrupted)?;
    if doc.version != SEQUENCE_DOCUMENT_VERSION {
        return Err(StoreError::Corrupted);
    }
    Ok(doc)
}
