//! Persisted form of the user-defined alarms (`alarms.json`).
//!
//! ```json
//! { "version": 1, "total": 1, "next_id": 4,
//!   "alarms": [ { "id": 3, "name": "Sunday mass", "description": "",
//!                 "weekday_mask": 1, "hour": 11, "minute": 0,
//!                 "interval_minutes": 0, "action": "MASS",
//!                 "parameter": 0, "enabled": true } ] }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{AlarmError, StoreError};

use super::rule::{
    ALL_DAYS, ActionKind, AlarmAction, AlarmRule, MAX_DESCRIPTION_LEN, MAX_NAME_LEN, WILDCARD,
    truncated, weekday_bit,
};

pub const ALARMS_DOCUMENT: &str = "alarms.json";
pub const ALARM_DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmDocument {
    pub version: u32,
    pub total: usize,
    pub next_id: i32,
    pub alarms: Vec<AlarmRecord>,
}

/// The editable fields of a user-defined alarm, as submitted by the
/// management API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub weekday_mask: u8,
    pub hour: u8,
    pub minute: u8,
    #[serde(default)]
    pub interval_minutes: u16,
    /// One of the [`ActionKind`] tags.
    pub action: String,
    #[serde(default)]
    pub parameter: u16,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

/// Alarms seeded when no usable `alarms.json` exists: the two Sunday
/// calls to mass.
pub fn default_alarms() -> [AlarmRequest; 2] {
    let sunday_mass = |minute: u8, name: &str, description: &str| AlarmRequest {
        name: name.into(),
        description: description.into(),
        weekday_mask: weekday_bit(0),
        hour: 11,
        minute,
        interval_minutes: 0,
        action: ActionKind::Mass.tag().into(),
        parameter: 0,
        enabled: true,
    };
    [
        sunday_mass(5, "Sunday mass 11:05", "First call for Sunday mass"),
        sunday_mass(25, "Sunday mass 11:25", "Second call for Sunday mass"),
    ]
}

/// One stored alarm: its web id plus the request fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmRecord {
    pub id: i32,
    #[serde(flatten)]
    pub fields: AlarmRequest,
}

impl AlarmRequest {
    /// Check every field; returns the parsed action tag.
    pub fn validate(&self) -> Result<ActionKind, AlarmError> {
        if self.name.trim().is_empty() {
            return Err(AlarmError::Invalid("name"));
        }
        if self.hour > 23 && self.hour != WILDCARD {
            return Err(AlarmError::Invalid("hour"));
        }
        if self.minute > 59 && self.minute != WILDCARD {
            return Err(AlarmError::Invalid("minute"));
        }
        if self.weekday_mask & ALL_DAYS == 0 || self.weekday_mask & !ALL_DAYS != 0 {
            return Err(AlarmError::Invalid("weekday_mask"));
        }
        ActionKind::from_tag(&self.action).ok_or(AlarmError::Invalid("action"))
    }

    /// Build a user-defined rule.  The action is left for the caller to bind.
    pub fn to_rule(&self, kind: ActionKind, web_id: i32) -> AlarmRule {
        let mut rule = if self.interval_minutes > 0 {
            AlarmRule::periodic(self.weekday_mask, self.interval_minutes, AlarmAction::Unbound, self.parameter)
        } else {
            AlarmRule::fixed(self.weekday_mask, self.hour, self.minute, AlarmAction::Unbound, self.parameter)
        };
        self.apply_to(&mut rule, kind);
        rule.user_defined = true;
        rule.web_id = web_id;
        rule
    }

    /// Overwrite the editable fields of `rule`, keeping its action and id.
    pub fn apply_to(&self, rule: &mut AlarmRule, kind: ActionKind) {
        rule.name = truncated::<MAX_NAME_LEN>(self.name.trim());
        rule.description = truncated::<MAX_DESCRIPTION_LEN>(&self.description);
        rule.weekday_mask = self.weekday_mask;
        rule.hour = self.hour;
        rule.minute = self.minute;
        rule.interval_minutes = self.interval_minutes;
        rule.parameter = self.parameter;
        rule.enabled = self.enabled;
        rule.kind = Some(kind);
        rule.reset_cache();
    }

    pub fn from_rule(rule: &AlarmRule) -> Self {
        Self {
            name: rule.name.as_str().into(),
            description: rule.description.as_str().into(),
            weekday_mask: rule.weekday_mask,
            hour: rule.hour,
            minute: rule.minute,
            interval_minutes: rule.interval_minutes,
            action: rule.kind.map_or("", ActionKind::tag).into(),
            parameter: rule.parameter,
            enabled: rule.enabled,
        }
    }
}

impl AlarmRecord {
    pub fn from_rule(rule: &AlarmRule) -> Self {
        Self {
            id: rule.web_id,
            fields: AlarmRequest::from_rule(rule),
        }
    }
}

/// Parse and version-check an alarm document.  Record contents are not
/// validated here; the loader skips invalid records individually.
pub fn parse_alarm_document(text: &str) -> Result<AlarmDocument, StoreError> {
    let doc: AlarmDocument = serde_json::from_str(text).map_err(|_| StoreError::Corrupted)?;
    if doc.version != ALARM_DOCUMENT_VERSION {
        return Err(StoreError::Corrupted);
    }
    Ok(doc)
}

pub fn render_alarm_document(doc: &AlarmDocument) -> Result<String, StoreError> {
    serde_json::to_string(doc).map_err(|_| StoreError::Encode)
}
