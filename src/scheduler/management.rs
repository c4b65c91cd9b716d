//! Management API over the user-defined alarms.
//!
//! Only rules flagged `user_defined` are visible here.  Every mutation is
//! committed in memory first and then the whole user-defined subset is
//! written to `alarms.json`; a failed write is reported in the returned
//! [`Mutation`] but never rolls the change back.

use log::{info, warn};
use serde::Serialize;

use crate::app::ports::DocumentStore;
use crate::error::{AlarmError, StoreError};

use super::AlarmScheduler;
use super::MAX_ALARMS;
use super::document::{
    ALARMS_DOCUMENT, ALARM_DOCUMENT_VERSION, AlarmDocument, AlarmRecord, AlarmRequest,
    default_alarms, parse_alarm_document, render_alarm_document,
};
use super::rule::AlarmRule;

/// Web ids run from 1 up to, not including, this value.
pub const MAX_WEB_ID: i32 = i32::MAX;

/// A committed change plus the outcome of persisting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation<T> {
    pub value: T,
    pub persisted: Result<(), StoreError>,
}

impl<T> Mutation<T> {
    pub fn is_persisted(&self) -> bool {
        self.persisted.is_ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AlarmStats {
    pub total: usize,
    pub system: usize,
    pub user_defined: usize,
    pub enabled: usize,
    pub disabled: usize,
    pub free: usize,
    pub capacity: usize,
    pub next_web_id: i32,
}

impl AlarmScheduler {
    /// Add a user-defined alarm.  Returns its new web id.
    pub fn create(
        &mut self,
        request: &AlarmRequest,
        store: &mut impl DocumentStore,
    ) -> Result<Mutation<i32>, AlarmError> {
        let kind = request.validate()?;
        if self.is_full() {
            warn!("Alarms: table full, '{}' rejected", request.name);
            return Err(AlarmError::TableFull);
        }
        if self.next_web_id >= MAX_WEB_ID {
            warn!("Alarms: ids exhausted, '{}' rejected", request.name);
            return Err(AlarmError::IdsExhausted);
        }
        let web_id = self.next_web_id;
        let mut rule = request.to_rule(kind, web_id);
        rule.action = self.bind(kind);
        self.add(rule)?;
        self.next_web_id += 1;
        info!("Alarms: created #{} '{}'", web_id, request.name);
        Ok(Mutation {
            value: web_id,
            persisted: self.persist(store),
        })
    }

    /// Replace the editable fields of alarm `web_id`.  Its id and bound
    /// action are kept.
    pub fn update(
        &mut self,
        web_id: i32,
        request: &AlarmRequest,
        store: &mut impl DocumentStore,
    ) -> Result<Mutation<()>, AlarmError> {
        let kind = request.validate()?;
        let slot = self.user_slot(web_id)?;
        request.apply_to(&mut self.rules[slot], kind);
        info!("Alarms: updated #{}", web_id);
        Ok(Mutation {
            value: (),
            persisted: self.persist(store),
        })
    }

    /// Remove alarm `web_id`.  Later slots shift down; web ids don't change.
    pub fn delete(
        &mut self,
        web_id: i32,
        store: &mut impl DocumentStore,
    ) -> Result<Mutation<()>, AlarmError> {
        let slot = self.user_slot(web_id)?;
        let removed = self.rules.remove(slot);
        info!("Alarms: deleted #{} '{}'", web_id, removed.name);
        Ok(Mutation {
            value: (),
            persisted: self.persist(store),
        })
    }

    pub fn set_enabled(
        &mut self,
        web_id: i32,
        enabled: bool,
        store: &mut impl DocumentStore,
    ) -> Result<Mutation<()>, AlarmError> {
        let slot = self.user_slot(web_id)?;
        self.set_enabled_at(slot, enabled);
        info!(
            "Alarms: #{} {}",
            web_id,
            if enabled { "enabled" } else { "disabled" }
        );
        Ok(Mutation {
            value: (),
            persisted: self.persist(store),
        })
    }

    /// Every user-defined alarm, in table order.
    pub fn list(&self) -> Vec<AlarmRecord> {
        self.user_rules().map(AlarmRecord::from_rule).collect()
    }

    pub fn find(&self, web_id: i32) -> Option<&AlarmRule> {
        self.slot_of(web_id)
            .map(|slot| &self.rules[slot])
            .filter(|r| r.user_defined)
    }

    pub fn stats(&self) -> AlarmStats {
        let user_defined = self.user_rules().count();
        let enabled = self.rules.iter().filter(|r| r.enabled).count();
        AlarmStats {
            total: self.rules.len(),
            system: self.rules.len() - user_defined,
            user_defined,
            enabled,
            disabled: self.rules.len() - enabled,
            free: MAX_ALARMS - self.rules.len(),
            capacity: MAX_ALARMS,
            next_web_id: self.next_web_id,
        }
    }

    // ── Persistence ───────────────────────────────────────────

    /// Write the user-defined subset to `alarms.json`.
    pub fn persist(&self, store: &mut impl DocumentStore) -> Result<(), StoreError> {
        let alarms = self.list();
        let doc = AlarmDocument {
            version: ALARM_DOCUMENT_VERSION,
            total: alarms.len(),
            next_id: self.next_web_id,
            alarms,
        };
        let result = render_alarm_document(&doc).and_then(|text| store.write(ALARMS_DOCUMENT, &text));
        if let Err(e) = result {
            warn!("Alarms: persist failed: {}", e);
        }
        result
    }

    /// Load user-defined alarms from `alarms.json`, binding each with the
    /// installed binder.  A missing or corrupt document is replaced with one
    /// holding the [`default_alarms`].  Invalid or duplicate records are
    /// skipped.  Returns the number of alarms loaded.
    pub fn load_user_alarms(&mut self, store: &mut impl DocumentStore) -> usize {
        let doc = match store.read(ALARMS_DOCUMENT).and_then(|t| parse_alarm_document(&t)) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Alarms: {} unusable ({}), seeding defaults", ALARMS_DOCUMENT, e);
                return self.seed_defaults(store);
            }
        };

        let mut loaded = 0;
        let mut max_id = 0;
        for record in &doc.alarms {
            let kind = match record.fields.validate() {
                Ok(kind) => kind,
                Err(e) => {
                    warn!("Alarms: record #{} skipped: {}", record.id, e);
                    continue;
                }
            };
            if !(1..MAX_WEB_ID).contains(&record.id) || self.slot_of(record.id).is_some() {
                warn!("Alarms: record with bad or duplicate id {} skipped", record.id);
                continue;
            }
            let mut rule = record.fields.to_rule(kind, record.id);
            rule.action = self.bind(kind);
            if self.add(rule).is_err() {
                warn!("Alarms: table full, remaining records dropped");
                break;
            }
            max_id = max_id.max(record.id);
            loaded += 1;
        }
        self.next_web_id = self
            .next_web_id
            .max(doc.next_id.min(MAX_WEB_ID))
            .max(max_id + 1);
        info!(
            "Alarms: {} of {} stored alarms loaded, next id {}",
            loaded,
            doc.alarms.len(),
            self.next_web_id
        );
        loaded
    }

    fn seed_defaults(&mut self, store: &mut impl DocumentStore) -> usize {
        let mut seeded = 0;
        for request in default_alarms() {
            let Ok(kind) = request.validate() else {
                continue;
            };
            if self.next_web_id >= MAX_WEB_ID {
                break;
            }
            let mut rule = request.to_rule(kind, self.next_web_id);
            rule.action = self.bind(kind);
            if self.add(rule).is_err() {
                break;
            }
            self.next_web_id += 1;
            seeded += 1;
        }
        if let Err(e) = self.persist(store) {
            warn!("Alarms: could not create {}: {}", ALARMS_DOCUMENT, e);
        }
        info!("Alarms: {} default alarms seeded", seeded);
        seeded
    }

    fn user_rules(&self) -> impl Iterator<Item = &AlarmRule> {
        self.rules.iter().filter(|r| r.user_defined)
    }

    fn user_slot(&self, web_id: i32) -> Result<usize, AlarmError> {
        let slot = self.slot_of(web_id).ok_or(AlarmError::NotFound(web_id))?;
        if self.rules[slot].user_defined {
            Ok(slot)
        } else {
            Err(AlarmError::NotUserDefined(web_id))
        }
    }
}
