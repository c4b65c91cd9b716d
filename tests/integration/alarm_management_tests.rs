//! Integration tests for user alarm management and its persistence.
//!
//! Exercises create / update / delete / enable against a [`MemoryStore`],
//! then restarts a fresh service on the same store to check what survives.

use belltower::app::events::TowerEvent;
use belltower::app::ports::DocumentStore;
use belltower::app::service::TowerService;
use belltower::adapters::store::MemoryStore;
use belltower::config::TowerConfig;
use belltower::error::{AlarmError, StoreError};
use belltower::scheduler::MAX_ALARMS;
use belltower::scheduler::document::{ALARMS_DOCUMENT, AlarmRequest, parse_alarm_document};
use belltower::tower::sequence::SequenceLibrary;

use super::mock_hw::{RecordingSink, started_service};

fn request(name: &str, hour: u8, minute: u8, action: &str) -> AlarmRequest {
    AlarmRequest {
        name: name.into(),
        description: String::new(),
        weekday_mask: 0x7F,
        hour,
        minute,
        interval_minutes: 0,
        action: action.into(),
        parameter: 0,
        enabled: true,
    }
}

fn restart(store: &mut MemoryStore) -> (TowerService, RecordingSink) {
    let mut sink = RecordingSink::new();
    let mut app = TowerService::new(TowerConfig::default(), SequenceLibrary::defaults(), true);
    app.start(store, &mut sink);
    (app, sink)
}

#[test]
fn first_start_seeds_sunday_masses() {
    let mut store = MemoryStore::new();
    let (app, sink) = restart(&mut store);
    assert!(sink.contains(&TowerEvent::Started {
        user_alarms: 2,
        system_alarms: 4
    }));

    let doc = parse_alarm_document(&store.read(ALARMS_DOCUMENT).unwrap()).unwrap();
    assert_eq!(doc.next_id, 3);
    let seeded: Vec<_> = doc
        .alarms
        .iter()
        .map(|r| (r.id, r.fields.weekday_mask, r.fields.hour, r.fields.minute))
        .collect();
    assert_eq!(seeded, [(1, 0x01, 11, 5), (2, 0x01, 11, 25)]);
    assert!(doc.alarms.iter().all(|r| r.fields.action == "MASS" && r.fields.enabled));
    assert_eq!(app.alarms().list(), doc.alarms);
}

#[test]
fn deleted_defaults_stay_deleted() {
    let mut store = MemoryStore::new();
    let (mut app, _sink) = restart(&mut store);
    app.alarms_mut().delete(1, &mut store).unwrap();
    app.alarms_mut().delete(2, &mut store).unwrap();

    let (app, sink) = restart(&mut store);
    assert!(app.alarms().list().is_empty());
    assert!(sink.contains(&TowerEvent::Started {
        user_alarms: 0,
        system_alarms: 4
    }));
    assert_eq!(app.alarms().next_web_id(), 3);
}

#[test]
fn created_alarms_survive_restart() {
    let (mut app, mut store, _sink) = started_service(TowerConfig::default());
    let a = app
        .alarms_mut()
        .create(&request("Morning", 8, 0, "MASS"), &mut store)
        .unwrap();
    let b = app
        .alarms_mut()
        .create(&request("Vespers", 18, 30, "FESTIVAL"), &mut store)
        .unwrap();
    assert!(a.is_persisted() && b.is_persisted());
    assert_eq!((a.value, b.value), (1, 2));

    let (app, sink) = restart(&mut store);
    assert!(sink.contains(&TowerEvent::Started {
        user_alarms: 2,
        system_alarms: 4
    }));
    let names: Vec<_> = app.alarms().list().into_iter().map(|r| r.fields.name).collect();
    assert_eq!(names, ["Morning", "Vespers"]);
    assert_eq!(app.alarms().next_web_id(), 3);
}

#[test]
fn delete_keeps_ids_of_remaining_alarms() {
    let (mut app, mut store, _sink) = started_service(TowerConfig::default());
    for (i, name) in ["a", "b", "c"].iter().enumerate() {
        app.alarms_mut()
            .create(&request(name, 9, i as u8, "MASS"), &mut store)
            .unwrap();
    }
    app.alarms_mut().delete(2, &mut store).unwrap();
    let ids: Vec<_> = app.alarms().list().iter().map(|r| r.id).collect();
    assert_eq!(ids, [1, 3]);
    assert_eq!(
        app.alarms_mut().delete(2, &mut store).map(|m| m.value),
        Err(AlarmError::NotFound(2))
    );

    // Ids are never reused, even after a restart.
    let (mut app, _sink) = restart(&mut store);
    let m = app
        .alarms_mut()
        .create(&request("d", 10, 0, "FUNERAL"), &mut store)
        .unwrap();
    assert_eq!(m.value, 4);
}

#[test]
fn update_replaces_fields_and_keeps_id() {
    let (mut app, mut store, _sink) = started_service(TowerConfig::default());
    let id = app
        .alarms_mut()
        .create(&request("Morning", 8, 0, "MASS"), &mut store)
        .unwrap()
        .value;
    let mut changed = request("Late morning", 10, 15, "MASS");
    changed.weekday_mask = 0x01;
    app.alarms_mut().update(id, &changed, &mut store).unwrap();

    let (app, _sink) = restart(&mut store);
    let rule = app.alarms().find(id).unwrap();
    assert_eq!(rule.name.as_str(), "Late morning");
    assert_eq!((rule.hour, rule.minute, rule.weekday_mask), (10, 15, 0x01));
}

#[test]
fn disabled_alarm_persists_disabled() {
    let (mut app, mut store, _sink) = started_service(TowerConfig::default());
    let id = app
        .alarms_mut()
        .create(&request("Noon", 12, 0, "HOUR_CHIME"), &mut store)
        .unwrap()
        .value;
    app.alarms_mut().set_enabled(id, false, &mut store).unwrap();
    let (app, _sink) = restart(&mut store);
    assert!(!app.alarms().find(id).unwrap().enabled);
    assert_eq!(app.alarms().stats().disabled, 1);
}

#[test]
fn invalid_requests_are_rejected() {
    let (mut app, mut store, _sink) = started_service(TowerConfig::default());
    let alarms = app.alarms_mut();
    assert_eq!(
        alarms.create(&request("x", 24, 0, "MASS"), &mut store).map(|m| m.value),
        Err(AlarmError::Invalid("hour"))
    );
    assert_eq!(
        alarms.create(&request("x", 8, 0, "DANCE"), &mut store).map(|m| m.value),
        Err(AlarmError::Invalid("action"))
    );
    assert_eq!(
        alarms.create(&request("  ", 8, 0, "MASS"), &mut store).map(|m| m.value),
        Err(AlarmError::Invalid("name"))
    );
    assert!(alarms.list().is_empty());
}

#[test]
fn table_full_after_system_rules() {
    let (mut app, mut store, _sink) = started_service(TowerConfig::default());
    let free = MAX_ALARMS - app.alarms().len();
    for i in 0..free {
        app.alarms_mut()
            .create(&request("fill", 6, i as u8, "MASS"), &mut store)
            .unwrap();
    }
    assert!(app.alarms().is_full());
    assert_eq!(
        app.alarms_mut()
            .create(&request("one more", 7, 0, "MASS"), &mut store)
            .map(|m| m.value),
        Err(AlarmError::TableFull)
    );
    let stats = app.alarms().stats();
    assert_eq!((stats.user_defined, stats.system, stats.free), (free, 4, 0));
}

#[test]
fn system_rules_are_not_editable() {
    let (mut app, mut store, _sink) = started_service(TowerConfig::default());
    assert!(app.alarms().find(-1).is_none());
    assert!(app.alarms_mut().delete(-1, &mut store).is_err());
    assert_eq!(app.alarms().len(), 4);
}

#[test]
fn write_failure_keeps_change_in_memory() {
    let (mut app, mut store, _sink) = started_service(TowerConfig::default());
    store.set_read_only(true);
    let m = app
        .alarms_mut()
        .create(&request("Unsaved", 8, 0, "MASS"), &mut store)
        .unwrap();
    assert_eq!(m.persisted, Err(StoreError::Io));
    assert_eq!(app.alarms().list().len(), 1);
}

#[test]
fn corrupt_document_is_replaced_with_defaults() {
    let mut store = MemoryStore::new();
    store.write(ALARMS_DOCUMENT, "{\"alarms\": [").unwrap();
    let (app, sink) = restart(&mut store);
    assert_eq!(app.alarms().list().len(), 2);
    assert!(sink.contains(&TowerEvent::Started {
        user_alarms: 2,
        system_alarms: 4
    }));
    let doc = parse_alarm_document(&store.read(ALARMS_DOCUMENT).unwrap()).unwrap();
    assert_eq!(doc.alarms.len(), 2);
}

#[test]
fn bad_records_skipped_on_load() {
    let mut store = MemoryStore::new();
    let text = r#"{
        "version": 1, "total": 3, "next_id": 2,
        "alarms": [
            {"id": 5, "name": "Good", "weekday_mask": 127, "hour": 7, "minute": 0, "action": "MASS"},
            {"id": 5, "name": "Duplicate", "weekday_mask": 127, "hour": 8, "minute": 0, "action": "MASS"},
            {"id": 6, "name": "Bad hour", "weekday_mask": 127, "hour": 30, "minute": 0, "action": "MASS"}
        ]
    }"#;
    store.write(ALARMS_DOCUMENT, text).unwrap();
    let (app, _sink) = restart(&mut store);
    let list = app.alarms().list();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].fields.name, "Good");
    assert_eq!(app.alarms().next_web_id(), 6);
}

#[test]
fn id_at_upper_bound_is_skipped_not_fatal() {
    let mut store = MemoryStore::new();
    let text = r#"{
        "version": 1, "total": 2, "next_id": 2147483647,
        "alarms": [
            {"id": 2147483647, "name": "Overflow", "weekday_mask": 127, "hour": 7, "minute": 0, "action": "MASS"},
            {"id": 4, "name": "Kept", "weekday_mask": 127, "hour": 8, "minute": 0, "action": "MASS"}
        ]
    }"#;
    store.write(ALARMS_DOCUMENT, text).unwrap();
    let (mut app, _sink) = restart(&mut store);
    let ids: Vec<_> = app.alarms().list().iter().map(|r| r.id).collect();
    assert_eq!(ids, [4]);
    assert_eq!(app.alarms().next_web_id(), i32::MAX);
    assert_eq!(
        app.alarms_mut()
            .create(&request("No room", 9, 0, "MASS"), &mut store)
            .map(|m| m.value),
        Err(AlarmError::IdsExhausted)
    );
    assert_eq!(app.alarms().list().len(), 1);
}
