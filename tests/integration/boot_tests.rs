//! Integration tests for the boot path: storage, config, sequences.
//!
//! Mirrors what `main` does on the device, using a [`FileStore`] in a
//! temporary directory in place of the SPIFFS mount.

use belltower::adapters::store::{FileStore, MemoryStore};
use belltower::app::actions::ActionCode;
use belltower::app::ports::{ConfigError, ConfigPort, DocumentStore};
use belltower::app::service::TowerService;
use belltower::config::{self, CONFIG_DOCUMENT, TowerConfig};
use belltower::drivers::hw_init::mount_storage;
use belltower::scheduler::document::{ALARMS_DOCUMENT, AlarmRequest};
use belltower::tower::sequence::{
    NamedPattern, SEQUENCES_DOCUMENT, SequenceLibrary, SequenceStep, parse_sequence_document,
};

use super::mock_hw::{MockHardware, RecordingSink, monday_at};

fn boot(store: &mut FileStore) -> (TowerService, RecordingSink) {
    let config = config::load_or_default(&*store);
    let library = SequenceLibrary::load_or_create(store);
    let mut sink = RecordingSink::new();
    let mut app = TowerService::new(config, library, true);
    app.start(store, &mut sink);
    (app, sink)
}

#[test]
fn first_boot_creates_documents() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("spiffs");
    mount_storage(root.to_str().unwrap(), "spiffs").unwrap();
    let mut store = FileStore::new(&root);

    let (app, _sink) = boot(&mut store);
    assert_eq!(app.config(), &TowerConfig::default());
    assert!(store.exists(ALARMS_DOCUMENT));
    assert_eq!(app.alarms().list().len(), 2);
    assert!(store.exists(SEQUENCES_DOCUMENT));
    // Config stays absent until someone saves one.
    assert!(!store.exists(CONFIG_DOCUMENT));

    let doc = parse_sequence_document(&store.read(SEQUENCES_DOCUMENT).unwrap()).unwrap();
    assert_eq!(SequenceLibrary::from_document(&doc), SequenceLibrary::defaults());
}

#[test]
fn state_survives_reboot_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::new(dir.path());
    let (mut app, _sink) = boot(&mut store);

    let request = AlarmRequest {
        name: "Angelus".into(),
        description: "Noon prayer".into(),
        weekday_mask: 0x7F,
        hour: 12,
        minute: 0,
        interval_minutes: 0,
        action: "FUNERAL".into(),
        parameter: 0,
        enabled: true,
    };
    app.alarms_mut().create(&request, &mut store).unwrap();
    let quieter = TowerConfig {
        night_start_hour: 21,
        ..TowerConfig::default()
    };
    app.update_config(quieter.clone(), &mut store).unwrap();
    drop(app);

    let (app, _sink) = boot(&mut store);
    assert_eq!(app.config(), &quieter);
    let descriptions: Vec<_> = app
        .alarms()
        .list()
        .into_iter()
        .map(|r| r.fields.description)
        .collect();
    assert_eq!(
        descriptions,
        [
            "First call for Sunday mass",
            "Second call for Sunday mass",
            "Noon prayer"
        ]
    );
}

#[test]
fn sequence_override_is_played() {
    let mut store = MemoryStore::new();
    let text = r#"{"version":1,"mass":[{"bell_index":1,"repetitions":2,"interval_ms":300}]}"#;
    store.write(SEQUENCES_DOCUMENT, text).unwrap();
    let library = SequenceLibrary::load_or_create(&mut store);
    assert!(library.is_overridden(NamedPattern::Mass));
    assert_eq!(library.get(NamedPattern::Mass), &[SequenceStep::new(1, 2, 300)]);

    let mut sink = RecordingSink::new();
    let mut app = TowerService::new(TowerConfig::default(), library, false);
    app.start(&mut store, &mut sink);
    let mut hw = MockHardware::at(monday_at(15, 10));
    app.handle_action(ActionCode::Mass, 0, &mut hw, &mut sink)
        .unwrap();
    for _ in 0..4 {
        app.tick(&mut hw, &mut sink);
        hw.advance_ms(300);
    }
    assert_eq!(hw.strikes, vec![1, 1]);
    assert!(!app.tower().is_playing());
}

#[test]
fn corrupt_sequences_are_rewritten() {
    let mut store = MemoryStore::new();
    store.write(SEQUENCES_DOCUMENT, "{{{").unwrap();
    let library = SequenceLibrary::load_or_create(&mut store);
    assert_eq!(library, SequenceLibrary::defaults());
    assert!(parse_sequence_document(&store.read(SEQUENCES_DOCUMENT).unwrap()).is_ok());
}

#[test]
fn invalid_config_falls_back_to_defaults() {
    let mut store = MemoryStore::new();
    store
        .write(CONFIG_DOCUMENT, r#"{"strike_pulse_ms": 5}"#)
        .unwrap();
    assert!(matches!(
        store.load_config(),
        Err(ConfigError::ValidationFailed(_))
    ));
    assert_eq!(config::load_or_default(&store), TowerConfig::default());
}

#[test]
fn rejected_config_update_changes_nothing() {
    let mut store = MemoryStore::new();
    let mut sink = RecordingSink::new();
    let mut app = TowerService::new(TowerConfig::default(), SequenceLibrary::defaults(), true);
    app.start(&mut store, &mut sink);
    let bad = TowerConfig {
        default_heating_minutes: 0,
        ..TowerConfig::default()
    };
    assert!(app.update_config(bad, &mut store).is_err());
    assert_eq!(app.config(), &TowerConfig::default());
    assert!(!store.exists(CONFIG_DOCUMENT));
}

#[test]
fn heating_default_follows_config() {
    let mut store = MemoryStore::new();
    let mut sink = RecordingSink::new();
    let mut app = TowerService::new(TowerConfig::default(), SequenceLibrary::defaults(), true);
    app.start(&mut store, &mut sink);
    let config = TowerConfig {
        default_heating_minutes: 30,
        ..TowerConfig::default()
    };
    app.update_config(config, &mut store).unwrap();
    assert_eq!(app.heat_minutes(), 30);
    let mut hw = MockHardware::at(monday_at(15, 10));
    app.handle_action(ActionCode::HeatOn, 0, &mut hw, &mut sink)
        .unwrap();
    assert!(app.tower().heating().is_some_and(|h| h.requested_minutes() == 30));
}
