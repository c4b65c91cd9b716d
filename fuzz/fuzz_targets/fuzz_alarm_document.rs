//! Fuzz target: `alarms.json` loader
//!
//! Feeds arbitrary bytes to the alarm loader through an in-memory store
//! and verifies:
//! - No panics under arbitrary input
//! - The table never exceeds `MAX_ALARMS`
//! - Every loaded alarm has a positive, unique web id below `next_web_id`
//! - The document written back always parses
//!
//! cargo fuzz run fuzz_alarm_document

#![no_main]

use libfuzzer_sys::fuzz_target;

use belltower::adapters::store::MemoryStore;
use belltower::app::ports::DocumentStore;
use belltower::scheduler::document::{ALARMS_DOCUMENT, parse_alarm_document};
use belltower::scheduler::rule::default_binding;
use belltower::scheduler::{AlarmScheduler, MAX_ALARMS};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let mut store = MemoryStore::new();
    let _ = store.write(ALARMS_DOCUMENT, text);

    let mut alarms = AlarmScheduler::new();
    alarms.set_binder(default_binding);
    let loaded = alarms.load_user_alarms(&mut store);

    assert!(loaded <= MAX_ALARMS);
    assert_eq!(alarms.len(), loaded);

    let list = alarms.list();
    let mut ids: Vec<i32> = list.iter().map(|r| r.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), list.len(), "duplicate web id loaded");
    for id in ids {
        assert!(id > 0 && id < alarms.next_web_id());
    }

    if alarms.persist(&mut store).is_ok() {
        let back = store.read(ALARMS_DOCUMENT).expect("just written");
        let doc = parse_alarm_document(&back).expect("written document must parse");
        assert_eq!(doc.alarms.len(), loaded);
    }
});
