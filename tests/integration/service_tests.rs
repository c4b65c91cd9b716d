//! Integration tests for the TowerService → alarms → tower → ports pipeline.
//!
//! Drives the full control loop against [`MockHardware`] with a settable
//! wall clock and checks strikes, relay writes and emitted events.

use belltower::app::actions::ActionCode;
use belltower::app::events::TowerEvent;
use belltower::config::TowerConfig;
use belltower::error::ActionError;
use belltower::scheduler::document::AlarmRequest;
use belltower::scheduler::rule::SystemTask;
use belltower::tower::ActivePattern;
use belltower::tower::sequence::NamedPattern;
use belltower::tower::status::StatusFlag;

use super::mock_hw::{MockHardware, RecordingSink, monday_at, started_service};

/// Tick until the tower goes idle, stepping the monotonic clock.
fn play_out(
    app: &mut belltower::app::service::TowerService,
    hw: &mut MockHardware,
    sink: &mut RecordingSink,
) {
    for _ in 0..1000 {
        app.tick(hw, sink);
        if !app.tower().is_playing() {
            return;
        }
        hw.advance_ms(500);
    }
    panic!("sequence never finished");
}

// ── Start-up ──────────────────────────────────────────────────

#[test]
fn start_installs_system_rules() {
    let (app, _store, sink) = started_service(TowerConfig::default());
    assert_eq!(
        sink.events,
        vec![TowerEvent::Started {
            user_alarms: 0,
            system_alarms: 4
        }]
    );
    assert_eq!(app.alarms().len(), 4);
    assert!(app.alarms().list().is_empty());
}

#[test]
fn quarter_chimes_add_two_rules() {
    let config = TowerConfig {
        quarter_chimes: true,
        ..TowerConfig::default()
    };
    let (app, _store, _sink) = started_service(config);
    assert_eq!(app.alarms().len(), 6);
}

// ── Automatic chimes ─────────────────────────────────────────

#[test]
fn hour_chime_strikes_twelve_hour_count() {
    let (mut app, _store, mut sink) = started_service(TowerConfig::default());
    let mut hw = MockHardware::at(monday_at(16, 0));

    app.tick(&mut hw, &mut sink);
    assert!(sink.contains(&TowerEvent::ProtectionChanged(true)));
    assert!(sink.contains(&TowerEvent::SequenceStarted(ActivePattern::Hour {
        hour: 16,
        with_quarters: false
    })));
    assert_ne!(app.status_bitmask() & StatusFlag::HourChime.mask(), 0);

    play_out(&mut app, &mut hw, &mut sink);
    assert_eq!(hw.strikes, vec![0, 0, 0, 0]);
    assert_eq!(
        sink.count(|e| matches!(e, TowerEvent::BellStruck(1))),
        4
    );
    assert!(sink.contains(&TowerEvent::SequenceFinished));
    assert_eq!(app.status_bitmask() & 0x19, 0);
}

#[test]
fn hour_chime_fires_once_per_minute() {
    let (mut app, _store, mut sink) = started_service(TowerConfig::default());
    let mut hw = MockHardware::at(monday_at(13, 0));
    play_out(&mut app, &mut hw, &mut sink);
    // Same minute, later second: already fired.
    hw.advance_secs(30);
    sink.clear();
    app.tick(&mut hw, &mut sink);
    assert!(!app.tower().is_playing());
    assert_eq!(hw.strikes.len(), 1);
}

#[test]
fn hour_chime_with_quarters_prefix() {
    let config = TowerConfig {
        hour_with_quarters: true,
        ..TowerConfig::default()
    };
    let (mut app, _store, mut sink) = started_service(config);
    let mut hw = MockHardware::at(monday_at(14, 0));
    play_out(&mut app, &mut hw, &mut sink);
    assert_eq!(hw.strikes, vec![1, 1, 1, 1, 0, 0]);
}

#[test]
fn half_hour_strikes_quarter_bell_once() {
    let (mut app, _store, mut sink) = started_service(TowerConfig::default());
    let mut hw = MockHardware::at(monday_at(15, 30));
    play_out(&mut app, &mut hw, &mut sink);
    assert_eq!(hw.strikes, vec![1]);
    assert!(sink.contains(&TowerEvent::SequenceStarted(ActivePattern::HalfHour)));
}

#[test]
fn quarter_to_strikes_three() {
    let config = TowerConfig {
        quarter_chimes: true,
        ..TowerConfig::default()
    };
    let (mut app, _store, mut sink) = started_service(config);
    let mut hw = MockHardware::at(monday_at(15, 45));
    play_out(&mut app, &mut hw, &mut sink);
    assert_eq!(hw.strikes, vec![1, 1, 1]);
}

#[test]
fn chimes_silent_at_night() {
    let (mut app, _store, mut sink) = started_service(TowerConfig::default());
    let mut hw = MockHardware::at(monday_at(23, 0));
    app.tick(&mut hw, &mut sink);
    assert!(!app.tower().is_playing());
    assert!(hw.strikes.is_empty());
    // The window still applies.
    assert!(sink.contains(&TowerEvent::ProtectionChanged(true)));
}

#[test]
fn clock_loss_clears_protection_bit() {
    let (mut app, _store, mut sink) = started_service(TowerConfig::default());
    let mut hw = MockHardware::at(monday_at(15, 59));
    app.tick(&mut hw, &mut sink);
    assert!(app.tower().status().contains(StatusFlag::Protection));

    hw.epoch = None;
    app.tick(&mut hw, &mut sink);
    assert!(!app.tower().status().contains(StatusFlag::Protection));
    assert_eq!(
        sink.count(|e| matches!(e, TowerEvent::ProtectionChanged(false))),
        1
    );
    assert!(app.request_manual(NamedPattern::Mass, &mut sink).is_ok());
}

#[test]
fn nothing_fires_without_clock() {
    let (mut app, _store, mut sink) = started_service(TowerConfig::default());
    let mut hw = MockHardware::unsynced();
    for _ in 0..10 {
        app.tick(&mut hw, &mut sink);
        hw.advance_ms(1000);
    }
    assert!(hw.strikes.is_empty());
    assert_eq!(app.tick_count(), 10);
    assert_eq!(sink.events.len(), 1);
}

#[test]
fn maintenance_tasks_are_reported() {
    let (mut app, _store, mut sink) = started_service(TowerConfig::default());
    let mut hw = MockHardware::at(monday_at(12, 2));
    app.tick(&mut hw, &mut sink);
    assert!(sink.contains(&TowerEvent::MaintenanceDue(SystemTask::SyncClock)));
    hw.advance_secs(180);
    app.tick(&mut hw, &mut sink);
    assert!(sink.contains(&TowerEvent::MaintenanceDue(SystemTask::RefreshDns)));
}

// ── Manual sequences ─────────────────────────────────────────

#[test]
fn manual_mass_plays_to_completion() {
    let (mut app, _store, mut sink) = started_service(TowerConfig::default());
    let mut hw = MockHardware::at(monday_at(15, 10));
    app.handle_action(ActionCode::Mass, 0, &mut hw, &mut sink)
        .unwrap();
    assert!(sink.contains(&TowerEvent::SequenceStarted(ActivePattern::Named(
        NamedPattern::Mass
    ))));
    let expected = app.tower().remaining_strikes();
    play_out(&mut app, &mut hw, &mut sink);
    assert_eq!(hw.strikes.len(), expected);
    assert_eq!(app.tower().last_struck_bell(), Some(2));
}

#[test]
fn manual_request_refused_while_playing() {
    let (mut app, _store, mut sink) = started_service(TowerConfig::default());
    let mut hw = MockHardware::at(monday_at(15, 10));
    app.handle_action(ActionCode::Funeral, 0, &mut hw, &mut sink)
        .unwrap();
    let r = app.handle_action(ActionCode::Festival, 0, &mut hw, &mut sink);
    assert_eq!(r, Err(ActionError::Busy));
    assert!(sink.contains(&TowerEvent::ActionBlocked(ActionError::Busy)));
    assert_eq!(
        app.tower().active_pattern(),
        Some(ActivePattern::Named(NamedPattern::Funeral))
    );
}

#[test]
fn manual_request_refused_in_protection_window() {
    let (mut app, _store, mut sink) = started_service(TowerConfig::default());
    let mut hw = MockHardware::at(monday_at(15, 58));
    app.tick(&mut hw, &mut sink);
    let r = app.handle_action(ActionCode::Mass, 0, &mut hw, &mut sink);
    assert_eq!(r, Err(ActionError::ProtectionWindow));
    assert!(!app.tower().is_playing());

    // Window closes at :04 with the default margin.
    hw.epoch = Some(monday_at(16, 4));
    app.tick(&mut hw, &mut sink);
    play_out(&mut app, &mut hw, &mut sink);
    assert!(sink.contains(&TowerEvent::ProtectionChanged(false)));
    app.handle_action(ActionCode::Mass, 0, &mut hw, &mut sink)
        .unwrap();
}

#[test]
fn stop_aborts_and_clears_status() {
    let (mut app, _store, mut sink) = started_service(TowerConfig::default());
    let mut hw = MockHardware::at(monday_at(15, 10));
    app.handle_action(ActionCode::Festival, 0, &mut hw, &mut sink)
        .unwrap();
    app.tick(&mut hw, &mut sink);
    app.handle_action(ActionCode::Stop, 0, &mut hw, &mut sink)
        .unwrap();
    assert!(sink.contains(&TowerEvent::SequenceStopped));
    assert!(!app.tower().is_playing());
    assert_eq!(app.status_bitmask() & StatusFlag::Sequence.mask(), 0);

    // Stopping again is a quiet no-op.
    sink.clear();
    app.handle_action(ActionCode::Stop, 0, &mut hw, &mut sink)
        .unwrap();
    assert!(sink.events.is_empty());
}

// ── User alarms ──────────────────────────────────────────────

#[test]
fn user_alarm_starts_named_sequence() {
    let (mut app, mut store, mut sink) = started_service(TowerConfig::default());
    let request = AlarmRequest {
        name: "Evening mass".into(),
        description: String::new(),
        weekday_mask: 0x02,
        hour: 15,
        minute: 20,
        interval_minutes: 0,
        action: "MASS".into(),
        parameter: 0,
        enabled: true,
    };
    app.alarms_mut().create(&request, &mut store).unwrap();

    let mut hw = MockHardware::at(monday_at(15, 19));
    app.tick(&mut hw, &mut sink);
    assert!(!app.tower().is_playing());

    hw.advance_secs(60);
    app.tick(&mut hw, &mut sink);
    assert_eq!(
        app.tower().active_pattern(),
        Some(ActivePattern::Named(NamedPattern::Mass))
    );
}

#[test]
fn user_alarm_skipped_on_other_weekday() {
    let (mut app, mut store, mut sink) = started_service(TowerConfig::default());
    let request = AlarmRequest {
        name: "Sunday only".into(),
        description: String::new(),
        weekday_mask: 0x01,
        hour: 15,
        minute: 20,
        interval_minutes: 0,
        action: "FESTIVAL".into(),
        parameter: 0,
        enabled: true,
    };
    app.alarms_mut().create(&request, &mut store).unwrap();
    let mut hw = MockHardware::at(monday_at(15, 20));
    app.tick(&mut hw, &mut sink);
    assert!(!app.tower().is_playing());
}

/// Run the control loop for `secs` seconds at a 100 ms period.
fn run_for(
    app: &mut belltower::app::service::TowerService,
    hw: &mut MockHardware,
    sink: &mut RecordingSink,
    secs: i64,
) {
    for _ in 0..secs {
        for _ in 0..10 {
            app.tick(hw, sink);
            hw.advance_ms(100);
        }
        hw.epoch = hw.epoch.map(|e| e + 1);
    }
}

fn daily_mass_at(hour: u8, minute: u8) -> AlarmRequest {
    AlarmRequest {
        name: "Daily mass".into(),
        description: String::new(),
        weekday_mask: 0x7F,
        hour,
        minute,
        interval_minutes: 0,
        action: "MASS".into(),
        parameter: 0,
        enabled: true,
    }
}

#[test]
fn alarm_sharing_the_hour_chime_minute_rings_after_it() {
    let (mut app, mut store, mut sink) = started_service(TowerConfig::default());
    app.alarms_mut()
        .create(&daily_mass_at(12, 0), &mut store)
        .unwrap();
    let mut hw = MockHardware::at(monday_at(12, 0));
    run_for(&mut app, &mut hw, &mut sink, 600);

    let started: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            TowerEvent::SequenceStarted(p) => Some(*p),
            _ => None,
        })
        .collect();
    assert_eq!(
        started,
        [
            ActivePattern::Hour {
                hour: 12,
                with_quarters: false
            },
            ActivePattern::Named(NamedPattern::Mass)
        ]
    );
    assert!(!sink.contains(&TowerEvent::ActionBlocked(ActionError::Busy)));
}

#[test]
fn alarm_waits_for_playing_sequence_within_its_minute() {
    let (mut app, mut store, mut sink) = started_service(TowerConfig::default());
    app.alarms_mut()
        .create(&daily_mass_at(15, 20), &mut store)
        .unwrap();
    let mut hw = MockHardware::at(monday_at(15, 19) + 58);
    app.tower_mut().start_hour(3, false);
    run_for(&mut app, &mut hw, &mut sink, 30);

    let finished = sink
        .events
        .iter()
        .position(|e| *e == TowerEvent::SequenceFinished)
        .unwrap();
    let mass = sink
        .events
        .iter()
        .position(|e| *e == TowerEvent::SequenceStarted(ActivePattern::Named(NamedPattern::Mass)))
        .unwrap();
    assert!(finished < mass);
    assert_eq!(hw.strikes[..3], [0, 0, 0]);
}

#[test]
fn alarm_lost_when_tower_busy_all_minute() {
    let (mut app, mut store, mut sink) = started_service(TowerConfig::default());
    app.alarms_mut()
        .create(&daily_mass_at(15, 20), &mut store)
        .unwrap();
    let mut hw = MockHardware::at(monday_at(15, 20));
    app.handle_action(ActionCode::Funeral, 0, &mut hw, &mut sink)
        .unwrap();
    // Keep the funeral toll going past 15:20 by never advancing the
    // monotonic clock beyond the first strike.
    for _ in 0..61 {
        app.tick(&mut hw, &mut sink);
        hw.epoch = hw.epoch.map(|e| e + 1);
    }
    assert!(app.tower().is_playing());
    app.handle_action(ActionCode::Stop, 0, &mut hw, &mut sink)
        .unwrap();
    run_for(&mut app, &mut hw, &mut sink, 60);
    assert!(!sink.contains(&TowerEvent::SequenceStarted(ActivePattern::Named(
        NamedPattern::Mass
    ))));
}

// ── Heating ──────────────────────────────────────────────────

#[test]
fn heating_runs_for_default_duration() {
    let (mut app, _store, mut sink) = started_service(TowerConfig::default());
    let mut hw = MockHardware::at(monday_at(15, 5));
    app.handle_action(ActionCode::HeatOn, 0, &mut hw, &mut sink)
        .unwrap();
    assert!(hw.heating);
    assert!(sink.contains(&TowerEvent::HeatingChanged {
        on: true,
        minutes: 45
    }));
    assert_ne!(app.status_bitmask() & StatusFlag::Heating.mask(), 0);

    hw.advance_secs(44 * 60);
    app.tick(&mut hw, &mut sink);
    assert!(hw.heating);

    hw.advance_secs(60);
    app.tick(&mut hw, &mut sink);
    assert!(!hw.heating);
    assert!(sink.contains(&TowerEvent::HeatingChanged {
        on: false,
        minutes: 0
    }));
    assert_eq!(app.status_bitmask() & StatusFlag::Heating.mask(), 0);
}

#[test]
fn set_heat_timer_is_clamped_and_remembered() {
    let (mut app, _store, mut sink) = started_service(TowerConfig::default());
    let mut hw = MockHardware::at(monday_at(15, 5));
    app.handle_action(ActionCode::SetHeatTimer, 500, &mut hw, &mut sink)
        .unwrap();
    assert_eq!(app.heat_minutes(), 120);
    app.handle_action(ActionCode::HeatOff, 0, &mut hw, &mut sink)
        .unwrap();
    assert!(!hw.heating);
    app.handle_action(ActionCode::HeatOn, 0, &mut hw, &mut sink)
        .unwrap();
    assert!(sink.contains(&TowerEvent::HeatingChanged {
        on: true,
        minutes: 120
    }));
}

#[test]
fn heating_needs_a_clock() {
    let (mut app, _store, mut sink) = started_service(TowerConfig::default());
    let mut hw = MockHardware::unsynced();
    let r = app.handle_action(ActionCode::HeatOn, 0, &mut hw, &mut sink);
    assert_eq!(r, Err(ActionError::ClockUnavailable));
    assert!(!hw.heating);
    assert!(sink.contains(&TowerEvent::ActionBlocked(
        ActionError::ClockUnavailable
    )));
}

// ── Status bits ──────────────────────────────────────────────

#[test]
fn network_loss_sets_status_bit() {
    let (mut app, _store, mut sink) = started_service(TowerConfig::default());
    app.set_network_available(false, &mut sink);
    assert_ne!(app.status_bitmask() & StatusFlag::NoNetwork.mask(), 0);
    assert!(sink.contains(&TowerEvent::NetworkChanged { available: false }));
    sink.clear();
    app.set_network_available(false, &mut sink);
    assert!(sink.events.is_empty());
    app.set_network_available(true, &mut sink);
    assert_eq!(app.status_bitmask() & StatusFlag::NoNetwork.mask(), 0);
}
