//! Bell tower controller: main entry point.
//!
//! Hexagonal architecture with a single cooperative control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        LogEventSink   FileStore   SystemClock │
//! │  (Bell+Relay+Clock)     (EventSink)    (Documents) (Clock)     │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              TowerService (pure logic)                 │    │
//! │  │  Alarms · Sequences · Heating · Protection             │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyOutputPin, OutputPin, PinDriver};
use esp_idf_hal::peripherals::Peripherals;
use log::{error, info, warn};

use belltower::adapters::hardware::HardwareAdapter;
use belltower::adapters::log_sink::LogEventSink;
use belltower::adapters::store::FileStore;
use belltower::adapters::time::SystemClock;
use belltower::app::service::TowerService;
use belltower::config;
use belltower::drivers::bell::BellBank;
use belltower::drivers::hw_init;
use belltower::drivers::relay::HeatingRelay;
use belltower::pins;
use belltower::tower::sequence::SequenceLibrary;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Belltower v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Storage ────────────────────────────────────────────
    let persistent = match hw_init::mount_storage(pins::STORAGE_BASE_PATH, pins::STORAGE_PARTITION) {
        Ok(()) => true,
        Err(e) => {
            error!("{}, running without persistence", e);
            false
        }
    };
    let mut store = FileStore::new(pins::STORAGE_BASE_PATH);

    // ── 3. Config and sequences (or defaults) ─────────────────
    let config = if persistent {
        config::load_or_default(&store)
    } else {
        config::TowerConfig::default()
    };
    let library = if persistent {
        SequenceLibrary::load_or_create(&mut store)
    } else {
        SequenceLibrary::defaults()
    };

    // ── 4. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let strikers: [PinDriver<'_, AnyOutputPin, _>; 2] = [
        PinDriver::output(peripherals.pins.gpio26.downgrade_output())?,
        PinDriver::output(peripherals.pins.gpio25.downgrade_output())?,
    ];
    let heating = PinDriver::output(peripherals.pins.gpio33.downgrade_output())?;
    info!(
        "Pins: bells {:?}, heating GPIO{}",
        pins::BELL_GPIOS,
        pins::HEATING_GPIO
    );

    let bells = BellBank::new(strikers, FreeRtos, config.strike_pulse_ms);
    let mut hw = HardwareAdapter::new(SystemClock::new(), bells, Some(HeatingRelay::new(heating)));
    let mut log_sink = LogEventSink::new();

    // ── 5. App service ────────────────────────────────────────
    let mut app = TowerService::new(config.clone(), library, hw.has_heating());
    app.start(&mut store, &mut log_sink);
    if !persistent {
        warn!("Alarm changes will not survive a reboot");
    }

    info!("System ready. Entering control loop.");

    // ── 6. Control loop ───────────────────────────────────────
    loop {
        app.tick(&mut hw, &mut log_sink);
        FreeRtos::delay_ms(config.control_loop_interval_ms);
    }
}
