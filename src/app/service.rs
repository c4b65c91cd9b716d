//! Application service: the hexagonal core.
//!
//! [`TowerService`] owns the bell tower, the alarm table, the protection
//! monitor and the configuration.  It exposes a hardware-agnostic API;
//! all I/O flows through port traits injected at call sites, making the
//! entire service testable with mock adapters.
//!
//! ```text
//!   ClockSource ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                   │         TowerService          │
//!      BellPort ◀── │ Alarms · Tower · Protection   │
//!     RelayPort ◀── └──────────────────────────────┘ ◀─▶ DocumentStore
//! ```

use log::{debug, info, warn};

use crate::clock::WallClock;
use crate::config::{TowerConfig, validate_config};
use crate::error::ActionError;
use crate::heating::HeatingTimer;
use crate::protection::ProtectionMonitor;
use crate::scheduler::rule::{
    ALL_DAYS, AlarmAction, AlarmRule, SystemTask, WILDCARD, default_binding,
};
use crate::scheduler::{AlarmScheduler, NightHours};
use crate::tower::sequence::{NamedPattern, SequenceLibrary};
use crate::tower::status::StatusFlag;
use crate::tower::{ActivePattern, BellTower};

use super::actions::ActionCode;
use super::events::TowerEvent;
use super::ports::{
    AlarmDelegate, BellPort, ClockSource, ConfigError, ConfigPort, DocumentStore, EventSink,
    RelayPort,
};

// ───────────────────────────────────────────────────────────────
// TowerService
// ───────────────────────────────────────────────────────────────

pub struct TowerService {
    tower: BellTower,
    alarms: AlarmScheduler,
    protection: ProtectionMonitor,
    config: TowerConfig,
    /// Heating duration used when an action gives none.
    heat_minutes: u16,
    network_available: bool,
    tick_count: u64,
}

impl TowerService {
    /// Build the service.  `heating_fitted` is false on towers without a
    /// heating relay.
    pub fn new(config: TowerConfig, library: SequenceLibrary, heating_fitted: bool) -> Self {
        let heating = heating_fitted.then(HeatingTimer::new);
        Self {
            tower: BellTower::new(library, heating),
            alarms: AlarmScheduler::new(),
            protection: ProtectionMonitor::new(),
            heat_minutes: config.default_heating_minutes,
            config,
            network_available: true,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Load the user alarms, bind them, then append the system rules.
    pub fn start(&mut self, store: &mut impl DocumentStore, sink: &mut impl EventSink) {
        let user_alarms = self.alarms.load_user_alarms(store);
        self.alarms.set_binder(default_binding);
        let system_alarms = self.install_system_rules();
        info!(
            "TowerService started: {} user alarms, {} system alarms",
            user_alarms, system_alarms
        );
        sink.emit(&TowerEvent::Started {
            user_alarms,
            system_alarms,
        });
    }

    fn install_system_rules(&mut self) -> usize {
        let cfg = &self.config;
        let invoke = |task, hour, minute, name| {
            AlarmRule::fixed(ALL_DAYS, hour, minute, AlarmAction::Invoke(task), 0).named(name)
        };

        let mut rules: heapless::Vec<AlarmRule, 6> = heapless::Vec::new();
        let _ = rules.push(invoke(SystemTask::HourChime, WILDCARD, 0, "Hour chime"));
        let _ = rules.push(invoke(SystemTask::HalfHourChime, WILDCARD, 30, "Half-hour chime"));
        if cfg.quarter_chimes {
            let _ = rules.push(invoke(SystemTask::QuarterChime, WILDCARD, 15, "Quarter past"));
            let _ = rules.push(invoke(SystemTask::QuarterChime, WILDCARD, 45, "Quarter to"));
        }
        let _ = rules.push(invoke(
            SystemTask::SyncClock,
            cfg.clock_sync_hour,
            cfg.clock_sync_minute,
            "Clock sync",
        ));
        let _ = rules.push(invoke(
            SystemTask::RefreshDns,
            cfg.dns_refresh_hour,
            cfg.dns_refresh_minute,
            "DNS refresh",
        ));

        let mut added = 0;
        for rule in rules {
            let name = rule.name.clone();
            match self.alarms.add(rule) {
                Ok(_) => added += 1,
                Err(e) => warn!("TowerService: system alarm '{}' not installed: {}", name, e),
            }
        }
        added
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control-loop iteration: protection → alarms → playback →
    /// heating.  Never blocks except for the strike pulse inside playback.
    pub fn tick<H>(&mut self, hw: &mut H, sink: &mut impl EventSink)
    where
        H: ClockSource + BellPort + RelayPort,
    {
        self.tick_count += 1;
        let now = hw.now();
        let now_ms = hw.monotonic_ms();

        // 1. Protection window
        if let Some(active) = self
            .protection
            .update(now.as_ref(), self.config.protection_margin_minutes)
        {
            self.tower.set_protection(active);
            sink.emit(&TowerEvent::ProtectionChanged(active));
        }

        // 2. Alarms
        {
            let mut dispatcher = ActionDispatcher {
                tower: &mut self.tower,
                config: &self.config,
                heat_minutes: &mut self.heat_minutes,
                relay: &mut *hw,
                sink: &mut *sink,
            };
            self.alarms.tick(now.as_ref(), &mut dispatcher);
        }

        // 3. Playback
        let was_playing = self.tower.is_playing();
        let bell = self.tower.advance(now_ms, hw);
        if bell != 0 {
            sink.emit(&TowerEvent::BellStruck(bell));
        }
        if was_playing && !self.tower.is_playing() {
            sink.emit(&TowerEvent::SequenceFinished);
        }

        // 4. Heating countdown
        let was_heating = self.tower.is_heating();
        self.tower.heat_check(now.as_ref(), hw);
        if was_heating && !self.tower.is_heating() {
            sink.emit(&TowerEvent::HeatingChanged {
                on: false,
                minutes: 0,
            });
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Execute an action received from the display unit or web layer.
    /// Named sequences are subject to the protection window.
    pub fn handle_action<H>(
        &mut self,
        code: ActionCode,
        parameter: u16,
        hw: &mut H,
        sink: &mut impl EventSink,
    ) -> Result<(), ActionError>
    where
        H: ClockSource + RelayPort,
    {
        if let Some(pattern) = named_pattern(code) {
            return self.request_manual(pattern, sink);
        }
        let now = hw.now();
        let mut dispatcher = ActionDispatcher {
            tower: &mut self.tower,
            config: &self.config,
            heat_minutes: &mut self.heat_minutes,
            relay: hw,
            sink,
        };
        dispatcher.run(AlarmAction::Dispatch(code), parameter, now.as_ref())
    }

    /// Start a named sequence on operator request.  Refused while another
    /// sequence plays or inside the protection window.
    pub fn request_manual(
        &mut self,
        pattern: NamedPattern,
        sink: &mut impl EventSink,
    ) -> Result<(), ActionError> {
        let refusal = if self.tower.status().contains(StatusFlag::Protection) {
            Some(ActionError::ProtectionWindow)
        } else if self.tower.is_playing() {
            Some(ActionError::Busy)
        } else {
            None
        };
        if let Some(e) = refusal {
            warn!("TowerService: manual {} refused: {}", pattern.name(), e);
            sink.emit(&TowerEvent::ActionBlocked(e));
            return Err(e);
        }
        match self.tower.start_named(pattern) {
            Ok(_) => {
                sink.emit(&TowerEvent::SequenceStarted(ActivePattern::Named(pattern)));
                Ok(())
            }
            Err(e) => {
                warn!("TowerService: {} failed to start: {}", pattern.name(), e);
                sink.emit(&TowerEvent::ActionBlocked(ActionError::Unsupported));
                Err(ActionError::Unsupported)
            }
        }
    }

    /// Record network availability; toggles the no-network status bit.
    pub fn set_network_available(&mut self, available: bool, sink: &mut impl EventSink) {
        if available == self.network_available {
            return;
        }
        self.network_available = available;
        self.tower.set_no_network(!available);
        info!(
            "TowerService: network {}",
            if available { "available" } else { "lost" }
        );
        sink.emit(&TowerEvent::NetworkChanged { available });
    }

    /// Validate, persist and apply a new configuration.  Chime rules
    /// installed at start are not re-created.
    pub fn update_config(
        &mut self,
        config: TowerConfig,
        port: &mut impl ConfigPort,
    ) -> Result<(), ConfigError> {
        validate_config(&config)?;
        port.save_config(&config)?;
        self.heat_minutes = config.default_heating_minutes;
        self.config = config;
        info!("TowerService: configuration updated");
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn tower(&self) -> &BellTower {
        &self.tower
    }

    pub fn tower_mut(&mut self) -> &mut BellTower {
        &mut self.tower
    }

    pub fn alarms(&self) -> &AlarmScheduler {
        &self.alarms
    }

    /// Management access for the web layer.
    pub fn alarms_mut(&mut self) -> &mut AlarmScheduler {
        &mut self.alarms
    }

    pub fn config(&self) -> &TowerConfig {
        &self.config
    }

    pub fn status_bitmask(&self) -> u8 {
        self.tower.status_bitmask()
    }

    pub fn heat_minutes(&self) -> u16 {
        self.heat_minutes
    }

    pub fn is_network_available(&self) -> bool {
        self.network_available
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

fn named_pattern(code: ActionCode) -> Option<NamedPattern> {
    match code {
        ActionCode::Funeral => Some(NamedPattern::Funeral),
        ActionCode::Mass => Some(NamedPattern::Mass),
        ActionCode::Festival => Some(NamedPattern::Festival),
        _ => None,
    }
}

// ───────────────────────────────────────────────────────────────
// Action dispatcher
// ───────────────────────────────────────────────────────────────

/// Borrows the parts of the service an action can touch, so the alarm
/// table can call into the tower while it is being iterated.
struct ActionDispatcher<'a, R, S> {
    tower: &'a mut BellTower,
    config: &'a TowerConfig,
    heat_minutes: &'a mut u16,
    relay: &'a mut R,
    sink: &'a mut S,
}

impl<R: RelayPort, S: EventSink> ActionDispatcher<'_, R, S> {
    /// Execute `action`, reporting refusals as `ActionBlocked`.
    fn run(
        &mut self,
        action: AlarmAction,
        parameter: u16,
        now: Option<&WallClock>,
    ) -> Result<(), ActionError> {
        let result = self.execute(action, parameter, now);
        if let Err(e) = result {
            self.sink.emit(&TowerEvent::ActionBlocked(e));
        }
        result
    }

    fn execute(
        &mut self,
        action: AlarmAction,
        parameter: u16,
        now: Option<&WallClock>,
    ) -> Result<(), ActionError> {
        match action {
            AlarmAction::Unbound => Err(ActionError::Unbound),
            AlarmAction::Dispatch(code) => self.dispatch(code, parameter, now),
            AlarmAction::Invoke(task) => match now {
                Some(now) => self.invoke(task, now),
                None => Err(ActionError::ClockUnavailable),
            },
        }
    }

    fn dispatch(
        &mut self,
        code: ActionCode,
        parameter: u16,
        now: Option<&WallClock>,
    ) -> Result<(), ActionError> {
        match code {
            ActionCode::Funeral => self.start_named(NamedPattern::Funeral),
            ActionCode::Mass => self.start_named(NamedPattern::Mass),
            ActionCode::Festival => self.start_named(NamedPattern::Festival),
            ActionCode::Stop => {
                let was_playing = self.tower.is_playing();
                self.tower.stop();
                if was_playing {
                    self.sink.emit(&TowerEvent::SequenceStopped);
                }
                Ok(())
            }
            ActionCode::HeatOn => {
                let minutes = if parameter > 0 {
                    self.config.clamp_heating_minutes(parameter)
                } else {
                    *self.heat_minutes
                };
                self.heat_on(minutes, now)
            }
            ActionCode::SetHeatTimer => {
                let minutes = self.config.clamp_heating_minutes(parameter);
                *self.heat_minutes = minutes;
                info!("TowerService: heating duration set to {} min", minutes);
                self.heat_on(minutes, now)
            }
            ActionCode::HeatOff => {
                if !self.tower.has_heating() {
                    return Err(ActionError::NoHeating);
                }
                let was_on = self.tower.is_heating();
                self.tower.heat_off(&mut *self.relay);
                if was_on {
                    self.sink.emit(&TowerEvent::HeatingChanged {
                        on: false,
                        minutes: 0,
                    });
                }
                Ok(())
            }
            ActionCode::ToggleProtection => {
                let active = !self.tower.status().contains(StatusFlag::Protection);
                self.tower.set_protection(active);
                info!("TowerService: protection toggled {}", if active { "on" } else { "off" });
                self.sink.emit(&TowerEvent::ProtectionChanged(active));
                Ok(())
            }
        }
    }

    fn invoke(&mut self, task: SystemTask, now: &WallClock) -> Result<(), ActionError> {
        match task {
            SystemTask::SyncClock | SystemTask::RefreshDns => {
                self.sink.emit(&TowerEvent::MaintenanceDue(task));
                return Ok(());
            }
            SystemTask::HourChime | SystemTask::HalfHourChime | SystemTask::QuarterChime => {}
        }

        let night = NightHours {
            start_hour: self.config.night_start_hour,
            end_hour: self.config.night_end_hour,
        };
        if night.is_night(now.hour) {
            debug!("TowerService: {:?} suppressed at night", task);
            return Ok(());
        }
        self.ensure_idle()?;

        match task {
            SystemTask::HourChime => self.tower.start_hour(now.hour, self.config.hour_with_quarters),
            SystemTask::HalfHourChime => self.tower.start_half_hour(),
            _ => self.tower.start_quarter(now.minute / 15),
        }
        if let Some(pattern) = self.tower.active_pattern() {
            self.sink.emit(&TowerEvent::SequenceStarted(pattern));
        }
        Ok(())
    }

    fn start_named(&mut self, pattern: NamedPattern) -> Result<(), ActionError> {
        self.ensure_idle()?;
        self.tower.start_named(pattern).map_err(|e| {
            warn!("TowerService: {} failed to start: {}", pattern.name(), e);
            ActionError::Unsupported
        })?;
        self.sink
            .emit(&TowerEvent::SequenceStarted(ActivePattern::Named(pattern)));
        Ok(())
    }

    fn heat_on(&mut self, minutes: u16, now: Option<&WallClock>) -> Result<(), ActionError> {
        self.tower.heat_on(minutes, now, &mut *self.relay)?;
        self.sink
            .emit(&TowerEvent::HeatingChanged { on: true, minutes });
        Ok(())
    }

    fn ensure_idle(&self) -> Result<(), ActionError> {
        if self.tower.is_playing() {
            debug!("TowerService: busy, action skipped");
            return Err(ActionError::Busy);
        }
        Ok(())
    }
}

impl<R: RelayPort, S: EventSink> AlarmDelegate for ActionDispatcher<'_, R, S> {
    fn on_alarm(
        &mut self,
        action: AlarmAction,
        parameter: u16,
        now: &WallClock,
    ) -> Result<(), ActionError> {
        // Busy alarms are retried by the scheduler; only report real refusals.
        let result = self.execute(action, parameter, Some(now));
        match result {
            Err(ActionError::Busy) | Ok(()) => {}
            Err(e) => self.sink.emit(&TowerEvent::ActionBlocked(e)),
        }
        result
    }
}
