//! Tower configuration parameters
//!
//! All tunable parameters for the bell tower controller.
//! Persisted as `config.json` through the [`ConfigPort`](crate::app::ports::ConfigPort).

use log::warn;
use serde::{Deserialize, Serialize};

use crate::app::ports::{ConfigError, ConfigPort};

/// Name of the persisted configuration document.
pub const CONFIG_DOCUMENT: &str = "config.json";

/// Core tower configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerConfig {
    // --- Bells ---
    /// How long a striker coil is energised per strike (milliseconds)
    pub strike_pulse_ms: u32,

    // --- Heating ---
    /// Minutes of heating when no duration is given
    pub default_heating_minutes: u16,
    /// Upper bound for any requested heating duration
    pub max_heating_minutes: u16,

    // --- Chimes ---
    /// Half-width of the protection window around :00 and :30 (minutes)
    pub protection_margin_minutes: u8,
    /// Hour at which automatic chimes fall silent (0-23)
    pub night_start_hour: u8,
    /// Hour at which automatic chimes resume (0-23)
    pub night_end_hour: u8,
    /// Play the four quarter strikes before each hour count
    pub hour_with_quarters: bool,
    /// Register :15 and :45 quarter chimes
    pub quarter_chimes: bool,

    // --- Maintenance ---
    pub clock_sync_hour: u8,
    pub clock_sync_minute: u8,
    pub dns_refresh_hour: u8,
    pub dns_refresh_minute: u8,

    // --- Timing ---
    /// Control loop interval (milliseconds)
    pub control_loop_interval_ms: u32,
}

impl Default for TowerConfig {
    fn default() -> Self {
        Self {
            // Bells
            strike_pulse_ms: 200,

            // Heating
            default_heating_minutes: 45,
            max_heating_minutes: 120, // 2 h

            // Chimes
            protection_margin_minutes: 3,
            night_start_hour: 23,
            night_end_hour: 7,
            hour_with_quarters: false,
            quarter_chimes: false,

            // Maintenance
            clock_sync_hour: 12,
            clock_sync_minute: 2,
            dns_refresh_hour: 12,
            dns_refresh_minute: 5,

            // Timing
            control_loop_interval_ms: 10,
        }
    }
}

impl TowerConfig {
    /// Clamp a requested heating duration into `[1, max_heating_minutes]`.
    pub fn clamp_heating_minutes(&self, minutes: u16) -> u16 {
        minutes.clamp(1, self.max_heating_minutes.max(1))
    }
}

/// Load the stored config, falling back to defaults if it is unusable.
pub fn load_or_default(port: &impl ConfigPort) -> TowerConfig {
    match port.load_config() {
        Ok(config) => config,
        Err(e) => {
            warn!("Config: stored config rejected ({}), using defaults", e);
            TowerConfig::default()
        }
    }
}

/// Range-check every field.  Callers persist only configs that pass.
pub fn validate_config(cfg: &TowerConfig) -> Result<(), ConfigError> {
    if !(20..=2000).contains(&cfg.strike_pulse_ms) {
        return Err(ConfigError::ValidationFailed(
            "strike_pulse_ms must be 20–2000",
        ));
    }
    if !(1..=1440).contains(&cfg.max_heating_minutes) {
        return Err(ConfigError::ValidationFailed(
            "max_heating_minutes must be 1–1440",
        ));
    }
    if cfg.default_heating_minutes == 0 || cfg.default_heating_minutes > cfg.max_heating_minutes {
        return Err(ConfigError::ValidationFailed(
            "default_heating_minutes must be 1–max_heating_minutes",
        ));
    }
    if cfg.protection_margin_minutes > 14 {
        return Err(ConfigError::ValidationFailed(
            "protection_margin_minutes must be 0–14",
        ));
    }
    if cfg.night_start_hour > 23 || cfg.night_end_hour > 23 {
        return Err(ConfigError::ValidationFailed("night hours must be 0–23"));
    }
    if cfg.clock_sync_hour > 23 || cfg.clock_sync_minute > 59 {
        return Err(ConfigError::ValidationFailed("clock sync time out of range"));
    }
    if cfg.dns_refresh_hour > 23 || cfg.dns_refresh_minute > 59 {
        return Err(ConfigError::ValidationFailed("DNS refresh time out of range"));
    }
    if !(1..=500).contains(&cfg.control_loop_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "control_loop_interval_ms must be 1–500",
        ));
    }
    Ok(())
}
