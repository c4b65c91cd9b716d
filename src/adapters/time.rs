//! System clock adapter.
//!
//! Implements [`ClockSource`] for the tower.
//!
//! - **`target_os = "espidf"`**: monotonic time from `esp_timer_get_time()`,
//!   wall clock from `gettimeofday()` broken down with `localtime_r()`, so
//!   whatever `TZ` the process has applies (UTC if none).  This crate never
//!   sets the system time; until something does (an SNTP client answering
//!   `MaintenanceDue(SyncClock)`), [`ClockSource::now`] returns `None`.
//! - **`not(target_os = "espidf")`**: `std::time::Instant` for monotonic
//!   time and `chrono::Utc` shifted by a fixed offset for the wall clock.

#[cfg(not(target_os = "espidf"))]
use chrono::Offset;

use crate::app::ports::ClockSource;
use crate::clock::WallClock;

/// Clock adapter for the ESP32 platform.
pub struct SystemClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
    #[cfg(not(target_os = "espidf"))]
    offset: chrono::FixedOffset,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    #[cfg(target_os = "espidf")]
    pub fn new() -> Self {
        Self {}
    }

    /// Host clock in UTC.
    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self::with_utc_offset_secs(0)
    }

    /// Host clock shifted by a fixed offset.  Offsets outside ±24 h are
    /// treated as UTC.
    #[cfg(not(target_os = "espidf"))]
    pub fn with_utc_offset_secs(secs: i32) -> Self {
        Self {
            start: std::time::Instant::now(),
            offset: chrono::FixedOffset::east_opt(secs).unwrap_or_else(|| chrono::Utc.fix()),
        }
    }
}

#[cfg(target_os = "espidf")]
impl ClockSource for SystemClock {
    fn now(&self) -> Option<WallClock> {
        use core::ptr;
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, ptr::null_mut()) } != 0 {
            return None;
        }
        let epoch = tv.tv_sec as i64;
        if !crate::clock::is_synchronized(epoch) {
            return None;
        }
        let secs = tv.tv_sec as esp_idf_svc::sys::time_t;
        let mut tm: esp_idf_svc::sys::tm = unsafe { core::mem::zeroed() };
        if unsafe { esp_idf_svc::sys::localtime_r(&secs, &mut tm) }.is_null() {
            return None;
        }
        if !(0..=23).contains(&tm.tm_hour) || !(0..=6).contains(&tm.tm_wday) {
            return None;
        }
        Some(WallClock {
            epoch,
            year: (tm.tm_year + 1900) as u16,
            day_of_year: (tm.tm_yday + 1) as u16,
            weekday: tm.tm_wday as u8,
            hour: tm.tm_hour as u8,
            minute: tm.tm_min as u8,
            second: tm.tm_sec as u8,
        })
    }

    fn monotonic_ms(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1000
    }
}

#[cfg(not(target_os = "espidf"))]
impl ClockSource for SystemClock {
    fn now(&self) -> Option<WallClock> {
        let local = chrono::Utc::now().with_timezone(&self.offset);
        crate::clock::is_synchronized(local.timestamp()).then(|| WallClock::from_datetime(&local))
    }

    fn monotonic_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
