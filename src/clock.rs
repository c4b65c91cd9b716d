//! Wall-clock value type.
//!
//! A [`WallClock`] is a broken-down local time sample together with its
//! Unix epoch seconds.  The scheduler matches on the calendar fields; the
//! heating timer and periodic alarms measure elapsed time on `epoch`.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};

/// Any wall-clock reading earlier than 2020-01-01 is treated as unsynced.
pub const EPOCH_2020: i64 = 1_577_836_800;

/// Weekday numbering used by alarm masks.
pub const SUNDAY: u8 = 0;
pub const SATURDAY: u8 = 6;

/// One synchronised wall-clock sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallClock {
    /// Seconds since the Unix epoch.
    pub epoch: i64,
    pub year: u16,
    /// Day of the year, 1-based.
    pub day_of_year: u16,
    /// 0 = Sunday … 6 = Saturday.
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// Calendar minute used to suppress refiring of fixed-time alarms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinuteStamp {
    pub day_of_year: u16,
    pub hour: u8,
    pub minute: u8,
}

impl WallClock {
    /// Break down any chrono date-time in its own time zone.
    pub fn from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self {
        Self {
            epoch: dt.timestamp(),
            year: dt.year().clamp(0, i32::from(u16::MAX)) as u16,
            day_of_year: dt.ordinal() as u16,
            weekday: dt.weekday().num_days_from_sunday() as u8,
            hour: dt.hour() as u8,
            minute: dt.minute() as u8,
            second: dt.second() as u8,
        }
    }

    /// UTC breakdown of `epoch`; `None` if it is before 2020 or out of range.
    pub fn from_epoch_utc(epoch: i64) -> Option<Self> {
        if !is_synchronized(epoch) {
            return None;
        }
        DateTime::<Utc>::from_timestamp(epoch, 0).map(|dt| Self::from_datetime(&dt))
    }

    /// The same instant shifted by `secs`, re-broken-down in UTC.
    pub fn plus_seconds(&self, secs: i64) -> Option<Self> {
        Self::from_epoch_utc(self.epoch.checked_add(secs)?)
    }

    pub fn minute_stamp(&self) -> MinuteStamp {
        MinuteStamp {
            day_of_year: self.day_of_year,
            hour: self.hour,
            minute: self.minute,
        }
    }
}

/// Whether an epoch reading looks like a synchronised clock.
pub const fn is_synchronized(epoch: i64) -> bool {
    epoch >= EPOCH_2020
}
