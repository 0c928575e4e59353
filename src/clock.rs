use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Angle units in one day. 360 units cover 1440 minutes, so one unit is 4 minutes.
pub const DAY_ANGLE: f64 = 360.0;
const MINUTES_PER_UNIT: f64 = 4.0;
const MINUTES_PER_DAY: i64 = 24 * 60;

static RE_CLOCK: Lazy<Regex> = Lazy::new(|| {
    // 7:05, 07:05, 07:05:59
    Regex::new(r"^(\d{1,2}):(\d{2})(?::\d{2}(?:\.\d{1,9})?)?$").unwrap()
});

/// Wall-clock time of day at minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClockTime {
    pub hour: u32,
    pub minute: u32,
}

impl ClockTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    pub fn from_angle(angle: f64) -> Self {
        angle_to_time(angle)
    }

    pub fn to_angle(self) -> f64 {
        minutes_to_angle((self.hour * 60 + self.minute) as f64)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Folds any angle into `[0, 360)`.
pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(DAY_ANGLE);
    // rem_euclid of a tiny negative value can round up to exactly 360
    if a >= DAY_ANGLE { 0.0 } else { a }
}

pub fn minutes_to_angle(minutes: f64) -> f64 {
    normalize_angle(minutes / MINUTES_PER_UNIT)
}

/// Seconds are dropped: the angle only encodes whole minutes since midnight.
pub fn time_to_angle(t: NaiveTime) -> f64 {
    minutes_to_angle((t.hour() * 60 + t.minute()) as f64)
}

pub fn angle_to_time(angle: f64) -> ClockTime {
    let minutes = (normalize_angle(angle) * MINUTES_PER_UNIT).round() as i64;
    let minutes = minutes.rem_euclid(MINUTES_PER_DAY) as u32;
    ClockTime { hour: minutes / 60, minute: minutes % 60 }
}

/// Parses `HH:MM` (optionally with seconds) into a clock time.
pub fn parse_clock(s: &str) -> Option<ClockTime> {
    let caps = RE_CLOCK.captures(s.trim())?;
    let hour = caps[1].parse::<u32>().ok()?;
    let minute = caps[2].parse::<u32>().ok()?;
    ClockTime::new(hour, minute)
}

/// Wall-clock time of a timestamp as written, i.e. in its own UTC offset.
/// Naive layouts without an offset are taken as they are.
pub fn parse_timestamp(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.time());
    }
    let offset_fmts = [
        "%Y-%m-%d %H:%M:%S%.f%:z",
        "%Y-%m-%d %H:%M:%S%:z",
        "%Y-%m-%dT%H:%M:%S%.f%z",
        "%Y-%m-%d %H:%M:%S%.f%z",
    ];
    for f in offset_fmts.iter() {
        if let Ok(dt) = DateTime::parse_from_str(s, f) {
            return Some(dt.time());
        }
    }
    let naive_fmts = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
    ];
    for f in naive_fmts.iter() {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, f) {
            return Some(ndt.time());
        }
    }
    if let Some(t) = parse_epoch_digits(s) {
        return Some(t);
    }
    parse_clock(s).and_then(|c| NaiveTime::from_hms_opt(c.hour, c.minute, 0))
}

fn parse_epoch_digits(s: &str) -> Option<NaiveTime> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse::<i64>().ok().and_then(epoch_to_time)
}

/// UTC wall clock of a Unix epoch given in seconds (10 digits), milliseconds
/// (13) or microseconds (16).
pub fn epoch_to_time(epoch: i64) -> Option<NaiveTime> {
    if epoch < 0 {
        return None;
    }
    let (secs, nanos) = match epoch.to_string().len() {
        10 => (epoch, 0),
        13 => (epoch / 1_000, (epoch % 1_000) * 1_000_000),
        16 => (epoch / 1_000_000, (epoch % 1_000_000) * 1_000),
        _ => return None,
    };
    DateTime::<Utc>::from_timestamp(secs, nanos as u32).map(|dt| dt.time())
}

pub fn timestamp_to_angle(s: &str) -> Option<f64> {
    parse_timestamp(s).map(time_to_angle)
}
