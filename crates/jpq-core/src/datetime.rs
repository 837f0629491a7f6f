//! Date and time values produced by the `.datetime()` item method.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Datetime {
    Date(NaiveDate),
    Time(NaiveTime),
    TimeTz(NaiveTime, FixedOffset),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<FixedOffset>),
}

const DATE: &str = "%Y-%m-%d";
const TIME: &str = "%H:%M:%S%.f";
const TIMESTAMPS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const TIMESTAMPS_TZ: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z"];

impl Datetime {
    /// Recognize an ISO-8601 date, time or timestamp, with or without zone.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
            return Some(Datetime::TimestampTz(ts));
        }
        for format in TIMESTAMPS_TZ {
            if let Ok(ts) = DateTime::parse_from_str(text, format) {
                return Some(Datetime::TimestampTz(ts));
            }
        }
        for format in TIMESTAMPS {
            if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
                return Some(Datetime::Timestamp(ts));
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, DATE) {
            return Some(Datetime::Date(date));
        }
        if let Ok(time) = NaiveTime::parse_from_str(text, TIME) {
            return Some(Datetime::Time(time));
        }
        parse_time_tz(text)
    }

    /// Name reported by the `.type()` item method.
    pub fn type_name(&self) -> &'static str {
        match self {
            Datetime::Date(_) => "date",
            Datetime::Time(_) => "time without time zone",
            Datetime::TimeTz(..) => "time with time zone",
            Datetime::Timestamp(_) => "timestamp without time zone",
            Datetime::TimestampTz(_) => "timestamp with time zone",
        }
    }

    /// Compare two values; `None` when one is zoned and the other is not.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        use Datetime::*;
        match (self, other) {
            (Date(a), Date(b)) => Some(a.cmp(b)),
            (Date(a), Timestamp(b)) => Some(midnight(*a).cmp(b)),
            (Timestamp(a), Date(b)) => Some(a.cmp(&midnight(*b))),
            (Timestamp(a), Timestamp(b)) => Some(a.cmp(b)),
            (TimestampTz(a), TimestampTz(b)) => Some(a.cmp(b)),
            (Time(a), Time(b)) => Some(a.cmp(b)),
            (TimeTz(a, za), TimeTz(b, zb)) => Some(utc_nanos(a, za).cmp(&utc_nanos(b, zb))),
            _ => None,
        }
    }

    pub fn to_iso(&self) -> String {
        match self {
            Datetime::Date(d) => d.format(DATE).to_string(),
            Datetime::Time(t) => t.format(TIME).to_string(),
            Datetime::TimeTz(t, z) => format!("{}{z}", t.format(TIME)),
            Datetime::Timestamp(ts) => ts.format(TIMESTAMPS[0]).to_string(),
            Datetime::TimestampTz(ts) => ts.format(TIMESTAMPS_TZ[0]).to_string(),
        }
    }
}

impl fmt::Display for Datetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso())
    }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn utc_nanos(time: &NaiveTime, zone: &FixedOffset) -> i64 {
    let seconds = i64::from(time.num_seconds_from_midnight()) - i64::from(zone.local_minus_utc());
    seconds * 1_000_000_000 + i64::from(time.nanosecond())
}

/// `HH:MM:SS[.f]` followed by `Z` or `±HH[:MM]`.
fn parse_time_tz(text: &str) -> Option<Datetime> {
    if let Some(time) = text.strip_suffix('Z') {
        let time = NaiveTime::parse_from_str(time, TIME).ok()?;
        return Some(Datetime::TimeTz(time, FixedOffset::east_opt(0)?));
    }
    let split = text.rfind(['+', '-'])?;
    let (time, zone) = text.split_at(split);
    let time = NaiveTime::parse_from_str(time, TIME).ok()?;
    let sign = if zone.starts_with('-') { -1 } else { 1 };
    let zone = &zone[1..];
    let (hours, minutes) = match zone.split_once(':') {
        Some((h, m)) => (h, m),
        None if zone.len() == 4 => zone.split_at(2),
        None => (zone, "0"),
    };
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 15 || minutes > 59 {
        return None;
    }
    let offset = FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))?;
    Some(Datetime::TimeTz(time, offset))
}
