use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use std::fmt;

/// Zones that are known to sit at UTC+0 when given by name.
const UTC_ZONE_NAMES: &[&str] = &["UTC", "GMT", "UT", "Z"];

/// How the wall-clock part of a [`DateTimeValue`] is anchored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimeZoneSpec {
    /// No zone was given; the value is local wall-clock time.
    Floating,
    /// Numeric offset, either `+HHMM` or `+HH:MM` in the source text.
    Offset(FixedOffset),
    /// Named abbreviation kept verbatim (`UTC`, `MSK`, ...).
    Named(String),
}

/// A parsed date/time carrying the zone exactly as it was written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DateTimeValue {
    local: NaiveDateTime,
    zone: TimeZoneSpec,
}

impl DateTimeValue {
    pub fn new(local: NaiveDateTime, zone: TimeZoneSpec) -> Self {
        Self { local, zone }
    }

    pub fn floating(local: NaiveDateTime) -> Self {
        Self::new(local, TimeZoneSpec::Floating)
    }

    pub fn local(&self) -> NaiveDateTime {
        self.local
    }

    pub fn date(&self) -> NaiveDate {
        self.local.date()
    }

    pub fn time(&self) -> NaiveTime {
        self.local.time()
    }

    pub fn zone(&self) -> &TimeZoneSpec {
        &self.zone
    }

    /// Numeric offset of the zone, if one can be determined.
    ///
    /// Named zones only resolve when they are an alias of UTC.
    pub fn offset(&self) -> Option<FixedOffset> {
        match &self.zone {
            TimeZoneSpec::Floating => None,
            TimeZoneSpec::Offset(offset) => Some(*offset),
            TimeZoneSpec::Named(name) => UTC_ZONE_NAMES
                .iter()
                .any(|utc| utc.eq_ignore_ascii_case(name))
                .then(|| FixedOffset::east_opt(0))
                .flatten(),
        }
    }

    /// Pins the value to an instant when the offset is known.
    pub fn to_fixed(&self) -> Option<DateTime<FixedOffset>> {
        self.offset()?.from_local_datetime(&self.local).single()
    }

    /// ISO-8601 basic offset form, e.g. `2016-01-01T06:20:00+0300`.
    pub fn to_iso8601(&self) -> String {
        let stamp = self.local.format("%Y-%m-%dT%H:%M:%S");
        match self.offset() {
            Some(offset) => format!("{}{}", stamp, offset_without_colon(offset)),
            None => stamp.to_string(),
        }
    }
}

fn offset_without_colon(offset: FixedOffset) -> String {
    let seconds = offset.local_minus_utc();
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.abs() / 60;
    format!("{}{:02}{:02}", sign, minutes / 60, minutes % 60)
}

impl fmt::Display for DateTimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.local.format("%Y-%m-%dT%H:%M:%S"))?;
        match &self.zone {
            TimeZoneSpec::Floating => Ok(()),
            TimeZoneSpec::Offset(offset) => write!(f, "{}", offset),
            TimeZoneSpec::Named(name) => write!(f, " {}", name),
        }
    }
}
