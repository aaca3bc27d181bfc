use crate::core::{DateTimeValue, ScalarType, TimeZoneSpec, Value};
use chrono::{FixedOffset, NaiveDate, NaiveTime};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::Value as JsonValue;

lazy_static! {
    static ref DATE_TIME: Regex = Regex::new(
        r"(?i)^(?P<y>\d{4})-(?P<m>\d{2})-(?P<d>\d{2})\s*T?\s*(?:(?P<h>\d{2}):(?P<min>\d{2})(?::(?P<s>\d{2}))?(?:\.(?P<frac>\d+))?)?\s*(?:(?P<tzt>\w{1,3})|(?P<tzo>[+-]?\d{4})|(?P<tzp>[+-]?\d{2}:\d{2}))?$"
    )
    .expect("date-time pattern is valid");
}

/// Converts a raw source scalar into the value written to a field.
///
/// Temporal fields get a parsed date-time (or `Null` when unparseable);
/// everything else passes through unchanged.
pub(crate) fn coerce(raw: &JsonValue, scalar_type: &ScalarType) -> Value {
    if !scalar_type.is_temporal() {
        return Value::from_json(raw);
    }

    raw.as_str()
        .and_then(parse_datetime)
        .map(Value::DateTime)
        .unwrap_or(Value::Null)
}

/// Parses `YYYY-MM-DD[ T]HH:MM[:SS][.frac][zone]`, where the time and the zone
/// are optional. The zone is an abbreviation, `Z`, `+HHMM` or `+HH:MM`.
pub fn parse_datetime(raw: &str) -> Option<DateTimeValue> {
    let caps = DATE_TIME.captures(raw.trim())?;

    let date = NaiveDate::from_ymd_opt(number(&caps, "y")?, number(&caps, "m")?, number(&caps, "d")?)?;
    let time = match caps.name("h") {
        Some(_) => NaiveTime::from_hms_opt(
            number(&caps, "h")?,
            number(&caps, "min")?,
            caps.name("s").map_or(Some(0), |_| number(&caps, "s"))?,
        )?,
        None => NaiveTime::from_hms_opt(0, 0, 0)?,
    };

    let zone = if let Some(name) = caps.name("tzt") {
        let name = name.as_str();
        if !name.chars().all(|ch| ch.is_ascii_alphabetic()) {
            return None;
        }
        if name.eq_ignore_ascii_case("z") {
            TimeZoneSpec::Offset(FixedOffset::east_opt(0)?)
        } else {
            TimeZoneSpec::Named(name.to_string())
        }
    } else if let Some(offset) = caps.name("tzo").or_else(|| caps.name("tzp")) {
        TimeZoneSpec::Offset(parse_offset(offset.as_str())?)
    } else {
        TimeZoneSpec::Floating
    };

    Some(DateTimeValue::new(date.and_time(time), zone))
}

fn number<T: std::str::FromStr>(caps: &Captures<'_>, group: &str) -> Option<T> {
    caps.name(group)?.as_str().parse().ok()
}

/// `+0300`, `-03:30`, `0100`.
fn parse_offset(raw: &str) -> Option<FixedOffset> {
    let (sign, digits) = match raw.as_bytes().first()? {
        b'-' => (-1, &raw[1..]),
        b'+' => (1, &raw[1..]),
        _ => (1, raw),
    };
    let digits = digits.replace(':', "");
    let hours: i32 = digits.get(..2)?.parse().ok()?;
    let minutes: i32 = digits.get(2..4)?.parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn test_parse_offset_with_colon() {
        let dt = parse_datetime("2016-01-01T06:20+03:00").unwrap();
        assert_eq!(dt.time().hour(), 6);
        assert_eq!(dt.time().minute(), 20);
        assert_eq!(dt.time().second(), 0);
        assert_eq!(dt.offset(), FixedOffset::east_opt(3 * 3600));
    }

    #[test]
    fn test_parse_date_only() {
        let dt = parse_datetime("2016-01-01").unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2016, 1, 1).unwrap());
        assert_eq!(dt.time(), NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        assert_eq!(dt.zone(), &TimeZoneSpec::Floating);
    }

    #[test]
    fn test_parse_named_zone() {
        let dt = parse_datetime("2016-01-01 06:00:00UTC").unwrap();
        assert_eq!(dt.zone(), &TimeZoneSpec::Named("UTC".into()));
        assert_eq!(dt.to_iso8601(), "2016-01-01T06:00:00+0000");
    }

    #[test]
    fn test_parse_zulu_and_fraction() {
        let dt = parse_datetime("2016-01-01T06:20:15.250Z").unwrap();
        assert_eq!(dt.time().second(), 15);
        assert_eq!(dt.zone(), &TimeZoneSpec::Offset(FixedOffset::east_opt(0).unwrap()));

        let dt = parse_datetime("2016-01-01t06:20z").unwrap();
        assert_eq!(dt.offset(), FixedOffset::east_opt(0));
    }

    #[test]
    fn test_parse_compact_and_negative_offsets() {
        let dt = parse_datetime("1990-06-06 18:00 +0130").unwrap();
        assert_eq!(dt.offset(), FixedOffset::east_opt(5400));

        let dt = parse_datetime("1990-06-06T18:00-05:00").unwrap();
        assert_eq!(dt.offset(), FixedOffset::east_opt(-5 * 3600));
        assert_eq!(dt.date().year(), 1990);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_datetime("not-a-date").is_none());
        assert!(parse_datetime("2016-13-01").is_none());
        assert!(parse_datetime("2016-02-30").is_none());
        assert!(parse_datetime("2016-01-01T25:00").is_none());
        assert!(parse_datetime("2016-01-01 12").is_none());
        assert!(parse_datetime("").is_none());
    }

    #[test]
    fn test_coerce() {
        assert_eq!(coerce(&json!("php"), &ScalarType::String), Value::from("php"));
        assert_eq!(coerce(&json!(5), &ScalarType::Integer), Value::Integer(5));
        assert_eq!(coerce(&json!("2016-01-01"), &ScalarType::String), Value::from("2016-01-01"));

        let coerced = coerce(&json!("2016-01-01"), &ScalarType::Date);
        assert!(coerced.as_datetime().is_some());

        assert_eq!(coerce(&json!("yesterday"), &ScalarType::DateTime), Value::Null);
        assert_eq!(coerce(&json!(20160101), &ScalarType::DateTime), Value::Null);
    }
}
