//! `date` and `datetime`: PHP-style date formatting.
//!
//! Accepted inputs are integer timestamps (seconds, UTC), numeric strings,
//! RFC 3339 strings, and `Y-m-d`, `Y-m-d H:i:s` or `Y-m-dTH:i:s` strings
//! (read as UTC). `none` means the current time.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Timelike, Utc};
use minijinja::value::ValueKind;
use minijinja::{Error, Value};

use super::str_arg;
use crate::error::FilterError;

pub const DEFAULT_DATE_FORMAT: &str = "d/m/Y";
pub const DEFAULT_DATETIME_FORMAT: &str = "d/m/Y H:i:s";

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

fn from_timestamp(seconds: i64) -> Option<DateTime<FixedOffset>> {
    DateTime::from_timestamp(seconds, 0).map(|dt| dt.fixed_offset())
}

/// Reads a date out of a template value.
pub fn parse_datetime(value: &Value) -> Option<DateTime<FixedOffset>> {
    match value.kind() {
        ValueKind::Number => {
            let seconds = f64::try_from(value.clone()).ok()?;
            if !seconds.is_finite() {
                return None;
            }
            from_timestamp(seconds.trunc() as i64)
        }
        ValueKind::String => parse_date_str(value.as_str()?),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(seconds) = s.parse::<i64>() {
        return from_timestamp(seconds);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

/// Unix timestamp of a template value, if it reads as a date.
pub fn parse_timestamp(value: &Value) -> Option<i64> {
    parse_datetime(value).map(|dt| dt.timestamp())
}

fn english_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(31, |last| last.day())
}

fn offset(dt: &DateTime<FixedOffset>, colon: bool) -> String {
    let seconds = dt.offset().local_minus_utc();
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.abs() / 60;
    if colon {
        format!("{sign}{:02}:{:02}", minutes / 60, minutes % 60)
    } else {
        format!("{sign}{:02}{:02}", minutes / 60, minutes % 60)
    }
}

fn zone_name(dt: &DateTime<FixedOffset>) -> String {
    if dt.offset().local_minus_utc() == 0 {
        "UTC".to_string()
    } else {
        offset(dt, true)
    }
}

/// Formats a date with PHP `date()` format characters.
///
/// Unknown characters are copied; a backslash copies the next character
/// literally.
///
/// # Example
///
/// ```rust
/// use chrono::{DateTime, TimeZone, Utc};
/// use skeleton_template::filters::date::format_php;
///
/// let dt = Utc.with_ymd_and_hms(2024, 3, 1, 14, 5, 9).unwrap().fixed_offset();
/// assert_eq!(format_php(&dt, "d/m/Y H:i:s"), "01/03/2024 14:05:09");
/// assert_eq!(format_php(&dt, "D, jS F"), "Fri, 1st March");
/// assert_eq!(format_php(&dt, "\\Y\\: Y"), "Y: 2024");
/// ```
pub fn format_php(dt: &DateTime<FixedOffset>, format: &str) -> String {
    let mut out = String::with_capacity(format.len() * 2);
    let mut chars = format.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            'd' => out.push_str(&format!("{:02}", dt.day())),
            'D' => out.push_str(&dt.format("%a").to_string()),
            'j' => out.push_str(&dt.day().to_string()),
            'l' => out.push_str(&dt.format("%A").to_string()),
            'N' => out.push_str(&dt.weekday().number_from_monday().to_string()),
            'S' => out.push_str(english_suffix(dt.day())),
            'w' => out.push_str(&dt.weekday().num_days_from_sunday().to_string()),
            'z' => out.push_str(&dt.ordinal0().to_string()),
            'W' => out.push_str(&format!("{:02}", dt.iso_week().week())),
            'o' => out.push_str(&dt.iso_week().year().to_string()),
            'F' => out.push_str(&dt.format("%B").to_string()),
            'm' => out.push_str(&format!("{:02}", dt.month())),
            'M' => out.push_str(&dt.format("%b").to_string()),
            'n' => out.push_str(&dt.month().to_string()),
            't' => out.push_str(&days_in_month(dt.year(), dt.month()).to_string()),
            'L' => out.push(if NaiveDate::from_ymd_opt(dt.year(), 2, 29).is_some() {
                '1'
            } else {
                '0'
            }),
            'Y' => out.push_str(&dt.year().to_string()),
            'y' => out.push_str(&format!("{:02}", dt.year().rem_euclid(100))),
            'a' => out.push_str(if dt.hour() < 12 { "am" } else { "pm" }),
            'A' => out.push_str(if dt.hour() < 12 { "AM" } else { "PM" }),
            'g' => out.push_str(&dt.hour12().1.to_string()),
            'G' => out.push_str(&dt.hour().to_string()),
            'h' => out.push_str(&format!("{:02}", dt.hour12().1)),
            'H' => out.push_str(&format!("{:02}", dt.hour())),
            'i' => out.push_str(&format!("{:02}", dt.minute())),
            's' => out.push_str(&format!("{:02}", dt.second())),
            'u' => out.push_str(&format!("{:06}", dt.nanosecond() / 1_000 % 1_000_000)),
            'v' => out.push_str(&format!("{:03}", dt.nanosecond() / 1_000_000 % 1_000)),
            'e' | 'T' => out.push_str(&zone_name(dt)),
            'P' => out.push_str(&offset(dt, true)),
            'O' => out.push_str(&offset(dt, false)),
            'Z' => out.push_str(&dt.offset().local_minus_utc().to_string()),
            'U' => out.push_str(&dt.timestamp().to_string()),
            'c' => out.push_str(&format_php(dt, "Y-m-d\\TH:i:sP")),
            'r' => out.push_str(&format_php(dt, "D, d M Y H:i:s O")),
            other => out.push(other),
        }
    }

    out
}

fn format_value(
    filter: &'static str,
    value: &Value,
    format: Option<&Value>,
    default_format: &str,
) -> Result<String, FilterError> {
    let format = str_arg(filter, "format", format, default_format)?;
    let dt = if value.is_undefined() || value.is_none() {
        Utc::now().fixed_offset()
    } else {
        parse_datetime(value).ok_or_else(|| {
            FilterError::argument(filter, "value", format!("cannot read '{value}' as a date"))
        })?
    };
    Ok(format_php(&dt, format))
}

/// `date(format='d/m/Y')`
pub fn date_filter(value: Value, format: Option<Value>) -> Result<String, Error> {
    Ok(format_value("date", &value, format.as_ref(), DEFAULT_DATE_FORMAT)?)
}

/// `datetime(format='d/m/Y H:i:s')`
pub fn datetime_filter(value: Value, format: Option<Value>) -> Result<String, Error> {
    Ok(format_value("datetime", &value, format.as_ref(), DEFAULT_DATETIME_FORMAT)?)
}
