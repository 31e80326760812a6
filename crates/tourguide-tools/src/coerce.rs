//! Lenient conversions for backend fields
//!
//! TourVisor returns the same numeric field as a string, an integer, a float or
//! an empty string depending on the endpoint.

use chrono::{Duration, NaiveDate};
use serde_json::Value;

/// Wire date format (`DD.MM.YYYY`)
pub const WIRE_DATE_FORMAT: &str = "%d.%m.%Y";

/// Integer view of a loosely typed value; floats truncate toward zero.
#[must_use]
pub fn safe_int(value: Option<&Value>, default: i64) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(default),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
                .unwrap_or(default)
        }
        Some(Value::Bool(b)) => i64::from(*b),
        _ => default,
    }
}

/// Float view of a loosely typed value; `None` when absent or unparsable.
#[must_use]
pub fn safe_float(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Non-empty string view; numbers are rendered, everything else is `None`.
#[must_use]
pub fn safe_str(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Truthiness of a backend flag (`1`, `"1"`, `true`)
#[must_use]
pub fn flag(value: Option<&Value>) -> bool {
    safe_int(value, 0) != 0
}

/// A backend collection as a list; single objects become one-element lists.
#[must_use]
pub fn as_list(value: Option<&Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items.clone(),
        Some(item @ Value::Object(_)) => vec![item.clone()],
        Some(Value::String(s)) if !s.is_empty() => vec![Value::String(s.clone())],
        _ => Vec::new(),
    }
}

/// Parse a `DD.MM.YYYY` date
#[must_use]
pub fn parse_wire_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), WIRE_DATE_FORMAT).ok()
}

/// Format a date as `DD.MM.YYYY`
#[must_use]
pub fn format_wire_date(date: NaiveDate) -> String {
    date.format(WIRE_DATE_FORMAT).to_string()
}

/// `DD.MM.YYYY` → `YYYY-MM-DD`; `None` when the input has no three dot-separated parts.
#[must_use]
pub fn wire_to_iso(raw: &str) -> Option<String> {
    let parts: Vec<&str> = raw.split('.').collect();
    match parts.as_slice() {
        [day, month, year] if !day.is_empty() && !month.is_empty() && !year.is_empty() => {
            Some(format!("{year}-{month}-{day}"))
        }
        _ => None,
    }
}

/// Departure date plus `nights`, as ISO; `None` when either part is missing.
#[must_use]
pub fn end_date_iso(raw: &str, nights: i64) -> Option<String> {
    if nights == 0 {
        return None;
    }
    let start = parse_wire_date(raw)?;
    let end = start.checked_add_signed(Duration::try_days(nights)?)?;
    Some(end.format("%Y-%m-%d").to_string())
}
