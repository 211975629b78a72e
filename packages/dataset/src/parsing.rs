//! Field-level parsing for raw arrest rows.
//!
//! Every function here is total: malformed input maps to `None` or an
//! `Unknown` variant instead of an error.

use chrono::{NaiveDate, NaiveDateTime};

/// Parses an arrest date.
///
/// Accepts the NYPD export format (`03/14/2024`), ISO dates, and Socrata
/// timestamps (`2024-03-14T00:00:00.000`).
#[must_use]
pub fn parse_arrest_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%m/%d/%Y") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.date())
}

/// Coerces a precinct identifier to an integer.
///
/// Integral floats (`"75.0"`) are accepted since some exports write the
/// column as a float. Anything else is `None`.
#[must_use]
pub fn coerce_precinct(s: &str) -> Option<i32> {
    let s = s.trim();
    if let Ok(id) = s.parse::<i32>() {
        return Some(id);
    }
    let f = s.parse::<f64>().ok()?;
    if f.fract() != 0.0 || f < f64::from(i32::MIN) || f > f64::from(i32::MAX) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    Some(f as i32)
}

/// Coerces a JSON property value (number or numeric string) to a precinct id.
#[must_use]
pub fn coerce_precinct_value(value: &serde_json::Value) -> Option<i32> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(|id| i32::try_from(id).ok())
            .or_else(|| coerce_precinct(&n.to_string())),
        serde_json::Value::String(s) => coerce_precinct(s),
        _ => None,
    }
}
