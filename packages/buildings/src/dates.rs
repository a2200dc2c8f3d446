//! Completion date parsing.
//!
//! Helsinki exports completion dates as `2001-05-31T00:00:00`, Espoo as
//! `31.5.2001`. The join normalizes both to ISO dates and refuses anything
//! else; the elaboration step re-parses leniently and treats failures as
//! missing.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::BuildingsError;

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const FINNISH_DATE_FORMAT: &str = "%d.%m.%Y";
const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Normalizes a raw completion date to `YYYY-MM-DD`.
///
/// Null stays null.
///
/// # Errors
///
/// Returns [`BuildingsError::UnrecognizedDate`] with the offending value if
/// it is not a string in one of the two register formats.
pub fn standardize_date(value: &Value) -> Result<Value, BuildingsError> {
    let unrecognized = || BuildingsError::UnrecognizedDate {
        value: value.to_string(),
    };

    match value {
        Value::Null => Ok(Value::Null),
        Value::String(s) => NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
            .map(|dt| dt.date())
            .or_else(|_| NaiveDate::parse_from_str(s, FINNISH_DATE_FORMAT))
            .map(|date| Value::String(date.format(ISO_DATE_FORMAT).to_string()))
            .map_err(|_| unrecognized()),
        _ => Err(unrecognized()),
    }
}

/// Parses a completion date leniently. Unparseable values are `None`.
#[must_use]
pub fn parse_completion_date(value: &Value) -> Option<NaiveDate> {
    let s = value.as_str()?.trim();
    NaiveDate::parse_from_str(s, ISO_DATE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).map(|dt| dt.date()))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(s, FINNISH_DATE_FORMAT))
        .ok()
}
