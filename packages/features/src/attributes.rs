//! Helpers for reading and writing scalar attribute values.
//!
//! Source files are inconsistent about types: floor counts and areas show
//! up as JSON numbers in one municipality's export and as strings in the
//! other's. These helpers coerce the way a dataframe `to_numeric` would and
//! map anything unusable to a missing value.

use serde_json::Value;

/// Reads a value as `f64`.
///
/// Accepts JSON numbers and numeric strings (surrounding whitespace
/// ignored). Returns `None` for null, booleans, non-numeric strings and
/// non-finite results.
#[must_use]
pub fn as_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// Reads a value as a non-empty string slice.
#[must_use]
pub fn as_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

/// Renders a scalar as the string key used by lookup tables.
///
/// Purpose-of-use codes are strings in some exports and integers in others,
/// so both are normalized to their textual form.
#[must_use]
pub fn as_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Builds a JSON number from an `f64`, or null if it is not finite.
#[must_use]
pub fn f64_value(value: f64) -> Value {
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}

/// Builds a JSON number from an optional `f64`.
#[must_use]
pub fn opt_f64_value(value: Option<f64>) -> Value {
    value.map_or(Value::Null, f64_value)
}

/// Returns `true` when the value counts as missing.
#[must_use]
pub const fn is_missing(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}
