//! Lenient value extraction for day-entry payloads.
//!
//! Payloads come from the entry form and the spreadsheet importer, so any
//! field can be missing, `null`, a numeric string or plain garbage. Every
//! reader here falls back to "nothing" instead of failing; callers decide
//! whether that means `0.0` or an absent optional.

use serde_json::Value;

/// Coerce a JSON scalar into a finite number.
///
/// Accepts numbers and numeric strings (either `.` or `,` as the decimal
/// separator). Booleans, arrays, objects and non-finite results are `None`.
pub fn number_from_value(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_numeric_str(s),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn parse_numeric_str(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(n) = trimmed.parse::<f64>() {
        return Some(n);
    }
    if !trimmed.contains(',') {
        return None;
    }
    // "1.234,56" and "12,5" as typed into the entry form
    trimmed.replace('.', "").replace(',', ".").parse::<f64>().ok()
}

/// Walk a dotted path (`"a.b.0.c"`). Numeric segments index into arrays.
pub fn value_at<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Number at a dotted path, `0.0` when anything along the way is missing or
/// not coercible.
pub fn number_at(value: &Value, path: &str) -> f64 {
    value_at(value, path)
        .and_then(number_from_value)
        .unwrap_or(0.0)
}

/// First key in `keys` that holds a coercible number, else `0.0`.
pub(crate) fn number_field(value: &Value, keys: &[&str]) -> f64 {
    keys.iter()
        .find_map(|key| value.get(*key).and_then(number_from_value))
        .unwrap_or(0.0)
}

/// Trimmed, non-empty text at a dotted path. Numbers are rendered so that a
/// room typed as `101` matches one typed as `"101"`.
pub fn text_at(value: &Value, path: &str) -> Option<String> {
    value_at(value, path).and_then(text_from_value)
}

pub(crate) fn text_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| value.get(*key).and_then(text_from_value))
}

fn text_from_value(value: &Value) -> Option<String> {
    let rendered = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!rendered.is_empty()).then_some(rendered)
}
