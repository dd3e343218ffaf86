//! Lenient conversions from JSON values to column types.
//!
//! Every helper returns `None` when the value cannot be converted; callers
//! pick the default (0 or null).

use serde_json::Value;

/// Integer from a number, numeric string or bool.
pub fn to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().and_then(|u| i64::try_from(u).ok()))
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

/// Non-negative integer, for counts and totals.
pub fn to_u64(value: &Value) -> Option<u64> {
    to_i64(value).and_then(|n| u64::try_from(n).ok())
}

/// Text form of a scalar; objects and arrays become JSON text.
pub fn to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => to_json_text(other),
    }
}

/// JSON text of any non-null value.
pub fn to_json_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => serde_json::to_string(other).ok(),
    }
}

/// Loose truthiness: null, false, 0, "" and empty containers are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
