//! Dot-notation JSON path lookup.

use serde_json::Value;

/// Extract a value from nested JSON using dot-notation path.
///
/// Numeric segments index into arrays. Missing segments yield `Value::Null`.
pub fn extract_path<'a>(data: &'a Value, path: &str) -> &'a Value {
    if path.is_empty() {
        return data;
    }

    let mut current = data;
    for key in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(key).unwrap_or(&Value::Null),
            Value::Array(arr) => {
                if let Ok(idx) = key.parse::<usize>() {
                    arr.get(idx).unwrap_or(&Value::Null)
                } else {
                    &Value::Null
                }
            }
            _ => &Value::Null,
        };
    }

    current
}

/// Like [`extract_path`] but `None` for missing or null values.
pub fn lookup<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    match extract_path(data, path) {
        Value::Null => None,
        value => Some(value),
    }
}

/// Items of a page found at `items_path`.
///
/// An array yields its elements, an object is a single item, anything else
/// (including a missing path) yields no items.
pub fn extract_items<'a>(data: &'a Value, items_path: &str) -> Vec<&'a Value> {
    match extract_path(data, items_path) {
        Value::Array(items) => items.iter().collect(),
        value @ Value::Object(_) => vec![value],
        _ => Vec::new(),
    }
}
