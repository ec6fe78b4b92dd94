use serde_json::Value;

/// Normalizes a list response into an item batch. Priority order: a bare
/// array is used directly, then an `items` field, then a `data` field,
/// defaulting to an empty batch.
pub fn extract_items(response: &Value) -> Vec<Value> {
    if let Some(items) = response.as_array() {
        return items.clone();
    }
    for field in ["items", "data"] {
        if let Some(items) = response.get(field).and_then(|value| value.as_array()) {
            return items.clone();
        }
    }
    Vec::new()
}

/// First non-null value among the candidate fields of an object.
pub fn pick<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    for key in keys {
        if let Some(value) = item.get(key) {
            if !value.is_null() {
                return Some(value);
            }
        }
    }
    None
}
