use serde_json::{Map, Value};

/// Nesting deeper than this is dropped.
pub const MAX_DEPTH: usize = 64;

/// Plain copy of a snapshot tree suitable for long-term storage.
///
/// Scalars, arrays and objects are copied; anything nested beyond
/// [`MAX_DEPTH`] is left out silently. Empty arrays and objects stay.
pub fn sanitize(value: &Value) -> Value {
    visit(value, 0).unwrap_or_else(|| Value::Object(Map::new()))
}

fn visit(value: &Value, depth: usize) -> Option<Value> {
    if depth > MAX_DEPTH {
        return None;
    }
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Some(value.clone()),
        Value::Array(items) => Some(Value::Array(
            items.iter().filter_map(|item| visit(item, depth + 1)).collect(),
        )),
        Value::Object(fields) => Some(Value::Object(
            fields
                .iter()
                .filter_map(|(key, field)| visit(field, depth + 1).map(|v| (key.clone(), v)))
                .collect(),
        )),
    }
}
