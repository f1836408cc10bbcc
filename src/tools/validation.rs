//! Check tool call arguments against the tool's JSON Schema before execution.

use serde_json::Value;

use super::types::AgentToolParameters;
use crate::error::DbChatError;

/// Validate `args` against the top level of `params`.
///
/// Covers the object type, required keys, declared property types and, for
/// arrays, the declared item type. Unknown keys and schema keywords are ignored.
/// Numeric strings pass as integers and a single item passes as a one-element
/// array, matching [`ToolArguments`](super::ToolArguments).
pub fn validate_arguments(args: &Value, params: &AgentToolParameters) -> Result<(), DbChatError> {
    check(args, &params.schema).map_err(DbChatError::InvalidArgument)
}

fn check(args: &Value, schema: &Value) -> Result<(), String> {
    if schema.get("type").and_then(Value::as_str) == Some("object") && !args.is_object() {
        return Err(format!("expected object arguments, got {}", type_name(args)));
    }
    let Some(obj) = args.as_object() else {
        return Ok(());
    };

    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str);
    for name in required {
        if obj.get(name).map_or(true, Value::is_null) {
            return Err(format!("missing required field '{name}'"));
        }
    }

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };
    for (key, value) in obj {
        let Some(prop) = properties.get(key) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        let item_type = prop.pointer("/items/type").and_then(Value::as_str);
        if let Some(expected) = prop.get("type").and_then(Value::as_str) {
            if !matches_type(value, expected) && !coercible(value, expected, item_type) {
                return Err(format!(
                    "field '{key}' expected type '{expected}', got {}",
                    type_name(value)
                ));
            }
        }
        if let (Some(items), Some(item_type)) = (value.as_array(), item_type) {
            if let Some(bad) = items.iter().find(|item| !matches_type(item, item_type)) {
                return Err(format!(
                    "field '{key}' expected items of type '{item_type}', got {}",
                    type_name(bad)
                ));
            }
        }
    }

    Ok(())
}

fn matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => {
            value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

/// Loose forms the argument accessors accept: numeric strings for integers and
/// a bare value for an array of that value's type.
fn coercible(value: &Value, expected: &str, item_type: Option<&str>) -> bool {
    match (expected, value) {
        ("integer", Value::String(s)) => s.trim().parse::<i64>().is_ok(),
        ("array", other) => item_type.is_some_and(|item| matches_type(other, item)),
        _ => false,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
