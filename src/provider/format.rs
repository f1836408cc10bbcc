//! Provider formatting helpers.

use serde_json::Value;

/// Tool results go to the model as plain strings; JSON strings are not re-quoted.
pub(crate) fn tool_result_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
