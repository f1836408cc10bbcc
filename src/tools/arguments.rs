//! Typed access to tool call arguments.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::DbChatError;

/// Arguments the model supplied for one tool call.
///
/// Models occasionally send the arguments object as a JSON-encoded string;
/// [`ToolArguments::new`] unwraps that form so callers always see an object.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolArguments {
    value: Value,
}

impl ToolArguments {
    pub fn new(value: Value) -> Self {
        let value = match value {
            Value::String(raw) if raw.trim().is_empty() => Value::Object(Default::default()),
            Value::String(raw) => match serde_json::from_str::<Value>(raw.trim()) {
                Ok(parsed @ Value::Object(_)) => parsed,
                _ => Value::String(raw),
            },
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        Self { value }
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &Value {
        &self.value
    }

    pub fn into_raw(self) -> Value {
        self.value
    }

    /// Get a required string argument.
    pub fn get_str(&self, key: &str) -> Result<&str, DbChatError> {
        self.get_str_opt(key)
            .ok_or_else(|| DbChatError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(Value::as_str)
    }

    /// Get an optional integer argument; numeric strings are accepted.
    pub fn get_i64_opt(&self, key: &str) -> Result<Option<i64>, DbChatError> {
        match self.value.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .map(Some)
                .ok_or_else(|| DbChatError::InvalidArgument(format!("{key} is out of range"))),
            Some(Value::String(s)) => s.trim().parse::<i64>().map(Some).map_err(|_| {
                DbChatError::InvalidArgument(format!("{key} must be an integer, got '{s}'"))
            }),
            Some(other) => Err(DbChatError::InvalidArgument(format!(
                "{key} must be an integer, got {other}"
            ))),
        }
    }

    /// Get an optional list of strings; a single string is treated as a one-element list.
    pub fn get_string_list(&self, key: &str) -> Result<Vec<String>, DbChatError> {
        match self.value.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::String(s)) => Ok(vec![s.clone()]),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        DbChatError::InvalidArgument(format!("{key} must contain only strings"))
                    })
                })
                .collect(),
            Some(other) => Err(DbChatError::InvalidArgument(format!(
                "{key} must be a list of strings, got {other}"
            ))),
        }
    }

    /// Deserialize the entire arguments into a typed struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, DbChatError> {
        serde_json::from_value(self.value.clone()).map_err(|e| {
            DbChatError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }
}
