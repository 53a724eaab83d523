//! Decoded arguments of a structured tool call.

use serde_json::Value;

use crate::error::AgentError;

/// Arguments that already passed the tool's schema check.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolArguments {
    value: Value,
}

impl ToolArguments {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn raw(&self) -> &Value {
        &self.value
    }

    /// String field `key`, or [`AgentError::InvalidArgument`] when it is absent
    /// or not a string.
    pub fn get_str(&self, key: &str) -> Result<&str, AgentError> {
        self.get_str_opt(key).ok_or_else(|| match self.value.get(key) {
            None => AgentError::InvalidArgument(format!("missing argument '{key}'")),
            Some(other) => {
                AgentError::InvalidArgument(format!("argument '{key}' is not a string: {other}"))
            }
        })
    }

    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(Value::as_str)
    }

    /// Decode the whole argument object into the tool's input type.
    ///
    /// Failure is reported as [`AgentError::InputShapeMismatch`] for `tool_name`.
    pub fn decode<T: serde::de::DeserializeOwned>(&self, tool_name: &str) -> Result<T, AgentError> {
        T::deserialize(&self.value).map_err(|e| AgentError::InputShapeMismatch {
            tool_name: tool_name.to_string(),
            message: e.to_string(),
        })
    }
}
