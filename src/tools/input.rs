//! Raw tool input chosen by the agent and the decoded value handed to a tool.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::arguments::ToolArguments;
use crate::error::AgentError;

/// Tool input as produced by the decision engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ToolInput {
    /// Plain text input.
    Text(String),
    /// Serialized JSON argument payload from a structured call.
    Structured(String),
}

impl ToolInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Wrap the argument string of a structured call.
    pub fn from_arguments(arguments: impl Into<String>) -> Self {
        Self::Structured(arguments.into())
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    /// Parse the payload as a generic JSON value.
    ///
    /// Text input becomes a JSON string; empty structured payloads become `{}`.
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::Text(text) => Ok(serde_json::Value::String(text.clone())),
            Self::Structured(raw) if raw.trim().is_empty() => Ok(serde_json::json!({})),
            Self::Structured(raw) => serde_json::from_str(raw),
        }
    }
}

impl fmt::Display for ToolInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Structured(raw) => match self.to_value() {
                Ok(value) => write!(f, "{value}"),
                Err(_) => f.write_str(raw),
            },
        }
    }
}

/// Decoded input passed to [`Tool::run`](super::Tool::run).
#[derive(Debug, Clone, PartialEq)]
pub enum ToolValue {
    Text(String),
    Arguments(ToolArguments),
}

impl ToolValue {
    pub fn as_text(&self) -> Result<&str, AgentError> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Arguments(_) => Err(AgentError::InvalidArgument(
                "expected text input, got structured arguments".into(),
            )),
        }
    }

    pub fn arguments(&self) -> Result<&ToolArguments, AgentError> {
        match self {
            Self::Arguments(args) => Ok(args),
            Self::Text(_) => Err(AgentError::InvalidArgument(
                "expected structured arguments, got text input".into(),
            )),
        }
    }
}
