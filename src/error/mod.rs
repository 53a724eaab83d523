//! Error types for toolloop.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

use crate::agent::AgentStep;

/// Primary error type for all toolloop operations.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Tool input for `{tool_name}` does not match its declared shape: {message}")]
    InputShapeMismatch { tool_name: String, message: String },

    #[error("Unexpected chat message type: expected ai, got {got}")]
    UnexpectedMessageType { got: String },

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Callback error: {0}")]
    Callback(String),

    #[error("Canceled")]
    Canceled,

    #[error("Agent stopped after reaching the iteration limit ({} steps)", steps.len())]
    MaxIterationsReached { steps: Vec<AgentStep> },
}

impl AgentError {
    /// Create an API error from a status code and message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a tool execution error.
    pub fn tool(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::RateLimited { .. } => ErrorCategory::ProviderTransient,
            Self::Api { status, .. } => match status {
                429 | 500 => ErrorCategory::ProviderTransient,
                _ => ErrorCategory::ProviderFatal,
            },
            Self::Authentication(_) | Self::Network(_) | Self::Stream(_) => {
                ErrorCategory::ProviderFatal
            }
            Self::InputShapeMismatch { .. } => ErrorCategory::InputShape,
            Self::UnexpectedMessageType { .. } => ErrorCategory::Protocol,
            Self::ToolExecution { .. } | Self::ToolNotFound(_) => ErrorCategory::ToolExecution,
            Self::Canceled => ErrorCategory::Canceled,
            Self::MaxIterationsReached { .. } => ErrorCategory::MaxIterations,
            Self::Configuration(_) | Self::InvalidArgument(_) | Self::Template(_) => {
                ErrorCategory::Configuration
            }
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Callback(_) => ErrorCategory::Callback,
            Self::Io(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether the model client may retry the request that produced this error.
    ///
    /// Only HTTP 429 and 500 qualify.
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::ProviderTransient
    }

    /// Whether the caller aborted the run.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            Self::Authentication(_) => RecoverySuggestion::CheckCredentials,
            _ => match self.category() {
                ErrorCategory::ProviderTransient => RecoverySuggestion::RetryWithDelay,
                ErrorCategory::InputShape => RecoverySuggestion::CheckToolSchema,
                ErrorCategory::ToolExecution => RecoverySuggestion::CheckToolImplementation,
                ErrorCategory::MaxIterations => RecoverySuggestion::RaiseIterationLimit,
                ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
                _ => RecoverySuggestion::None,
            },
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, AgentError>;
