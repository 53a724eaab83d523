//! Error classification used by retry and callers.

use serde::{Deserialize, Serialize};

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Rate limited (429) or server error (500); safe to retry the same request.
    ProviderTransient,
    /// Any other provider or transport failure.
    ProviderFatal,
    /// Tool input did not decode into the tool's declared shape.
    InputShape,
    /// The model answered with something other than an AI message.
    Protocol,
    ToolExecution,
    Canceled,
    MaxIterations,
    Configuration,
    Serialization,
    Callback,
    Unknown,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    RetryWithDelay,
    CheckCredentials,
    CheckConfiguration,
    CheckToolImplementation,
    CheckToolSchema,
    RaiseIterationLimit,
    None,
}
