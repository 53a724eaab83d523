//! Decision and step records of one executor run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::tools::ToolInput;
use crate::types::ChatMessage;

/// Named values passed into and returned from a run.
pub type ChainValues = BTreeMap<String, serde_json::Value>;

/// A decision to invoke one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentAction {
    pub tool: String,
    pub tool_input: ToolInput,
    /// Human-readable description of the decision.
    pub log: String,
    /// Messages that produced this action, replayed verbatim into the
    /// scratchpad. Empty for plain-text actions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub message_log: Vec<ChatMessage>,
}

/// A decision to stop with a final answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentFinish {
    pub return_values: ChainValues,
    pub log: String,
}

/// An executed action and the observation it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStep {
    pub action: AgentAction,
    pub observation: String,
}

/// Outcome of one planning call: exactly one of an action or a finish.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentDecision {
    Action(AgentAction),
    Finish(AgentFinish),
}

impl AgentDecision {
    pub fn is_finish(&self) -> bool {
        matches!(self, Self::Finish(_))
    }
}
