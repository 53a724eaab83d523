//! Normalized model results.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::message::{ChatMessage, FunctionCall};
use super::usage::Usage;

/// Why generation finished.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    FunctionCall,
    ToolCalls,
    ContentFilter,
}

/// One candidate answer from the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Generation {
    pub text: String,
    pub message: ChatMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

/// Provenance metadata for a model call.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LlmOutput {
    pub model_name: String,
    /// Best effort in streaming mode; may be all zeros.
    pub token_usage: Usage,
}

/// Result of a single model client invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelResult {
    pub generations: Vec<Generation>,
    pub llm_output: LlmOutput,
}

/// A message as reported by a provider, before role normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderMessage {
    pub role: String,
    pub content: String,
    pub name: Option<String>,
    pub function_call: Option<FunctionCall>,
}

impl ProviderMessage {
    /// Map a provider role onto the [`ChatMessage`] union.
    pub fn into_chat_message(self) -> ChatMessage {
        match self.role.as_str() {
            "user" => ChatMessage::human(self.content),
            "assistant" => ChatMessage::Ai {
                text: self.content,
                function_call: self.function_call,
            },
            "system" => ChatMessage::system(self.content),
            "function" => ChatMessage::function(self.name.unwrap_or_default(), self.content),
            "" => ChatMessage::generic("unknown", self.content),
            other => ChatMessage::generic(other, self.content),
        }
    }
}
