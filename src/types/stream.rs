//! Streaming delta types.

use serde::{Deserialize, Serialize};

use super::generation::FinishReason;
use super::usage::Usage;

/// One incremental fragment of a streamed chat completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChatChunk {
    /// May be empty; such chunks carry nothing to merge.
    pub choices: Vec<ChunkChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: ChunkDelta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChunkDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCallDelta>,
}

/// Partial structured call; `arguments` is a JSON fragment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FunctionCallDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

impl ChatChunk {
    /// A chunk carrying only a text fragment.
    pub fn text(content: impl Into<String>) -> Self {
        Self::from_delta(ChunkDelta {
            content: Some(content.into()),
            ..Default::default()
        })
    }

    /// A chunk carrying a role and no content.
    pub fn role(role: impl Into<String>) -> Self {
        Self::from_delta(ChunkDelta {
            role: Some(role.into()),
            ..Default::default()
        })
    }

    /// A chunk carrying a partial function call.
    pub fn function_call(name: Option<&str>, arguments: Option<&str>) -> Self {
        Self::from_delta(ChunkDelta {
            function_call: Some(FunctionCallDelta {
                name: name.map(str::to_string),
                arguments: arguments.map(str::to_string),
            }),
            ..Default::default()
        })
    }

    pub fn from_delta(delta: ChunkDelta) -> Self {
        Self {
            choices: vec![ChunkChoice {
                index: 0,
                delta,
                finish_reason: None,
            }],
            usage: None,
        }
    }

    pub fn with_finish_reason(mut self, reason: FinishReason) -> Self {
        if let Some(choice) = self.choices.first_mut() {
            choice.finish_reason = Some(reason);
        }
        self
    }
}
