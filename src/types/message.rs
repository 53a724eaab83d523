//! Chat message types exchanged with models and replayed into scratchpads.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A structured call request attached to an AI message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunctionCall {
    pub name: String,
    /// Call arguments as serialized JSON, exactly as produced by the model.
    pub arguments: String,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// Discriminant of a [`ChatMessage`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageType {
    Human,
    Ai,
    System,
    Function,
    Generic,
}

/// An immutable conversation message.
///
/// Each variant carries only the fields its role needs: AI messages may
/// carry a structured call, function messages name the tool that produced
/// them and generic messages keep an arbitrary role string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatMessage {
    Human {
        text: String,
    },
    Ai {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        function_call: Option<FunctionCall>,
    },
    System {
        text: String,
    },
    Function {
        name: String,
        text: String,
    },
    Generic {
        role: String,
        text: String,
    },
}

impl ChatMessage {
    /// Create a human message.
    pub fn human(text: impl Into<String>) -> Self {
        Self::Human { text: text.into() }
    }

    /// Create a plain AI message.
    pub fn ai(text: impl Into<String>) -> Self {
        Self::Ai {
            text: text.into(),
            function_call: None,
        }
    }

    /// Create an AI message requesting a function call.
    pub fn ai_with_call(text: impl Into<String>, call: FunctionCall) -> Self {
        Self::Ai {
            text: text.into(),
            function_call: Some(call),
        }
    }

    /// Create a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self::System { text: text.into() }
    }

    /// Create a function result message.
    pub fn function(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Function {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Create a message with an arbitrary role.
    pub fn generic(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Generic {
            role: role.into(),
            text: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Human { text }
            | Self::Ai { text, .. }
            | Self::System { text }
            | Self::Function { text, .. }
            | Self::Generic { text, .. } => text,
        }
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Human { .. } => MessageType::Human,
            Self::Ai { .. } => MessageType::Ai,
            Self::System { .. } => MessageType::System,
            Self::Function { .. } => MessageType::Function,
            Self::Generic { .. } => MessageType::Generic,
        }
    }

    /// The structured call carried by an AI message, if any.
    pub fn function_call(&self) -> Option<&FunctionCall> {
        match self {
            Self::Ai { function_call, .. } => function_call.as_ref(),
            _ => None,
        }
    }
}

/// Role labels used when rendering a conversation as plain text.
#[derive(Debug, Clone)]
pub struct TranscriptPrefixes {
    pub human: String,
    pub ai: String,
    pub system: String,
    pub function: String,
}

impl Default for TranscriptPrefixes {
    fn default() -> Self {
        Self {
            human: "Human".to_string(),
            ai: "AI".to_string(),
            system: "System".to_string(),
            function: "Function".to_string(),
        }
    }
}

/// Render messages as `Role: text` lines joined by newlines.
///
/// Generic messages use their own role string as the prefix.
pub fn format_transcript(messages: &[ChatMessage], prefixes: &TranscriptPrefixes) -> String {
    messages
        .iter()
        .map(|message| {
            let role = match message {
                ChatMessage::Human { .. } => prefixes.human.as_str(),
                ChatMessage::Ai { .. } => prefixes.ai.as_str(),
                ChatMessage::System { .. } => prefixes.system.as_str(),
                ChatMessage::Function { .. } => prefixes.function.as_str(),
                ChatMessage::Generic { role, .. } => role.as_str(),
            };
            format!("{role}: {}", message.text())
        })
        .collect::<Vec<_>>()
        .join("\n")
}
