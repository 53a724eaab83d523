//! Minimal chat prompt rendering.
//!
//! A [`ChatTemplate`] is a pure function from a variable map to a message
//! list. Text templates substitute `{{name}}` (or `{{.name}}`) placeholders;
//! [`MessageTemplate::Placeholder`] splices in a whole message list.

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::agent::ChainValues;
use crate::error::{AgentError, Result};
use crate::types::ChatMessage;

fn variable_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{\s*\.?([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid template pattern")
    })
}

/// Substitute every `{{name}}` in `template` from `values`.
pub fn render(template: &str, values: &ChainValues) -> Result<String> {
    let mut missing = None;
    let rendered = variable_pattern().replace_all(template, |caps: &Captures<'_>| {
        let name = &caps[1];
        match values.get(name) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });
    match missing {
        Some(name) => Err(AgentError::Template(format!("missing template variable: {name}"))),
        None => Ok(rendered.into_owned()),
    }
}

/// One entry of a chat template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageTemplate {
    System(String),
    Human(String),
    Ai(String),
    /// Splice in the message list stored under this key.
    Placeholder(String),
}

impl MessageTemplate {
    pub fn system(template: impl Into<String>) -> Self {
        Self::System(template.into())
    }

    pub fn human(template: impl Into<String>) -> Self {
        Self::Human(template.into())
    }

    pub fn ai(template: impl Into<String>) -> Self {
        Self::Ai(template.into())
    }

    pub fn placeholder(key: impl Into<String>) -> Self {
        Self::Placeholder(key.into())
    }
}

/// Ordered list of message templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatTemplate {
    messages: Vec<MessageTemplate>,
}

impl ChatTemplate {
    pub fn new(messages: Vec<MessageTemplate>) -> Self {
        Self { messages }
    }

    /// Render into messages. Text variables come from `values`; placeholder
    /// lists come from `lists`.
    pub fn format(
        &self,
        values: &ChainValues,
        lists: &HashMap<String, Vec<ChatMessage>>,
    ) -> Result<Vec<ChatMessage>> {
        let mut out = Vec::with_capacity(self.messages.len());
        for template in &self.messages {
            match template {
                MessageTemplate::System(t) => out.push(ChatMessage::system(render(t, values)?)),
                MessageTemplate::Human(t) => out.push(ChatMessage::human(render(t, values)?)),
                MessageTemplate::Ai(t) => out.push(ChatMessage::ai(render(t, values)?)),
                MessageTemplate::Placeholder(key) => {
                    let messages = lists.get(key).ok_or_else(|| {
                        AgentError::Template(format!("missing messages placeholder: {key}"))
                    })?;
                    out.extend(messages.iter().cloned());
                }
            }
        }
        Ok(out)
    }

    /// Names of the text variables referenced by the templates.
    pub fn input_variables(&self) -> BTreeSet<String> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                MessageTemplate::System(t) | MessageTemplate::Human(t) | MessageTemplate::Ai(t) => {
                    Some(t)
                }
                MessageTemplate::Placeholder(_) => None,
            })
            .flat_map(|t| variable_pattern().captures_iter(t).map(|c| c[1].to_string()))
            .collect()
    }
}
