//! Tool registry and the invocation protocol.

use std::sync::Arc;

use super::arguments::ToolArguments;
use super::input::{ToolInput, ToolValue};
use super::tool::{Tool, ToolContext};
use super::types::{InputShape, ToolSignature, TEXT_INPUT_FIELD};
use super::validation::validate_arguments;
use crate::callbacks::CallbackManager;
use crate::error::{AgentError, Result};

/// Signature of `tool` as declared to the model.
pub fn describe(tool: &dyn Tool) -> ToolSignature {
    ToolSignature {
        name: tool.name().to_string(),
        description: tool.description().to_string(),
        parameters: tool.input_shape().parameters().schema,
    }
}

/// Decode a raw input into the value `tool` accepts.
///
/// Structured tools require a JSON object that satisfies their schema. Text
/// tools take text unchanged and unwrap the single `__arg1` field when the
/// model sent a structured call. Arguments that are not JSON at all reach a
/// text tool verbatim.
pub fn decode_input(tool: &dyn Tool, input: &ToolInput) -> Result<ToolValue> {
    let mismatch = |message: String| AgentError::InputShapeMismatch {
        tool_name: tool.name().to_string(),
        message,
    };

    match tool.input_shape() {
        InputShape::Text => match input {
            ToolInput::Text(text) => Ok(ToolValue::Text(text.clone())),
            ToolInput::Structured(raw) => {
                let text = match serde_json::from_str::<serde_json::Value>(raw) {
                    Ok(serde_json::Value::String(text)) => text,
                    Ok(serde_json::Value::Object(map)) => match map.get(TEXT_INPUT_FIELD) {
                        Some(serde_json::Value::String(text)) => text.clone(),
                        Some(other) => {
                            return Err(mismatch(format!(
                                "field '{TEXT_INPUT_FIELD}' must be a string, got {other}"
                            )))
                        }
                        None => raw.clone(),
                    },
                    _ => raw.clone(),
                };
                Ok(ToolValue::Text(text))
            }
        },
        InputShape::Object(params) => {
            let value = input.to_value().map_err(|e| mismatch(e.to_string()))?;
            validate_arguments(&value, &params.schema).map_err(mismatch)?;
            Ok(ToolValue::Arguments(ToolArguments::new(value)))
        }
    }
}

/// Run `tool` with `input`, reporting lifecycle events to `callbacks`.
///
/// `on_tool_start` fires first; exactly one of `on_tool_end` or
/// `on_tool_error` follows. Failures are not retried. Errors raised by the
/// tool itself are reported as [`AgentError::ToolExecution`], except
/// cancellation and shape mismatches which keep their kind.
pub async fn invoke(
    tool: &dyn Tool,
    input: &ToolInput,
    ctx: &ToolContext,
    callbacks: &CallbackManager,
) -> Result<String> {
    let name = tool.name();
    callbacks.tool_start(name, input)?;

    let outcome = match decode_input(tool, input) {
        Ok(value) => {
            tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => Err(AgentError::Canceled),
                result = tool.run(ctx, value) => result.map_err(|e| match e {
                    AgentError::Canceled
                    | AgentError::InputShapeMismatch { .. }
                    | AgentError::ToolExecution { .. } => e,
                    other => AgentError::tool(name, other.to_string()),
                }),
            }
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(output) => {
            callbacks.tool_end(name, &output)?;
            Ok(output)
        }
        Err(e) => {
            tracing::debug!(tool = name, error = %e, "tool invocation failed");
            callbacks.tool_error(name, &e)?;
            Err(e)
        }
    }
}

/// Ordered, immutable-after-construction set of tools.
///
/// Safe to share across concurrent runs behind an `Arc`.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of tools, rejecting duplicate names.
    pub fn from_tools(tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Result<Self> {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        if self.get(tool.name()).is_some() {
            return Err(AgentError::Configuration(format!(
                "duplicate tool name: {}",
                tool.name()
            )));
        }
        self.tools.push(tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Signatures in registration order.
    pub fn signatures(&self) -> Vec<ToolSignature> {
        self.tools.iter().map(|t| describe(t.as_ref())).collect()
    }

    /// Look up `name` and [`invoke`] it.
    pub async fn invoke(
        &self,
        name: &str,
        input: &ToolInput,
        ctx: &ToolContext,
        callbacks: &CallbackManager,
    ) -> Result<String> {
        let tool = self
            .get(name)
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))?;
        invoke(tool.as_ref(), input, ctx, callbacks).await
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
