//! Lifecycle hooks for tool calls, model calls and agent decisions.
//!
//! Hooks run synchronously on the calling task. An error returned by any
//! handler aborts the current step and is surfaced unchanged to the caller.

mod logging;
mod stream_writer;
mod usage;

use std::sync::Arc;

use uuid::Uuid;

use crate::agent::{AgentAction, AgentFinish};
use crate::error::Result;
use crate::tools::ToolInput;
use crate::types::ModelResult;

pub use self::logging::TracingHandler;
pub use self::stream_writer::StreamWriterHandler;
pub use self::usage::{token_cost, UsageHandler, UsageReport};

/// Payload for [`Callback::on_tool_start`].
#[derive(Debug, Clone, Copy)]
pub struct ToolStartInput<'a> {
    pub run_id: Uuid,
    pub tool_name: &'a str,
    pub input: &'a ToolInput,
}

/// Payload for [`Callback::on_tool_end`].
#[derive(Debug, Clone, Copy)]
pub struct ToolEndInput<'a> {
    pub run_id: Uuid,
    pub tool_name: &'a str,
    pub output: &'a str,
}

/// Payload for [`Callback::on_tool_error`].
#[derive(Debug, Clone, Copy)]
pub struct ToolErrorInput<'a> {
    pub run_id: Uuid,
    pub tool_name: &'a str,
    pub error: &'a crate::error::AgentError,
}

/// Payload for [`Callback::on_model_new_token`].
#[derive(Debug, Clone, Copy)]
pub struct ModelNewTokenInput<'a> {
    pub run_id: Uuid,
    pub token: &'a str,
}

/// Payload for [`Callback::on_model_end`].
#[derive(Debug, Clone, Copy)]
pub struct ModelEndInput<'a> {
    pub run_id: Uuid,
    pub result: &'a ModelResult,
}

/// Observer of run lifecycle events. Every hook defaults to a no-op.
pub trait Callback: Send + Sync {
    fn on_tool_start(&self, _input: ToolStartInput<'_>) -> Result<()> {
        Ok(())
    }

    fn on_tool_end(&self, _input: ToolEndInput<'_>) -> Result<()> {
        Ok(())
    }

    fn on_tool_error(&self, _input: ToolErrorInput<'_>) -> Result<()> {
        Ok(())
    }

    /// Called once per non-empty streamed content fragment, in arrival order.
    fn on_model_new_token(&self, _input: ModelNewTokenInput<'_>) -> Result<()> {
        Ok(())
    }

    fn on_model_end(&self, _input: ModelEndInput<'_>) -> Result<()> {
        Ok(())
    }

    fn on_agent_action(&self, _run_id: Uuid, _action: &AgentAction) -> Result<()> {
        Ok(())
    }

    fn on_agent_finish(&self, _run_id: Uuid, _finish: &AgentFinish) -> Result<()> {
        Ok(())
    }
}

/// Fans events out to a list of handlers, tagged with one run id.
#[derive(Clone, Default)]
pub struct CallbackManager {
    run_id: Uuid,
    handlers: Vec<Arc<dyn Callback>>,
}

impl CallbackManager {
    pub fn new(handlers: Vec<Arc<dyn Callback>>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            handlers,
        }
    }

    /// Add a handler.
    pub fn with_handler(mut self, handler: Arc<dyn Callback>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Same handlers, tagged with `run_id`.
    pub fn for_run(&self, run_id: Uuid) -> Self {
        Self {
            run_id,
            handlers: self.handlers.clone(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn tool_start(&self, tool_name: &str, input: &ToolInput) -> Result<()> {
        let payload = ToolStartInput {
            run_id: self.run_id,
            tool_name,
            input,
        };
        self.handlers.iter().try_for_each(|h| h.on_tool_start(payload))
    }

    pub fn tool_end(&self, tool_name: &str, output: &str) -> Result<()> {
        let payload = ToolEndInput {
            run_id: self.run_id,
            tool_name,
            output,
        };
        self.handlers.iter().try_for_each(|h| h.on_tool_end(payload))
    }

    pub fn tool_error(&self, tool_name: &str, error: &crate::error::AgentError) -> Result<()> {
        let payload = ToolErrorInput {
            run_id: self.run_id,
            tool_name,
            error,
        };
        self.handlers.iter().try_for_each(|h| h.on_tool_error(payload))
    }

    pub fn model_new_token(&self, token: &str) -> Result<()> {
        let payload = ModelNewTokenInput {
            run_id: self.run_id,
            token,
        };
        self.handlers
            .iter()
            .try_for_each(|h| h.on_model_new_token(payload))
    }

    pub fn model_end(&self, result: &ModelResult) -> Result<()> {
        let payload = ModelEndInput {
            run_id: self.run_id,
            result,
        };
        self.handlers.iter().try_for_each(|h| h.on_model_end(payload))
    }

    pub fn agent_action(&self, action: &AgentAction) -> Result<()> {
        self.handlers
            .iter()
            .try_for_each(|h| h.on_agent_action(self.run_id, action))
    }

    pub fn agent_finish(&self, finish: &AgentFinish) -> Result<()> {
        self.handlers
            .iter()
            .try_for_each(|h| h.on_agent_finish(self.run_id, finish))
    }
}

impl std::fmt::Debug for CallbackManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackManager")
            .field("run_id", &self.run_id)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
