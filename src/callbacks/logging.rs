use uuid::Uuid;

use super::{Callback, ModelEndInput, ToolEndInput, ToolErrorInput, ToolStartInput};
use crate::agent::{AgentAction, AgentFinish};
use crate::error::Result;

/// Forwards lifecycle events to `tracing`.
///
/// Attach it per run to get verbose output; nothing is logged through this
/// handler unless it is registered.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHandler;

impl Callback for TracingHandler {
    fn on_tool_start(&self, input: ToolStartInput<'_>) -> Result<()> {
        tracing::info!(
            run_id = %input.run_id,
            tool = input.tool_name,
            input = %input.input,
            "tool start"
        );
        Ok(())
    }

    fn on_tool_end(&self, input: ToolEndInput<'_>) -> Result<()> {
        tracing::info!(
            run_id = %input.run_id,
            tool = input.tool_name,
            output = input.output,
            "tool end"
        );
        Ok(())
    }

    fn on_tool_error(&self, input: ToolErrorInput<'_>) -> Result<()> {
        tracing::warn!(
            run_id = %input.run_id,
            tool = input.tool_name,
            error = %input.error,
            "tool error"
        );
        Ok(())
    }

    fn on_model_end(&self, input: ModelEndInput<'_>) -> Result<()> {
        let output = &input.result.llm_output;
        tracing::debug!(
            run_id = %input.run_id,
            model = %output.model_name,
            prompt_tokens = output.token_usage.prompt_tokens,
            completion_tokens = output.token_usage.completion_tokens,
            generations = input.result.generations.len(),
            "model end"
        );
        Ok(())
    }

    fn on_agent_action(&self, run_id: Uuid, action: &AgentAction) -> Result<()> {
        tracing::info!(%run_id, tool = %action.tool, "{}", action.log.trim());
        Ok(())
    }

    fn on_agent_finish(&self, run_id: Uuid, finish: &AgentFinish) -> Result<()> {
        tracing::info!(
            %run_id,
            keys = ?finish.return_values.keys().collect::<Vec<_>>(),
            "agent finish"
        );
        Ok(())
    }
}
