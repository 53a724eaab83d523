//! The control loop: plan, act, observe, repeat.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::context::RunContext;
use super::types::{AgentDecision, AgentFinish, AgentStep, ChainValues};
use super::Agent;
use crate::callbacks::CallbackManager;
use crate::error::{AgentError, Result};
use crate::tools::{ToolContext, ToolRegistry};

/// Output key holding the step history when it is requested.
pub const INTERMEDIATE_STEPS_KEY: &str = "intermediate_steps";

/// Settings for [`Executor`].
///
/// | field | default | effect |
/// |---|---|---|
/// | `max_iterations` | `5` | planning calls allowed before giving up |
/// | `return_intermediate_steps` | `false` | add the step history to the output |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    pub max_iterations: usize,
    pub return_intermediate_steps: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            return_intermediate_steps: false,
        }
    }
}

/// Drives an [`Agent`] until it finishes or runs out of iterations.
///
/// One executor may serve concurrent runs; each run owns its step history.
#[derive(Clone)]
pub struct Executor {
    agent: Arc<dyn Agent>,
    tools: Arc<ToolRegistry>,
    config: ExecutorConfig,
    callbacks: CallbackManager,
}

impl Executor {
    pub fn new(agent: Arc<dyn Agent>, tools: Arc<ToolRegistry>, config: ExecutorConfig) -> Self {
        Self {
            agent,
            tools,
            config,
            callbacks: CallbackManager::default(),
        }
    }

    /// Handlers notified during every run.
    pub fn with_callbacks(mut self, callbacks: CallbackManager) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run with a single `input` value and return the agent's answer.
    pub async fn run(&self, input: impl Into<String>) -> Result<String> {
        self.run_with_cancel(input, CancellationToken::new()).await
    }

    pub async fn run_with_cancel(
        &self,
        input: impl Into<String>,
        cancel: CancellationToken,
    ) -> Result<String> {
        let input_key = self
            .agent
            .input_keys()
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Configuration("agent declares no input keys".into()))?;
        let inputs = ChainValues::from([(input_key, serde_json::Value::String(input.into()))]);

        let outputs = self.call_with_cancel(inputs, cancel).await?;
        let output_key = self
            .agent
            .output_keys()
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Configuration("agent declares no output keys".into()))?;

        match outputs.get(&output_key) {
            Some(serde_json::Value::String(text)) => Ok(text.clone()),
            Some(other) => Ok(other.to_string()),
            None => Err(AgentError::InvalidArgument(format!(
                "missing output key `{output_key}`"
            ))),
        }
    }

    /// Run with named inputs and return the agent's output values.
    pub async fn call(&self, inputs: ChainValues) -> Result<ChainValues> {
        self.call_with_cancel(inputs, CancellationToken::new()).await
    }

    /// Like [`call`](Self::call), aborting with [`AgentError::Canceled`] when
    /// `cancel` fires. No tool runs after cancellation is observed.
    pub async fn call_with_cancel(
        &self,
        inputs: ChainValues,
        cancel: CancellationToken,
    ) -> Result<ChainValues> {
        for key in self.agent.input_keys() {
            if !inputs.contains_key(&key) {
                return Err(AgentError::InvalidArgument(format!("missing input key `{key}`")));
            }
        }

        let ctx = RunContext::new(cancel, &self.callbacks);
        info!(
            run_id = %ctx.run_id,
            max_iterations = self.config.max_iterations,
            "executor run started"
        );

        let mut steps: Vec<AgentStep> = Vec::new();
        let mut iterations = 0;

        while iterations < self.config.max_iterations {
            if ctx.cancel.is_cancelled() {
                info!(run_id = %ctx.run_id, iterations, "executor run canceled");
                return Err(AgentError::Canceled);
            }

            let decision = self.agent.plan(&ctx, &steps, &inputs).await?;
            iterations += 1;

            let action = match decision {
                AgentDecision::Finish(finish) => {
                    ctx.callbacks.agent_finish(&finish)?;
                    info!(run_id = %ctx.run_id, iterations, "executor run finished");
                    return self.finish(finish, steps);
                }
                AgentDecision::Action(action) => action,
            };

            ctx.callbacks.agent_action(&action)?;
            if ctx.cancel.is_cancelled() {
                return Err(AgentError::Canceled);
            }

            debug!(
                run_id = %ctx.run_id,
                iteration = iterations,
                tool = %action.tool,
                "invoking tool"
            );
            let tool_ctx = ToolContext::new(ctx.run_id, action.tool.clone(), ctx.cancel.clone());
            let observation = self
                .tools
                .invoke(&action.tool, &action.tool_input, &tool_ctx, &ctx.callbacks)
                .await?;

            steps.push(AgentStep {
                action,
                observation,
            });
        }

        info!(run_id = %ctx.run_id, steps = steps.len(), "executor stopped at iteration limit");
        Err(AgentError::MaxIterationsReached { steps })
    }

    fn finish(&self, finish: AgentFinish, steps: Vec<AgentStep>) -> Result<ChainValues> {
        let mut outputs = finish.return_values;
        if self.config.return_intermediate_steps {
            outputs.insert(
                INTERMEDIATE_STEPS_KEY.to_string(),
                serde_json::to_value(&steps)?,
            );
        }
        Ok(outputs)
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("tools", &self.tools)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
