//! Tool-calling agent: decision engine, scratchpad replay and control loop.

pub mod context;
pub mod executor;
pub mod functions;
pub mod scratchpad;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;

pub use context::RunContext;
pub use executor::{Executor, ExecutorConfig, INTERMEDIATE_STEPS_KEY};
pub use functions::{FunctionsAgent, FunctionsAgentConfig, INPUT_KEY};
pub use scratchpad::build_scratchpad;
pub use types::{AgentAction, AgentDecision, AgentFinish, AgentStep, ChainValues};

/// Decides the next move given the steps taken so far.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Return exactly one action or finish for the current state.
    async fn plan(
        &self,
        ctx: &RunContext,
        steps: &[AgentStep],
        inputs: &ChainValues,
    ) -> Result<AgentDecision>;

    /// Keys the agent reads from the run inputs.
    fn input_keys(&self) -> Vec<String>;

    /// Keys present in a finish's return values.
    fn output_keys(&self) -> Vec<String>;
}
