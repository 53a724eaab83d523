//! Decision engine driven by structured function calls.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::context::RunContext;
use super::executor::{Executor, ExecutorConfig};
use super::scratchpad::build_scratchpad;
use super::types::{AgentAction, AgentDecision, AgentFinish, AgentStep, ChainValues};
use super::Agent;
use crate::error::{AgentError, Result};
use crate::history::ChatMessageHistory;
use crate::model::{ChatModel, GenerateOptions};
use crate::prompt::{ChatTemplate, MessageTemplate};
use crate::tools::{ToolInput, ToolRegistry, ToolSignature};
use crate::types::ChatMessage;

/// Input key holding the user's request.
pub const INPUT_KEY: &str = "input";
const SCRATCHPAD_KEY: &str = "agent_scratchpad";

/// Settings for [`FunctionsAgent`].
///
/// | field | default | effect |
/// |---|---|---|
/// | `output_key` | `output` | key of the final answer in the returned values |
/// | `system_message` | `You are a helpful AI assistant.` | first message of every prompt |
/// | `extra_messages` | empty | templates rendered between the system and human messages |
/// | `chat_history` | none | when set, prompts are built from stored history instead of templates |
#[derive(Clone)]
pub struct FunctionsAgentConfig {
    pub output_key: String,
    pub system_message: String,
    pub extra_messages: Vec<MessageTemplate>,
    pub chat_history: Option<Arc<dyn ChatMessageHistory>>,
}

impl Default for FunctionsAgentConfig {
    fn default() -> Self {
        Self {
            output_key: "output".to_string(),
            system_message: "You are a helpful AI assistant.".to_string(),
            extra_messages: Vec::new(),
            chat_history: None,
        }
    }
}

impl std::fmt::Debug for FunctionsAgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionsAgentConfig")
            .field("output_key", &self.output_key)
            .field("system_message", &self.system_message)
            .field("extra_messages", &self.extra_messages)
            .field("chat_history", &self.chat_history.is_some())
            .finish()
    }
}

/// Asks a function-calling chat model what to do next.
pub struct FunctionsAgent {
    model: Arc<dyn ChatModel>,
    functions: Vec<ToolSignature>,
    template: ChatTemplate,
    config: FunctionsAgentConfig,
}

impl FunctionsAgent {
    /// Fails when `model` cannot issue function calls.
    pub fn new(
        model: Arc<dyn ChatModel>,
        tools: &ToolRegistry,
        config: FunctionsAgentConfig,
    ) -> Result<Self> {
        if !model.supports_function_calling() {
            return Err(AgentError::Configuration(format!(
                "agent requires a function-calling chat model, got {}",
                model.model_type()
            )));
        }

        let mut templates = vec![MessageTemplate::system(config.system_message.clone())];
        templates.extend(config.extra_messages.iter().cloned());
        templates.push(MessageTemplate::human(format!("{{{{.{INPUT_KEY}}}}}")));
        templates.push(MessageTemplate::placeholder(SCRATCHPAD_KEY));

        Ok(Self {
            model,
            functions: tools.signatures(),
            template: ChatTemplate::new(templates),
            config,
        })
    }

    /// Build the agent and wrap it in an [`Executor`] over the same tools.
    pub fn executor(
        model: Arc<dyn ChatModel>,
        tools: ToolRegistry,
        config: FunctionsAgentConfig,
        executor_config: ExecutorConfig,
    ) -> Result<Executor> {
        let agent = Self::new(model, &tools, config)?;
        Ok(Executor::new(Arc::new(agent), Arc::new(tools), executor_config))
    }

    pub fn functions(&self) -> &[ToolSignature] {
        &self.functions
    }

    async fn compose(&self, steps: &[AgentStep], inputs: &ChainValues) -> Result<Vec<ChatMessage>> {
        let scratchpad = build_scratchpad(steps);
        match &self.config.chat_history {
            None => {
                let lists = HashMap::from([(SCRATCHPAD_KEY.to_string(), scratchpad)]);
                self.template.format(inputs, &lists)
            }
            Some(history) => {
                let input = inputs
                    .get(INPUT_KEY)
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        AgentError::InvalidArgument(format!("`{INPUT_KEY}` must be a string"))
                    })?;
                let mut messages = history.messages().await?;
                messages.push(ChatMessage::human(input));
                messages.extend(scratchpad);
                Ok(messages)
            }
        }
    }
}

impl std::fmt::Debug for FunctionsAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionsAgent")
            .field("model", &self.model.model_type())
            .field("functions", &self.functions.len())
            .field("config", &self.config)
            .finish()
    }
}

#[async_trait]
impl Agent for FunctionsAgent {
    async fn plan(
        &self,
        ctx: &RunContext,
        steps: &[AgentStep],
        inputs: &ChainValues,
    ) -> Result<AgentDecision> {
        let messages = self.compose(steps, inputs).await?;

        let options = GenerateOptions {
            functions: self.functions.clone(),
            stop: Vec::new(),
            callbacks: ctx.callbacks.clone(),
            cancel: ctx.cancel.clone(),
        };
        let result = self.model.generate(&messages, &options).await?;

        let message = result
            .generations
            .into_iter()
            .next()
            .map(|g| g.message)
            .ok_or_else(|| AgentError::api(200, "model returned no generations"))?;

        let (text, function_call) = match message {
            ChatMessage::Ai {
                text,
                function_call,
            } => (text, function_call),
            other => {
                return Err(AgentError::UnexpectedMessageType {
                    got: other.message_type().to_string(),
                })
            }
        };

        if let Some(call) = function_call {
            let tool_input = ToolInput::from_arguments(call.arguments.clone());
            let responded = if text.is_empty() {
                String::new()
            } else {
                format!("responded: {text}")
            };
            let log = format!("\nInvoking `{}` with `{tool_input}`\n{responded}\n", call.name);
            let tool = call.name.clone();
            return Ok(AgentDecision::Action(AgentAction {
                tool,
                tool_input,
                log,
                message_log: vec![ChatMessage::ai_with_call(text, call)],
            }));
        }

        let return_values = ChainValues::from([(
            self.config.output_key.clone(),
            serde_json::Value::String(text.clone()),
        )]);
        Ok(AgentDecision::Finish(AgentFinish {
            return_values,
            log: text,
        }))
    }

    fn input_keys(&self) -> Vec<String> {
        vec![INPUT_KEY.to_string()]
    }

    fn output_keys(&self) -> Vec<String> {
        vec![self.config.output_key.clone()]
    }
}
