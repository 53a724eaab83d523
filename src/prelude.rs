//! Convenience re-exports for common use.

pub use crate::agent::{
    Agent, AgentAction, AgentDecision, AgentFinish, AgentStep, ChainValues, Executor,
    ExecutorConfig, FunctionsAgent, FunctionsAgentConfig,
};
pub use crate::callbacks::{Callback, CallbackManager};
pub use crate::config::ClientConfig;
pub use crate::error::{AgentError, Result};
pub use crate::model::{ChatModel, ChatModelConfig, GenerateOptions, OpenAiChatModel};
pub use crate::provider::ModelProvider;
pub use crate::tools::{
    AgentToolParameters, FnTool, InputShape, Tool, ToolArguments, ToolContext, ToolInput,
    ToolRegistry, ToolValue,
};
pub use crate::types::{ChatMessage, FunctionCall, ModelResult, Usage};
