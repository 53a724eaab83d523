//! Tool trait and closure-based tool wrapper.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::input::ToolValue;
use super::types::{AgentToolParameters, InputShape};
use crate::error::AgentError;

/// Context available during tool execution.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// Run the invocation belongs to.
    pub run_id: Uuid,
    /// Tool name as requested by the model.
    pub tool_name: String,
    /// Fires when the caller aborts the run.
    pub cancel: CancellationToken,
    /// Additional metadata for the tool.
    pub metadata: serde_json::Value,
}

impl ToolContext {
    pub fn new(run_id: Uuid, tool_name: impl Into<String>, cancel: CancellationToken) -> Self {
        Self {
            run_id,
            tool_name: tool_name.into(),
            cancel,
            metadata: serde_json::Value::Null,
        }
    }
}

/// A callable capability exposed to the model.
///
/// Tools are pure request/response functions: the registry decodes the raw
/// input according to [`input_shape`](Tool::input_shape) before calling
/// [`run`](Tool::run), and reports lifecycle events around it.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (must match what the model calls).
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// Shape of the accepted input.
    fn input_shape(&self) -> &InputShape;

    /// Execute the tool with its decoded input.
    async fn run(&self, ctx: &ToolContext, input: ToolValue) -> Result<String, AgentError>;
}

type ToolHandler = dyn Fn(
        ToolValue,
        ToolContext,
    ) -> Pin<Box<dyn Future<Output = Result<String, AgentError>> + Send>>
    + Send
    + Sync;

/// Closure-based tool for quick tool creation.
pub struct FnTool {
    name: String,
    description: String,
    input_shape: InputShape,
    handler: Arc<ToolHandler>,
}

impl FnTool {
    /// Create a tool from a closure.
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        input_shape: InputShape,
        handler: F,
    ) -> Self
    where
        F: Fn(ToolValue, ToolContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, AgentError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            input_shape,
            handler: Arc::new(move |input, ctx| Box::pin(handler(input, ctx))),
        }
    }

    /// Tool taking a bare string.
    pub fn text<F, Fut>(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
    where
        F: Fn(String, ToolContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, AgentError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        Self::new(name, description, InputShape::Text, move |input, ctx| {
            let handler = Arc::clone(&handler);
            async move {
                let text = input.as_text()?.to_string();
                handler(text, ctx).await
            }
        })
    }

    /// Tool taking a JSON object described by `parameters`.
    pub fn structured<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: AgentToolParameters,
        handler: F,
    ) -> Self
    where
        F: Fn(super::ToolArguments, ToolContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, AgentError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        Self::new(
            name,
            description,
            InputShape::Object(parameters),
            move |input, ctx| {
                let handler = Arc::clone(&handler);
                async move {
                    let args = input.arguments()?.clone();
                    handler(args, ctx).await
                }
            },
        )
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_shape(&self) -> &InputShape {
        &self.input_shape
    }

    async fn run(&self, ctx: &ToolContext, input: ToolValue) -> Result<String, AgentError> {
        (self.handler)(input, ctx.clone()).await
    }
}

impl std::fmt::Debug for FnTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("structured", &self.input_shape.is_structured())
            .finish()
    }
}
