//! Shared test helpers: scripted provider, scripted model and a recording callback.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::BoxStream;

use toolloop::agent::{AgentAction, AgentFinish};
use toolloop::callbacks::{
    Callback, ModelEndInput, ModelNewTokenInput, ToolEndInput, ToolErrorInput, ToolStartInput,
};
use toolloop::error::{AgentError, Result};
use toolloop::model::{ChatModel, GenerateOptions};
use toolloop::provider::{ModelProvider, ProviderChoice, ProviderRequest, ProviderResponse};
use toolloop::types::*;
use uuid::Uuid;

/// One scripted stream: the chunks to yield, then optionally hang forever.
pub struct ScriptedStream {
    pub chunks: Vec<Result<ChatChunk>>,
    pub hang_after: bool,
}

/// A provider that replays queued responses, errors and streams.
#[derive(Default)]
pub struct MockProvider {
    responses: Mutex<VecDeque<Result<ProviderResponse>>>,
    streams: Mutex<VecDeque<ScriptedStream>>,
    requests: Mutex<Vec<ProviderRequest>>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an assistant text response.
    pub fn queue_text(&self, text: &str) {
        self.queue_message(ProviderMessage {
            role: "assistant".into(),
            content: text.into(),
            ..Default::default()
        });
    }

    pub fn queue_message(&self, message: ProviderMessage) {
        self.responses.lock().unwrap().push_back(Ok(ProviderResponse {
            model: "gpt-3.5-turbo-0613".into(),
            choices: vec![ProviderChoice {
                message,
                finish_reason: Some(FinishReason::Stop),
            }],
            usage: Usage {
                prompt_tokens: 10,
                completion_tokens: 20,
                total_tokens: 30,
            },
        }));
    }

    pub fn queue_error(&self, error: AgentError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn queue_stream(&self, chunks: Vec<ChatChunk>) {
        self.streams.lock().unwrap().push_back(ScriptedStream {
            chunks: chunks.into_iter().map(Ok).collect(),
            hang_after: false,
        });
    }

    pub fn queue_scripted_stream(&self, stream: ScriptedStream) {
        self.streams.lock().unwrap().push_back(stream);
    }

    /// Number of provider calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, request: &ProviderRequest) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn create_chat_completion(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        self.record(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AgentError::api(400, "no scripted response")))
    }

    async fn create_chat_completion_stream(
        &self,
        request: &ProviderRequest,
    ) -> Result<BoxStream<'static, Result<ChatChunk>>> {
        self.record(request);
        let script = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AgentError::api(400, "no scripted stream"))?;

        let stream = async_stream::stream! {
            for chunk in script.chunks {
                yield chunk;
            }
            if script.hang_after {
                futures::future::pending::<()>().await;
            }
        };
        Ok(Box::pin(stream))
    }
}

/// A chat model that returns queued messages and records every prompt.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<ChatMessage>>>,
    prompts: Mutex<Vec<Vec<ChatMessage>>>,
    functions: Mutex<Vec<Vec<String>>>,
    supports_functions: bool,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            functions: Mutex::new(Vec::new()),
            supports_functions: true,
        }
    }

    pub fn without_function_calling() -> Self {
        Self {
            supports_functions: false,
            ..Self::new()
        }
    }

    pub fn reply(self, message: ChatMessage) -> Self {
        self.replies.lock().unwrap().push_back(Ok(message));
        self
    }

    pub fn reply_text(self, text: &str) -> Self {
        self.reply(ChatMessage::ai(text))
    }

    pub fn reply_call(self, name: &str, arguments: &str) -> Self {
        self.reply(ChatMessage::ai_with_call("", FunctionCall::new(name, arguments)))
    }

    pub fn fail(self, error: AgentError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    /// Number of `generate` calls made so far.
    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<Vec<ChatMessage>> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn offered_functions(&self) -> Vec<Vec<String>> {
        self.functions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn model_type(&self) -> &str {
        "scripted"
    }

    fn supports_function_calling(&self) -> bool {
        self.supports_functions
    }

    async fn generate(
        &self,
        messages: &[ChatMessage],
        options: &GenerateOptions,
    ) -> Result<ModelResult> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        self.functions
            .lock()
            .unwrap()
            .push(options.functions.iter().map(|f| f.name.clone()).collect());

        // The last successful reply repeats once the script runs out.
        let reply = {
            let mut replies = self.replies.lock().unwrap();
            let repeat_last = replies.len() == 1 && matches!(replies.front(), Some(Ok(_)));
            if repeat_last {
                replies.front().and_then(|r| r.as_ref().ok()).cloned().map(Ok)
            } else {
                replies.pop_front()
            }
        };
        let message = reply.unwrap_or_else(|| Ok(ChatMessage::ai("")))?;

        let result = ModelResult {
            generations: vec![Generation {
                text: message.text().to_string(),
                message,
                finish_reason: Some(FinishReason::Stop),
            }],
            llm_output: LlmOutput {
                model_name: "gpt-3.5-turbo".into(),
                token_usage: Usage::default(),
            },
        };
        options.callbacks.model_end(&result)?;
        Ok(result)
    }
}

/// Records every lifecycle event as a short string.
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<String>>,
    run_ids: Mutex<Vec<Uuid>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn run_ids(&self) -> Vec<Uuid> {
        self.run_ids.lock().unwrap().clone()
    }

    fn push(&self, run_id: Uuid, event: String) {
        self.run_ids.lock().unwrap().push(run_id);
        self.events.lock().unwrap().push(event);
    }
}

impl Callback for Recorder {
    fn on_tool_start(&self, input: ToolStartInput<'_>) -> Result<()> {
        self.push(input.run_id, format!("tool_start:{}:{}", input.tool_name, input.input));
        Ok(())
    }

    fn on_tool_end(&self, input: ToolEndInput<'_>) -> Result<()> {
        self.push(input.run_id, format!("tool_end:{}:{}", input.tool_name, input.output));
        Ok(())
    }

    fn on_tool_error(&self, input: ToolErrorInput<'_>) -> Result<()> {
        self.push(input.run_id, format!("tool_error:{}", input.tool_name));
        Ok(())
    }

    fn on_model_new_token(&self, input: ModelNewTokenInput<'_>) -> Result<()> {
        self.push(input.run_id, format!("token:{}", input.token));
        Ok(())
    }

    fn on_model_end(&self, input: ModelEndInput<'_>) -> Result<()> {
        self.push(input.run_id, "model_end".to_string());
        Ok(())
    }

    fn on_agent_action(&self, run_id: Uuid, action: &AgentAction) -> Result<()> {
        self.push(run_id, format!("action:{}", action.tool));
        Ok(())
    }

    fn on_agent_finish(&self, run_id: Uuid, _finish: &AgentFinish) -> Result<()> {
        self.push(run_id, "finish".to_string());
        Ok(())
    }
}
