//! OpenAI Chat Completions API provider with legacy `functions` calling.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::AgentError;
use crate::types::*;

use super::http::{
    bearer_headers, is_sse_done, parse_sse_data, shared_client, status_to_error, SseLineBuffer,
};
use super::{ModelProvider, ProviderChoice, ProviderRequest, ProviderResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
    organization: Option<String>,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, base_url: Option<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            organization: None,
        }
    }

    /// Build from layered client configuration; fails without an API key.
    pub fn from_config(config: &ClientConfig) -> Result<Self, AgentError> {
        let provider = Self::new(config.api_key()?, config.base_url.clone());
        Ok(match &config.org_id {
            Some(org) => provider.with_organization(org.clone()),
            None => provider,
        })
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = bearer_headers(&self.api_key);
        if let Some(org) = &self.organization {
            if let Ok(val) = HeaderValue::from_str(org) {
                headers.insert("OpenAI-Organization", val);
            }
        }
        headers
    }

    fn build_request_body(&self, request: &ProviderRequest, stream: bool) -> serde_json::Value {
        let messages = request
            .messages
            .iter()
            .map(message_to_openai)
            .collect::<Vec<_>>();
        let settings = &request.settings;

        let mut obj = serde_json::Map::new();
        obj.insert("model".into(), request.model.clone().into());
        obj.insert("messages".into(), messages.into());
        obj.insert("stream".into(), stream.into());
        obj.insert("temperature".into(), settings.temperature.into());
        obj.insert("top_p".into(), settings.top_p.into());
        obj.insert("presence_penalty".into(), settings.presence_penalty.into());
        obj.insert("frequency_penalty".into(), settings.frequency_penalty.into());

        if let Some(max) = settings.max_tokens {
            obj.insert("max_tokens".into(), max.into());
        }
        if let Some(n) = settings.n {
            obj.insert("n".into(), n.into());
        }
        if !settings.stop.is_empty() {
            obj.insert("stop".into(), serde_json::json!(settings.stop));
        }
        if !request.functions.is_empty() {
            obj.insert("functions".into(), serde_json::json!(request.functions));
        }

        serde_json::Value::Object(obj)
    }

    async fn post(
        &self,
        request: &ProviderRequest,
        stream: bool,
    ) -> Result<reqwest::Response, AgentError> {
        let body = self.build_request_body(request, stream);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(
            model = %request.model,
            stream,
            functions = request.functions.len(),
            "OpenAI chat completion"
        );

        let resp = shared_client()
            .post(&url)
            .headers(self.headers())
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }
        Ok(resp)
    }
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("base_url", &self.base_url)
            .field("organization", &self.organization)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn create_chat_completion(
        &self,
        request: &ProviderRequest,
    ) -> Result<ProviderResponse, AgentError> {
        let resp = self.post(request, false).await?;
        let data: OpenAiChatResponse = resp.json().await?;

        let choices = data
            .choices
            .into_iter()
            .map(|choice| ProviderChoice {
                message: ProviderMessage {
                    role: choice.message.role.unwrap_or_default(),
                    content: choice.message.content.unwrap_or_default(),
                    name: choice.message.name,
                    function_call: choice
                        .message
                        .function_call
                        .map(|call| FunctionCall::new(call.name, call.arguments)),
                },
                finish_reason: choice.finish_reason.as_deref().and_then(parse_finish_reason),
            })
            .collect();

        Ok(ProviderResponse {
            model: data.model.unwrap_or_else(|| request.model.clone()),
            choices,
            usage: data.usage.map(Usage::from).unwrap_or_default(),
        })
    }

    async fn create_chat_completion_stream(
        &self,
        request: &ProviderRequest,
    ) -> Result<BoxStream<'static, Result<ChatChunk, AgentError>>, AgentError> {
        let resp = self.post(request, true).await?;
        let byte_stream = resp.bytes_stream();

        let stream = async_stream::stream! {
            let mut buffer = SseLineBuffer::new();
            futures::pin_mut!(byte_stream);

            'read: while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(AgentError::Network(e));
                        break;
                    }
                };

                buffer.extend(&chunk);

                while let Some(line) = buffer.next_line() {
                    if line.is_empty() || line.starts_with(':') {
                        continue;
                    }
                    if is_sse_done(&line) {
                        break 'read;
                    }

                    let Some(data) = parse_sse_data(&line) else {
                        continue;
                    };
                    match serde_json::from_str::<OpenAiStreamChunk>(data) {
                        Ok(chunk) => yield Ok(chunk.into()),
                        Err(e) => match stream_error_message(data) {
                            Some(message) => {
                                yield Err(AgentError::Stream(message));
                                break 'read;
                            }
                            None => debug!(error = %e, "skipping unparseable OpenAI stream chunk"),
                        },
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

fn stream_error_message(data: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(data).ok()?;
    let error = value.get("error")?;
    Some(
        error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
    )
}

fn parse_finish_reason(s: &str) -> Option<FinishReason> {
    match s {
        "stop" => Some(FinishReason::Stop),
        "length" => Some(FinishReason::Length),
        "function_call" => Some(FinishReason::FunctionCall),
        "tool_calls" => Some(FinishReason::ToolCalls),
        "content_filter" => Some(FinishReason::ContentFilter),
        _ => None,
    }
}

fn message_to_openai(msg: &ChatMessage) -> serde_json::Value {
    match msg {
        ChatMessage::Human { text } => serde_json::json!({ "role": "user", "content": text }),
        ChatMessage::System { text } => serde_json::json!({ "role": "system", "content": text }),
        ChatMessage::Ai {
            text,
            function_call: None,
        } => serde_json::json!({ "role": "assistant", "content": text }),
        ChatMessage::Ai {
            text,
            function_call: Some(call),
        } => serde_json::json!({
            "role": "assistant",
            "content": if text.is_empty() {
                serde_json::Value::Null
            } else {
                serde_json::Value::String(text.clone())
            },
            "function_call": { "name": call.name, "arguments": call.arguments },
        }),
        ChatMessage::Function { name, text } => serde_json::json!({
            "role": "function",
            "name": name,
            "content": text,
        }),
        ChatMessage::Generic { role, text } => serde_json::json!({ "role": role, "content": text }),
    }
}

// OpenAI API response types (internal)

#[derive(Deserialize)]
struct OpenAiChatResponse {
    model: Option<String>,
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    role: Option<String>,
    content: Option<String>,
    name: Option<String>,
    function_call: Option<OpenAiFunctionCall>,
}

#[derive(Deserialize)]
struct OpenAiFunctionCall {
    #[serde(default)]
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl From<OpenAiUsage> for Usage {
    fn from(u: OpenAiUsage) -> Self {
        Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }
    }
}

#[derive(Deserialize)]
struct OpenAiStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAiStreamChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiStreamChoice {
    #[serde(default)]
    index: u32,
    #[serde(default)]
    delta: OpenAiStreamDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct OpenAiStreamDelta {
    role: Option<String>,
    content: Option<String>,
    function_call: Option<OpenAiFunctionCallDelta>,
}

#[derive(Deserialize)]
struct OpenAiFunctionCallDelta {
    name: Option<String>,
    arguments: Option<String>,
}

impl From<OpenAiStreamChunk> for ChatChunk {
    fn from(chunk: OpenAiStreamChunk) -> Self {
        ChatChunk {
            choices: chunk
                .choices
                .into_iter()
                .map(|choice| ChunkChoice {
                    index: choice.index,
                    finish_reason: choice.finish_reason.as_deref().and_then(parse_finish_reason),
                    delta: ChunkDelta {
                        role: choice.delta.role,
                        content: choice.delta.content,
                        function_call: choice.delta.function_call.map(|call| FunctionCallDelta {
                            name: call.name,
                            arguments: call.arguments,
                        }),
                    },
                })
                .collect(),
            usage: chunk.usage.map(Usage::from),
        }
    }
}
