//! Model provider transport.
//!
//! A provider turns a conversation plus declared function signatures into
//! either one response or a stream of deltas. Retry, merging and
//! normalization live in [`crate::model`].

pub mod http;
pub mod openai;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::AgentError;
use crate::tools::ToolSignature;
use crate::types::{ChatChunk, ChatMessage, FinishReason, ProviderMessage, Usage};

pub use openai::OpenAiProvider;

/// Sampling settings forwarded to the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: Option<u32>,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    pub n: Option<u32>,
    pub stop: Vec<String>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 1.0,
            max_tokens: None,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            n: None,
            stop: Vec::new(),
        }
    }
}

/// A request sent to a model provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Declared function signatures; empty means none are offered.
    pub functions: Vec<ToolSignature>,
    pub settings: GenerationSettings,
}

/// One candidate returned by a one-shot call.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderChoice {
    pub message: ProviderMessage,
    pub finish_reason: Option<FinishReason>,
}

/// Response from a one-shot call.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub model: String,
    pub choices: Vec<ProviderChoice>,
    pub usage: Usage,
}

/// Core trait implemented by model providers.
///
/// Implementations must be safe for concurrent read-only use.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "openai").
    fn provider_name(&self) -> &str;

    /// Issue a single request and return the whole response.
    async fn create_chat_completion(
        &self,
        request: &ProviderRequest,
    ) -> Result<ProviderResponse, AgentError>;

    /// Issue a streaming request. The stream ends at the end-of-stream marker.
    async fn create_chat_completion_stream(
        &self,
        request: &ProviderRequest,
    ) -> Result<BoxStream<'static, Result<ChatChunk, AgentError>>, AgentError>;
}
