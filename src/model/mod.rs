//! Chat model abstraction: the client the decision engine talks to.

pub mod openai;
pub mod stream;

use std::time::Duration;

use async_trait::async_trait;
use bon::Builder;
use tokio_util::sync::CancellationToken;

use crate::callbacks::CallbackManager;
use crate::error::Result;
use crate::provider::GenerationSettings;
use crate::tools::ToolSignature;
use crate::types::{ChatMessage, ModelResult};

pub use openai::OpenAiChatModel;
pub use stream::StreamAccumulator;

/// Per-call options for [`ChatModel::generate`].
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Function signatures offered to the model.
    pub functions: Vec<ToolSignature>,
    /// Stop sequences.
    pub stop: Vec<String>,
    pub callbacks: CallbackManager,
    /// Aborts the call, including an in-flight stream.
    pub cancel: CancellationToken,
}

/// A chat model that may request structured function calls.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Identifier of the model family (e.g. "openai").
    fn model_type(&self) -> &str;

    fn supports_function_calling(&self) -> bool {
        false
    }

    /// Run one completion and normalize it into a [`ModelResult`].
    ///
    /// Fails with [`AgentError::Canceled`](crate::error::AgentError::Canceled)
    /// when `options.cancel` fires before the call completes.
    async fn generate(&self, messages: &[ChatMessage], options: &GenerateOptions)
        -> Result<ModelResult>;
}

/// Settings for [`OpenAiChatModel`].
///
/// | field | default | effect |
/// |---|---|---|
/// | `model_name` | `gpt-3.5-turbo` | model id sent to the provider |
/// | `temperature` | `1.0` | sampling temperature |
/// | `top_p` | `1.0` | nucleus sampling mass |
/// | `max_tokens` | none | completion length cap |
/// | `presence_penalty` | `0.0` | |
/// | `frequency_penalty` | `0.0` | |
/// | `n` | none | number of candidates |
/// | `max_retries` | `3` | attempts for one non-streaming call |
/// | `retry_delay` | `100ms` | fixed pause between attempts |
/// | `stream` | `false` | use the delta stream instead of a one-shot call |
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct ChatModelConfig {
    #[builder(default = "gpt-3.5-turbo".to_string(), into)]
    pub model_name: String,
    #[builder(default = 1.0)]
    pub temperature: f32,
    #[builder(default = 1.0)]
    pub top_p: f32,
    pub max_tokens: Option<u32>,
    #[builder(default)]
    pub presence_penalty: f32,
    #[builder(default)]
    pub frequency_penalty: f32,
    pub n: Option<u32>,
    #[builder(default = 3)]
    pub max_retries: u32,
    #[builder(default = Duration::from_millis(100))]
    pub retry_delay: Duration,
    #[builder(default)]
    pub stream: bool,
}

impl Default for ChatModelConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ChatModelConfig {
    pub(crate) fn settings(&self, stop: &[String]) -> GenerationSettings {
        GenerationSettings {
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
            presence_penalty: self.presence_penalty,
            frequency_penalty: self.frequency_penalty,
            n: self.n,
            stop: stop.to_vec(),
        }
    }
}
