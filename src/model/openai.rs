//! OpenAI chat model: bounded retry for one-shot calls, delta merging for streams.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::stream::{accumulate, cancellable};
use super::{ChatModel, ChatModelConfig, GenerateOptions};
use crate::config::ClientConfig;
use crate::error::{AgentError, Result};
use crate::provider::{ModelProvider, OpenAiProvider, ProviderRequest, ProviderResponse};
use crate::types::{ChatMessage, Generation, LlmOutput, ModelResult};
use crate::util::retry::RetryPolicy;

pub struct OpenAiChatModel {
    provider: Arc<dyn ModelProvider>,
    config: ChatModelConfig,
}

impl OpenAiChatModel {
    pub fn new(provider: Arc<dyn ModelProvider>, config: ChatModelConfig) -> Self {
        Self { provider, config }
    }

    /// Build against the OpenAI HTTP provider.
    pub fn from_client_config(client: &ClientConfig, config: ChatModelConfig) -> Result<Self> {
        let provider = OpenAiProvider::from_config(client)?;
        Ok(Self::new(Arc::new(provider), config))
    }

    pub fn config(&self) -> &ChatModelConfig {
        &self.config
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.config.max_retries, self.config.retry_delay)
    }

    fn request(&self, messages: &[ChatMessage], options: &GenerateOptions) -> ProviderRequest {
        ProviderRequest {
            model: self.config.model_name.clone(),
            messages: messages.to_vec(),
            functions: options.functions.clone(),
            settings: self.config.settings(&options.stop),
        }
    }

    async fn generate_once(
        &self,
        request: &ProviderRequest,
        options: &GenerateOptions,
    ) -> Result<ModelResult> {
        let response = self
            .retry_policy()
            .execute_cancellable(&options.cancel, || {
                self.provider.create_chat_completion(request)
            })
            .await?;
        Ok(self.normalize(response))
    }

    async fn generate_stream(
        &self,
        request: &ProviderRequest,
        options: &GenerateOptions,
    ) -> Result<ModelResult> {
        let stream = tokio::select! {
            biased;
            _ = options.cancel.cancelled() => return Err(AgentError::Canceled),
            stream = self.provider.create_chat_completion_stream(request) => stream?,
        };
        let acc =
            accumulate(cancellable(stream, options.cancel.clone()), &options.callbacks).await?;
        Ok(acc.finish(self.config.model_name.clone()))
    }

    fn normalize(&self, response: ProviderResponse) -> ModelResult {
        debug!(
            model = %response.model,
            choices = response.choices.len(),
            total_tokens = response.usage.total_tokens,
            "chat completion received"
        );
        let generations = response
            .choices
            .into_iter()
            .map(|choice| Generation {
                text: choice.message.content.clone(),
                message: choice.message.into_chat_message(),
                finish_reason: choice.finish_reason,
            })
            .collect();

        ModelResult {
            generations,
            llm_output: LlmOutput {
                model_name: self.config.model_name.clone(),
                token_usage: response.usage,
            },
        }
    }
}

impl std::fmt::Debug for OpenAiChatModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiChatModel")
            .field("provider", &self.provider.provider_name())
            .field("config", &self.config)
            .finish()
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    fn model_type(&self) -> &str {
        "openai"
    }

    fn supports_function_calling(&self) -> bool {
        true
    }

    async fn generate(
        &self,
        messages: &[ChatMessage],
        options: &GenerateOptions,
    ) -> Result<ModelResult> {
        if options.cancel.is_cancelled() {
            return Err(AgentError::Canceled);
        }
        let request = self.request(messages, options);
        debug!(
            model = %request.model,
            stream = self.config.stream,
            messages = request.messages.len(),
            "generating"
        );

        let result = if self.config.stream {
            self.generate_stream(&request, options).await?
        } else {
            self.generate_once(&request, options).await?
        };

        options.callbacks.model_end(&result)?;
        Ok(result)
    }
}
