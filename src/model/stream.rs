//! Merging of streamed deltas into one message.

use futures::stream::BoxStream;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::callbacks::CallbackManager;
use crate::error::{AgentError, Result};
use crate::types::{
    ChatChunk, FinishReason, FunctionCall, Generation, LlmOutput, ModelResult, ProviderMessage,
    Usage,
};

/// Wrap a delta stream so it observes `cancel` before every receive.
///
/// When `cancel` fires the stream yields a single [`AgentError::Canceled`] and
/// ends. The stream also ends after the first error it forwards.
pub fn cancellable<T: Send + 'static>(
    stream: BoxStream<'static, Result<T>>,
    cancel: CancellationToken,
) -> BoxStream<'static, Result<T>> {
    Box::pin(async_stream::stream! {
        let mut stream = stream;
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                next = stream.next() => Some(next),
            };
            match next {
                None => {
                    yield Err(AgentError::Canceled);
                    break;
                }
                Some(None) => break,
                Some(Some(item)) => {
                    let failed = item.is_err();
                    yield item;
                    if failed {
                        break;
                    }
                }
            }
        }
    })
}

/// Accumulates deltas of the choice with index 0.
///
/// Deltas for other candidates (requested with `n > 1`) are dropped.
/// Content and call arguments are concatenated in arrival order. The role and
/// the call name are taken from the first delta that carries a non-empty
/// value; later values are ignored.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StreamAccumulator {
    role: Option<String>,
    content: String,
    call_name: Option<String>,
    call_arguments: String,
    has_call: bool,
    finish_reason: Option<FinishReason>,
    usage: Option<Usage>,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one chunk. Returns the content fragment it carried, if non-empty.
    pub fn push(&mut self, chunk: ChatChunk) -> Option<String> {
        if let Some(usage) = chunk.usage {
            self.usage = Some(usage);
        }
        let choice = chunk.choices.into_iter().find(|c| c.index == 0)?;
        let delta = choice.delta;

        if self.role.is_none() {
            self.role = delta.role.filter(|r| !r.is_empty());
        }
        if let Some(call) = delta.function_call {
            self.has_call = true;
            if self.call_name.is_none() {
                self.call_name = call.name.filter(|n| !n.is_empty());
            }
            if let Some(arguments) = call.arguments {
                self.call_arguments.push_str(&arguments);
            }
        }
        if choice.finish_reason.is_some() {
            self.finish_reason = choice.finish_reason;
        }

        let token = delta.content.filter(|c| !c.is_empty())?;
        self.content.push_str(&token);
        Some(token)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// The merged call, if any delta carried one.
    pub fn function_call(&self) -> Option<FunctionCall> {
        self.has_call.then(|| {
            FunctionCall::new(
                self.call_name.clone().unwrap_or_default(),
                self.call_arguments.clone(),
            )
        })
    }

    /// Normalize into a single-generation result.
    pub fn finish(self, model_name: impl Into<String>) -> ModelResult {
        let function_call = self.function_call();
        let message = ProviderMessage {
            role: self.role.unwrap_or_default(),
            content: self.content.clone(),
            name: None,
            function_call,
        }
        .into_chat_message();

        ModelResult {
            generations: vec![Generation {
                text: self.content,
                message,
                finish_reason: self.finish_reason,
            }],
            llm_output: LlmOutput {
                model_name: model_name.into(),
                token_usage: self.usage.unwrap_or_default(),
            },
        }
    }
}

/// Drain `stream`, firing the token hook for every content fragment before
/// reading the next delta.
pub async fn accumulate(
    stream: BoxStream<'static, Result<ChatChunk>>,
    callbacks: &CallbackManager,
) -> Result<StreamAccumulator> {
    let mut stream = stream;
    let mut acc = StreamAccumulator::new();
    while let Some(chunk) = stream.next().await {
        if let Some(token) = acc.push(chunk?) {
            callbacks.model_new_token(&token)?;
        }
    }
    Ok(acc)
}
