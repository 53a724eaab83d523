use std::fmt;
use std::sync::{Arc, RwLock};

use super::{Callback, ModelEndInput};
use crate::error::{AgentError, Result};
use crate::types::Usage;

/// USD per 1K tokens. Completion prices for gpt-4 models carry a `-completion` suffix.
const MODEL_COST_PER_1K: &[(&str, f64)] = &[
    ("gpt-4", 0.03),
    ("gpt-4-0314", 0.03),
    ("gpt-4-completion", 0.06),
    ("gpt-4-0314-completion", 0.06),
    ("gpt-4-32k", 0.06),
    ("gpt-4-32k-0314", 0.06),
    ("gpt-4-32k-completion", 0.12),
    ("gpt-4-32k-0314-completion", 0.12),
    ("gpt-3.5-turbo", 0.002),
    ("gpt-3.5-turbo-0301", 0.002),
    ("text-ada-001", 0.0004),
    ("ada", 0.0004),
    ("text-babbage-001", 0.0005),
    ("babbage", 0.0005),
    ("text-curie-001", 0.002),
    ("curie", 0.002),
    ("text-davinci-003", 0.02),
    ("text-davinci-002", 0.02),
    ("code-davinci-002", 0.02),
    ("ada-finetuned", 0.0016),
    ("babbage-finetuned", 0.0024),
    ("curie-finetuned", 0.012),
    ("davinci-finetuned", 0.12),
];

fn standardize_model_name(model_name: &str, is_completion: bool) -> String {
    let model_name = model_name.to_lowercase();
    if model_name.contains("ft-") {
        let base = model_name.split(':').next().unwrap_or_default();
        format!("{base}-finetuned")
    } else if is_completion && model_name.starts_with("gpt-4") {
        format!("{model_name}-completion")
    } else {
        model_name
    }
}

/// Cost in USD of `tokens` prompt or completion tokens for an OpenAI model.
pub fn token_cost(model_name: &str, tokens: u32, is_completion: bool) -> Result<f64> {
    let name = standardize_model_name(model_name, is_completion);
    let per_1k = MODEL_COST_PER_1K
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, cost)| *cost)
        .ok_or_else(|| AgentError::Callback(format!("unknown model: {name}")))?;
    Ok(per_1k * f64::from(tokens) / 1000.0)
}

/// Cumulative totals collected by [`UsageHandler`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageReport {
    pub usage: Usage,
    pub successful_requests: u64,
    pub total_cost: f64,
    /// Models seen without a known price, in first-seen order.
    pub unpriced_models: Vec<String>,
}

impl fmt::Display for UsageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tokens Used: {}\n\tPrompt Tokens: {}\n\tCompletion Tokens: {}\nSuccessful Requests: {}\nTotal Cost (USD): ${:.2}",
            self.usage.total_tokens,
            self.usage.prompt_tokens,
            self.usage.completion_tokens,
            self.successful_requests,
            self.total_cost
        )?;
        if !self.unpriced_models.is_empty() {
            write!(f, "\nUnpriced Models: {}", self.unpriced_models.join(", "))?;
        }
        Ok(())
    }
}

/// Accumulates token usage and OpenAI cost across model calls.
///
/// Clones share the same totals. A strict handler fails the model call when
/// the model has no known price; a lenient one still counts its tokens and
/// lists the model in [`UsageReport::unpriced_models`].
#[derive(Debug, Clone)]
pub struct UsageHandler {
    inner: Arc<RwLock<UsageReport>>,
    strict: bool,
}

impl Default for UsageHandler {
    fn default() -> Self {
        Self {
            inner: Arc::default(),
            strict: true,
        }
    }
}

impl UsageHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lenient() -> Self {
        Self {
            strict: false,
            ..Self::default()
        }
    }

    /// Snapshot of the totals so far.
    pub fn report(&self) -> UsageReport {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Reset all tracking.
    pub fn reset(&self) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = UsageReport::default();
    }
}

impl Callback for UsageHandler {
    fn on_model_end(&self, input: ModelEndInput<'_>) -> Result<()> {
        let output = &input.result.llm_output;
        let usage = output.token_usage;

        let priced = if output.model_name.is_empty() {
            Ok(0.0)
        } else {
            token_cost(&output.model_name, usage.completion_tokens, true).and_then(|completion| {
                Ok(completion + token_cost(&output.model_name, usage.prompt_tokens, false)?)
            })
        };
        let cost = match priced {
            Ok(cost) => Some(cost),
            Err(e) if self.strict => return Err(e),
            Err(e) => {
                tracing::warn!(model = %output.model_name, error = %e, "no price for model");
                None
            }
        };

        let mut report = self
            .inner
            .write()
            .map_err(|_| AgentError::Callback("usage lock poisoned".into()))?;
        report.successful_requests += 1;
        report.usage.merge(&usage);
        match cost {
            Some(cost) => report.total_cost += cost,
            None if !report.unpriced_models.contains(&output.model_name) => {
                report.unpriced_models.push(output.model_name.clone());
            }
            None => {}
        }
        Ok(())
    }
}
