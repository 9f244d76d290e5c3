use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::external::{ExternalError, LLMConfig, LanguageModel};

/// Shown to the user whenever an answer could not be generated.
pub const APOLOGY: &str =
    "I encountered an error processing your question. Please try again or rephrase your question.";

/// Calls a [`LanguageModel`] with a per-attempt timeout and a bounded number
/// of retries.
#[derive(Clone)]
pub struct AnswerGenerator {
    model: Arc<dyn LanguageModel>,
    max_retries: usize,
    timeout: Duration,
    backoff: Duration,
}

impl AnswerGenerator {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        max_retries: usize,
        timeout: Duration,
        backoff: Duration,
    ) -> Self {
        Self {
            model,
            max_retries,
            timeout,
            backoff,
        }
    }

    pub fn from_config(model: Arc<dyn LanguageModel>, config: &LLMConfig) -> Self {
        Self::new(
            model,
            config.max_retries,
            config.timeout(),
            Duration::from_millis(config.retry_backoff_ms),
        )
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, ExternalError> {
        let attempts = self.max_retries + 1;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            let outcome = tokio::time::timeout(self.timeout, self.model.complete(prompt)).await;
            match outcome {
                Ok(Ok(text)) if !text.trim().is_empty() => {
                    debug!(attempt, chars = text.len(), "generated answer");
                    return Ok(text.trim().to_string());
                }
                Ok(Ok(_)) => last_error = "model returned an empty answer".to_string(),
                Ok(Err(e)) => last_error = e.to_string(),
                Err(_) => {
                    last_error = format!("timed out after {}s", self.timeout.as_secs_f32())
                }
            }

            warn!(attempt, attempts, error = %last_error, "generation attempt failed");
            if attempt < attempts && !self.backoff.is_zero() {
                tokio::time::sleep(self.backoff * attempt as u32).await;
            }
        }

        Err(ExternalError::Generation(format!(
            "gave up after {} attempts: {}",
            attempts, last_error
        )))
    }
}
