//! edgequake-llm adapter.
//!
//! `ProviderFactory` binds a model at construction time, so a provider
//! instance is created per call. Credentials come from the provider's usual
//! environment variables (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, …).

use super::{GenerateOptions, ModelBackend};
use crate::error::BackendError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tracing::debug;

const SYSTEM_PROMPT: &str =
    "You grade startup pitch decks. Follow the output format instructions exactly.";

/// Any provider `edgequake-llm` knows by name.
#[derive(Debug, Clone)]
pub struct ProviderBackend {
    provider_name: String,
}

impl ProviderBackend {
    pub fn new(provider_name: impl Into<String>) -> Self {
        Self {
            provider_name: provider_name.into(),
        }
    }

    fn create(&self, model: &str) -> Result<Arc<dyn LLMProvider>, BackendError> {
        ProviderFactory::create_llm_provider(&self.provider_name, model).map_err(|e| {
            BackendError::Provider {
                provider: self.provider_name.clone(),
                message: format!("could not create provider for model '{model}': {e}"),
            }
        })
    }
}

fn build_options(options: &GenerateOptions) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(options.temperature),
        max_tokens: Some(options.max_tokens),
        response_format: options.json_response.then(|| "json_object".to_string()),
        ..Default::default()
    }
}

#[async_trait]
impl ModelBackend for ProviderBackend {
    fn name(&self) -> &str {
        &self.provider_name
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, BackendError> {
        let provider = self.create(model)?;
        let messages = vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)];

        let response = provider
            .chat(&messages, Some(&build_options(options)))
            .await
            .map_err(|e| BackendError::Provider {
                provider: self.provider_name.clone(),
                message: e.to_string(),
            })?;

        debug!(
            "{}/{}: {} input tokens, {} output tokens",
            self.provider_name, model, response.prompt_tokens, response.completion_tokens
        );

        if response.content.trim().is_empty() {
            return Err(BackendError::EmptyResponse);
        }
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_copies_settings() {
        let opts = build_options(&GenerateOptions {
            temperature: 0.2,
            max_tokens: 8192,
            json_response: true,
        });
        assert_eq!(opts.temperature, Some(0.2));
        assert_eq!(opts.max_tokens, Some(8192));
        assert_eq!(opts.response_format.as_deref(), Some("json_object"));
    }

    #[test]
    fn prose_requests_leave_response_format_unset() {
        let opts = build_options(&GenerateOptions {
            temperature: 0.2,
            max_tokens: 8192,
            json_response: false,
        });
        assert_eq!(opts.response_format, None);
    }

    #[test]
    fn name_is_provider_name() {
        assert_eq!(ProviderBackend::new("anthropic").name(), "anthropic");
    }
}
