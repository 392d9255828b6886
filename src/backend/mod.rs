//! Model backends: the thing a model identifier plus a prompt is sent to.
//!
//! The invoker in [`crate::pipeline::llm`] only sees [`ModelBackend`]. Two
//! implementations ship with the crate:
//!
//! * [`GeminiBackend`] — Google's Generative Language REST API via `reqwest`.
//! * [`ProviderBackend`] — any provider known to `edgequake-llm`
//!   (openai, anthropic, ollama, …).
//!
//! Tests substitute their own implementation.

mod gemini;
mod provider;

pub use gemini::GeminiBackend;
pub use provider::ProviderBackend;

use crate::config::{OutputMode, ScorerConfig};
use crate::error::{BackendError, ScorerError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Per-call generation settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub max_tokens: usize,
    /// Ask the backend for a JSON-only reply when it supports that.
    pub json_response: bool,
}

impl GenerateOptions {
    pub fn from_config(config: &ScorerConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            json_response: config.output_mode == OutputMode::StructuredJson,
        }
    }
}

/// A text-generation endpoint addressed by model identifier.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Short name for logs (`"gemini"`, `"openai"`, …).
    fn name(&self) -> &str;

    /// Send `prompt` to `model` and return the reply text.
    ///
    /// `model` is passed exactly as the invoker chose it, with or without
    /// the `models/` prefix.
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, BackendError>;
}

/// Pick the backend for a run, from most-specific to least-specific.
///
/// 1. **Pre-built backend** (`config.backend`), used as-is.
/// 2. **Named provider** (`config.provider_name`), built through edgequake-llm.
/// 3. **Gemini** with `config.api_key`; a missing key is a configuration error.
pub fn resolve_backend(config: &ScorerConfig) -> Result<Arc<dyn ModelBackend>, ScorerError> {
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }

    if let Some(ref name) = config.provider_name {
        return Ok(Arc::new(ProviderBackend::new(name.clone())));
    }

    config.check_credentials()?;
    let key = config.api_key.clone().unwrap_or_default();
    let backend = GeminiBackend::with_config(
        key,
        &config.gemini_base_url,
        &config.api_version,
        Duration::from_secs(config.api_timeout_secs),
    )?;
    Ok(Arc::new(backend))
}
