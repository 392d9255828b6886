//! Configuration types for pitch-deck evaluation.
//!
//! All evaluation behaviour is controlled through [`ScorerConfig`], built
//! once at startup via [`ScorerConfigBuilder`] and passed by reference to
//! every stage. Nothing in the pipeline reads ambient global state; the API
//! key, the rubric, and the model candidate list all travel in this struct.

use crate::backend::ModelBackend;
use crate::error::ScorerError;
use crate::pipeline::gate::DEFAULT_MIN_TEXT_CHARS;
use crate::progress::ProgressCallback;
use crate::prompts::DEFAULT_MAX_DECK_CHARS;
use crate::rubric::RubricDefinition;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Default Gemini REST endpoint.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Candidate models, most capable first.
pub const DEFAULT_MODELS: &[&str] = &[
    "gemini-2.5-flash",
    "gemini-2.0-flash",
    "gemini-1.5-pro",
    "gemini-1.5-flash",
];

/// Configuration for an evaluation run.
///
/// # Example
/// ```rust
/// use eureka_scorer::{OutputMode, ScorerConfig};
///
/// let config = ScorerConfig::builder()
///     .api_key("test-key")
///     .models(["gemini-2.0-flash"])
///     .output_mode(OutputMode::StructuredJson)
///     .build()
///     .unwrap();
/// assert_eq!(config.models, vec!["gemini-2.0-flash".to_string()]);
/// ```
#[derive(Clone)]
pub struct ScorerConfig {
    /// Gemini API key. Required unless `provider_name` or `backend` is set.
    pub api_key: Option<String>,

    /// Candidate model identifiers, tried in order. Default: [`DEFAULT_MODELS`].
    pub models: Vec<String>,

    /// Base URL of the Gemini REST API. Overridden in tests.
    pub gemini_base_url: String,

    /// Gemini API version path segment. Default: `v1beta`.
    pub api_version: String,

    /// edgequake-llm provider name (e.g. "openai", "anthropic", "ollama").
    /// When set, the candidates are model ids for that provider instead of Gemini.
    pub provider_name: Option<String>,

    /// Pre-constructed backend. Takes precedence over everything else.
    pub backend: Option<Arc<dyn ModelBackend>>,

    /// What the model is asked to produce. Default: [`OutputMode::StructuredJson`].
    pub output_mode: OutputMode,

    /// The rubric embedded in the prompt and used to align reviews.
    pub rubric: RubricDefinition,

    /// Sampling temperature. Default: 0.2.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 8192.
    ///
    /// Twelve reviews with a sentence or two of reasoning each fit in roughly
    /// 1 500 tokens; the headroom covers chatty models.
    pub max_tokens: usize,

    /// Deck text beyond this many characters is cut off. Default: 30 000.
    pub max_deck_chars: usize,

    /// Decks with fewer extracted characters are rejected. Default: 50.
    pub min_text_chars: usize,

    /// Per-attempt model call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Reviews scoring at or below this count as weak for coaching. Default: 2.
    pub weak_threshold: u8,

    /// Optional progress events sink.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            api_version: "v1beta".to_string(),
            provider_name: None,
            backend: None,
            output_mode: OutputMode::default(),
            rubric: RubricDefinition::eureka(),
            temperature: 0.2,
            max_tokens: 8192,
            max_deck_chars: DEFAULT_MAX_DECK_CHARS,
            min_text_chars: DEFAULT_MIN_TEXT_CHARS,
            api_timeout_secs: 60,
            download_timeout_secs: 120,
            weak_threshold: 2,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ScorerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScorerConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("models", &self.models)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("api_version", &self.api_version)
            .field("provider_name", &self.provider_name)
            .field("backend", &self.backend.as_ref().map(|_| "<dyn ModelBackend>"))
            .field("output_mode", &self.output_mode)
            .field("questions", &self.rubric.questions.len())
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_deck_chars", &self.max_deck_chars)
            .field("min_text_chars", &self.min_text_chars)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("weak_threshold", &self.weak_threshold)
            .finish()
    }
}

impl ScorerConfig {
    /// Create a new builder for `ScorerConfig`.
    pub fn builder() -> ScorerConfigBuilder {
        ScorerConfigBuilder {
            config: Self::default(),
        }
    }

    /// Default configuration with the API key read from `GEMINI_API_KEY`.
    ///
    /// A missing or empty key is a [`ScorerError::Configuration`] error.
    pub fn from_env() -> Result<Self, ScorerError> {
        let key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty());
        match key {
            Some(k) => Self::builder().api_key(k).build(),
            None => Err(missing_key_error()),
        }
    }

    /// Fail fast when no backend could be constructed at run time.
    ///
    /// The Gemini backend needs an API key; a named provider or an injected
    /// backend brings its own credentials.
    pub fn check_credentials(&self) -> Result<(), ScorerError> {
        if self.backend.is_some() || self.provider_name.is_some() {
            return Ok(());
        }
        match self.api_key.as_deref() {
            Some(k) if !k.trim().is_empty() => Ok(()),
            _ => Err(missing_key_error()),
        }
    }
}

fn missing_key_error() -> ScorerError {
    ScorerError::Configuration {
        hint: format!(
            "API key missing. Set {API_KEY_ENV} (or pass --api-key), \
             or choose another provider with --provider."
        ),
    }
}

/// Builder for [`ScorerConfig`].
#[derive(Debug)]
pub struct ScorerConfigBuilder {
    config: ScorerConfig,
}

impl ScorerConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.models = models
            .into_iter()
            .map(Into::into)
            .map(|m: String| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        self
    }

    pub fn gemini_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.gemini_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.config.api_version = version.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn backend(mut self, backend: Arc<dyn ModelBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.config.output_mode = mode;
        self
    }

    pub fn rubric(mut self, rubric: RubricDefinition) -> Self {
        self.config.rubric = rubric;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_deck_chars(mut self, n: usize) -> Self {
        self.config.max_deck_chars = n;
        self
    }

    pub fn min_text_chars(mut self, n: usize) -> Self {
        self.config.min_text_chars = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn weak_threshold(mut self, score: u8) -> Self {
        self.config.weak_threshold = score;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ScorerConfig, ScorerError> {
        let c = &self.config;
        if c.models.is_empty() {
            return Err(ScorerError::InvalidConfig(
                "At least one candidate model is required".into(),
            ));
        }
        if !(1_000..=200_000).contains(&c.max_deck_chars) {
            return Err(ScorerError::InvalidConfig(format!(
                "max_deck_chars must be 1000–200000, got {}",
                c.max_deck_chars
            )));
        }
        if c.api_timeout_secs == 0 {
            return Err(ScorerError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        if !(1..=3).contains(&c.weak_threshold) {
            return Err(ScorerError::InvalidConfig(format!(
                "weak_threshold must be 1–3, got {}",
                c.weak_threshold
            )));
        }
        if c.rubric.questions.is_empty() {
            return Err(ScorerError::InvalidConfig(
                "The rubric needs at least one question".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// What the model is asked to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// A markdown table plus Total Score and Hard Truth sections, shown verbatim.
    Markdown,
    /// One JSON object, parsed and validated into a [`crate::output::ScoreReport`]. (default)
    #[default]
    StructuredJson,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ScorerConfig::default();
        assert_eq!(c.models.len(), 4);
        assert_eq!(c.models[0], "gemini-2.5-flash");
        assert_eq!(c.max_deck_chars, 30_000);
        assert_eq!(c.min_text_chars, 50);
        assert_eq!(c.output_mode, OutputMode::StructuredJson);

        let built = ScorerConfig::builder().build().unwrap();
        assert_eq!(built.max_deck_chars, DEFAULT_MAX_DECK_CHARS);
        assert_eq!(built.min_text_chars, DEFAULT_MIN_TEXT_CHARS);
    }

    #[test]
    fn builder_rejects_empty_model_list() {
        let err = ScorerConfig::builder()
            .models(Vec::<String>::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, ScorerError::InvalidConfig(_)));
    }

    #[test]
    fn builder_drops_blank_model_names() {
        let c = ScorerConfig::builder()
            .models(["gemini-2.0-flash", "  ", ""])
            .build()
            .unwrap();
        assert_eq!(c.models, vec!["gemini-2.0-flash".to_string()]);
    }

    #[test]
    fn builder_rejects_tiny_budget() {
        let err = ScorerConfig::builder().max_deck_chars(10).build().unwrap_err();
        assert!(err.to_string().contains("max_deck_chars"));
    }

    #[test]
    fn credentials_required_for_gemini() {
        let c = ScorerConfig::default();
        assert!(matches!(
            c.check_credentials(),
            Err(ScorerError::Configuration { .. })
        ));

        let c = ScorerConfig::builder().api_key("k").build().unwrap();
        assert!(c.check_credentials().is_ok());

        let c = ScorerConfig::builder().provider_name("ollama").build().unwrap();
        assert!(c.check_credentials().is_ok());
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = ScorerConfig::builder().api_key("super-secret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let c = ScorerConfig::builder()
            .gemini_base_url("http://127.0.0.1:9999/")
            .build()
            .unwrap();
        assert_eq!(c.gemini_base_url, "http://127.0.0.1:9999");
    }
}
