//! # eureka-scorer
//!
//! Score startup pitch decks against the Eureka pitch-competition rubric
//! with a hosted language model.
//!
//! The deck's text is extracted, wrapped in a prompt carrying the 12 rubric
//! questions and their calibration anchors, and sent to the first candidate
//! model that answers. The reply is treated as untrusted text: code fences
//! are stripped, the JSON is validated field by field, and the total is
//! recomputed locally.
//!
//! ## Pipeline Overview
//!
//! ```text
//! deck (PDF / PPTX, path or URL)
//!  │
//!  ├─ 1. Input     read the file or download the URL
//!  ├─ 2. Extract   pdfium (spawn_blocking) or zip + XML slide text
//!  ├─ 3. Gate      < 50 chars → image-only deck, stop here
//!  ├─ 4. Prompt    rubric + anchors + deck text (cut to 30 000 chars)
//!  ├─ 5. Invoke    gemini-2.5-flash → gemini-2.0-flash → gemini-1.5-pro → …
//!  └─ 6. Normalize fences, JSON, schema repair, recomputed total
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use eureka_scorer::{evaluate_file, ScorerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads GEMINI_API_KEY
//!     let config = ScorerConfig::from_env()?;
//!     let output = evaluate_file("pitch.pdf", &config).await?;
//!     if let Some(report) = output.evaluation.report() {
//!         println!("{}/36 via {}", report.total_score, output.model);
//!         println!("{}", report.hard_truth);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `eureka` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ## Other Providers
//!
//! Gemini is called over its REST API directly. Any provider supported by
//! `edgequake-llm` can be used instead by setting
//! [`ScorerConfig::provider_name`]; the candidate list then holds that
//! provider's model ids.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod coach;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod report;
pub mod rubric;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{GeminiBackend, GenerateOptions, ModelBackend, ProviderBackend};
pub use coach::{coach, search_link, weak_reviews};
pub use config::{OutputMode, ScorerConfig, ScorerConfigBuilder};
pub use error::{BackendError, InvocationFailure, NormalizationError, ScorerError};
pub use evaluate::{evaluate_bytes, evaluate_file, evaluate_sync, evaluate_text, evaluate_to_file};
pub use output::{
    CaseStudy, Evaluation, EvaluationOutput, EvaluationStats, ModelAttempt, ReviewEntry,
    SchemaWarning, ScoreReport,
};
pub use pipeline::extract::{DeckFormat, ExtractedDeck};
pub use pipeline::gate::check_extracted;
pub use pipeline::llm::{invoke, Invocation, InvokeOptions};
pub use pipeline::normalize::{normalize, strip_code_fences};
pub use progress::{EvaluationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use prompts::build_prompt;
pub use report::{render_markdown, score_label, ScoreBand};
pub use rubric::{AnchorExample, RubricDefinition, RubricQuestion};
