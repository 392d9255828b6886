//! Evaluation entry points.
//!
//! One run is strictly linear:
//!
//! ```text
//! resolve backend → input → extract → gate → prompt → invoke → normalize
//! ```
//!
//! The backend is resolved first, so a missing API key fails before any
//! download or extraction work.

use crate::backend::{resolve_backend, GenerateOptions, ModelBackend};
use crate::config::ScorerConfig;
use crate::error::ScorerError;
use crate::output::{EvaluationOutput, EvaluationStats};
use crate::pipeline::extract::{self, DeckFormat, ExtractedDeck};
use crate::pipeline::{gate, input, llm, normalize};
use crate::prompts::{build_prompt, truncate_chars};
use crate::report::render_evaluation;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Evaluate a deck given as a local path or an `http(s)://` URL.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// Every failure ends only this run: configuration, input, extraction, the
/// content gate, model invocation (all candidates failed) or normalization.
pub async fn evaluate_file(
    input_str: impl AsRef<str>,
    config: &ScorerConfig,
) -> Result<EvaluationOutput, ScorerError> {
    let start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting evaluation: {}", input_str);

    let result = resolve_and_run(input_str, config, start).await;

    report_completion(config, &result);
    result
}

/// Evaluate deck bytes already in memory (an upload, a database blob, …).
///
/// `source_name` supplies the extension used for format detection.
pub async fn evaluate_bytes(
    bytes: Vec<u8>,
    source_name: &str,
    config: &ScorerConfig,
) -> Result<EvaluationOutput, ScorerError> {
    let start = Instant::now();
    let result = extract_and_run(bytes, source_name, config, start).await;

    report_completion(config, &result);
    result
}

/// Evaluate text that was extracted elsewhere.
pub async fn evaluate_text(
    text: &str,
    source_name: &str,
    config: &ScorerConfig,
) -> Result<EvaluationOutput, ScorerError> {
    let start = Instant::now();
    let deck = ExtractedDeck {
        raw_text: text.to_string(),
        format: DeckFormat::Text,
        source_name: source_name.to_string(),
    };
    let result = match resolve_backend(config) {
        Ok(backend) => run(backend.as_ref(), deck, config, start).await,
        Err(e) => Err(e),
    };

    report_completion(config, &result);
    result
}

/// Synchronous wrapper around [`evaluate_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn evaluate_sync(
    input_str: impl AsRef<str>,
    config: &ScorerConfig,
) -> Result<EvaluationOutput, ScorerError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ScorerError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(evaluate_file(input_str, config))
}

/// Evaluate a deck and write the rendered markdown report to a file.
///
/// Uses atomic write (temp file + rename) so a failed run never leaves a
/// half-written report behind.
pub async fn evaluate_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ScorerConfig,
) -> Result<EvaluationOutput, ScorerError> {
    let output = evaluate_file(input_str, config).await?;
    let rendered = render_evaluation(&output.evaluation, &config.rubric);
    write_atomic(output_path.as_ref(), &rendered).await?;
    Ok(output)
}

/// Write `contents` to `path` through a sibling temp file.
pub async fn write_atomic(path: &Path, contents: &str) -> Result<(), ScorerError> {
    let write_err = |e: std::io::Error| ScorerError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, contents).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn resolve_and_run(
    input_str: &str,
    config: &ScorerConfig,
    start: Instant,
) -> Result<EvaluationOutput, ScorerError> {
    config.check_credentials()?;
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    extract_and_run(resolved.bytes, &resolved.source_name, config, start).await
}

async fn extract_and_run(
    bytes: Vec<u8>,
    source_name: &str,
    config: &ScorerConfig,
    start: Instant,
) -> Result<EvaluationOutput, ScorerError> {
    let backend = resolve_backend(config)?;
    let deck = extract::extract_text(bytes, source_name).await?;
    run(backend.as_ref(), deck, config, start).await
}

/// Gate → prompt → invoke → normalize for one extracted deck.
async fn run(
    backend: &dyn ModelBackend,
    deck: ExtractedDeck,
    config: &ScorerConfig,
    start: Instant,
) -> Result<EvaluationOutput, ScorerError> {
    let deck = gate::check_extracted(deck, config.min_text_chars)?;
    let extracted_chars = deck.char_count();
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_complete(&deck.source_name, extracted_chars);
    }

    let (_, truncated) = truncate_chars(&deck.raw_text, config.max_deck_chars);
    if truncated {
        info!(
            "Deck text cut to {} of {} chars",
            config.max_deck_chars, extracted_chars
        );
    }
    let prompt = build_prompt(
        &deck.raw_text,
        &config.rubric,
        config.output_mode,
        config.max_deck_chars,
    );
    debug!("Prompt: {} chars", prompt.chars().count());

    let options = llm::InvokeOptions {
        generate: GenerateOptions::from_config(config),
        attempt_timeout: Duration::from_secs(config.api_timeout_secs),
        progress: config.progress_callback.clone(),
    };
    let invocation = llm::invoke(backend, &prompt, &config.models, &options).await?;

    let evaluation = normalize::normalize(&invocation.text, config.output_mode, &config.rubric)?;

    let stats = EvaluationStats {
        extracted_chars,
        prompt_chars: prompt.chars().count(),
        truncated,
        total_duration_ms: start.elapsed().as_millis() as u64,
        llm_duration_ms: invocation.duration_ms,
    };

    if let Some(report) = evaluation.report() {
        info!(
            "'{}' scored {}/{} via {} ({} warnings)",
            deck.source_name,
            report.total_score,
            config.rubric.max_total(),
            invocation.model,
            report.warnings.len()
        );
    }

    Ok(EvaluationOutput {
        source_name: deck.source_name,
        evaluation,
        model: invocation.model,
        attempts: invocation.attempts,
        stats,
    })
}

fn report_completion(config: &ScorerConfig, result: &Result<EvaluationOutput, ScorerError>) {
    if let Some(ref cb) = config.progress_callback {
        match result {
            Ok(out) => cb.on_evaluation_complete(
                out.evaluation.report().map(|r| r.total_score),
                true,
            ),
            Err(_) => cb.on_evaluation_complete(None, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_atomic_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("deck.md");
        write_atomic(&path, "# Report\n").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Report\n");
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn missing_key_fails_before_reading_input() {
        let config = ScorerConfig::default();
        let err = evaluate_file("/no/such/deck.pdf", &config).await.unwrap_err();
        assert!(matches!(err, ScorerError::Configuration { .. }));
    }
}
