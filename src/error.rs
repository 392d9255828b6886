//! Error types for the eureka-scorer library.
//!
//! Three layers of failure, from narrowest to widest:
//!
//! * [`BackendError`] — one model identifier failed once. Never fatal on its
//!   own: the invoker records it in a [`crate::output::ModelAttempt`] and
//!   moves on to the next form or candidate.
//!
//! * [`NormalizationError`] — the model answered, but the answer could not
//!   be turned into a [`crate::output::ScoreReport`]. Both variants carry
//!   the raw reply so the user never loses what the model said.
//!
//! * [`ScorerError`] — the evaluation run stops. Every variant is scoped to
//!   the current run; the caller can immediately start another one.

use crate::output::ModelAttempt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// All errors that end an evaluation run.
#[derive(Debug, Error)]
pub enum ScorerError {
    // ── Configuration ────────────────────────────────────────────────────
    /// Required configuration (the API key) is missing.
    #[error("Configuration error: {hint}")]
    Configuration { hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ─────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Deck file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Extraction errors ────────────────────────────────────────────────
    /// The file extension / magic bytes do not match a supported deck format.
    #[error("Unsupported file '{source_name}': {detail}\nUpload a .pdf or .pptx deck.")]
    UnsupportedFormat { source_name: String, detail: String },

    /// The file looked like a deck but could not be read.
    #[error("Could not read '{source_name}': {detail}")]
    Extraction { source_name: String, detail: String },

    /// Extraction worked but produced too little text to grade.
    #[error("{}", empty_content_message(.source_name, .chars, .min_chars))]
    EmptyContent {
        source_name: String,
        chars: usize,
        min_chars: usize,
    },

    // ── Model errors ─────────────────────────────────────────────────────
    /// Every candidate model failed.
    #[error(transparent)]
    ModelInvocation(#[from] InvocationFailure),

    /// The reply could not be normalized into a report.
    #[error(transparent)]
    Normalization(#[from] NormalizationError),

    // ── I/O errors ───────────────────────────────────────────────────────
    /// Could not create or write the output report file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn empty_content_message(source_name: &str, chars: &usize, min_chars: &usize) -> String {
    if *chars == 0 {
        format!(
            "No extractable text in '{source_name}'.\n\
             The deck is probably exported as flattened images; export it with real text and retry."
        )
    } else {
        format!(
            "Only {chars} characters of text found in '{source_name}' (need at least {min_chars}).\n\
             Most slides are probably images; export the deck with real text and retry."
        )
    }
}

impl ScorerError {
    /// Raw model reply attached to the error, if any.
    ///
    /// Present for normalization failures so callers can show the user
    /// what the model actually said.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            ScorerError::Normalization(e) => Some(e.raw()),
            _ => None,
        }
    }
}

/// Every candidate model identifier failed.
#[derive(Debug, Clone, Error)]
#[error("All {} model attempts failed.\nLast error: {last_error}", .attempts.len())]
pub struct InvocationFailure {
    /// One entry per identifier form tried, in order.
    pub attempts: Vec<ModelAttempt>,
    /// Detail of the final failure.
    pub last_error: String,
}

/// A model reply that could not be turned into a structured report.
#[derive(Debug, Clone, Error)]
pub enum NormalizationError {
    /// The reply (after fence stripping) is not valid JSON.
    #[error("Model reply is not valid JSON: {detail}")]
    InvalidJson { detail: String, raw: String },

    /// The reply parsed, but its top level is not a JSON object.
    #[error("Model reply has an unexpected shape: {detail}")]
    SchemaMismatch { detail: String, raw: String },
}

impl NormalizationError {
    /// The unmodified model reply.
    pub fn raw(&self) -> &str {
        match self {
            NormalizationError::InvalidJson { raw, .. }
            | NormalizationError::SchemaMismatch { raw, .. } => raw,
        }
    }
}

/// Failure of a single call against a model backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport-level failure (DNS, TLS, connection reset, …).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The API refused to answer (safety filter, recitation, …).
    #[error("response blocked: {reason}")]
    Blocked { reason: String },

    /// The API answered 200 but without any text.
    #[error("empty response from model")]
    EmptyResponse,

    /// The attempt exceeded the per-call timeout.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Error surfaced by an edgequake-llm provider.
    #[error("{provider} error: {message}")]
    Provider { provider: String, message: String },
}
