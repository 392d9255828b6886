//! Model invocation: ordered fallback across candidate identifiers.
//!
//! Each candidate gets one logical attempt made of up to two identifier
//! forms, the bare name then `models/<name>`. Every failure (transport,
//! HTTP status, safety block, empty reply, timeout) is recorded as a
//! [`ModelAttempt`] and the loop moves on. There are no retries and no
//! backoff: the first form that returns text wins and nothing after it is
//! attempted.

use crate::backend::{GenerateOptions, ModelBackend};
use crate::error::{BackendError, InvocationFailure};
use crate::output::ModelAttempt;
use crate::progress::ProgressCallback;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const MODELS_PREFIX: &str = "models/";

/// Settings for one invocation.
#[derive(Clone)]
pub struct InvokeOptions {
    pub generate: GenerateOptions,
    /// Upper bound on each individual attempt.
    pub attempt_timeout: Duration,
    pub progress: Option<ProgressCallback>,
}

/// A successful invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Reply text, untouched.
    pub text: String,
    /// Identifier form that produced `text`.
    pub model: String,
    /// Every form tried, the winning one last.
    pub attempts: Vec<ModelAttempt>,
    pub duration_ms: u64,
}

/// Identifier forms tried for one candidate, in order.
pub fn identifier_forms(candidate: &str) -> Vec<String> {
    if candidate.starts_with(MODELS_PREFIX) {
        vec![candidate.to_string()]
    } else {
        vec![candidate.to_string(), format!("{MODELS_PREFIX}{candidate}")]
    }
}

/// Send `prompt` to the first candidate that answers.
///
/// An empty candidate list fails immediately with no attempts recorded.
pub async fn invoke(
    backend: &dyn ModelBackend,
    prompt: &str,
    candidates: &[String],
    options: &InvokeOptions,
) -> Result<Invocation, InvocationFailure> {
    let start = Instant::now();

    if candidates.is_empty() {
        return Err(InvocationFailure {
            attempts: Vec::new(),
            last_error: "no candidate models configured".into(),
        });
    }

    let mut attempts: Vec<ModelAttempt> = Vec::new();
    let mut last_error = String::new();

    for candidate in candidates {
        for id in identifier_forms(candidate) {
            let attempt_no = attempts.len() + 1;
            if let Some(ref cb) = options.progress {
                cb.on_attempt_start(&id, attempt_no);
            }
            debug!("{}: attempt {} with '{}'", backend.name(), attempt_no, id);

            let result = match tokio::time::timeout(
                options.attempt_timeout,
                backend.generate(&id, prompt, &options.generate),
            )
            .await
            {
                Ok(r) => r,
                Err(_) => Err(BackendError::Timeout(options.attempt_timeout)),
            };

            match result {
                Ok(text) => {
                    let duration_ms = start.elapsed().as_millis() as u64;
                    info!(
                        "{}: '{}' answered ({} chars, {}ms)",
                        backend.name(),
                        id,
                        text.len(),
                        duration_ms
                    );
                    if let Some(ref cb) = options.progress {
                        cb.on_attempt_succeeded(&id);
                    }
                    attempts.push(ModelAttempt::succeeded(&id));
                    return Ok(Invocation {
                        text,
                        model: id,
                        attempts,
                        duration_ms,
                    });
                }
                Err(e) => {
                    let detail = e.to_string();
                    warn!("{}: '{}' failed: {}", backend.name(), id, detail);
                    if let Some(ref cb) = options.progress {
                        cb.on_attempt_failed(&id, &detail);
                    }
                    attempts.push(ModelAttempt::failed(&id, &detail));
                    last_error = detail;
                }
            }
        }
    }

    Err(InvocationFailure {
        attempts,
        last_error,
    })
}
