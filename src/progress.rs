//! Progress-callback trait for evaluation events.
//!
//! Inject an [`Arc<dyn EvaluationProgressCallback>`] via
//! [`crate::config::ScorerConfigBuilder::progress_callback`] to hear about
//! extraction and each model attempt as they happen. The CLI uses it to drive
//! its spinner; a web front-end could forward the same events over a socket.
//!
//! # Example
//!
//! ```rust
//! use eureka_scorer::{EvaluationProgressCallback, ScorerConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct AttemptCounter {
//!     attempts: AtomicUsize,
//! }
//!
//! impl EvaluationProgressCallback for AttemptCounter {
//!     fn on_attempt_start(&self, model_identifier: &str, attempt: usize) {
//!         self.attempts.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("attempt {attempt}: {model_identifier}");
//!     }
//! }
//!
//! let counter = Arc::new(AttemptCounter { attempts: AtomicUsize::new(0) });
//!
//! let config = ScorerConfig::builder()
//!     .api_key("k")
//!     .progress_callback(counter as Arc<dyn EvaluationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the evaluation pipeline as it moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait EvaluationProgressCallback: Send + Sync {
    /// Called once the deck text is extracted and passed the content gate.
    ///
    /// # Arguments
    /// * `source_name` — file name of the deck
    /// * `chars`       — characters of extracted text
    fn on_extraction_complete(&self, source_name: &str, chars: usize) {
        let _ = (source_name, chars);
    }

    /// Called just before a model identifier is tried.
    ///
    /// # Arguments
    /// * `model_identifier` — the exact identifier sent to the backend
    /// * `attempt`          — 1-indexed attempt number across all candidates
    fn on_attempt_start(&self, model_identifier: &str, attempt: usize) {
        let _ = (model_identifier, attempt);
    }

    /// Called when an identifier fails. The invoker moves on afterwards.
    fn on_attempt_failed(&self, model_identifier: &str, error: &str) {
        let _ = (model_identifier, error);
    }

    /// Called when an identifier returns text.
    fn on_attempt_succeeded(&self, model_identifier: &str) {
        let _ = model_identifier;
    }

    /// Called once a run ends, successful or not.
    ///
    /// # Arguments
    /// * `total_score` — recomputed total in structured mode, `None` otherwise
    /// * `success`     — whether the run produced an evaluation
    fn on_evaluation_complete(&self, total_score: Option<u32>, success: bool) {
        let _ = (total_score, success);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl EvaluationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ScorerConfig`].
pub type ProgressCallback = Arc<dyn EvaluationProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingCallback {
        events: Mutex<Vec<String>>,
    }

    impl EvaluationProgressCallback for RecordingCallback {
        fn on_attempt_start(&self, model_identifier: &str, attempt: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("start {attempt} {model_identifier}"));
        }

        fn on_attempt_failed(&self, model_identifier: &str, _error: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("fail {model_identifier}"));
        }

        fn on_evaluation_complete(&self, total_score: Option<u32>, success: bool) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done {total_score:?} {success}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_extraction_complete("deck.pdf", 1200);
        cb.on_attempt_start("gemini-2.5-flash", 1);
        cb.on_attempt_failed("gemini-2.5-flash", "HTTP 404");
        cb.on_attempt_succeeded("models/gemini-2.5-flash");
        cb.on_evaluation_complete(Some(24), true);
    }

    #[test]
    fn recording_callback_keeps_order() {
        let cb = RecordingCallback::default();
        cb.on_attempt_start("a", 1);
        cb.on_attempt_failed("a", "boom");
        cb.on_attempt_start("models/a", 2);
        cb.on_evaluation_complete(None, false);

        let events = cb.events.lock().unwrap();
        assert_eq!(
            *events,
            vec!["start 1 a", "fail a", "start 2 models/a", "done None false"]
        );
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_attempt_start("x", 1);
        cb.on_evaluation_complete(Some(36), true);
    }
}
