//! Result types produced by an evaluation run.
//!
//! Everything here is `Serialize + Deserialize` so the CLI can emit it as
//! JSON and callers can store or diff runs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One graded rubric answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEntry {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Always in `1..=3`.
    pub score: u8,
    pub reasoning: String,
}

/// The validated scorecard for one deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreReport {
    /// In rubric order.
    pub reviews: Vec<ReviewEntry>,
    /// Sum of `reviews[*].score`, recomputed locally.
    pub total_score: u32,
    pub hard_truth: String,
    /// Non-fatal problems found while normalizing the model reply.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<SchemaWarning>,
}

/// A schema problem that was recovered from with a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaWarning {
    /// `reviews` absent or not an array.
    MissingReviews,
    /// Review at `index` dropped because it was not a JSON object.
    MalformedReview { index: usize },
    /// Review at `index` dropped because its score was unusable.
    InvalidScore { index: usize, value: String },
    /// Review at `index` had no reasoning; a placeholder was used.
    MissingReasoning { index: usize },
    /// Review at `index` had no question text; the rubric text was used.
    MissingQuestion { index: usize },
    /// `total_score` absent; computed from the reviews.
    MissingTotal { computed: u32 },
    /// `total_score` disagreed with the sum of the reviews.
    TotalMismatch { reported: i64, computed: u32 },
    /// `hard_truth` absent or blank; a placeholder was used.
    MissingHardTruth,
    /// More reviews than rubric questions; extras dropped.
    ExtraReviews { expected: usize, received: usize },
    /// Fewer reviews than rubric questions.
    MissingReviewsForQuestions { expected: usize, received: usize },
}

impl fmt::Display for SchemaWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaWarning::MissingReviews => write!(f, "reply had no `reviews` list"),
            SchemaWarning::MalformedReview { index } => {
                write!(f, "review {} dropped: not a JSON object", index + 1)
            }
            SchemaWarning::InvalidScore { index, value } => {
                write!(f, "review {} dropped: score {value} is not 1, 2 or 3", index + 1)
            }
            SchemaWarning::MissingReasoning { index } => {
                write!(f, "review {} had no reasoning", index + 1)
            }
            SchemaWarning::MissingQuestion { index } => {
                write!(f, "review {} had no question text", index + 1)
            }
            SchemaWarning::MissingTotal { computed } => {
                write!(f, "reply had no total_score; computed {computed}")
            }
            SchemaWarning::TotalMismatch { reported, computed } => write!(
                f,
                "model reported total_score {reported} but the reviews add up to {computed}"
            ),
            SchemaWarning::MissingHardTruth => write!(f, "reply had no hard_truth summary"),
            SchemaWarning::ExtraReviews { expected, received } => write!(
                f,
                "received {received} reviews for {expected} questions; extras dropped"
            ),
            SchemaWarning::MissingReviewsForQuestions { expected, received } => write!(
                f,
                "received {received} reviews for {expected} questions"
            ),
        }
    }
}

/// Output of the normalizer for one model reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "result", rename_all = "snake_case")]
pub enum Evaluation {
    /// Markdown mode: the model text, untouched.
    Markdown(String),
    /// Structured mode: the validated scorecard.
    Scored(ScoreReport),
}

impl Evaluation {
    pub fn report(&self) -> Option<&ScoreReport> {
        match self {
            Evaluation::Scored(r) => Some(r),
            Evaluation::Markdown(_) => None,
        }
    }
}

/// One identifier form tried against a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelAttempt {
    pub model_identifier: String,
    pub succeeded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl ModelAttempt {
    pub fn succeeded(identifier: impl Into<String>) -> Self {
        Self {
            model_identifier: identifier.into(),
            succeeded: true,
            error_detail: None,
        }
    }

    pub fn failed(identifier: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            model_identifier: identifier.into(),
            succeeded: false,
            error_detail: Some(detail.into()),
        }
    }
}

/// Timing and size figures for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationStats {
    /// Characters extracted from the deck (before truncation).
    pub extracted_chars: usize,
    /// Characters in the final prompt.
    pub prompt_chars: usize,
    /// Whether the deck text was cut to fit the prompt budget.
    pub truncated: bool,
    /// Wall-clock time of the whole run.
    pub total_duration_ms: u64,
    /// Time spent waiting on model backends.
    pub llm_duration_ms: u64,
}

/// Everything an evaluation run returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationOutput {
    /// Name of the evaluated file (or `"<text>"` for raw text input).
    pub source_name: String,
    pub evaluation: Evaluation,
    /// Identifier that produced the reply.
    pub model: String,
    pub attempts: Vec<ModelAttempt>,
    pub stats: EvaluationStats,
}

/// A famous-startup example for one weak rubric answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseStudy {
    pub weakness: String,
    pub example_company: String,
    pub lesson: String,
    #[serde(default)]
    pub search_query: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluation_serialises_with_mode_tag() {
        let e = Evaluation::Markdown("| a |".into());
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["mode"], "markdown");
        assert_eq!(json["result"], "| a |");
    }

    #[test]
    fn schema_warning_display_is_one_based() {
        let w = SchemaWarning::InvalidScore {
            index: 0,
            value: "7".into(),
        };
        assert_eq!(w.to_string(), "review 1 dropped: score 7 is not 1, 2 or 3");
    }
}
