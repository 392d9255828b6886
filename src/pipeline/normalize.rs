//! Response normalization: turn a model reply into an [`Evaluation`].
//!
//! Models ignore "JSON only" instructions often enough that the reply is
//! treated as untrusted text:
//!
//! 1. Strip leading / trailing code fences (```` ``` ```` or ```` ```json ````).
//! 2. Parse. Unparseable text is an error that carries the raw reply.
//! 3. Validate field by field. Anything recoverable becomes a
//!    [`SchemaWarning`] plus a default, so one bad entry never costs the
//!    user the other eleven.
//!
//! `total_score` is always recomputed from the kept reviews; the model's own
//! arithmetic is only compared against it.

use crate::config::OutputMode;
use crate::error::NormalizationError;
use crate::output::{Evaluation, ReviewEntry, SchemaWarning, ScoreReport};
use crate::rubric::{RubricDefinition, MAX_SCORE_PER_QUESTION};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

/// Used when a review has no reasoning.
pub const MISSING_REASONING: &str = "No reasoning provided.";

/// Used when the reply has no hard-truth summary.
pub const MISSING_HARD_TRUTH: &str = "No summary provided.";

// ── Fence stripping ──────────────────────────────────────────────────────

static RE_OPENING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```[A-Za-z0-9_-]*[ \t]*\r?\n?").unwrap());

static RE_CLOSING_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n?```$").unwrap());

/// Remove a leading and/or trailing code fence, then trim.
///
/// Purely textual: text without fences comes back trimmed and otherwise
/// unchanged.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut s = raw.trim();
    if let Some(m) = RE_OPENING_FENCE.find(s) {
        s = &s[m.end()..];
    }
    if let Some(m) = RE_CLOSING_FENCE.find(s) {
        s = &s[..m.start()];
    }
    s.trim()
}

// ── Coercion helpers ─────────────────────────────────────────────────────

/// `"2"`, `"2.0"`, `"2/3"`, `" 3 / 3 "`.
static RE_SCORE_STRING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)(?:\.0+)?\s*(?:/\s*\d+)?$").unwrap());

fn as_integer(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => RE_SCORE_STRING
            .captures(s.trim())
            .and_then(|c| c[1].parse().ok()),
        _ => None,
    }
}

/// Integer score in `1..=3`, if `v` can be read as one.
pub fn coerce_score(v: &Value) -> Option<u8> {
    as_integer(v)
        .filter(|n| (1..=MAX_SCORE_PER_QUESTION as i64).contains(n))
        .map(|n| n as u8)
}

fn non_blank_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn describe(v: Option<&Value>) -> String {
    match v {
        None | Some(Value::Null) => "missing".into(),
        Some(Value::String(s)) => format!("{s:?}"),
        Some(other) => other.to_string(),
    }
}

// ── Normalizer ───────────────────────────────────────────────────────────

/// Normalize one model reply.
///
/// In [`OutputMode::Markdown`] the reply is returned untouched.
pub fn normalize(
    raw: &str,
    mode: OutputMode,
    rubric: &RubricDefinition,
) -> Result<Evaluation, NormalizationError> {
    match mode {
        OutputMode::Markdown => Ok(Evaluation::Markdown(raw.to_string())),
        OutputMode::StructuredJson => normalize_json(raw, rubric).map(Evaluation::Scored),
    }
}

/// Structured-mode normalization.
pub fn normalize_json(
    raw: &str,
    rubric: &RubricDefinition,
) -> Result<ScoreReport, NormalizationError> {
    let cleaned = strip_code_fences(raw);

    let value: Value =
        serde_json::from_str(cleaned).map_err(|e| NormalizationError::InvalidJson {
            detail: e.to_string(),
            raw: raw.to_string(),
        })?;

    let Value::Object(obj) = value else {
        return Err(NormalizationError::SchemaMismatch {
            detail: format!("expected a JSON object, got {}", json_kind(&value)),
            raw: raw.to_string(),
        });
    };

    let mut warnings = Vec::new();
    let expected = rubric.questions.len();

    // ── reviews ──
    let items: &[Value] = match obj.get("reviews") {
        Some(Value::Array(a)) => a,
        _ => {
            warnings.push(SchemaWarning::MissingReviews);
            &[]
        }
    };

    let items = if expected > 0 && items.len() > expected {
        warnings.push(SchemaWarning::ExtraReviews {
            expected,
            received: items.len(),
        });
        &items[..expected]
    } else {
        items
    };

    let mut reviews = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let Value::Object(entry) = item else {
            warnings.push(SchemaWarning::MalformedReview { index });
            continue;
        };

        let Some(score) = entry.get("score").and_then(coerce_score) else {
            warnings.push(SchemaWarning::InvalidScore {
                index,
                value: describe(entry.get("score")),
            });
            continue;
        };

        let rubric_q = rubric.question_at(index);

        let question = match non_blank_str(entry, "question") {
            Some(q) => q.to_string(),
            None => {
                warnings.push(SchemaWarning::MissingQuestion { index });
                rubric_q
                    .map(|q| format!("{}. {}", q.id, q.text))
                    .unwrap_or_else(|| format!("Question {}", index + 1))
            }
        };

        let category = non_blank_str(entry, "category")
            .map(str::to_string)
            .or_else(|| rubric_q.map(|q| q.category.clone()));

        let reasoning = match non_blank_str(entry, "reasoning") {
            Some(r) => r.to_string(),
            None => {
                warnings.push(SchemaWarning::MissingReasoning { index });
                MISSING_REASONING.to_string()
            }
        };

        reviews.push(ReviewEntry {
            question,
            category,
            score,
            reasoning,
        });
    }

    if reviews.len() < expected {
        warnings.push(SchemaWarning::MissingReviewsForQuestions {
            expected,
            received: reviews.len(),
        });
    }

    // ── total_score ──
    let computed: u32 = reviews.iter().map(|r| r.score as u32).sum();
    match obj.get("total_score").and_then(as_integer) {
        None => warnings.push(SchemaWarning::MissingTotal { computed }),
        Some(reported) if reported != computed as i64 => {
            warnings.push(SchemaWarning::TotalMismatch { reported, computed })
        }
        Some(_) => {}
    }

    // ── hard_truth ──
    let hard_truth = match non_blank_str(&obj, "hard_truth") {
        Some(h) => h.to_string(),
        None => {
            warnings.push(SchemaWarning::MissingHardTruth);
            MISSING_HARD_TRUTH.to_string()
        }
    };

    for w in &warnings {
        warn!("Model reply: {w}");
    }

    Ok(ScoreReport {
        reviews,
        total_score: computed,
        hard_truth,
        warnings,
    })
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
