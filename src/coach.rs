//! Coaching: famous-startup case studies for the weak answers of a report.
//!
//! A second model call, made through the same invoker and candidate list as
//! the grading call. It only runs when asked for and only when the report
//! has at least one weak answer.

use crate::backend::{GenerateOptions, ModelBackend};
use crate::config::ScorerConfig;
use crate::error::{NormalizationError, ScorerError};
use crate::output::{CaseStudy, ReviewEntry, ScoreReport};
use crate::pipeline::llm::{self, InvokeOptions};
use crate::pipeline::normalize::strip_code_fences;
use crate::prompts::build_case_study_prompt;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

const SEARCH_URL: &str = "https://www.google.com/search";

/// Reviews scoring at or below `threshold`, in report order.
pub fn weak_reviews(report: &ScoreReport, threshold: u8) -> Vec<ReviewEntry> {
    report
        .reviews
        .iter()
        .filter(|r| r.score <= threshold)
        .cloned()
        .collect()
}

/// Web-search link for `query`, query string percent-encoded.
pub fn search_link(query: &str) -> String {
    match reqwest::Url::parse_with_params(SEARCH_URL, &[("q", query)]) {
        Ok(url) => url.to_string(),
        Err(_) => SEARCH_URL.to_string(),
    }
}

/// Parse the coaching reply: `{"case_studies": [...]}` or a bare array.
///
/// Entries missing required fields are skipped. A blank `search_query` is
/// filled from the company name.
pub fn parse_case_studies(raw: &str) -> Result<Vec<CaseStudy>, NormalizationError> {
    let value: Value =
        serde_json::from_str(strip_code_fences(raw)).map_err(|e| NormalizationError::InvalidJson {
            detail: e.to_string(),
            raw: raw.to_string(),
        })?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("case_studies") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(NormalizationError::SchemaMismatch {
                    detail: "no `case_studies` list".into(),
                    raw: raw.to_string(),
                })
            }
        },
        _ => {
            return Err(NormalizationError::SchemaMismatch {
                detail: "expected an object with `case_studies`".into(),
                raw: raw.to_string(),
            })
        }
    };

    let mut studies = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<CaseStudy>(item) {
            Ok(mut s) => {
                if s.search_query.trim().is_empty() {
                    s.search_query = format!("{} pitch deck", s.example_company.trim());
                }
                studies.push(s);
            }
            Err(e) => warn!("Case study {} skipped: {}", i + 1, e),
        }
    }
    Ok(studies)
}

/// Ask the model for case studies covering the weak answers in `report`.
///
/// Returns an empty list without calling the model when nothing is weak.
pub async fn coach(
    backend: &dyn ModelBackend,
    report: &ScoreReport,
    config: &ScorerConfig,
) -> Result<Vec<CaseStudy>, ScorerError> {
    let weak = weak_reviews(report, config.weak_threshold);
    if weak.is_empty() {
        info!("No answers at or below {}; skipping coaching", config.weak_threshold);
        return Ok(Vec::new());
    }
    info!("Coaching on {} weak answers", weak.len());

    let prompt = build_case_study_prompt(&weak);
    let options = InvokeOptions {
        generate: GenerateOptions {
            json_response: true,
            ..GenerateOptions::from_config(config)
        },
        attempt_timeout: Duration::from_secs(config.api_timeout_secs),
        progress: config.progress_callback.clone(),
    };

    let invocation = llm::invoke(backend, &prompt, &config.models, &options).await?;
    Ok(parse_case_studies(&invocation.text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(score: u8) -> ReviewEntry {
        ReviewEntry {
            question: format!("q{score}"),
            category: None,
            score,
            reasoning: "r".into(),
        }
    }

    #[test]
    fn weak_reviews_respect_threshold() {
        let report = ScoreReport {
            reviews: vec![entry(1), entry(3), entry(2)],
            total_score: 6,
            hard_truth: "h".into(),
            warnings: vec![],
        };
        let weak = weak_reviews(&report, 2);
        assert_eq!(weak.len(), 2);
        assert_eq!(weak[0].score, 1);
        assert_eq!(weak[1].score, 2);
        assert_eq!(weak_reviews(&report, 1).len(), 1);
    }

    #[test]
    fn search_link_encodes_query() {
        let link = search_link("Airbnb pitch deck & validation");
        assert_eq!(
            link,
            "https://www.google.com/search?q=Airbnb+pitch+deck+%26+validation"
        );
    }

    #[test]
    fn parses_wrapped_and_bare_forms() {
        let wrapped = r#"```json
{"case_studies":[{"weakness":"Customer Discovery","example_company":"Airbnb","lesson":"Narrow beachhead.","search_query":"Airbnb deck"}]}
```"#;
        let s = parse_case_studies(wrapped).unwrap();
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].example_company, "Airbnb");

        let bare = r#"[{"weakness":"Validation","example_company":"Dropbox","lesson":"Demo video waitlist."}]"#;
        let s = parse_case_studies(bare).unwrap();
        assert_eq!(s[0].search_query, "Dropbox pitch deck");
    }

    #[test]
    fn malformed_entries_skipped() {
        let raw = r#"{"case_studies":[{"weakness":"x"},{"weakness":"Team","example_company":"Uber","lesson":"l","search_query":"q"}]}"#;
        let s = parse_case_studies(raw).unwrap();
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].example_company, "Uber");
    }

    #[test]
    fn wrong_shape_is_schema_mismatch() {
        let err = parse_case_studies(r#"{"studies":[]}"#).unwrap_err();
        assert!(matches!(err, NormalizationError::SchemaMismatch { .. }));
        let err = parse_case_studies("nope").unwrap_err();
        assert!(matches!(err, NormalizationError::InvalidJson { .. }));
    }
}
