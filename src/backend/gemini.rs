//! Gemini REST adapter (`generateContent`).

use super::{GenerateOptions, ModelBackend};
use crate::error::{BackendError, ScorerError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Client for `POST {base}/{version}/models/{id}:generateContent`.
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
}

impl GeminiBackend {
    /// Client with a custom base URL (wiremock in tests), API version and
    /// transport timeout.
    pub fn with_config(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        api_version: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ScorerError> {
        let api_key = api_key.into();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut key = HeaderValue::from_str(&api_key).map_err(|_| ScorerError::Configuration {
            hint: "GEMINI_API_KEY contains characters that are not valid in an HTTP header"
                .into(),
        })?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ScorerError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_version: api_version.into(),
        })
    }

    /// Both identifier forms address the same REST resource.
    fn generate_url(&self, model: &str) -> String {
        let resource = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        };
        format!(
            "{}/{}/{}:generateContent",
            self.base_url, self.api_version, resource
        )
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

// ── ModelBackend ─────────────────────────────────────────────────────────

#[async_trait]
impl ModelBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, BackendError> {
        let body = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_tokens,
                response_mime_type: options.json_response.then_some("application/json"),
            },
        };

        let url = self.generate_url(model);
        debug!("POST {url} ({} prompt chars)", prompt.len());

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ErrorEnvelope>(&text) {
                Ok(env) => match env.error.status {
                    Some(s) => format!("{s}: {}", env.error.message),
                    None => env.error.message,
                },
                Err(_) => text.chars().take(300).collect(),
            };
            return Err(BackendError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&text).map_err(|e| BackendError::Status {
                status: status.as_u16(),
                message: format!("unreadable response body: {e}"),
            })?;

        extract_text(parsed)
    }
}

fn extract_text(resp: GenerateResponse) -> Result<String, BackendError> {
    if let Some(reason) = resp.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(BackendError::Blocked { reason });
    }

    let Some(candidate) = resp.candidates.into_iter().next() else {
        return Err(BackendError::EmptyResponse);
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return match candidate.finish_reason.as_deref() {
            Some(r @ ("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT")) => {
                Err(BackendError::Blocked {
                    reason: r.to_string(),
                })
            }
            _ => Err(BackendError::EmptyResponse),
        };
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> GeminiBackend {
        GeminiBackend::with_config("k", "http://localhost:1/", "v1beta", Duration::from_secs(1))
            .unwrap()
    }

    #[test]
    fn url_is_identical_for_both_identifier_forms() {
        let b = backend();
        assert_eq!(
            b.generate_url("gemini-2.0-flash"),
            "http://localhost:1/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert_eq!(
            b.generate_url("models/gemini-2.0-flash"),
            b.generate_url("gemini-2.0-flash")
        );
    }

    #[test]
    fn request_body_uses_camel_case() {
        let body = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [Part { text: "hi" }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.2,
                max_output_tokens: 100,
                response_mime_type: Some("application/json"),
            },
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(v["generationConfig"]["maxOutputTokens"], 100);
        assert_eq!(v["contents"][0]["parts"][0]["text"], "hi");
    }

    #[test]
    fn extract_joins_parts() {
        let resp: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}]},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(resp).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn extract_reports_block_reason() {
        let resp: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert!(matches!(
            extract_text(resp),
            Err(BackendError::Blocked { reason }) if reason == "SAFETY"
        ));
    }

    #[test]
    fn extract_empty_candidates() {
        assert!(matches!(
            extract_text(GenerateResponse::default()),
            Err(BackendError::EmptyResponse)
        ));
    }
}
