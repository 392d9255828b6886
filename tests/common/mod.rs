//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use eureka_scorer::{BackendError, GenerateOptions, ModelBackend};
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::Mutex;
use std::time::Duration;

/// Backend whose reply is scripted per model identifier.
///
/// Identifiers without a script fail with HTTP 404, like an unknown model.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: HashMap<String, Result<String, String>>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, model: &str, text: &str) -> Self {
        self.replies.insert(model.to_string(), Ok(text.to_string()));
        self
    }

    pub fn fail(mut self, model: &str, message: &str) -> Self {
        self.replies
            .insert(model.to_string(), Err(message.to_string()));
        self
    }

    pub fn delay(mut self, model: &str, delay: Duration) -> Self {
        self.delays.insert(model.to_string(), delay);
        self
    }

    /// Identifiers in the order they were called.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        _options: &GenerateOptions,
    ) -> Result<String, BackendError> {
        self.calls.lock().unwrap().push(model.to_string());
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(d) = self.delays.get(model) {
            tokio::time::sleep(*d).await;
        }

        match self.replies.get(model) {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(message)) => Err(BackendError::Status {
                status: 400,
                message: message.clone(),
            }),
            None => Err(BackendError::Status {
                status: 404,
                message: format!("models/{} is not found", model.trim_start_matches("models/")),
            }),
        }
    }
}

/// A structured reply covering all twelve Eureka questions.
pub fn full_reply(score: u8) -> String {
    let reviews: Vec<serde_json::Value> = (1..=12)
        .map(|i| {
            serde_json::json!({
                "question": format!("{i}. question"),
                "score": score,
                "reasoning": format!("reasoning {i}")
            })
        })
        .collect();
    serde_json::json!({
        "reviews": reviews,
        "total_score": 12 * score as u32,
        "hard_truth": "The deck needs customer evidence."
    })
    .to_string()
}

/// Minimal PPTX archive: one slide part per entry, each a list of paragraphs.
pub fn pptx_bytes(slides: &[&[&str]]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let opts = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);

    zip.start_file("[Content_Types].xml", opts).unwrap();
    zip.write_all(br#"<?xml version="1.0"?><Types/>"#).unwrap();

    // Written out of order on purpose: slide10 must sort after slide2.
    let mut order: Vec<usize> = (0..slides.len()).collect();
    order.reverse();
    for i in order {
        let paragraphs: String = slides[i]
            .iter()
            .map(|p| format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", xml_escape(p)))
            .collect();
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:sp><p:txBody>{paragraphs}</p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#
        );
        zip.start_file(format!("ppt/slides/slide{}.xml", i + 1), opts)
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
    }

    zip.finish().unwrap().into_inner()
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Deck text long enough to pass the content gate.
pub const SAMPLE_DECK: &[&[&str]] = &[
    &["FreshRoute", "Farm-to-restaurant logistics for independent kitchens"],
    &["Problem", "Chefs spend 6 hours a week sourcing local produce"],
    &["Customer", "Independent restaurants in Portland with under 40 seats"],
];
