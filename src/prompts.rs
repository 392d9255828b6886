//! Prompts sent to the model.
//!
//! Every prompt is assembled here so tests can inspect them without a
//! backend. The rubric text and anchors are rendered from
//! [`RubricDefinition`] rather than hard-coded, so a custom rubric flows
//! through the same builder.

use crate::config::OutputMode;
use crate::output::ReviewEntry;
use crate::rubric::RubricDefinition;
use std::fmt::Write as _;

/// Default character budget for deck text inside the prompt.
pub const DEFAULT_MAX_DECK_CHARS: usize = 30_000;

const JUDGE_PREAMBLE: &str = r#"You are a strict Judge for the 'Eureka' Pitch Competition.

TASK: Score the uploaded pitch deck based on the RUBRIC below."#;

const SCORING_LEGEND: &str = r#"SCORING:
   3 = Specific and evidence based (names, numbers, tests run, money committed)
   2 = Present but vague
   1 = Missing or generic"#;

const JSON_FORMAT: &str = r#"OUTPUT FORMAT:
Respond with VALID JSON ONLY. No prose, no code fences.
{
    "reviews": [
        {
            "question": "1. What is the problem you want to solve?",
            "score": 1,
            "reasoning": "The deck only states..."
        }
    ],
    "total_score": 0,
    "hard_truth": "Summary paragraph."
}
Include exactly one review per rubric question, in rubric order.
Every score must be the integer 1, 2 or 3."#;

const MARKDOWN_FORMAT: &str = r#"OUTPUT FORMAT:
1. A markdown table with the columns | Category | Question | Score | Reasoning |,
   one row per rubric question, in rubric order. Score is 1, 2 or 3.
2. A section with the heading ## Total Score holding the sum of the scores.
3. A section with the heading ## Hard Truth holding one blunt summary paragraph."#;

/// Cut `text` to at most `max_chars` characters.
///
/// Returns the (possibly borrowed) prefix and whether anything was dropped.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}

/// Build the grading prompt for one deck.
///
/// The deck text is cut to `max_chars` characters; everything else (rubric
/// questions, scoring legend, anchors, output instructions) is always
/// included in full.
pub fn build_prompt(
    deck_text: &str,
    rubric: &RubricDefinition,
    mode: OutputMode,
    max_chars: usize,
) -> String {
    let (deck, _) = truncate_chars(deck_text, max_chars);

    let mut p = String::with_capacity(deck.len() + 4096);
    p.push_str(JUDGE_PREAMBLE);
    p.push_str("\n\nINPUT PITCH DECK:\n\"\"\"\n");
    p.push_str(deck);
    p.push_str("\n\"\"\"\n\nRUBRIC QUESTIONS:\n");
    p.push_str(&render_questions(rubric));
    p.push('\n');
    p.push_str(SCORING_LEGEND);
    p.push('\n');

    if !rubric.anchors.is_empty() {
        p.push_str("Use the CASE STUDY ANCHORS to decide whether a score is 1 or 3.\n");
        p.push_str("\nCASE STUDY ANCHORS (STRICT RULES):\n");
        p.push_str(&render_anchors(rubric));
    }

    p.push('\n');
    p.push_str(match mode {
        OutputMode::StructuredJson => JSON_FORMAT,
        OutputMode::Markdown => MARKDOWN_FORMAT,
    });
    p
}

/// Numbered questions grouped under `SECTION n: CATEGORY` headings.
fn render_questions(rubric: &RubricDefinition) -> String {
    let mut out = String::new();
    let mut current: Option<&str> = None;
    let mut section = 0;
    for q in &rubric.questions {
        if current != Some(q.category.as_str()) {
            section += 1;
            if current.is_some() {
                out.push('\n');
            }
            let _ = writeln!(out, "SECTION {section}: {}", q.category.to_uppercase());
            current = Some(&q.category);
        }
        let _ = writeln!(out, "{}. {}", q.id, q.text);
    }
    out
}

fn render_anchors(rubric: &RubricDefinition) -> String {
    let mut out = String::new();
    for (i, a) in rubric.anchors.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {} (\"{}\")\n   1 STAR (BAD): \"{}\"\n   (Reasoning: {})\n   3 STAR (GOOD): \"{}\"\n   (Reasoning: {})\n",
            i + 1,
            a.category.to_uppercase(),
            a.prompt,
            a.bad_example,
            a.bad_reasoning,
            a.good_example,
            a.good_reasoning,
        );
    }
    out
}

/// Prompt for the coaching agent: one famous-startup example per weakness.
pub fn build_case_study_prompt(weak: &[ReviewEntry]) -> String {
    let weaknesses: String = weak
        .iter()
        .map(|r| format!("- {} (Score: {})\n", r.question, r.score))
        .collect();

    format!(
        r#"You are a Startup Mentor. The founder's pitch fell short in these areas:
{weaknesses}
TASK:
For EACH weakness, name a famous successful startup (Airbnb, Dropbox, Uber, DoorDash, ...) whose early pitch handled this exact point well.

OUTPUT FORMAT (JSON ONLY):
{{
    "case_studies": [
        {{
            "weakness": "Customer Discovery",
            "example_company": "Airbnb",
            "lesson": "Airbnb did not just say 'travelers'. They targeted attendees of a sold-out design conference in SF.",
            "search_query": "Airbnb pitch deck customer validation slide"
        }}
    ]
}}"#
    )
}
