//! Markdown rendering of evaluation results.

use crate::output::{CaseStudy, Evaluation, ScoreReport};
use crate::rubric::RubricDefinition;
use std::fmt::Write as _;

/// Qualitative band of a single score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    /// 1: missing or generic.
    Weak,
    /// 2: present but vague.
    Vague,
    /// 3: specific and evidence based.
    Strong,
}

impl ScoreBand {
    pub fn as_str(self) -> &'static str {
        match self {
            ScoreBand::Weak => "weak",
            ScoreBand::Vague => "vague",
            ScoreBand::Strong => "strong",
        }
    }

    /// Display colour name: red, yellow or green.
    pub fn colour(self) -> &'static str {
        match self {
            ScoreBand::Weak => "red",
            ScoreBand::Vague => "yellow",
            ScoreBand::Strong => "green",
        }
    }
}

/// Band for a score. Anything below 2 is weak, anything above 2 strong.
pub fn score_label(score: u8) -> ScoreBand {
    match score {
        0 | 1 => ScoreBand::Weak,
        2 => ScoreBand::Vague,
        _ => ScoreBand::Strong,
    }
}

/// Table cells cannot hold raw pipes or newlines.
fn cell(text: &str) -> String {
    text.replace('|', "\\|")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render a scorecard as markdown: table, total, hard truth, warnings.
pub fn render_markdown(report: &ScoreReport, rubric: &RubricDefinition) -> String {
    let mut out = String::new();
    out.push_str("| Category | Question | Score | Reasoning |\n");
    out.push_str("|---|---|:---:|---|\n");
    for r in &report.reviews {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} |",
            cell(r.category.as_deref().unwrap_or("")),
            cell(&r.question),
            r.score,
            cell(&r.reasoning)
        );
    }

    let _ = write!(
        out,
        "\n## Total Score\n\n**{}/{}**\n\n## Hard Truth\n\n{}\n",
        report.total_score,
        rubric.max_total(),
        report.hard_truth.trim()
    );

    if !report.warnings.is_empty() {
        out.push_str("\n## Warnings\n\n");
        for w in &report.warnings {
            let _ = writeln!(out, "- {w}");
        }
    }
    out
}

/// Markdown for either evaluation mode. Markdown-mode text is returned as is.
pub fn render_evaluation(evaluation: &Evaluation, rubric: &RubricDefinition) -> String {
    match evaluation {
        Evaluation::Markdown(text) => text.clone(),
        Evaluation::Scored(report) => render_markdown(report, rubric),
    }
}

/// Coaching section: one entry per case study with a search link.
pub fn render_case_studies(studies: &[CaseStudy]) -> String {
    let mut out = String::from("## Learn From The Best\n\n");
    for s in studies {
        let _ = write!(
            out,
            "### {}: {}\n\n{}\n\n[Search: {}]({})\n\n",
            s.weakness.trim(),
            s.example_company.trim(),
            s.lesson.trim(),
            s.search_query,
            crate::coach::search_link(&s.search_query)
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{ReviewEntry, SchemaWarning};

    fn report() -> ScoreReport {
        ScoreReport {
            reviews: vec![
                ReviewEntry {
                    question: "1. What is the problem you want to solve?".into(),
                    category: Some("Problem".into()),
                    score: 3,
                    reasoning: "Names the | exact\npain.".into(),
                },
                ReviewEntry {
                    question: "6. Who is the customer/end user?".into(),
                    category: None,
                    score: 1,
                    reasoning: "Everyone.".into(),
                },
            ],
            total_score: 4,
            hard_truth: "No customer evidence.".into(),
            warnings: vec![SchemaWarning::MissingTotal { computed: 4 }],
        }
    }

    #[test]
    fn labels() {
        assert_eq!(score_label(1), ScoreBand::Weak);
        assert_eq!(score_label(2), ScoreBand::Vague);
        assert_eq!(score_label(3).colour(), "green");
        assert_eq!(score_label(1).as_str(), "weak");
    }

    #[test]
    fn markdown_has_table_total_and_truth() {
        let md = render_markdown(&report(), &RubricDefinition::eureka());
        assert!(md.starts_with("| Category | Question | Score | Reasoning |"));
        assert!(md.contains("| Problem | 1. What is the problem you want to solve? | 3 | Names the \\| exact pain. |"));
        assert!(md.contains("|  | 6. Who is the customer/end user? | 1 | Everyone. |"));
        assert!(md.contains("**4/36**"));
        assert!(md.contains("## Hard Truth\n\nNo customer evidence."));
        assert!(md.contains("- reply had no total_score; computed 4"));
    }

    #[test]
    fn markdown_mode_rendered_verbatim() {
        let e = Evaluation::Markdown("raw *model* text".into());
        assert_eq!(
            render_evaluation(&e, &RubricDefinition::eureka()),
            "raw *model* text"
        );
    }

    #[test]
    fn case_studies_include_links() {
        let md = render_case_studies(&[CaseStudy {
            weakness: "Customer Discovery".into(),
            example_company: "Airbnb".into(),
            lesson: "Targeted a sold-out conference.".into(),
            search_query: "Airbnb pitch deck".into(),
        }]);
        assert!(md.contains("### Customer Discovery: Airbnb"));
        assert!(md.contains("(https://www.google.com/search?q=Airbnb+pitch+deck)"));
    }
}
