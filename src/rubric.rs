//! The grading rubric: questions plus calibration anchors.
//!
//! A rubric is plain data. [`RubricDefinition::eureka`] returns the built-in
//! Eureka pitch-competition rubric; callers with their own competition can
//! construct a [`RubricDefinition`] directly or load one from JSON.

use serde::{Deserialize, Serialize};

/// Highest score a single answer can get.
pub const MAX_SCORE_PER_QUESTION: u8 = 3;

/// One rubric question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricQuestion {
    pub id: u32,
    pub category: String,
    pub text: String,
}

/// A 1-star / 3-star sample answer pair for one rubric category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorExample {
    pub category: String,
    /// The question the category is about, in the founder's words.
    pub prompt: String,
    pub bad_example: String,
    pub bad_reasoning: String,
    pub good_example: String,
    pub good_reasoning: String,
}

/// The full rubric handed to the prompt builder and the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricDefinition {
    pub questions: Vec<RubricQuestion>,
    #[serde(default)]
    pub anchors: Vec<AnchorExample>,
}

impl RubricDefinition {
    /// The 12-question Eureka rubric with its three case-study anchors.
    pub fn eureka() -> Self {
        let q = |id: u32, category: &str, text: &str| RubricQuestion {
            id,
            category: category.to_string(),
            text: text.to_string(),
        };

        let questions = vec![
            q(1, "Problem", "What is the problem you want to solve?"),
            q(2, "Problem", "Why do you care about solving this problem?"),
            q(3, "Problem", "Why are you uniquely qualified to solve this problem?"),
            q(4, "Problem", "Initial thoughts on finding customers?"),
            q(5, "Problem", "Initial thoughts on monetization?"),
            q(6, "Discovery", "Who is the customer/end user?"),
            q(7, "Discovery", "Have you carved out user profile specifics? (Who have you talked to?)"),
            q(8, "Discovery", "How are customers currently solving this problem?"),
            q(9, "Discovery", "What are the competitive products?"),
            q(10, "Discovery", "Prototype status?"),
            q(11, "Discovery", "Analysis of results?"),
            q(12, "Discovery", "What do you need now?"),
        ];

        let anchors = vec![
            AnchorExample {
                category: "Problem Identification".into(),
                prompt: "Why you?".into(),
                bad_example: "We are passionate students who love music.".into(),
                bad_reasoning: "Generic passion, no unique leverage.".into(),
                good_example: "Our CTO holds a patent in audio signal processing and I managed a $2M inventory at Guitar Center.".into(),
                good_reasoning: "Specific, verifiable, relevant domain expertise.".into(),
            },
            AnchorExample {
                category: "Customer Discovery".into(),
                prompt: "Who is the customer?".into(),
                bad_example: "Everyone who owns a home is our customer.".into(),
                bad_reasoning: "TAM is not a customer profile. Too broad.".into(),
                good_example: "Our beachhead is single-family homeowners in the Northeast with oil heat (12% of region).".into(),
                good_reasoning: "Specific geography, demographic, and technical constraint.".into(),
            },
            AnchorExample {
                category: "Validation".into(),
                prompt: "How do you know?".into(),
                bad_example: "We sent out a survey and people liked it.".into(),
                bad_reasoning: "Surveys are weak evidence of purchase intent.".into(),
                good_example: "We pre-sold 50 units at $20 each using a smoke-test landing page.".into(),
                good_reasoning: "Financial commitment and actual behavior tracked.".into(),
            },
        ];

        Self { questions, anchors }
    }

    /// Highest reachable total (`questions × 3`).
    pub fn max_total(&self) -> u32 {
        self.questions.len() as u32 * MAX_SCORE_PER_QUESTION as u32
    }

    /// Question at a zero-based position, if the rubric has one.
    pub fn question_at(&self, index: usize) -> Option<&RubricQuestion> {
        self.questions.get(index)
    }
}

impl Default for RubricDefinition {
    fn default() -> Self {
        Self::eureka()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eureka_rubric_shape() {
        let r = RubricDefinition::eureka();
        assert_eq!(r.questions.len(), 12);
        assert_eq!(r.anchors.len(), 3);
        assert_eq!(r.max_total(), 36);
        assert_eq!(r.questions[0].category, "Problem");
        assert_eq!(r.questions[11].category, "Discovery");
    }

    #[test]
    fn question_ids_are_sequential() {
        let r = RubricDefinition::eureka();
        for (i, q) in r.questions.iter().enumerate() {
            assert_eq!(q.id as usize, i + 1);
        }
    }

    #[test]
    fn rubric_loads_from_json_without_anchors() {
        let json = r#"{"questions":[{"id":1,"category":"Team","text":"Who are you?"}]}"#;
        let r: RubricDefinition = serde_json::from_str(json).unwrap();
        assert!(r.anchors.is_empty());
        assert_eq!(r.max_total(), 3);
    }
}
