use eureka_scorer::pipeline::normalize::{normalize_json, strip_code_fences};
use eureka_scorer::RubricDefinition;
use proptest::prelude::*;
use serde_json::json;

fn reply(scores: &[i64], total: i64) -> String {
    let reviews: Vec<_> = scores
        .iter()
        .enumerate()
        .map(|(i, s)| {
            json!({
                "question": format!("{}. q", i + 1),
                "score": s,
                "reasoning": "r"
            })
        })
        .collect();
    json!({ "reviews": reviews, "total_score": total, "hard_truth": "h" }).to_string()
}

proptest! {
    #[test]
    fn fenced_and_bare_replies_normalize_identically(
        scores in prop::collection::vec(1i64..=3, 1..12),
        lang in "(json|JSON|)",
        pad in "[ \t\n]{0,3}",
    ) {
        let rubric = RubricDefinition::eureka();
        let bare = reply(&scores, 0);
        let fenced = format!("{pad}```{lang}\n{bare}\n```{pad}");

        let a = normalize_json(&bare, &rubric).unwrap();
        let b = normalize_json(&fenced, &rubric).unwrap();
        prop_assert_eq!(&a, &b);

        let c = normalize_json(strip_code_fences(&fenced), &rubric).unwrap();
        prop_assert_eq!(&b, &c);
    }

    #[test]
    fn total_is_always_the_sum_of_kept_scores(
        scores in prop::collection::vec(-5i64..10, 1..20),
        claimed in -100i64..100,
    ) {
        let rubric = RubricDefinition::eureka();
        let report = normalize_json(&reply(&scores, claimed), &rubric).unwrap();

        let sum: u32 = report.reviews.iter().map(|r| r.score as u32).sum();
        prop_assert_eq!(report.total_score, sum);
        prop_assert!(report.total_score <= rubric.max_total());
    }

    #[test]
    fn only_in_range_scores_survive(scores in prop::collection::vec(-5i64..10, 1..20)) {
        let rubric = RubricDefinition::eureka();
        let report = normalize_json(&reply(&scores, 0), &rubric).unwrap();

        let expected = scores
            .iter()
            .take(rubric.questions.len())
            .filter(|s| (1..=3).contains(*s))
            .count();
        prop_assert_eq!(report.reviews.len(), expected);
        prop_assert!(report.reviews.iter().all(|r| (1..=3).contains(&r.score)));
    }

    #[test]
    fn arbitrary_text_never_panics(raw in ".{0,200}") {
        let rubric = RubricDefinition::eureka();
        let _ = normalize_json(&raw, &rubric);
    }
}
