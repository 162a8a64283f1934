//! Property-based tests for aggregation and extraction using proptest

use std::sync::OnceLock;

use proptest::prelude::*;

use choice_eval::analysis::HierarchyState;
use choice_eval::extraction::{patterns, AnswerExtractor, ExtractionResult};
use choice_eval::records::{Difficulty, EvaluationRecord, Mode, Taxonomy};
use choice_eval::scoring::{Outcome, SampleScorer};

// =========================================================================
// Strategies
// =========================================================================

fn arb_taxonomy() -> impl Strategy<Value = Taxonomy> {
    (
        prop::sample::select(vec!["Science", "Engineering"]),
        prop::sample::select(vec!["Physics", "Chemistry", "Civil"]),
        prop::sample::select(vec!["Theory", "Applied", "unknown"]),
    )
        .prop_map(|(d, f, s)| Taxonomy::new(d, f, s))
}

fn arb_outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        Just(Outcome::Correct),
        Just(Outcome::Incorrect),
        Just(Outcome::Miss),
        Just(Outcome::Error),
    ]
}

fn arb_difficulty() -> impl Strategy<Value = Difficulty> {
    prop_oneof![
        Just(Difficulty::Easy),
        Just(Difficulty::Middle),
        Just(Difficulty::Hard),
        Just(Difficulty::Unknown),
    ]
}

fn arb_samples() -> impl Strategy<Value = Vec<(Taxonomy, Outcome, Difficulty)>> {
    prop::collection::vec((arb_taxonomy(), arb_outcome(), arb_difficulty()), 0..40)
}

fn fold_all(samples: &[(Taxonomy, Outcome, Difficulty)]) -> HierarchyState {
    let mut state = HierarchyState::new();
    for (taxonomy, outcome, difficulty) in samples {
        state.fold(taxonomy, *outcome, *difficulty);
    }
    state
}

/// Responses built from answer-like fragments so that matches are common
fn arb_response() -> impl Strategy<Value = String> {
    let fragment = prop_oneof![
        Just("The answer is ".to_string()),
        Just("Answer: ".to_string()),
        Just("\\boxed{".to_string()),
        Just("}$".to_string()),
        Just("\n".to_string()),
        Just("Question:".to_string()),
        "[A-J]".prop_map(|s| s),
        "[a-z ]{0,8}".prop_map(|s| s),
        "[().*:]".prop_map(|s| s),
    ];
    prop::collection::vec(fragment, 0..10).prop_map(|parts| parts.concat())
}

fn extractor() -> &'static AnswerExtractor {
    static EXTRACTOR: OnceLock<AnswerExtractor> = OnceLock::new();
    EXTRACTOR.get_or_init(AnswerExtractor::new)
}

// =========================================================================
// Properties
// =========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn merge_is_commutative(a in arb_samples(), b in arb_samples()) {
        let left = fold_all(&a);
        let right = fold_all(&b);

        let mut ab = left.clone();
        ab.merge(&right);
        let mut ba = right.clone();
        ba.merge(&left);

        prop_assert_eq!(&ab, &ba);

        let mut concatenated = a.clone();
        concatenated.extend(b.iter().cloned());
        prop_assert_eq!(&ab, &fold_all(&concatenated));
    }

    #[test]
    fn absorb_order_does_not_matter(a in arb_samples(), b in arb_samples()) {
        let left = fold_all(&a);
        let right = fold_all(&b);

        let mut forward = HierarchyState::new();
        forward.absorb_run("m1", Mode::ZeroShot, &left);
        forward.absorb_run("m2", Mode::FiveShot, &right);

        let mut backward = HierarchyState::new();
        backward.absorb_run("m2", Mode::FiveShot, &right);
        backward.absorb_run("m1", Mode::ZeroShot, &left);

        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn parents_equal_sum_of_children(samples in arb_samples()) {
        let state = fold_all(&samples);

        for (discipline, stats) in &state.disciplines {
            let field_total: u64 = state.fields_of(discipline).map(|(_, f)| f.counts.total).sum();
            prop_assert_eq!(stats.counts.total, field_total);

            for (_, field) in state.fields_of(discipline) {
                let subfield_total: u64 = state
                    .subfields_of(discipline, field.name())
                    .map(|(_, s)| s.counts.total)
                    .sum();
                let subfield_correct: u64 = state
                    .subfields_of(discipline, field.name())
                    .map(|(_, s)| s.counts.correct)
                    .sum();
                prop_assert_eq!(field.counts.total, subfield_total);
                prop_assert_eq!(field.counts.correct, subfield_correct);
            }
        }

        for stats in state.subfields.values() {
            let counts = &stats.counts;
            prop_assert_eq!(counts.difficulty.total(), counts.total);
            prop_assert!(counts.correct + counts.error + counts.miss <= counts.total);
        }

        prop_assert_eq!(state.totals().total, samples.len() as u64);
    }

    #[test]
    fn extraction_stays_within_alphabet(response in arb_response(), option_count in 0usize..14) {
        let options: Vec<String> = (0..option_count).map(|i| format!("option {}", i)).collect();
        let refs: Vec<&str> = options.iter().map(String::as_str).collect();
        let bound = option_count.min(patterns::MAX_OPTIONS);

        match extractor().extract_text(&response, &refs) {
            ExtractionResult::Letter(letter) => {
                prop_assert!(letter.is_ascii_uppercase());
                prop_assert!(((letter as u8 - b'A') as usize) < bound, "{} outside {} options", letter, option_count);
            }
            ExtractionResult::NoMatch => {}
            ExtractionResult::Malformed => prop_assert!(false, "validated input reported as malformed"),
        }
    }

    #[test]
    fn scoring_is_deterministic(response in arb_response(), gold in "[A-D]") {
        let scorer = SampleScorer::default();
        let options = vec!["w".to_string(), "x".to_string(), "y".to_string(), "z".to_string()];
        let record = EvaluationRecord::new(response, options, gold);

        for mode in Mode::all() {
            let first = scorer.score(&record, mode);
            let second = scorer.score(&record, mode);
            prop_assert_eq!(first.outcome, second.outcome);
            prop_assert_eq!(first.extracted, second.extracted);
            prop_assert_ne!(first.outcome, Outcome::Error);
        }
    }
}
