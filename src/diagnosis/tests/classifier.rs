use super::common::*;
use crate::diagnosis::classifier::{ClassifierError, DiagnosisClassifier};
use crate::diagnosis::domain::{AnswerOption, Axis, ScoreDelta, ScoreVector, SessionState};
use crate::diagnosis::rules::{resolve_category, ThresholdRule};

#[test]
fn scores_are_summed_across_answers_touching_the_same_axis() {
    let first = AnswerOption::new("a", delta(&[(Axis::Oiliness, 2)]));
    let second = AnswerOption::new("b", delta(&[(Axis::Oiliness, 3), (Axis::Dryness, 1)]));

    let state = SessionState::new().apply_answer(&first).apply_answer(&second);

    assert_eq!(
        state.scores,
        ScoreVector {
            oiliness: 5,
            dryness: 1,
            sensitivity: 0,
            normal: 0,
        }
    );
}

#[test]
fn combination_flag_is_last_write_wins() {
    let sets = AnswerOption::new("sets", ScoreDelta::new()).with_combination(true);
    let clears = AnswerOption::new("clears", ScoreDelta::new()).with_combination(false);
    let silent = AnswerOption::new("silent", ScoreDelta::new());

    let set_then_clear = SessionState::new().apply_answer(&sets).apply_answer(&clears);
    assert!(!set_then_clear.combination);

    let clear_then_set = SessionState::new().apply_answer(&clears).apply_answer(&sets);
    assert!(clear_then_set.combination);

    let untouched = clear_then_set.apply_answer(&silent);
    assert!(untouched.combination, "options without a flag leave it alone");
}

#[test]
fn apply_answer_returns_new_snapshot_without_mutating_input() {
    let option = AnswerOption::new("a", delta(&[(Axis::Sensitivity, 4)])).with_combination(true);
    let before = SessionState::new();

    let after = before.apply_answer(&option);

    assert_eq!(before, SessionState::new());
    assert_eq!(after.scores.sensitivity, 4);
    assert!(after.combination);
}

#[test]
fn ten_oily_answers_resolve_to_oily() {
    let classifier = scenario_classifier();

    let diagnosis = classifier.classify(&[0; 10]).expect("classifies");

    assert_eq!(
        diagnosis.scores,
        ScoreVector {
            oiliness: 10,
            ..ScoreVector::default()
        }
    );
    assert!(!diagnosis.combination);
    assert_eq!(diagnosis.category.as_str(), "OILY");
    assert_eq!(diagnosis.result.type_name, "oily");
}

#[test]
fn all_zero_answers_fall_through_to_fallback() {
    let classifier = scenario_classifier();

    let diagnosis = classifier.classify(&[2; 10]).expect("classifies");

    assert_eq!(diagnosis.scores, ScoreVector::default());
    assert!(!diagnosis.combination);
    assert_eq!(diagnosis.category.as_str(), "NORMAL");
}

#[test]
fn single_flag_answer_resolves_combination_regardless_of_scores() {
    let classifier = scenario_classifier();
    let mut answers = [0; 10];
    answers[..3].fill(2);
    answers[3] = 1;

    let diagnosis = classifier.classify(&answers).expect("classifies");

    assert_eq!(diagnosis.scores.oiliness, 6);
    assert!(diagnosis.combination);
    assert_eq!(diagnosis.category.as_str(), "COMBINATION");
}

#[test]
fn earlier_rule_wins_over_later_satisfiable_rule() {
    let classifier = DiagnosisClassifier::new(ten_question_definition(vec![
        ThresholdRule::axis("RULE_A", Axis::Oiliness, 1),
        ThresholdRule::axis("RULE_B", Axis::Oiliness, 5),
        ThresholdRule::fallback("NORMAL"),
    ]));

    let diagnosis = classifier.classify(&[0; 10]).expect("classifies");

    assert_eq!(diagnosis.category.as_str(), "RULE_A");
}

#[test]
fn classification_is_deterministic() {
    let classifier = DiagnosisClassifier::standard();
    let answers = [1, 0, 1, 1, 1, 1, 2, 1, 1, 3];

    let first = classifier.classify(&answers).expect("classifies");
    for _ in 0..20 {
        assert_eq!(classifier.classify(&answers).expect("classifies"), first);
    }
}

#[test]
fn standard_quiz_resolves_each_category() {
    let classifier = DiagnosisClassifier::standard();
    let cases: [([usize; 10], &str); 6] = [
        ([3, 3, 2, 0, 3, 2, 3, 0, 2, 2], "SENSITIVE"),
        ([1, 0, 0, 2, 0, 1, 0, 2, 0, 0], "OILY_DEHYDRATED"),
        ([2, 0, 0, 2, 0, 3, 1, 2, 2, 0], "OILY"),
        ([0, 2, 3, 2, 2, 0, 0, 2, 0, 1], "DRY"),
        ([3, 1, 3, 2, 3, 3, 3, 2, 2, 3], "COMBINATION"),
        ([3, 3, 3, 2, 3, 3, 3, 2, 2, 4], "NORMAL"),
    ];

    for (answers, expected) in cases {
        let diagnosis = classifier.classify(&answers).expect("classifies");
        assert_eq!(
            diagnosis.category.as_str(),
            expected,
            "answers {answers:?} scored {:?}",
            diagnosis.scores
        );
    }
}

#[test]
fn classify_rejects_wrong_answer_count() {
    let classifier = scenario_classifier();
    let err = classifier.classify(&[0; 9]).expect_err("short sheet");
    assert!(matches!(
        err,
        ClassifierError::AnswerCountMismatch {
            expected: 10,
            actual: 9
        }
    ));
    assert!(err.is_invalid_answer());
}

#[test]
fn classify_rejects_out_of_range_options() {
    let classifier = scenario_classifier();
    let mut answers = [0; 10];
    answers[4] = 3;

    let err = classifier.classify(&answers).expect_err("option 3 missing");

    assert!(matches!(
        err,
        ClassifierError::OptionOutOfRange {
            question: 4,
            option: 3,
            available: 3
        }
    ));
}

#[test]
fn fallback_is_returned_instead_of_an_error() {
    let rules = scenario_rules();
    let key = resolve_category(&SessionState::new(), &rules).expect("fallback matches");
    assert_eq!(key.as_str(), "NORMAL");
}
