//! Regression detection between two scored runs of the same answer set.

use std::sync::Arc;

use hybridscore_core::engine::{BatchEngine, EngineConfig, NoopReporter};
use hybridscore_core::model::{AnswerCase, AnswerSet};
use hybridscore_core::report::EvalReport;
use hybridscore_core::{Evaluator, EvaluatorConfig};

fn case(id: &str, reference: &str, candidate: &str) -> AnswerCase {
    AnswerCase {
        id: id.into(),
        question: String::new(),
        reference: reference.into(),
        candidate: candidate.into(),
        tags: vec![],
    }
}

fn answer_set(answers: Vec<AnswerCase>) -> AnswerSet {
    AnswerSet {
        id: "regression".into(),
        name: "Regression".into(),
        description: String::new(),
        preset: None,
        answers,
    }
}

fn baseline_answers() -> Vec<AnswerCase> {
    vec![
        case("dice", "E(X) = 21/6 = 3.5", "Por lo tanto E(X) = 3.5"),
        case("ace", "La probabilidad es 1/52", "aproximadamente 0.0192"),
        case("coin", "P = 1/2 * 1/2 = 1/4", "P = 0,25"),
    ]
}

async fn score(answers: Vec<AnswerCase>) -> EvalReport {
    let evaluator = Evaluator::new(EvaluatorConfig::default()).unwrap();
    let engine = BatchEngine::new(Arc::new(evaluator), EngineConfig::default());
    engine.run(&answer_set(answers), &NoopReporter).await.unwrap()
}

#[tokio::test]
async fn identical_runs_have_no_changes() {
    let baseline = score(baseline_answers()).await;
    let current = score(baseline_answers()).await;

    let diff = current.compare(&baseline, 0.0);
    assert!(!diff.has_regressions());
    assert!(diff.improvements.is_empty());
    assert_eq!(diff.unchanged, 3);
    assert_eq!(diff.baseline_points, diff.current_points);
}

#[tokio::test]
async fn worse_candidate_is_a_regression() {
    let baseline = score(baseline_answers()).await;

    let mut answers = baseline_answers();
    answers[1].candidate = "ni idea".into();
    let current = score(answers).await;

    let diff = current.compare(&baseline, 0.05);
    assert!(diff.has_regressions());
    assert_eq!(diff.regressions.len(), 1);
    assert_eq!(diff.regressions[0].answer_id, "ace");
    assert!(diff.regressions[0].delta < -0.05);
    assert_eq!(diff.unchanged, 2);
    assert!(diff.current_points < diff.baseline_points);

    // The same comparison read the other way round is an improvement.
    let reverse = baseline.compare(&current, 0.05);
    assert!(!reverse.has_regressions());
    assert_eq!(reverse.improvements.len(), 1);
    assert_eq!(reverse.improvements[0].answer_id, "ace");
}

#[tokio::test]
async fn large_threshold_absorbs_changes() {
    let baseline = score(baseline_answers()).await;

    let mut answers = baseline_answers();
    answers[1].candidate = "ni idea".into();
    let current = score(answers).await;

    let diff = current.compare(&baseline, 1.0);
    assert!(!diff.has_regressions());
    assert_eq!(diff.unchanged, 3);
}

#[tokio::test]
async fn added_and_removed_answers_are_counted() {
    let baseline = score(baseline_answers()).await;

    let mut answers = baseline_answers();
    answers.remove(0);
    answers.push(case("median", "La mediana es 7", "la mediana es 7"));
    answers.push(case("mode", "La moda es 2", "2"));
    let current = score(answers).await;

    let diff = current.compare(&baseline, 0.05);
    assert_eq!(diff.new_answers, 2);
    assert_eq!(diff.removed_answers, 1);
    assert_eq!(diff.unchanged, 2);
}

#[tokio::test]
async fn markdown_lists_regressed_answers() {
    let baseline = score(baseline_answers()).await;

    let mut answers = baseline_answers();
    answers[2].candidate = "P = 0.75".into();
    let current = score(answers).await;

    let md = current.compare(&baseline, 0.05).to_markdown();
    assert!(md.contains("**Summary:** 1 regressions"));
    assert!(md.contains("### Regressions"));
    assert!(md.contains("| coin |"));
    assert!(!md.contains("### Improvements"));
}
