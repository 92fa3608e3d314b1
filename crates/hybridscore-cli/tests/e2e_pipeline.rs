//! End-to-end pipeline: load the bundled answer sets, score them, persist
//! the reports and read them back.

use std::path::Path;
use std::sync::Arc;

use hybridscore_core::engine::{BatchEngine, EngineConfig, NoopReporter};
use hybridscore_core::model::AnswerResult;
use hybridscore_core::parser;
use hybridscore_core::report::EvalReport;
use hybridscore_core::{Evaluator, EvaluatorConfig, WeightPreset};

fn engine() -> BatchEngine {
    let evaluator = Evaluator::new(EvaluatorConfig::default()).unwrap();
    BatchEngine::new(Arc::new(evaluator), EngineConfig::default())
}

fn result<'a>(report: &'a EvalReport, id: &str) -> &'a AnswerResult {
    report
        .results
        .iter()
        .find(|r| r.answer_id == id)
        .unwrap_or_else(|| panic!("no result for {id}"))
}

#[tokio::test]
async fn bundled_answer_sets_are_valid() {
    let sets = parser::load_answer_sets(Path::new("../../answer-sets")).unwrap();
    assert_eq!(sets.len(), 2);
    for set in &sets {
        let warnings = parser::validate_answer_set(set);
        assert!(warnings.is_empty(), "{}: {warnings:?}", set.id);
    }
}

#[tokio::test]
async fn probability_set_scores_as_expected() {
    let set = parser::parse_answer_set(Path::new("../../answer-sets/probability.toml")).unwrap();
    let report = engine().run(&set, &NoopReporter).await.unwrap();

    assert_eq!(report.preset, Some(WeightPreset::Quantitative));
    assert_eq!(report.results.len(), 5);
    assert_eq!(report.aggregate.total, 5);
    assert_eq!(report.aggregate.failed, 0);
    for r in &report.results {
        assert!(r.scores.in_unit_range(), "{}: {:?}", r.answer_id, r.scores);
    }

    let dice = result(&report, "dice-expectation");
    assert_eq!(dice.scores.numeric_score, 1.0);
    assert!(dice.scores.reasoning_score >= 0.75);

    // 0.25 with a decimal comma against 1/2 * 1/2
    let coin = result(&report, "coin-two-heads");
    assert_eq!(coin.scores.numeric_score, 1.0);

    let ace = result(&report, "ace-of-spades");
    assert!(ace.scores.numeric_score >= 0.5);

    let clueless = result(&report, "bernoulli-variance");
    assert_eq!(clueless.scores.numeric_score, 0.0);
    assert_eq!(clueless.scores.reasoning_score, 0.0);
    assert!(clueless.scores.final_score <= 0.2);
    assert!(clueless.scores.final_score < dice.scores.final_score);

    let cards = &report.aggregate.per_tag["cartas"];
    assert_eq!(cards.count, 2);
}

#[tokio::test]
async fn statistics_set_uses_general_preset() {
    let set = parser::parse_answer_set(Path::new("../../answer-sets/statistics.toml")).unwrap();
    let report = engine().run(&set, &NoopReporter).await.unwrap();

    assert_eq!(report.preset, Some(WeightPreset::General));
    assert_eq!(report.weights, WeightPreset::General.weights());
    assert_eq!(report.aggregate.failed, 0);
}

#[tokio::test]
async fn report_survives_save_and_load() {
    let dir = tempfile::TempDir::new().unwrap();
    let set = parser::parse_answer_set(Path::new("../../answer-sets/probability.toml")).unwrap();
    let report = engine().run(&set, &NoopReporter).await.unwrap();

    let path = dir.path().join("nested/report.json");
    report.save_json(&path).unwrap();
    let loaded = EvalReport::load_json(&path).unwrap();

    assert_eq!(loaded.id, report.id);
    assert_eq!(loaded.answer_set.id, "probability-basics");
    assert_eq!(loaded.results.len(), report.results.len());
    assert_eq!(loaded.aggregate.global_points, report.aggregate.global_points);

    // Saved scores are rounded to three decimals.
    let diff = loaded.compare(&report, 1e-3);
    assert!(!diff.has_regressions());
    assert_eq!(diff.unchanged, 5);
}
