//! Evaluation reports with JSON persistence and regression detection.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::AnswerResult;
use crate::scoring::{ScoreWeights, WeightPreset};
use crate::statistics::AggregateStats;

/// A complete evaluation report for one answer set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the answer set.
    pub answer_set: AnswerSetSummary,
    /// Preset the weights came from, if any.
    #[serde(default)]
    pub preset: Option<WeightPreset>,
    /// Weights the final scores were combined with.
    pub weights: ScoreWeights,
    /// Embedding backend used for the semantic and keyword signals.
    pub embedder: String,
    /// Individual answer results, in answer-set order.
    pub results: Vec<AnswerResult>,
    /// Aggregate statistics.
    pub aggregate: AggregateStats,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Summary of an answer set (without the answers themselves).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSetSummary {
    pub id: String,
    pub name: String,
    pub answer_count: usize,
}

impl EvalReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: EvalReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare this report against a baseline by final score per answer.
    /// Deltas within `threshold` count as unchanged.
    pub fn compare(&self, baseline: &EvalReport, threshold: f64) -> RegressionReport {
        let score_map = |report: &EvalReport| -> HashMap<String, f64> {
            report
                .results
                .iter()
                .map(|r| (r.answer_id.clone(), r.scores.final_score))
                .collect()
        };

        let baseline_scores = score_map(baseline);
        let current_scores = score_map(self);

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_answers = 0usize;

        for result in &self.results {
            let id = &result.answer_id;
            let current = result.scores.final_score;
            let Some(&baseline_val) = baseline_scores.get(id) else {
                new_answers += 1;
                continue;
            };
            let change = ScoreChange {
                answer_id: id.clone(),
                baseline_score: baseline_val,
                current_score: current,
                delta: current - baseline_val,
            };
            if change.delta < -threshold {
                regressions.push(change);
            } else if change.delta > threshold {
                improvements.push(change);
            } else {
                unchanged += 1;
            }
        }

        let removed_answers = baseline_scores
            .keys()
            .filter(|k| !current_scores.contains_key(*k))
            .count();

        RegressionReport {
            regressions,
            improvements,
            unchanged,
            new_answers,
            removed_answers,
            baseline_points: baseline.aggregate.global_points,
            current_points: self.aggregate.global_points,
        }
    }
}

/// Result of comparing two reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionReport {
    /// Answers whose final score went down.
    pub regressions: Vec<ScoreChange>,
    /// Answers whose final score went up.
    pub improvements: Vec<ScoreChange>,
    /// Answers with no significant change.
    pub unchanged: usize,
    /// Answers in current but not baseline.
    pub new_answers: usize,
    /// Answers in baseline but not current.
    pub removed_answers: usize,
    pub baseline_points: f64,
    pub current_points: f64,
}

/// A significant change in one answer's final score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreChange {
    pub answer_id: String,
    pub baseline_score: f64,
    pub current_score: f64,
    pub delta: f64,
}

impl RegressionReport {
    /// Format the regression report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} regressions, {} improvements, {} unchanged \
             (global score {:.1} -> {:.1})\n\n",
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged,
            self.baseline_points,
            self.current_points
        ));

        let sections = [
            ("Regressions", &self.regressions),
            ("Improvements", &self.improvements),
        ];
        for (title, changes) in sections {
            if changes.is_empty() {
                continue;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Answer | Baseline | Current | Delta |\n");
            md.push_str("|--------|----------|---------|-------|\n");
            for c in changes {
                md.push_str(&format!(
                    "| {} | {:.1} | {:.1} | {:+.1} |\n",
                    c.answer_id,
                    c.baseline_score * 100.0,
                    c.current_score * 100.0,
                    c.delta * 100.0
                ));
            }
            md.push('\n');
        }

        md
    }

    /// Returns true if there are any regressions.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerCase, ScoreRecord};
    use crate::statistics::compute_aggregate_stats;

    fn make_result(id: &str, final_score: f64) -> AnswerResult {
        let case = AnswerCase {
            id: id.into(),
            question: String::new(),
            reference: "3.5".into(),
            candidate: "3.5".into(),
            tags: vec![],
        };
        let scores = ScoreRecord {
            semantic_score: final_score,
            numeric_score: final_score,
            concept_score: final_score,
            reasoning_score: final_score,
            final_score,
            error: None,
        };
        AnswerResult::new(&case, scores, &ScoreWeights::default(), 0)
    }

    fn make_report(results: Vec<AnswerResult>) -> EvalReport {
        EvalReport {
            id: Uuid::nil(),
            created_at: Utc::now(),
            answer_set: AnswerSetSummary {
                id: "test".into(),
                name: "Test".into(),
                answer_count: results.len(),
            },
            preset: Some(WeightPreset::Quantitative),
            weights: ScoreWeights::default(),
            embedder: "hashing".into(),
            aggregate: compute_aggregate_stats(&results),
            results,
            duration_ms: 0,
        }
    }

    #[test]
    fn compare_identical_reports() {
        let baseline = make_report(vec![make_result("a1", 0.8)]);
        let current = make_report(vec![make_result("a1", 0.8)]);

        let report = current.compare(&baseline, 0.05);
        assert!(report.regressions.is_empty());
        assert!(report.improvements.is_empty());
        assert_eq!(report.unchanged, 1);
    }

    #[test]
    fn compare_with_regression_and_improvement() {
        let baseline = make_report(vec![make_result("a1", 0.9), make_result("a2", 0.3)]);
        let current = make_report(vec![make_result("a1", 0.4), make_result("a2", 0.6)]);

        let report = current.compare(&baseline, 0.05);
        assert!(report.has_regressions());
        assert_eq!(report.regressions[0].answer_id, "a1");
        assert!((report.regressions[0].delta + 0.5).abs() < 1e-9);
        assert_eq!(report.improvements[0].answer_id, "a2");
    }

    #[test]
    fn small_deltas_are_unchanged() {
        let baseline = make_report(vec![make_result("a1", 0.80)]);
        let current = make_report(vec![make_result("a1", 0.78)]);
        let report = current.compare(&baseline, 0.05);
        assert!(!report.has_regressions());
        assert_eq!(report.unchanged, 1);
    }

    #[test]
    fn compare_with_new_and_removed() {
        let baseline = make_report(vec![make_result("old", 0.5)]);
        let current = make_report(vec![make_result("new", 0.5)]);

        let report = current.compare(&baseline, 0.05);
        assert_eq!(report.new_answers, 1);
        assert_eq!(report.removed_answers, 1);
    }

    #[test]
    fn json_roundtrip() {
        let report = make_report(vec![make_result("a1", 0.75)]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("report.json");

        report.save_json(&path).unwrap();
        let loaded = EvalReport::load_json(&path).unwrap();

        assert_eq!(loaded.answer_set.id, "test");
        assert_eq!(loaded.results.len(), 1);
        assert_eq!(loaded.results[0].scores.final_score, 0.75);
        assert_eq!(loaded.preset, Some(WeightPreset::Quantitative));
    }

    #[test]
    fn markdown_output() {
        let baseline = make_report(vec![make_result("a1", 0.9)]);
        let current = make_report(vec![make_result("a1", 0.2)]);

        let md = current.compare(&baseline, 0.05).to_markdown();
        assert!(md.contains("### Regressions"));
        assert!(md.contains("| a1 | 90.0 | 20.0 | -70.0 |"));
        assert!(!md.contains("### Improvements"));
    }
}
