//! Aggregate statistics over a batch of scored answers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::AnswerResult;
use crate::scoring::PerformanceLevel;

/// Aggregate statistics across all results of a run.
///
/// Means are taken over successfully evaluated answers only; failed
/// evaluations are counted in `failed` and left out of every mean.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateStats {
    /// Number of answers in the run.
    pub total: usize,
    /// Answers whose evaluation produced an error record.
    pub failed: usize,
    pub mean_semantic: f64,
    pub mean_numeric: f64,
    pub mean_concepts: f64,
    pub mean_reasoning: f64,
    pub mean_final: f64,
    /// Mean final score on the 0-100 scale, rounded to one decimal.
    pub global_points: f64,
    /// Performance level of `global_points`.
    pub level: PerformanceLevel,
    /// Mean difficulty points of the questions.
    pub mean_difficulty: f64,
    /// How many answers fell in each performance level.
    pub per_level: BTreeMap<PerformanceLevel, usize>,
    /// Per-tag statistics.
    pub per_tag: BTreeMap<String, TagStats>,
}

/// Statistics for answers sharing one tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagStats {
    pub count: usize,
    pub mean_final: f64,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Compute aggregate statistics from all results.
pub fn compute_aggregate_stats(results: &[AnswerResult]) -> AggregateStats {
    let ok: Vec<&AnswerResult> = results.iter().filter(|r| !r.is_error()).collect();

    let mean_final = mean(ok.iter().map(|r| r.scores.final_score));
    let global_points = (mean_final * 1000.0).round() / 10.0;

    let mut per_level = BTreeMap::new();
    for r in &ok {
        *per_level.entry(r.level).or_insert(0) += 1;
    }

    let mut tag_scores: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for r in &ok {
        for tag in &r.tags {
            tag_scores
                .entry(tag.clone())
                .or_default()
                .push(r.scores.final_score);
        }
    }
    let per_tag = tag_scores
        .into_iter()
        .map(|(tag, scores)| {
            let stats = TagStats {
                count: scores.len(),
                mean_final: mean(scores.into_iter()),
            };
            (tag, stats)
        })
        .collect();

    AggregateStats {
        total: results.len(),
        failed: results.len() - ok.len(),
        mean_semantic: mean(ok.iter().map(|r| r.scores.semantic_score)),
        mean_numeric: mean(ok.iter().map(|r| r.scores.numeric_score)),
        mean_concepts: mean(ok.iter().map(|r| r.scores.concept_score)),
        mean_reasoning: mean(ok.iter().map(|r| r.scores.reasoning_score)),
        mean_final,
        global_points,
        level: PerformanceLevel::from_points(global_points),
        mean_difficulty: mean(results.iter().map(|r| r.difficulty.points)),
        per_level,
        per_tag,
    }
}
