//! Core data model types for hybridscore.
//!
//! An [`AnswerPair`] goes in, a [`ScoreRecord`] comes out. Answer sets group
//! pairs for batch runs.

use serde::{Deserialize, Serialize, Serializer};

use crate::difficulty::{self, Difficulty};
use crate::scoring::{Contributions, PerformanceLevel, ScoreWeights, WeightPreset};

/// Input to one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerPair {
    /// The known-correct answer.
    pub reference: String,
    /// The answer being evaluated.
    pub candidate: String,
}

impl AnswerPair {
    pub fn new(reference: impl Into<String>, candidate: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            candidate: candidate.into(),
        }
    }
}

/// Result of one evaluation. Every score lies in [0, 1].
///
/// Serialises each score rounded to three decimals. A record with all zeros
/// and `error` set means the evaluation could not be completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    #[serde(serialize_with = "round3")]
    pub semantic_score: f64,
    #[serde(serialize_with = "round3")]
    pub numeric_score: f64,
    #[serde(serialize_with = "round3")]
    pub concept_score: f64,
    #[serde(serialize_with = "round3")]
    pub reasoning_score: f64,
    #[serde(serialize_with = "round3")]
    pub final_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScoreRecord {
    /// The all-zero record returned when evaluation fails.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            semantic_score: 0.0,
            numeric_score: 0.0,
            concept_score: 0.0,
            reasoning_score: 0.0,
            final_score: 0.0,
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Final score on the 0-100 scale, rounded to one decimal.
    pub fn points(&self) -> f64 {
        (self.final_score * 1000.0).round() / 10.0
    }

    pub fn level(&self) -> PerformanceLevel {
        PerformanceLevel::from_points(self.points())
    }

    /// Whether every field lies in [0, 1].
    pub fn in_unit_range(&self) -> bool {
        [
            self.semantic_score,
            self.numeric_score,
            self.concept_score,
            self.reasoning_score,
            self.final_score,
        ]
        .iter()
        .all(|s| (0.0..=1.0).contains(s))
    }
}

fn round3<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((value * 1000.0).round() / 1000.0)
}

/// One interview answer to be scored in a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerCase {
    /// Unique identifier within the set.
    pub id: String,
    /// The question asked (informational).
    #[serde(default)]
    pub question: String,
    pub reference: String,
    pub candidate: String,
    /// Tags for filtering and per-tag statistics.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl AnswerCase {
    pub fn pair(&self) -> AnswerPair {
        AnswerPair::new(self.reference.clone(), self.candidate.clone())
    }
}

/// A collection of answers evaluated together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSet {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Weight preset requested by the set, if any.
    #[serde(default)]
    pub preset: Option<WeightPreset>,
    #[serde(default)]
    pub answers: Vec<AnswerCase>,
}

/// Outcome of one answer in a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer_id: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub scores: ScoreRecord,
    pub level: PerformanceLevel,
    pub contributions: Contributions,
    pub difficulty: Difficulty,
    pub duration_ms: u64,
}

impl AnswerResult {
    pub fn new(
        case: &AnswerCase,
        scores: ScoreRecord,
        weights: &ScoreWeights,
        duration_ms: u64,
    ) -> Self {
        Self {
            answer_id: case.id.clone(),
            question: case.question.clone(),
            tags: case.tags.clone(),
            level: scores.level(),
            contributions: weights.contributions(&scores),
            difficulty: difficulty::classify(&case.reference),
            scores,
            duration_ms,
        }
    }

    pub fn is_error(&self) -> bool {
        self.scores.is_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_record_is_all_zero() {
        let record = ScoreRecord::failed("boom");
        assert!(record.is_error());
        assert!(record.in_unit_range());
        assert_eq!(record.final_score, 0.0);
        assert_eq!(record.level(), PerformanceLevel::NeedsImprovement);
    }

    #[test]
    fn serialises_with_three_decimals() {
        let record = ScoreRecord {
            semantic_score: 0.123456,
            numeric_score: 1.0,
            concept_score: 0.0,
            reasoning_score: 0.75,
            final_score: 0.6666666,
            error: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["semantic_score"], 0.123);
        assert_eq!(json["final_score"], 0.667);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn error_field_serialised_when_present() {
        let json = serde_json::to_string(&ScoreRecord::failed("model offline")).unwrap();
        assert!(json.contains("\"error\":\"model offline\""));
        let back: ScoreRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.error.as_deref(), Some("model offline"));
    }

    #[test]
    fn points_and_level() {
        let record = ScoreRecord {
            semantic_score: 0.9,
            numeric_score: 0.9,
            concept_score: 0.9,
            reasoning_score: 0.9,
            final_score: 0.7234,
            error: None,
        };
        assert_eq!(record.points(), 72.3);
        assert_eq!(record.level(), PerformanceLevel::Good);
    }

    #[test]
    fn answer_result_derives_level_and_difficulty() {
        let case = AnswerCase {
            id: "a1".into(),
            question: "¿Media de un dado?".into(),
            reference: "3.5".into(),
            candidate: "3.5".into(),
            tags: vec!["dados".into()],
        };
        let scores = ScoreRecord {
            semantic_score: 1.0,
            numeric_score: 1.0,
            concept_score: 0.0,
            reasoning_score: 0.0,
            final_score: 0.75,
            error: None,
        };
        let result = AnswerResult::new(&case, scores, &ScoreWeights::default(), 3);
        assert_eq!(result.level, PerformanceLevel::Good);
        assert_eq!(result.contributions.numeric, 60.0);
        assert_eq!(result.difficulty.level, crate::difficulty::DifficultyLevel::Easy);
        assert_eq!(result.tags, vec!["dados"]);
        assert!(!result.is_error());
    }
}
