//! Weighted aggregation of the four sub-scores and performance levels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::ScoreRecord;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Convex combination weights of the hybrid score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub semantic: f64,
    pub numeric: f64,
    pub concepts: f64,
    pub reasoning: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        WeightPreset::default().weights()
    }
}

impl ScoreWeights {
    /// Weights must be finite, non-negative and sum to 1.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in self.named() {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }
        let sum = self.semantic + self.numeric + self.concepts + self.reasoning;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightSum(sum));
        }
        Ok(())
    }

    fn named(&self) -> [(&'static str, f64); 4] {
        [
            ("semantic", self.semantic),
            ("numeric", self.numeric),
            ("concepts", self.concepts),
            ("reasoning", self.reasoning),
        ]
    }

    /// Combine four sub-scores into the final score, clamped to [0, 1].
    pub fn combine(&self, semantic: f64, numeric: f64, concepts: f64, reasoning: f64) -> f64 {
        let score = self.semantic * semantic
            + self.numeric * numeric
            + self.concepts * concepts
            + self.reasoning * reasoning;
        if score.is_nan() {
            return 0.0;
        }
        score.clamp(0.0, 1.0)
    }

    /// Weighted contribution of each signal on a 0-100 scale, rounded to 0.1.
    pub fn contributions(&self, record: &ScoreRecord) -> Contributions {
        let pct = |w: f64, s: f64| (w * s * 1000.0).round() / 10.0;
        Contributions {
            semantic: pct(self.semantic, record.semantic_score),
            numeric: pct(self.numeric, record.numeric_score),
            concepts: pct(self.concepts, record.concept_score),
            reasoning: pct(self.reasoning, record.reasoning_score),
        }
    }
}

/// Hybrid score of four sub-scores under the given weights.
pub fn final_hybrid_score(
    weights: &ScoreWeights,
    semantic: f64,
    numeric: f64,
    concepts: f64,
    reasoning: f64,
) -> f64 {
    weights.combine(semantic, numeric, concepts, reasoning)
}

/// Per-signal breakdown of a final score, in points out of 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contributions {
    pub semantic: f64,
    pub numeric: f64,
    pub concepts: f64,
    pub reasoning: f64,
}

/// Named weighting schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightPreset {
    /// Numeric- and reasoning-dominant, for quantitative interview questions.
    #[default]
    Quantitative,
    /// Semantic-dominant, for general knowledge questions.
    General,
}

impl WeightPreset {
    pub fn weights(self) -> ScoreWeights {
        match self {
            WeightPreset::Quantitative => ScoreWeights {
                semantic: 0.15,
                numeric: 0.60,
                concepts: 0.10,
                reasoning: 0.15,
            },
            WeightPreset::General => ScoreWeights {
                semantic: 0.40,
                numeric: 0.25,
                concepts: 0.20,
                reasoning: 0.15,
            },
        }
    }
}

impl fmt::Display for WeightPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightPreset::Quantitative => write!(f, "quantitative"),
            WeightPreset::General => write!(f, "general"),
        }
    }
}

impl FromStr for WeightPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quantitative" | "quant" | "numeric" => Ok(WeightPreset::Quantitative),
            "general" | "qa" | "semantic" => Ok(WeightPreset::General),
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }
}

/// Performance level of a score on the 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceLevel {
    NeedsImprovement,
    Acceptable,
    Good,
    Excellent,
}

impl PerformanceLevel {
    /// Classify a score in points (0-100).
    pub fn from_points(points: f64) -> Self {
        if points >= 85.0 {
            PerformanceLevel::Excellent
        } else if points >= 70.0 {
            PerformanceLevel::Good
        } else if points >= 50.0 {
            PerformanceLevel::Acceptable
        } else {
            PerformanceLevel::NeedsImprovement
        }
    }

    /// Classify a score in [0, 1].
    pub fn from_unit(score: f64) -> Self {
        Self::from_points((score * 1000.0).round() / 10.0)
    }

    /// Label shown to candidates.
    pub fn label(self) -> &'static str {
        match self {
            PerformanceLevel::Excellent => "Excelente",
            PerformanceLevel::Good => "Bueno",
            PerformanceLevel::Acceptable => "Aceptable",
            PerformanceLevel::NeedsImprovement => "Necesita Mejora",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            PerformanceLevel::Excellent => {
                "Dominio excepcional del tema. Respuestas precisas y completas."
            }
            PerformanceLevel::Good => "Buen entendimiento general con algunas áreas de mejora.",
            PerformanceLevel::Acceptable => {
                "Conocimientos básicos demostrados. Recomendable profundizar."
            }
            PerformanceLevel::NeedsImprovement => {
                "Se recomienda revisar los conceptos fundamentales."
            }
        }
    }
}

impl fmt::Display for PerformanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        WeightPreset::Quantitative.weights().validate().unwrap();
        WeightPreset::General.weights().validate().unwrap();
        assert_eq!(ScoreWeights::default(), WeightPreset::Quantitative.weights());
    }

    #[test]
    fn negative_weight_rejected() {
        let w = ScoreWeights {
            semantic: -0.1,
            numeric: 0.7,
            concepts: 0.2,
            reasoning: 0.2,
        };
        assert!(matches!(
            w.validate(),
            Err(ConfigError::InvalidWeight { name: "semantic", .. })
        ));
    }

    #[test]
    fn combine_is_convex() {
        let w = WeightPreset::Quantitative.weights();
        assert!((w.combine(1.0, 1.0, 1.0, 1.0) - 1.0).abs() < 1e-9);
        assert_eq!(w.combine(0.0, 0.0, 0.0, 0.0), 0.0);
        let mixed = w.combine(0.5, 1.0, 0.0, 0.25);
        assert!((mixed - (0.075 + 0.6 + 0.0 + 0.0375)).abs() < 1e-9);
    }

    #[test]
    fn combine_is_monotone_in_every_input() {
        let w = WeightPreset::General.weights();
        let base = [0.3, 0.4, 0.5, 0.6];
        let score = |s: [f64; 4]| w.combine(s[0], s[1], s[2], s[3]);
        for i in 0..4 {
            let mut bumped = base;
            bumped[i] += 0.2;
            assert!(score(bumped) >= score(base), "input {i} decreased the score");
        }
    }

    #[test]
    fn combine_clamps_out_of_range_inputs() {
        let w = ScoreWeights::default();
        assert_eq!(w.combine(5.0, 5.0, 5.0, 5.0), 1.0);
        assert_eq!(w.combine(-1.0, -1.0, -1.0, -1.0), 0.0);
        assert_eq!(w.combine(f64::NAN, 0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn preset_parse_and_display() {
        assert_eq!("general".parse::<WeightPreset>().unwrap(), WeightPreset::General);
        assert_eq!(" Quant ".parse::<WeightPreset>().unwrap(), WeightPreset::Quantitative);
        assert!("fancy".parse::<WeightPreset>().is_err());
        assert_eq!(WeightPreset::General.to_string(), "general");
    }

    #[test]
    fn performance_levels() {
        assert_eq!(PerformanceLevel::from_points(92.0), PerformanceLevel::Excellent);
        assert_eq!(PerformanceLevel::from_points(85.0), PerformanceLevel::Excellent);
        assert_eq!(PerformanceLevel::from_points(70.0), PerformanceLevel::Good);
        assert_eq!(PerformanceLevel::from_points(50.0), PerformanceLevel::Acceptable);
        assert_eq!(PerformanceLevel::from_points(49.9), PerformanceLevel::NeedsImprovement);
        assert_eq!(PerformanceLevel::from_unit(0.849), PerformanceLevel::Good);
        assert_eq!(PerformanceLevel::Excellent.to_string(), "Excelente");
    }

    #[test]
    fn contributions_scale_to_points() {
        let record = ScoreRecord {
            semantic_score: 1.0,
            numeric_score: 0.5,
            concept_score: 0.0,
            reasoning_score: 1.0,
            final_score: 0.6,
            error: None,
        };
        let c = WeightPreset::Quantitative.weights().contributions(&record);
        assert_eq!(c.semantic, 15.0);
        assert_eq!(c.numeric, 30.0);
        assert_eq!(c.concepts, 0.0);
        assert_eq!(c.reasoning, 15.0);
    }
}
