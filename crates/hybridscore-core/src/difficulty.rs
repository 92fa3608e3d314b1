//! Heuristic difficulty of a question, judged from its reference answer.

use std::fmt;

use serde::{Deserialize, Serialize};

const MATH_SYMBOLS: &[char] = &['²', '³', '√', 'π', '∑', '∫', '∞', '≠', '≤', '≥', '×', '÷'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Easy,
    Medium,
    Hard,
}

impl DifficultyLevel {
    pub fn label(self) -> &'static str {
        match self {
            DifficultyLevel::Easy => "Fácil",
            DifficultyLevel::Medium => "Media",
            DifficultyLevel::Hard => "Difícil",
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Difficulty points (0-100) and the resulting level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Difficulty {
    pub level: DifficultyLevel,
    pub points: f64,
}

/// Classify a question by its reference answer.
///
/// Up to 30 points for length (50 words saturate), 30 if any math symbol
/// appears, and 10 per word longer than ten characters up to 40.
pub fn classify(reference: &str) -> Difficulty {
    let words: Vec<&str> = reference.split_whitespace().collect();

    let length_points = (words.len() as f64 / 50.0).min(1.0) * 30.0;
    let math_points = if reference.contains(MATH_SYMBOLS) {
        30.0
    } else {
        0.0
    };
    let long_words = words.iter().filter(|w| w.chars().count() > 10).count();
    let vocabulary_points = (long_words as f64 * 10.0).min(40.0);

    let points = length_points + math_points + vocabulary_points;
    let level = if points >= 60.0 {
        DifficultyLevel::Hard
    } else if points >= 30.0 {
        DifficultyLevel::Medium
    } else {
        DifficultyLevel::Easy
    };

    Difficulty {
        level,
        points: points.round(),
    }
}
