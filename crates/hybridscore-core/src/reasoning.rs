//! Surface-structure reasoning score of a candidate answer.
//!
//! Four signals, 0.25 each: a logical connector, mathematical notation,
//! stepwise structure and a definition framing. Only the candidate text is
//! inspected.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::text;

const CONNECTORS: &[&str] = &[
    "por lo tanto",
    "entonces",
    "asi que",
    "porque",
    "debido a",
    "consecuentemente",
    "por consiguiente",
    "dado que",
    "ya que",
    "de modo que",
    "implica",
];

const NOTATION_WORDS: &[&str] = &[
    "recurrencia",
    "esperanza",
    "varianza",
    "probabilidad condicional",
];

const NOTATION_SYMBOLS: &[&str] = &[
    "e(", "p(", "var(", "∑", "∫", "√", "^", "1/", "≈", "≤", "≥",
];

const STEP_WORDS: &[&str] = &[
    "primero",
    "segundo",
    "luego",
    "despues",
    "finalmente",
    "paso",
];

const DEFINITION_WORDS: &[&str] = &[
    "sea",
    "sean",
    "definimos",
    "consideremos",
    "supongamos",
    "denotemos",
];

fn word_regex(words: &[&str]) -> Regex {
    let alternation = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{alternation})\b")).expect("marker words form a valid regex")
}

static CONNECTOR_RE: LazyLock<Regex> = LazyLock::new(|| word_regex(CONNECTORS));
static NOTATION_RE: LazyLock<Regex> = LazyLock::new(|| word_regex(NOTATION_WORDS));
static STEP_RE: LazyLock<Regex> = LazyLock::new(|| word_regex(STEP_WORDS));
static DEFINITION_RE: LazyLock<Regex> = LazyLock::new(|| word_regex(DEFINITION_WORDS));
static NUMBERED_STEP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\d+[.)]\s").expect("valid numbered-step regex"));

/// Which structural markers a text carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningSignals {
    pub connector: bool,
    pub notation: bool,
    pub steps: bool,
    pub definition: bool,
}

impl ReasoningSignals {
    pub fn detect(candidate: &str) -> Self {
        let folded = text::fold(candidate);
        Self {
            connector: CONNECTOR_RE.is_match(&folded),
            notation: NOTATION_RE.is_match(&folded)
                || NOTATION_SYMBOLS.iter().any(|s| folded.contains(s)),
            steps: folded.contains('\n')
                || NUMBERED_STEP_RE.is_match(&folded)
                || STEP_RE.is_match(&folded),
            definition: DEFINITION_RE.is_match(&folded),
        }
    }

    pub fn count(&self) -> usize {
        [self.connector, self.notation, self.steps, self.definition]
            .into_iter()
            .filter(|s| *s)
            .count()
    }

    pub fn score(&self) -> f64 {
        (self.count() as f64 * 0.25).min(1.0)
    }
}

/// Reasoning score of a candidate answer, in [0, 1].
pub fn reasoning_score(candidate: &str) -> f64 {
    ReasoningSignals::detect(candidate).score()
}
