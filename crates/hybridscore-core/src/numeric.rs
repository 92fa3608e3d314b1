//! Numeric/symbolic validation of quantitative answers.
//!
//! Two tiers, in order:
//!
//! 1. Exact: one arithmetic expression is pulled from each text and both are
//!    evaluated over rationals. Equal values score 1.0 immediately.
//! 2. Tolerance: every number, fraction, percentage and assignment value is
//!    extracted from both texts, and the closest pair by relative error is
//!    mapped through the tolerance bands.
//!
//! Nothing here fails: texts without numbers score 0.0.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::NumericConfig;
use crate::symbolic;

/// How a numeric candidate was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    Number,
    Fraction,
    Percentage,
    Assignment,
    Expression,
}

/// A number extracted from a text, with the substring it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericCandidate {
    pub value: f64,
    pub source: String,
    pub kind: CandidateKind,
}

static UNICODE_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{Nd}&&[^0-9]]").expect("valid regex"));

static DECIMAL_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]),([0-9])").expect("valid regex"));

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^0-9.])(-?[0-9]+(?:\.[0-9]+)?)").expect("valid regex")
});

static FRACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+(?:\.[0-9]+)?)\s*/\s*([0-9]+(?:\.[0-9]+)?)").expect("valid regex")
});

static PERCENTAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+(?:\.[0-9]+)?)\s*%").expect("valid regex"));

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z_][A-Za-z0-9_]*(?:\([^()=]*\))?\s*=\s*([0-9.+\-*/^()×÷·\s]+)")
        .expect("valid regex")
});

static EXPRESSION_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9.+\-*/^()×÷·\s]+").expect("valid regex"));

/// Fold non-ASCII decimal digits (`٣`, `３`, `३`) to ASCII and replace
/// decimal commas (`0,5`) with decimal points.
pub fn normalize_numerals(text: &str) -> String {
    let folded = fold_digits(text);
    DECIMAL_COMMA.replace_all(&folded, "${1}.${2}").into_owned()
}

/// Decimal digit blocks are contiguous runs of ten starting at zero, so a
/// digit's value is its offset from the start of its run, modulo ten.
fn fold_digits(text: &str) -> Cow<'_, str> {
    if text.is_ascii() || !UNICODE_DIGIT.is_match(text) {
        return Cow::Borrowed(text);
    }
    let is_digit = |c: char| {
        let mut buf = [0u8; 4];
        UNICODE_DIGIT.is_match(c.encode_utf8(&mut buf))
    };
    let folded = text
        .chars()
        .map(|c| {
            if !is_digit(c) {
                return c;
            }
            let offset = (1..)
                .map_while(|back| char::from_u32(u32::from(c) - back))
                .take_while(|&prev| is_digit(prev))
                .count();
            char::from(b'0' + (offset % 10) as u8)
        })
        .collect();
    Cow::Owned(folded)
}

/// The arithmetic expression a text commits to: the right-hand side of the
/// last `name = ...` assignment, otherwise the longest digit-bearing run of
/// arithmetic characters.
pub fn extract_expression(text: &str) -> Option<String> {
    let text = normalize_numerals(text);

    let assigned = ASSIGNMENT
        .captures_iter(&text)
        .filter_map(|c| c.get(1))
        .map(|m| tidy_expression(m.as_str()))
        .filter(|e| has_digit(e))
        .last();
    if assigned.is_some() {
        return assigned;
    }

    let mut best: Option<String> = None;
    for m in EXPRESSION_RUN.find_iter(&text) {
        let candidate = tidy_expression(m.as_str());
        if !has_digit(&candidate) {
            continue;
        }
        if best.as_ref().map_or(true, |b| candidate.len() > b.len()) {
            best = Some(candidate);
        }
    }
    best
}

/// Trim sentence punctuation and unbalanced outer parentheses.
fn tidy_expression(raw: &str) -> String {
    let mut s = raw.trim_matches(|c: char| c.is_whitespace() || c == '.' || c == ',');
    loop {
        let opens = s.matches('(').count();
        let closes = s.matches(')').count();
        if closes > opens && s.ends_with(')') {
            s = s[..s.len() - 1].trim_end();
        } else if opens > closes && s.starts_with('(') {
            s = s[1..].trim_start();
        } else {
            break;
        }
    }
    s.trim_matches(|c: char| c.is_whitespace() || c == '.' || c == ',')
        .to_string()
}

fn has_digit(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
}

/// Every plausible number in a text, deduplicated by value. Order follows
/// discovery: plain numbers, fractions, percentages, assignments, then the
/// value of the committed expression.
pub fn extract_candidates(text: &str) -> Vec<NumericCandidate> {
    let normalized = normalize_numerals(text);
    let mut out: Vec<NumericCandidate> = Vec::new();
    let mut push = |value: f64, source: &str, kind: CandidateKind| {
        if value.is_finite() && !out.iter().any(|c| c.value == value) {
            out.push(NumericCandidate {
                value,
                source: source.trim().to_string(),
                kind,
            });
        }
    };

    for cap in NUMBER.captures_iter(&normalized) {
        let m = &cap[1];
        if let Ok(v) = m.parse::<f64>() {
            push(v, m, CandidateKind::Number);
        }
    }

    for cap in FRACTION.captures_iter(&normalized) {
        let (Ok(num), Ok(den)) = (cap[1].parse::<f64>(), cap[2].parse::<f64>()) else {
            continue;
        };
        if den != 0.0 {
            push(num / den, &cap[0], CandidateKind::Fraction);
        }
    }

    for cap in PERCENTAGE.captures_iter(&normalized) {
        if let Ok(v) = cap[1].parse::<f64>() {
            push(v / 100.0, &cap[0], CandidateKind::Percentage);
        }
    }

    for cap in ASSIGNMENT.captures_iter(&normalized) {
        let rhs = tidy_expression(&cap[1]);
        if let Some(v) = symbolic::evaluate(&rhs).ok().and_then(|r| symbolic::to_f64(&r)) {
            push(v, &rhs, CandidateKind::Assignment);
        }
    }

    if let Some(expr) = extract_expression(text) {
        if let Some(v) = symbolic::evaluate(&expr).ok().and_then(|r| symbolic::to_f64(&r)) {
            push(v, &expr, CandidateKind::Expression);
        }
    }

    out
}

/// `|a-b| / max(|a|, |b|, 1)`.
pub fn relative_error(a: f64, b: f64) -> f64 {
    (a - b).abs() / a.abs().max(b.abs()).max(1.0)
}

/// Map a relative error to a graded score through the tolerance bands.
pub fn band_score(error: f64, bands: &NumericConfig) -> f64 {
    if !error.is_finite() {
        return 0.0;
    }
    if error <= bands.exact_band {
        1.0
    } else if error <= bands.close_band {
        let t = (error - bands.exact_band) / (bands.close_band - bands.exact_band);
        1.0 - t * (1.0 - bands.close_floor)
    } else if error <= bands.loose_band {
        let t = (error - bands.close_band) / (bands.loose_band - bands.close_band);
        bands.close_floor - t * (bands.close_floor - bands.loose_floor)
    } else {
        0.0
    }
}

/// Score how well the candidate's numbers match the reference's, in [0, 1].
pub fn numeric_validation(reference: &str, candidate: &str, bands: &NumericConfig) -> f64 {
    if let (Some(ref_expr), Some(cand_expr)) =
        (extract_expression(reference), extract_expression(candidate))
    {
        match symbolic::equivalent(&ref_expr, &cand_expr) {
            Some(true) => {
                tracing::debug!("exact match: '{ref_expr}' == '{cand_expr}'");
                return 1.0;
            }
            Some(false) => {}
            None => tracing::debug!(
                "symbolic tier skipped for '{ref_expr}' / '{cand_expr}', using tolerance"
            ),
        }
    }

    let ref_values = extract_candidates(reference);
    let cand_values = extract_candidates(candidate);
    if ref_values.is_empty() || cand_values.is_empty() {
        return 0.0;
    }

    let min_error = ref_values
        .iter()
        .flat_map(|r| cand_values.iter().map(move |c| relative_error(r.value, c.value)))
        .fold(f64::INFINITY, f64::min);

    band_score(min_error, bands).clamp(0.0, 1.0)
}
