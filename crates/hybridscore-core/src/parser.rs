//! TOML answer-set parser.
//!
//! Loads answer sets from TOML files and directories, and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::concepts;
use crate::model::{AnswerCase, AnswerSet};
use crate::numeric;
use crate::scoring::WeightPreset;

/// Intermediate TOML structure for parsing answer-set files.
#[derive(Debug, Deserialize)]
struct TomlAnswerFile {
    answer_set: TomlAnswerSetHeader,
    #[serde(default)]
    answers: Vec<TomlAnswer>,
}

#[derive(Debug, Deserialize)]
struct TomlAnswerSetHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    preset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlAnswer {
    id: String,
    #[serde(default)]
    question: String,
    reference: String,
    candidate: String,
    #[serde(default)]
    tags: Vec<String>,
}

/// Parse a single TOML file into an `AnswerSet`.
pub fn parse_answer_set(path: &Path) -> Result<AnswerSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answer set file: {}", path.display()))?;

    parse_answer_set_str(&content, path)
}

/// Parse a TOML string into an `AnswerSet`.
pub fn parse_answer_set_str(content: &str, source_path: &Path) -> Result<AnswerSet> {
    let parsed: TomlAnswerFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let preset = parsed
        .answer_set
        .preset
        .map(|p| p.parse::<WeightPreset>())
        .transpose()
        .with_context(|| format!("invalid preset in {}", source_path.display()))?;

    let answers = parsed
        .answers
        .into_iter()
        .map(|a| AnswerCase {
            id: a.id,
            question: a.question,
            reference: a.reference,
            candidate: a.candidate,
            tags: a.tags,
        })
        .collect();

    Ok(AnswerSet {
        id: parsed.answer_set.id,
        name: parsed.answer_set.name,
        description: parsed.answer_set.description,
        preset,
        answers,
    })
}

/// Recursively load all `.toml` answer-set files from a directory.
/// Files that fail to parse are skipped with a warning.
pub fn load_answer_directory(dir: &Path) -> Result<Vec<AnswerSet>> {
    let mut sets = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            sets.extend(load_answer_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_answer_set(&path) {
                Ok(set) => sets.push(set),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(sets)
}

/// Load a single file or every set under a directory.
pub fn load_answer_sets(path: &Path) -> Result<Vec<AnswerSet>> {
    if path.is_dir() {
        load_answer_directory(path)
    } else {
        Ok(vec![parse_answer_set(path)?])
    }
}

/// A warning from answer-set validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The answer ID (if applicable).
    pub answer_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate an answer set for common issues.
pub fn validate_answer_set(set: &AnswerSet) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if set.answers.is_empty() {
        warnings.push(ValidationWarning {
            answer_id: None,
            message: "answer set has no answers".into(),
        });
    }

    let mut seen_ids = HashSet::new();
    for answer in &set.answers {
        if !seen_ids.insert(&answer.id) {
            warnings.push(ValidationWarning {
                answer_id: Some(answer.id.clone()),
                message: format!("duplicate answer ID: {}", answer.id),
            });
        }
    }

    for answer in &set.answers {
        let warn = |message: &str| ValidationWarning {
            answer_id: Some(answer.id.clone()),
            message: message.into(),
        };

        if answer.reference.trim().is_empty() {
            warnings.push(warn("reference is empty"));
        } else if numeric::extract_candidates(&answer.reference).is_empty()
            && concepts::token_concepts(&answer.reference).is_empty()
        {
            // Both the numeric and concept scores are pinned to zero here.
            warnings.push(warn("reference has neither numbers nor concepts"));
        }

        if answer.candidate.trim().is_empty() {
            warnings.push(warn("candidate is empty"));
        }
    }

    warnings
}
