//! Evaluator configuration.
//!
//! Every hand-tuned constant of the analyzers (weights, tolerance bands,
//! fuzzy threshold) lives here so it can be re-tuned from a TOML file
//! without touching code.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::scoring::{ScoreWeights, WeightPreset};

/// Top-level evaluator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    #[serde(default)]
    pub weights: WeightSettings,
    #[serde(default)]
    pub numeric: NumericConfig,
    #[serde(default)]
    pub concepts: ConceptConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

/// Weight section: a preset, optionally overridden field by field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeightSettings {
    #[serde(default)]
    pub preset: Option<WeightPreset>,
    #[serde(default)]
    pub semantic: Option<f64>,
    #[serde(default)]
    pub numeric: Option<f64>,
    #[serde(default)]
    pub concepts: Option<f64>,
    #[serde(default)]
    pub reasoning: Option<f64>,
}

impl WeightSettings {
    /// Settings that select a preset with no overrides.
    pub fn preset(preset: WeightPreset) -> Self {
        Self {
            preset: Some(preset),
            ..Self::default()
        }
    }

    /// Resolve to concrete weights and validate them.
    pub fn resolve(&self) -> Result<ScoreWeights, ConfigError> {
        let base = self.preset.unwrap_or_default().weights();
        let weights = ScoreWeights {
            semantic: self.semantic.unwrap_or(base.semantic),
            numeric: self.numeric.unwrap_or(base.numeric),
            concepts: self.concepts.unwrap_or(base.concepts),
            reasoning: self.reasoning.unwrap_or(base.reasoning),
        };
        weights.validate()?;
        Ok(weights)
    }
}

/// Tolerance bands of the numeric validator, as relative errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumericConfig {
    /// Errors up to this value score 1.0.
    pub exact_band: f64,
    /// Errors up to this value interpolate from 1.0 down to `close_floor`.
    pub close_band: f64,
    /// Errors up to this value interpolate from `close_floor` down to `loose_floor`.
    pub loose_band: f64,
    pub close_floor: f64,
    pub loose_floor: f64,
}

impl Default for NumericConfig {
    fn default() -> Self {
        Self {
            exact_band: 0.02,
            close_band: 0.10,
            loose_band: 0.25,
            close_floor: 0.5,
            loose_floor: 0.2,
        }
    }
}

impl NumericConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bands = [self.exact_band, self.close_band, self.loose_band];
        if bands.iter().any(|b| !b.is_finite() || *b <= 0.0 || *b > 1.0) {
            return Err(ConfigError::InvalidBands(format!(
                "bands must lie in (0, 1], got {bands:?}"
            )));
        }
        if !(self.exact_band < self.close_band && self.close_band < self.loose_band) {
            return Err(ConfigError::InvalidBands(format!(
                "bands must be strictly increasing, got {bands:?}"
            )));
        }
        check_unit("close_floor", self.close_floor)?;
        check_unit("loose_floor", self.loose_floor)?;
        if self.loose_floor > self.close_floor {
            return Err(ConfigError::InvalidBands(
                "loose_floor must not exceed close_floor".into(),
            ));
        }
        Ok(())
    }
}

/// Concept coverage tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConceptConfig {
    /// A fuzzy concept match needs a normalised edit similarity strictly
    /// above this value.
    pub fuzzy_threshold: f64,
    /// Ceiling of the score granted when only fuzzy matches exist.
    pub fuzzy_floor_cap: f64,
    /// Number of embedding-ranked keywords added per text.
    pub keyword_top_n: usize,
    /// Shortest string for which substring containment counts as a match.
    pub min_substring_len: usize,
}

impl Default for ConceptConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.75,
            fuzzy_floor_cap: 0.2,
            keyword_top_n: 8,
            min_substring_len: 4,
        }
    }
}

impl ConceptConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unit("fuzzy_threshold", self.fuzzy_threshold)?;
        check_unit("fuzzy_floor_cap", self.fuzzy_floor_cap)
    }
}

/// Which embedding backend to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    #[default]
    Hashing,
    Onnx,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    pub dimensions: usize,
    /// Sentence-transformer name (onnx backend only).
    pub model: String,
    /// Where model weights are cached (onnx backend only).
    pub cache_dir: Option<PathBuf>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Hashing,
            dimensions: 384,
            model: "all-MiniLM-L6-v2".to_string(),
            cache_dir: None,
        }
    }
}

impl EvaluatorConfig {
    /// Check every section. Called before an evaluator is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.resolve()?;
        self.numeric.validate()?;
        self.concepts.validate()?;
        if self.embedding.dimensions == 0 {
            return Err(ConfigError::ZeroDimensions);
        }
        Ok(())
    }

    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::File {
            path: "<inline>".into(),
            message: e.to_string(),
        })
    }
}

fn check_unit(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { name, value })
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `hybridscore.toml` in the current directory
/// 2. `~/.config/hybridscore/config.toml`
///
/// Environment variable override: `HYBRIDSCORE_PRESET` selects a weight
/// preset and discards explicit weights from the file.
pub fn load_config() -> Result<EvaluatorConfig, ConfigError> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<EvaluatorConfig, ConfigError> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => {
            return Err(ConfigError::File {
                path: p.display().to_string(),
                message: "file not found".into(),
            })
        }
        None => {
            let local = PathBuf::from("hybridscore.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::File {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            tracing::debug!("loading evaluator config from {}", path.display());
            toml::from_str::<EvaluatorConfig>(&content).map_err(|e| ConfigError::File {
                path: path.display().to_string(),
                message: e.to_string(),
            })?
        }
        None => EvaluatorConfig::default(),
    };

    if let Ok(name) = std::env::var("HYBRIDSCORE_PRESET") {
        let preset: WeightPreset = name.parse()?;
        config.weights = WeightSettings::preset(preset);
    }

    config.validate()?;
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("hybridscore"))
}
