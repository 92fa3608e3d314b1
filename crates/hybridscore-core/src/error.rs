//! Evaluator error types.
//!
//! Extraction and parse failures never surface here: analyzers degrade those
//! to a 0.0 sub-score locally. What remains are model failures (fatal when
//! raised at initialisation), configuration problems, and the rare internal
//! failure that `evaluate_full` converts into an error-marked score record.

use thiserror::Error;

/// Failures of a model-backed resource (embedder, keyword extractor).
#[derive(Debug, Error)]
pub enum ModelError {
    /// The model could not be loaded.
    #[error("failed to load model '{model}': {message}")]
    Load { model: String, message: String },

    /// The backend does not exist or was not compiled in.
    #[error("embedding backend '{0}' is not available in this build")]
    UnsupportedBackend(String),

    /// Inference failed on a loaded model.
    #[error("inference failed: {0}")]
    Inference(String),

    /// The model produced a vector of the wrong size.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Invalid evaluator configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A weight is negative or not finite.
    #[error("weight '{name}' must be a finite non-negative number, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },

    /// Weights do not form a convex combination.
    #[error("weights must sum to 1.0, got {0}")]
    WeightSum(f64),

    /// Unknown preset name.
    #[error("unknown weight preset: {0}")]
    UnknownPreset(String),

    /// Tolerance bands must be increasing and inside (0, 1].
    #[error("invalid tolerance bands: {0}")]
    InvalidBands(String),

    /// A threshold or cap lies outside [0, 1].
    #[error("'{name}' must lie in [0, 1], got {value}")]
    OutOfRange { name: &'static str, value: f64 },

    /// Embedding dimension must be positive.
    #[error("embedding dimensions must be greater than zero")]
    ZeroDimensions,

    /// The config file could not be read or parsed.
    #[error("failed to load config {path}: {message}")]
    File { path: String, message: String },
}

/// Errors raised while evaluating a single answer pair.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error(transparent)]
    Model(#[from] ModelError),

    /// An analyzer produced NaN or infinity.
    #[error("{analyzer} produced a non-finite score")]
    NonFinite { analyzer: &'static str },

    /// An analyzer panicked.
    #[error("evaluation panicked: {0}")]
    Panicked(String),
}

/// Evaluator construction failures. These are fatal: an evaluator without
/// its models cannot score anything.
#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Model(#[from] ModelError),
}
