//! hybridscore-core: hybrid answer-evaluation engine.
//!
//! Scores a free-text candidate answer against a reference answer with four
//! independent analyzers (semantic similarity, numeric/symbolic validation,
//! concept coverage, reasoning structure) and a configurable weighted
//! combiner. Batch runs over TOML answer sets, aggregate statistics and
//! JSON reports build on top of the single-pair [`Evaluator`].

pub mod concepts;
pub mod config;
pub mod difficulty;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod keywords;
pub mod model;
pub mod numeric;
pub mod parser;
pub mod reasoning;
pub mod report;
pub mod scoring;
pub mod semantic;
pub mod statistics;
pub mod symbolic;
pub mod text;

pub use config::EvaluatorConfig;
pub use evaluator::Evaluator;
pub use model::{AnswerPair, ScoreRecord};
pub use scoring::{final_hybrid_score, ScoreWeights, WeightPreset};
