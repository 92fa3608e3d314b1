//! The hybrid evaluator: four analyzers and a weighted combiner.
//!
//! An [`Evaluator`] owns the resolved configuration and the loaded
//! embedding model. It is cheap to clone (the model sits behind an `Arc`)
//! and safe to share across threads. Model loading happens once, in
//! [`Evaluator::new`]; nothing in the per-call path touches disk or network.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, OnceLock};

use crate::concepts;
use crate::config::{load_config, EvaluatorConfig};
use crate::embedding::{load_embedder, Embedder};
use crate::error::{ConfigError, EvalError, InitError, ModelError};
use crate::model::{AnswerPair, ScoreRecord};
use crate::numeric;
use crate::reasoning;
use crate::scoring::ScoreWeights;
use crate::semantic;

static GLOBAL: OnceLock<Evaluator> = OnceLock::new();
static GLOBAL_INIT: Mutex<()> = Mutex::new(());

#[derive(Clone)]
pub struct Evaluator {
    config: EvaluatorConfig,
    weights: ScoreWeights,
    embedder: Arc<dyn Embedder>,
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("weights", &self.weights)
            .field("embedder", &self.embedder.name())
            .finish()
    }
}

impl Evaluator {
    /// Validate the configuration and load the embedding model.
    pub fn new(config: EvaluatorConfig) -> Result<Self, InitError> {
        config.validate()?;
        let embedder = load_embedder(&config.embedding)?;
        Self::assemble(config, embedder)
    }

    /// Build an evaluator around an already-loaded embedder.
    pub fn with_embedder(
        config: EvaluatorConfig,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, InitError> {
        config.validate()?;
        Self::assemble(config, embedder)
    }

    /// Resolve the weights of an already-validated config.
    fn assemble(config: EvaluatorConfig, embedder: Arc<dyn Embedder>) -> Result<Self, InitError> {
        let weights = config.weights.resolve()?;
        tracing::info!(
            "evaluator ready: {} embedder ({} dims), weights sem={} num={} concepts={} reasoning={}",
            embedder.name(),
            embedder.dimensions(),
            weights.semantic,
            weights.numeric,
            weights.concepts,
            weights.reasoning
        );
        Ok(Self {
            config,
            weights,
            embedder,
        })
    }

    /// A copy sharing the same model but combining with other weights.
    pub fn with_weights(&self, weights: ScoreWeights) -> Result<Self, ConfigError> {
        weights.validate()?;
        Ok(Self {
            weights,
            ..self.clone()
        })
    }

    /// Process-wide evaluator. The first successful call wins; later calls
    /// return the same instance and ignore their config.
    pub fn init_global(config: EvaluatorConfig) -> Result<&'static Evaluator, InitError> {
        let _guard = GLOBAL_INIT.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(existing) = GLOBAL.get() {
            return Ok(existing);
        }
        let evaluator = Self::new(config)?;
        Ok(GLOBAL.get_or_init(|| evaluator))
    }

    /// Process-wide evaluator, lazily built from [`load_config`] on first use.
    pub fn global() -> Result<&'static Evaluator, InitError> {
        if let Some(existing) = GLOBAL.get() {
            return Ok(existing);
        }
        Self::init_global(load_config()?)
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    pub fn embedder_name(&self) -> &str {
        self.embedder.name()
    }

    pub fn similarity(&self, a: &str, b: &str) -> Result<f64, ModelError> {
        semantic::similarity(self.embedder.as_ref(), a, b)
    }

    pub fn numeric_validation(&self, reference: &str, candidate: &str) -> f64 {
        numeric::numeric_validation(reference, candidate, &self.config.numeric)
    }

    pub fn concept_coverage(&self, reference: &str, candidate: &str) -> Result<f64, ModelError> {
        concepts::concept_coverage(
            reference,
            candidate,
            self.embedder.as_ref(),
            &self.config.concepts,
        )
    }

    pub fn reasoning_score(&self, candidate: &str) -> f64 {
        reasoning::reasoning_score(candidate)
    }

    pub fn final_hybrid_score(
        &self,
        semantic: f64,
        numeric: f64,
        concepts: f64,
        reasoning: f64,
    ) -> f64 {
        self.weights.combine(semantic, numeric, concepts, reasoning)
    }

    /// Run all four analyzers, propagating model failures.
    pub fn try_evaluate(&self, reference: &str, candidate: &str) -> Result<ScoreRecord, EvalError> {
        let semantic_score = finite("semantic", self.similarity(reference, candidate)?)?;
        let numeric_score = finite("numeric", self.numeric_validation(reference, candidate))?;
        let concept_score = finite("concepts", self.concept_coverage(reference, candidate)?)?;
        let reasoning_score = finite("reasoning", self.reasoning_score(candidate))?;
        let final_score = self.final_hybrid_score(
            semantic_score,
            numeric_score,
            concept_score,
            reasoning_score,
        );

        tracing::debug!(
            "scored pair: sem={semantic_score:.3} num={numeric_score:.3} \
             concepts={concept_score:.3} reasoning={reasoning_score:.3} final={final_score:.3}"
        );

        Ok(ScoreRecord {
            semantic_score,
            numeric_score,
            concept_score,
            reasoning_score,
            final_score,
            error: None,
        })
    }

    /// Score a pair. Never fails: any internal error, including a panic in
    /// an analyzer, yields an all-zero record carrying the error message.
    pub fn evaluate_full(&self, reference: &str, candidate: &str) -> ScoreRecord {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.try_evaluate(reference, candidate)
        }))
        .unwrap_or_else(|payload| Err(EvalError::Panicked(panic_message(payload.as_ref()))));

        match outcome {
            Ok(record) => record,
            Err(e) => {
                tracing::error!("evaluation failed: {e}");
                ScoreRecord::failed(e.to_string())
            }
        }
    }

    pub fn evaluate_pair(&self, pair: &AnswerPair) -> ScoreRecord {
        self.evaluate_full(&pair.reference, &pair.candidate)
    }
}

fn finite(analyzer: &'static str, score: f64) -> Result<f64, EvalError> {
    if score.is_finite() {
        Ok(score.clamp(0.0, 1.0))
    } else {
        Err(EvalError::NonFinite { analyzer })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
