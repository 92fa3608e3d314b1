//! Batch evaluation engine.
//!
//! Scores every answer of an answer set concurrently. Evaluation itself is
//! synchronous CPU work, so each answer runs on the blocking pool while a
//! semaphore bounds how many run at once.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::evaluator::Evaluator;
use crate::model::{AnswerCase, AnswerResult, AnswerSet, ScoreRecord};
use crate::report::{AnswerSetSummary, EvalReport};
use crate::statistics::compute_aggregate_stats;

/// Configuration for the batch engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum concurrent evaluations.
    pub parallelism: usize,
    /// Use the weight preset named by the answer set, when it names one.
    pub honor_set_preset: bool,
    /// Only evaluate answers carrying at least one of these tags.
    pub tags: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            honor_set_preset: true,
            tags: Vec::new(),
        }
    }
}

impl EngineConfig {
    fn selects(&self, answer: &AnswerCase) -> bool {
        self.tags.is_empty() || answer.tags.iter().any(|t| self.tags.contains(t))
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_answer_complete(&self, result: &AnswerResult);
    fn on_answer_error(&self, answer_id: &str, error: &str);
    fn on_set_complete(&self, total: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_answer_complete(&self, _: &AnswerResult) {}
    fn on_answer_error(&self, _: &str, _: &str) {}
    fn on_set_complete(&self, _: usize, _: usize, _: Duration) {}
}

/// Runs answer sets through a shared evaluator.
pub struct BatchEngine {
    evaluator: Arc<Evaluator>,
    config: EngineConfig,
}

impl BatchEngine {
    pub fn new(evaluator: Arc<Evaluator>, config: EngineConfig) -> Self {
        Self { evaluator, config }
    }

    fn evaluator_for(&self, set: &AnswerSet) -> Result<Arc<Evaluator>> {
        match set.preset {
            Some(preset) if self.config.honor_set_preset => {
                tracing::info!("answer set '{}' uses the {preset} preset", set.id);
                Ok(Arc::new(self.evaluator.with_weights(preset.weights())?))
            }
            _ => Ok(Arc::clone(&self.evaluator)),
        }
    }

    /// Evaluate every selected answer of a set and build the report.
    pub async fn run(&self, set: &AnswerSet, progress: &dyn ProgressReporter) -> Result<EvalReport> {
        let start = Instant::now();
        let run_id = Uuid::new_v4();
        let evaluator = self.evaluator_for(set)?;
        let weights = *evaluator.weights();
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));

        let mut futures = FuturesUnordered::new();

        for (index, case) in set
            .answers
            .iter()
            .filter(|a| self.config.selects(a))
            .enumerate()
        {
            let evaluator = Arc::clone(&evaluator);
            let semaphore = Arc::clone(&semaphore);
            let case = case.clone();

            futures.push(async move {
                // The semaphore is never closed, so acquisition cannot fail.
                let permit = semaphore.acquire_owned().await.ok();
                let task_case = case.clone();
                let joined = tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    let started = Instant::now();
                    let scores =
                        evaluator.evaluate_full(&task_case.reference, &task_case.candidate);
                    AnswerResult::new(
                        &task_case,
                        scores,
                        evaluator.weights(),
                        started.elapsed().as_millis() as u64,
                    )
                })
                .await;
                (index, case, joined)
            });
        }

        let total = futures.len();
        let mut results = Vec::with_capacity(total);
        let mut failed = 0usize;

        while let Some((index, case, joined)) = futures.next().await {
            let result = joined.unwrap_or_else(|e| {
                tracing::error!("evaluation task for {} failed: {e}", case.id);
                let scores = ScoreRecord::failed(format!("evaluation task failed: {e}"));
                AnswerResult::new(&case, scores, &weights, 0)
            });

            if let Some(error) = &result.scores.error {
                progress.on_answer_error(&result.answer_id, error);
                failed += 1;
            } else {
                progress.on_answer_complete(&result);
            }
            results.push((index, result));
        }

        results.sort_by_key(|(index, _)| *index);
        let results: Vec<AnswerResult> = results.into_iter().map(|(_, r)| r).collect();

        let elapsed = start.elapsed();
        progress.on_set_complete(total, failed, elapsed);

        let aggregate = compute_aggregate_stats(&results);
        let preset = if self.config.honor_set_preset && set.preset.is_some() {
            set.preset
        } else {
            evaluator.config().weights.preset
        };

        Ok(EvalReport {
            id: run_id,
            created_at: chrono::Utc::now(),
            answer_set: AnswerSetSummary {
                id: set.id.clone(),
                name: set.name.clone(),
                answer_count: results.len(),
            },
            preset,
            weights,
            embedder: evaluator.embedder_name().to_string(),
            results,
            aggregate,
            duration_ms: elapsed.as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::config::EvaluatorConfig;
    use crate::embedding::Embedder;
    use crate::error::ModelError;
    use crate::scoring::WeightPreset;

    fn case(id: &str, reference: &str, candidate: &str, tags: &[&str]) -> AnswerCase {
        AnswerCase {
            id: id.into(),
            question: String::new(),
            reference: reference.into(),
            candidate: candidate.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn answer_set(preset: Option<WeightPreset>) -> AnswerSet {
        AnswerSet {
            id: "set".into(),
            name: "Set".into(),
            description: String::new(),
            preset,
            answers: vec![
                case("a1", "El valor esperado es 3.5", "E(X) = 3.5", &["dados"]),
                case("a2", "La probabilidad es 1/52", "aproximadamente 0.0192", &["cartas"]),
                case("a3", "El valor esperado es 3.5", "No tengo idea", &["dados"]),
                case("a4", "La varianza es 35/12", "35/12", &[]),
            ],
        }
    }

    fn engine(config: EngineConfig) -> BatchEngine {
        let evaluator = Evaluator::new(EvaluatorConfig::default()).unwrap();
        BatchEngine::new(Arc::new(evaluator), config)
    }

    #[derive(Default)]
    struct Recorder {
        completed: Mutex<Vec<String>>,
        errors: Mutex<Vec<String>>,
        finished: Mutex<Option<(usize, usize)>>,
    }

    impl ProgressReporter for Recorder {
        fn on_answer_complete(&self, result: &AnswerResult) {
            self.completed.lock().unwrap().push(result.answer_id.clone());
        }
        fn on_answer_error(&self, answer_id: &str, _: &str) {
            self.errors.lock().unwrap().push(answer_id.to_string());
        }
        fn on_set_complete(&self, total: usize, failed: usize, _: Duration) {
            *self.finished.lock().unwrap() = Some((total, failed));
        }
    }

    #[tokio::test]
    async fn results_keep_answer_set_order() {
        let report = engine(EngineConfig::default())
            .run(&answer_set(None), &NoopReporter)
            .await
            .unwrap();
        let ids: Vec<_> = report.results.iter().map(|r| r.answer_id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2", "a3", "a4"]);
        assert_eq!(report.answer_set.answer_count, 4);
        assert_eq!(report.aggregate.total, 4);
        assert_eq!(report.embedder, "hashing");
        assert!(report.results.iter().all(|r| r.scores.in_unit_range()));
        assert_eq!(report.results[3].scores.numeric_score, 1.0);
    }

    #[tokio::test]
    async fn sequential_and_parallel_runs_agree() {
        let set = answer_set(None);
        let serial = engine(EngineConfig {
            parallelism: 1,
            ..EngineConfig::default()
        })
        .run(&set, &NoopReporter)
        .await
        .unwrap();
        let parallel = engine(EngineConfig {
            parallelism: 8,
            ..EngineConfig::default()
        })
        .run(&set, &NoopReporter)
        .await
        .unwrap();
        for (a, b) in serial.results.iter().zip(&parallel.results) {
            assert_eq!(a.scores, b.scores);
        }
    }

    #[tokio::test]
    async fn set_preset_overrides_configured_weights() {
        let report = engine(EngineConfig::default())
            .run(&answer_set(Some(WeightPreset::General)), &NoopReporter)
            .await
            .unwrap();
        assert_eq!(report.weights, WeightPreset::General.weights());
        assert_eq!(report.preset, Some(WeightPreset::General));

        let ignored = engine(EngineConfig {
            honor_set_preset: false,
            ..EngineConfig::default()
        })
        .run(&answer_set(Some(WeightPreset::General)), &NoopReporter)
        .await
        .unwrap();
        assert_eq!(ignored.weights, WeightPreset::Quantitative.weights());
    }

    #[tokio::test]
    async fn tag_filter_selects_answers() {
        let report = engine(EngineConfig {
            tags: vec!["dados".into()],
            ..EngineConfig::default()
        })
        .run(&answer_set(None), &NoopReporter)
        .await
        .unwrap();
        let ids: Vec<_> = report.results.iter().map(|r| r.answer_id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a3"]);
    }

    struct FlakyEmbedder;

    impl Embedder for FlakyEmbedder {
        fn name(&self) -> &str {
            "flaky"
        }
        fn dimensions(&self) -> usize {
            4
        }
        fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
            if text.contains("idea") {
                Err(ModelError::Inference("flaky backend".into()))
            } else {
                Ok(vec![1.0, 0.0, 0.0, 0.0])
            }
        }
    }

    #[tokio::test]
    async fn failed_answers_are_reported_and_counted() {
        let evaluator =
            Evaluator::with_embedder(EvaluatorConfig::default(), Arc::new(FlakyEmbedder)).unwrap();
        let engine = BatchEngine::new(Arc::new(evaluator), EngineConfig::default());
        let recorder = Recorder::default();

        let report = engine.run(&answer_set(None), &recorder).await.unwrap();

        assert_eq!(report.aggregate.failed, 1);
        assert!(report.results[2].is_error());
        assert_eq!(*recorder.errors.lock().unwrap(), vec!["a3".to_string()]);
        assert_eq!(recorder.completed.lock().unwrap().len(), 3);
        assert_eq!(*recorder.finished.lock().unwrap(), Some((4, 1)));
    }
}
