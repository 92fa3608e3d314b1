//! The `hybridscore run` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use comfy_table::{Cell, Table};

use hybridscore_core::engine::{BatchEngine, EngineConfig, ProgressReporter};
use hybridscore_core::model::AnswerResult;
use hybridscore_core::parser;
use hybridscore_core::report::EvalReport;
use hybridscore_core::WeightPreset;

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_answer_complete(&self, result: &AnswerResult) {
        eprintln!(
            "  Done: {} final {:.3} [{}] ({}ms)",
            result.answer_id, result.scores.final_score, result.level, result.duration_ms,
        );
    }

    fn on_answer_error(&self, answer_id: &str, error: &str) {
        eprintln!("  ERROR: {answer_id}: {error}");
    }

    fn on_set_complete(&self, total: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {}/{total} scored, {failed} failed ({:.1}s)",
            total - failed,
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    answers_path: PathBuf,
    parallelism: usize,
    preset: Option<WeightPreset>,
    ignore_set_preset: bool,
    filter: Option<String>,
    output: PathBuf,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");

    let evaluator = super::build_evaluator(config_path.as_deref(), preset)?;
    let sets = parser::load_answer_sets(&answers_path)?;
    anyhow::ensure!(
        !sets.is_empty(),
        "no answer sets found in {}",
        answers_path.display()
    );

    let tags: Vec<String> = filter
        .as_deref()
        .map(|f| {
            f.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let engine_config = EngineConfig {
        parallelism,
        honor_set_preset: preset.is_none() && !ignore_set_preset,
        tags,
    };
    let engine = BatchEngine::new(Arc::new(evaluator), engine_config);
    let reporter = ConsoleReporter;

    std::fs::create_dir_all(&output)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");

    for set in &sets {
        eprintln!(
            "hybridscore v{}: scoring {} answers from '{}'",
            env!("CARGO_PKG_VERSION"),
            set.answers.len(),
            set.name
        );
        eprintln!();

        let report = engine.run(set, &reporter).await?;
        print_summary(&report);

        let path = output.join(format!("report-{}-{timestamp}.json", set.id));
        report.save_json(&path)?;
        eprintln!("Results saved to: {}", path.display());
    }

    Ok(())
}

fn print_summary(report: &EvalReport) {
    let mut table = Table::new();
    table.set_header(vec![
        "Answer",
        "Semantic",
        "Numeric",
        "Concepts",
        "Reasoning",
        "Final",
        "Level",
        "Difficulty",
    ]);

    for r in &report.results {
        let s = &r.scores;
        table.add_row(vec![
            Cell::new(&r.answer_id),
            Cell::new(format!("{:.3}", s.semantic_score)),
            Cell::new(format!("{:.3}", s.numeric_score)),
            Cell::new(format!("{:.3}", s.concept_score)),
            Cell::new(format!("{:.3}", s.reasoning_score)),
            Cell::new(format!("{:.3}", s.final_score)),
            Cell::new(if r.is_error() { "ERROR".to_string() } else { r.level.to_string() }),
            Cell::new(r.difficulty.level.to_string()),
        ]);
    }

    let agg = &report.aggregate;
    println!("{table}");
    println!(
        "Global score: {:.1}/100 ({}) over {} answers, {} failed",
        agg.global_points, agg.level, agg.total, agg.failed
    );
    for (tag, stats) in &agg.per_tag {
        println!("  {tag}: {:.1}/100 ({} answers)", stats.mean_final * 100.0, stats.count);
    }
}
