//! The `hybridscore evaluate` command.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use hybridscore_core::difficulty;
use hybridscore_core::reasoning::ReasoningSignals;
use hybridscore_core::WeightPreset;

pub fn execute(
    reference: String,
    candidate: String,
    preset: Option<WeightPreset>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let candidate = if candidate == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read candidate from stdin")?;
        buf
    } else {
        candidate
    };

    let evaluator = super::build_evaluator(config_path.as_deref(), preset)?;
    let record = evaluator.evaluate_full(&reference, &candidate);

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        "text" => {
            let weights = evaluator.weights();
            let contributions = weights.contributions(&record);

            let mut table = Table::new();
            table.set_header(vec!["Signal", "Score", "Weight", "Points"]);
            let rows = [
                ("Semantic", record.semantic_score, weights.semantic, contributions.semantic),
                ("Numeric", record.numeric_score, weights.numeric, contributions.numeric),
                ("Concepts", record.concept_score, weights.concepts, contributions.concepts),
                ("Reasoning", record.reasoning_score, weights.reasoning, contributions.reasoning),
            ];
            for (name, score, weight, points) in rows {
                table.add_row(vec![
                    Cell::new(name),
                    Cell::new(format!("{score:.3}")),
                    Cell::new(format!("{weight:.2}")),
                    Cell::new(format!("{points:.1}")),
                ]);
            }
            println!("{table}");

            let level = record.level();
            println!(
                "\nFinal score: {:.3} ({:.1}/100, {level})",
                record.final_score,
                record.points()
            );
            println!("{}", level.description());

            let signals = ReasoningSignals::detect(&candidate);
            println!(
                "Reasoning markers: connector={} notation={} steps={} definition={}",
                signals.connector, signals.notation, signals.steps, signals.definition
            );
            let difficulty = difficulty::classify(&reference);
            println!(
                "Question difficulty: {} ({} points)",
                difficulty.level, difficulty.points
            );

            if let Some(error) = &record.error {
                println!("\nWARNING: evaluation failed: {error}");
            }
        }
        other => anyhow::bail!("unknown format '{other}' (expected text or json)"),
    }

    Ok(())
}
