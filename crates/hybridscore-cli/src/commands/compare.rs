//! The `hybridscore compare` command.

use std::path::PathBuf;

use anyhow::Result;

use hybridscore_core::report::EvalReport;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    let baseline = EvalReport::load_json(&baseline_path)?;
    let current = EvalReport::load_json(&current_path)?;

    let report = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!(
                "Comparison: {} regressions, {} improvements, {} unchanged",
                report.regressions.len(),
                report.improvements.len(),
                report.unchanged
            );
            println!(
                "Global score: {:.1} -> {:.1}",
                report.baseline_points, report.current_points
            );

            let sections = [
                ("Regressions", &report.regressions),
                ("Improvements", &report.improvements),
            ];
            for (title, changes) in sections {
                if changes.is_empty() {
                    continue;
                }
                println!("\n{title}:");
                for c in changes {
                    println!(
                        "  {} {:.1} -> {:.1} ({:+.1})",
                        c.answer_id,
                        c.baseline_score * 100.0,
                        c.current_score * 100.0,
                        c.delta * 100.0
                    );
                }
            }

            if report.new_answers > 0 {
                println!("\n{} new answer(s)", report.new_answers);
            }
            if report.removed_answers > 0 {
                println!("{} removed answer(s)", report.removed_answers);
            }
        }
    }

    if fail_on_regression && report.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}
