//! The `hybridscore validate` command.

use std::path::PathBuf;

use anyhow::Result;

use hybridscore_core::parser;

pub fn execute(answers_path: PathBuf) -> Result<()> {
    let sets = parser::load_answer_sets(&answers_path)?;

    let mut total_warnings = 0;

    for set in &sets {
        let preset = set
            .preset
            .map(|p| format!(", preset {p}"))
            .unwrap_or_default();
        println!("Answer set: {} ({} answers{preset})", set.name, set.answers.len());

        let warnings = parser::validate_answer_set(set);
        for w in &warnings {
            let prefix = w
                .answer_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All answer sets valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
