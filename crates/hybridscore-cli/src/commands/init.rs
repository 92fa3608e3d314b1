//! The `hybridscore init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("hybridscore.toml").exists() {
        println!("hybridscore.toml already exists, skipping.");
    } else {
        std::fs::write("hybridscore.toml", SAMPLE_CONFIG)?;
        println!("Created hybridscore.toml");
    }

    std::fs::create_dir_all("answer-sets")?;
    let example_path = Path::new("answer-sets/example.toml");
    if example_path.exists() {
        println!("answer-sets/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_ANSWER_SET)?;
        println!("Created answer-sets/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Tune weights and tolerance bands in hybridscore.toml");
    println!("  2. Run: hybridscore validate --answers answer-sets/example.toml");
    println!("  3. Run: hybridscore run --answers answer-sets/example.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# hybridscore configuration

[weights]
# "quantitative" (0.15/0.60/0.10/0.15) or "general" (0.40/0.25/0.20/0.15)
preset = "quantitative"
# Individual weights override the preset; all four must sum to 1.
# semantic = 0.15
# numeric = 0.60
# concepts = 0.10
# reasoning = 0.15

[numeric]
exact_band = 0.02
close_band = 0.10
loose_band = 0.25
close_floor = 0.5
loose_floor = 0.2

[concepts]
fuzzy_threshold = 0.75
fuzzy_floor_cap = 0.2
keyword_top_n = 8
min_substring_len = 4

[embedding]
# "hashing" needs no model files; "onnx" requires the onnx feature
backend = "hashing"
dimensions = 384
model = "all-MiniLM-L6-v2"
"#;

const EXAMPLE_ANSWER_SET: &str = r#"[answer_set]
id = "example"
name = "Example Answer Set"
description = "Two quantitative answers to get started"
preset = "quantitative"

[[answers]]
id = "dice-expectation"
question = "¿Cuál es el valor esperado de un dado justo?"
reference = "E(X) = 21/6 = 3.5"
candidate = "Primero sumamos las caras, 21. Por lo tanto la esperanza es 3.5"
tags = ["esperanza"]

[[answers]]
id = "ace-of-spades"
question = "¿Probabilidad de sacar el as de picas?"
reference = "La probabilidad es 1/52"
candidate = "aproximadamente 0.0192"
tags = ["probabilidad"]
"#;
