//! hybridscore CLI: score interview answers from the command line.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use hybridscore_core::WeightPreset;

mod commands;

#[derive(Parser)]
#[command(
    name = "hybridscore",
    version,
    about = "Hybrid answer-evaluation engine for quantitative interview answers"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one candidate answer against a reference answer
    Evaluate {
        /// Reference (known-correct) answer
        #[arg(long)]
        reference: String,

        /// Candidate answer; "-" reads it from stdin
        #[arg(long)]
        candidate: String,

        /// Weight preset: quantitative, general
        #[arg(long)]
        preset: Option<WeightPreset>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Score every answer of one or more answer sets
    Run {
        /// Path to .toml answer set or directory
        #[arg(long)]
        answers: PathBuf,

        /// Max concurrent evaluations
        #[arg(long, default_value = "4")]
        parallelism: usize,

        /// Weight preset; overrides the config and the answer set
        #[arg(long)]
        preset: Option<WeightPreset>,

        /// Ignore the preset named by answer sets
        #[arg(long)]
        ignore_set_preset: bool,

        /// Only evaluate answers with these tags (comma-separated)
        #[arg(long)]
        filter: Option<String>,

        /// Output directory for JSON reports
        #[arg(long, default_value = "./hybridscore-results")]
        output: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compare two evaluation reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Regression threshold on the final score
        #[arg(long, default_value = "0.05")]
        threshold: f64,

        /// Exit code 1 if regressions found
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate answer set TOML files
    Validate {
        /// Path to answer set file or directory
        #[arg(long)]
        answers: PathBuf,
    },

    /// Create starter config and example answer set
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hybridscore_core=warn".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Evaluate {
            reference,
            candidate,
            preset,
            format,
            config,
        } => commands::evaluate::execute(reference, candidate, preset, format, config),
        Commands::Run {
            answers,
            parallelism,
            preset,
            ignore_set_preset,
            filter,
            output,
            config,
        } => {
            commands::run::execute(
                answers,
                parallelism,
                preset,
                ignore_set_preset,
                filter,
                output,
                config,
            )
            .await
        }
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_regression, format),
        Commands::Validate { answers } => commands::validate::execute(answers),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
