pub mod compare;
pub mod evaluate;
pub mod init;
pub mod run;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};

use hybridscore_core::config::{load_config_from, WeightSettings};
use hybridscore_core::{Evaluator, WeightPreset};

/// Load the config (optionally forcing a preset) and build the evaluator.
pub fn build_evaluator(config_path: Option<&Path>, preset: Option<WeightPreset>) -> Result<Evaluator> {
    let mut config = load_config_from(config_path)?;
    if let Some(preset) = preset {
        config.weights = WeightSettings::preset(preset);
    }
    Evaluator::new(config).context("failed to initialise evaluator")
}
