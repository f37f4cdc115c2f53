pub mod analyze;
pub mod diseases;
pub mod history;
pub mod preload;

use agridoctor_pipeline::AnalyzerConfig;
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

/// Build the analyzer configuration shared by the model-using commands:
/// YAML file if given, then command-line overrides on top.
pub fn load_config(
    config_path: Option<&Path>,
    model_dir: Option<PathBuf>,
) -> Result<AnalyzerConfig> {
    let mut config = match config_path {
        Some(path) => AnalyzerConfig::from_yaml(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AnalyzerConfig::default(),
    };
    if let Some(dir) = model_dir {
        config.model_dir = dir;
    }
    Ok(config)
}
