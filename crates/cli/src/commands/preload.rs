//! Preload command - warm every model and record completion

use agridoctor_pipeline::{preloader, ModelManager};
use anyhow::{Context as _, Result};
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct PreloadCommand {
    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the .onnx model files
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Preload again even if a previous run completed
    #[arg(long)]
    force: bool,
}

impl PreloadCommand {
    pub fn execute(self) -> Result<()> {
        let config = super::load_config(self.config.as_deref(), self.model_dir)?;
        let mut manager = ModelManager::new(&config.model_dir);

        if self.force {
            preloader::reset();
        }

        preloader::preload(&mut manager, |progress| {
            println!("[{:3}%] {}", progress.percent, progress.message);
        })
        .context("Preload failed; it will restart from the first model next time")?;

        Ok(())
    }
}
