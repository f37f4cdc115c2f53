//! Analyze command - run the full pipeline over one photo

use agridoctor_common::{AnalysisError, CropType, Language};
use agridoctor_pipeline::{Analyzer, HistoryStore};
use anyhow::{Context as _, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::warn;

#[derive(Args)]
pub struct AnalyzeCommand {
    /// Path to the leaf photo (JPEG, PNG, ...)
    image: PathBuf,

    /// Crop to analyze for: corn, potato or wheat
    #[arg(short, long)]
    crop: String,

    /// Display language for the diagnosis: en or bn
    #[arg(short, long, default_value = "en")]
    lang: String,

    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the .onnx model files
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Skip recording this analysis in the history
    #[arg(long)]
    no_history: bool,
}

impl AnalyzeCommand {
    pub fn execute(self) -> Result<()> {
        let crop: CropType = self.crop.parse()?;
        let language: Language = self.lang.parse()?;

        let mut config = super::load_config(self.config.as_deref(), self.model_dir)?;
        config.language = language;
        let mut analyzer = Analyzer::new(config);

        let result = match analyzer.analyze_file(&self.image, crop) {
            Ok(result) => result,
            Err(AnalysisError::TooBlurry { score, threshold }) => {
                // Distinguished outcome, not a crash: tell the user to retake
                eprintln!(
                    "Photo too blurry to analyze (focus score {score:.1}, needs {threshold:.0}). \
                     Hold the camera steady and try again."
                );
                std::process::exit(2);
            }
            Err(e) => return Err(e).context("Analysis failed"),
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            println!("Crop:       {}", result.crop);
            println!("Diagnosis:  {}", result.disease_info.name);
            println!("Confidence: {:.1}%", result.confidence);
            println!();
            println!("{}", result.disease_info.description);
            if !result.disease_info.solutions.is_empty() {
                println!();
                println!("Recommended actions:");
                for (i, solution) in result.disease_info.solutions.iter().enumerate() {
                    println!("  {}. {}", i + 1, solution);
                }
            }
        }

        if !self.no_history {
            let store = HistoryStore::default_location();
            if let Err(e) = store.append(&self.image.to_string_lossy(), &result) {
                // History is best-effort; the diagnosis already printed
                warn!("Failed to record history: {e}");
            }
        }

        Ok(())
    }
}
