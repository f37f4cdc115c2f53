//! AgriDoctor - on-device crop disease analysis
//!
//! Facade over the pipeline crates. Most callers only need the
//! [`Analyzer`] and the shared domain types.
//!
//! # Example
//! ```no_run
//! use agridoctor::{Analyzer, AnalyzerConfig, CropType};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut analyzer = Analyzer::new(AnalyzerConfig::default());
//! let result = analyzer.analyze_file("leaf.jpg", CropType::Corn)?;
//! println!("{} ({:.1}%)", result.disease_info.name, result.confidence);
//! # Ok(())
//! # }
//! ```

pub use agridoctor_common::{
    AnalysisError, AnalysisResult, CropType, DiseaseInfo, Language, Result,
};
pub use agridoctor_pipeline::{
    is_preloaded, preload, Analyzer, AnalyzerConfig, HistoryEntry, HistoryStore, ModelManager,
    PreloadProgress, PreloadStage,
};
