//! Analysis pipeline orchestration
//!
//! Ties the stage crates together: the [`Analyzer`] runs the full
//! photo-to-diagnosis sequence, the [`preloader`] warms every model ahead
//! of first use, and the [`history::HistoryStore`] records completed
//! analyses.
//!
//! # Example
//! ```no_run
//! use agridoctor_pipeline::{Analyzer, AnalyzerConfig};
//! use agridoctor_common::CropType;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut analyzer = Analyzer::new(AnalyzerConfig::default());
//! let result = analyzer.analyze_file("leaf.jpg", CropType::Potato)?;
//! println!("{}: {:.1}%", result.disease_key, result.confidence);
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod history;
pub mod preloader;
pub mod resolver;

pub use agridoctor_classifier::ModelManager;
pub use analyzer::{Analyzer, AnalyzerConfig};
pub use history::{HistoryEntry, HistoryStore};
pub use preloader::{is_preloaded, preload, PreloadProgress, PreloadStage};
