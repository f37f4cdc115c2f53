//! End-to-end analysis orchestration
//!
//! `Analyzer` wires the stages together in fixed order: sharpness gate,
//! subject localization, tensor preprocessing, classification, result
//! resolution. The gate runs before any model is touched; a blurry photo
//! never costs a model load. `analyze` takes `&mut self`, so one analyzer
//! runs one analysis at a time.

use crate::resolver;
use agridoctor_classifier::{classify, prepare, ModelManager, CLASSIFIER_INPUT_SIZE};
use agridoctor_common::{AnalysisError, AnalysisResult, CropType, Language, Result};
use agridoctor_core::image_io::load_image;
use agridoctor_leaf_detection::{crop_to_subject, select_subject, DetectorConfig, LeafDetector};
use agridoctor_sharpness::{assess_sharpness, is_too_blurry, SharpnessConfig};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Analyzer configuration, loadable from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Directory holding the `.onnx` model artifacts
    pub model_dir: PathBuf,
    /// Display language for resolved disease information
    pub language: Language,
    /// Sharpness gate settings
    pub sharpness: SharpnessConfig,
    /// Subject localizer settings
    pub detector: DetectorConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            language: Language::En,
            sharpness: SharpnessConfig::default(),
            detector: DetectorConfig::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from a YAML file
    ///
    /// Missing fields fall back to defaults, so a partial file is valid.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        serde_yaml::from_str(&text).map_err(|e| AnalysisError::Config(e.to_string()))
    }
}

/// Runs the full analysis pipeline over single images
pub struct Analyzer {
    config: AnalyzerConfig,
    manager: ModelManager,
}

impl Analyzer {
    #[must_use]
    pub fn new(config: AnalyzerConfig) -> Self {
        let manager = ModelManager::new(&config.model_dir);
        Self { config, manager }
    }

    #[must_use]
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Model manager, exposed for preloading
    pub fn manager(&mut self) -> &mut ModelManager {
        &mut self.manager
    }

    /// Analyze an image file
    ///
    /// # Errors
    /// Returns an error if the file cannot be decoded or any stage fails.
    pub fn analyze_file(
        &mut self,
        path: impl AsRef<Path>,
        crop: CropType,
    ) -> Result<AnalysisResult> {
        let image = load_image(path.as_ref()).map_err(|e| AnalysisError::Image(e.to_string()))?;
        self.analyze(&image, crop)
    }

    /// Analyze a decoded image
    ///
    /// # Errors
    /// Returns `TooBlurry` before any model work if the photo fails the
    /// sharpness gate, otherwise whatever stage error occurred.
    pub fn analyze(&mut self, image: &RgbImage, crop: CropType) -> Result<AnalysisResult> {
        let score = assess_sharpness(image, &self.config.sharpness);
        if is_too_blurry(score, self.config.sharpness.blur_threshold) {
            info!("Rejecting blurry image: score {score:.2}");
            return Err(AnalysisError::TooBlurry {
                score,
                threshold: self.config.sharpness.blur_threshold,
            });
        }

        let region = {
            let session = self.manager.detector()?;
            let detections = LeafDetector::detect_with_session(session, image, &self.config.detector)?;
            let subject = select_subject(&detections);
            crop_to_subject(image, subject, self.config.detector.crop_padding)
        };
        debug!(
            "Classifying {}x{} region for {crop}",
            region.width(),
            region.height()
        );

        let tensor = prepare(&region, CLASSIFIER_INPUT_SIZE);
        let session = self.manager.resolve_classifier(crop)?;
        let probabilities = classify(session, crop, &tensor)?;

        let result = resolver::resolve(crop, &probabilities, self.config.language)?;
        info!(
            "Analysis complete: {} at {:.1}% confidence",
            result.disease_key, result.confidence
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::io::Write;

    #[test]
    fn test_config_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.model_dir, PathBuf::from("models"));
        assert_eq!(config.language, Language::En);
        assert_eq!(config.sharpness.blur_threshold, 100.0);
        assert_eq!(config.detector.crop_padding, 20);
    }

    #[test]
    fn test_config_from_partial_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "model_dir: /opt/agridoctor/models").unwrap();
        writeln!(file, "language: bn").unwrap();
        writeln!(file, "sharpness:").unwrap();
        writeln!(file, "  max_dimension: 256").unwrap();
        writeln!(file, "  blur_threshold: 80.0").unwrap();

        let config = AnalyzerConfig::from_yaml(file.path()).unwrap();
        assert_eq!(config.model_dir, PathBuf::from("/opt/agridoctor/models"));
        assert_eq!(config.language, Language::Bn);
        assert_eq!(config.sharpness.blur_threshold, 80.0);
        // Unspecified sections keep their defaults
        assert_eq!(config.detector.input_size, 640);
    }

    #[test]
    fn test_config_rejects_malformed_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "language: [not, a, string]").unwrap();
        let result = AnalyzerConfig::from_yaml(file.path());
        assert!(matches!(result, Err(AnalysisError::Config(_))));
    }

    #[test]
    fn test_blurry_image_never_touches_models() {
        // Model dir does not exist; if the gate ran after model loading
        // this would fail with ModelLoad instead of TooBlurry
        let config = AnalyzerConfig {
            model_dir: PathBuf::from("definitely/missing"),
            ..AnalyzerConfig::default()
        };
        let mut analyzer = Analyzer::new(config);

        let flat = RgbImage::from_pixel(64, 64, Rgb([90, 140, 70]));
        let result = analyzer.analyze(&flat, CropType::Corn);

        assert!(matches!(result, Err(AnalysisError::TooBlurry { .. })));
        assert_eq!(analyzer.manager().resident_crop(), None);
        assert!(!analyzer.manager().detector_loaded());
    }

    #[test]
    fn test_sharp_image_fails_on_missing_models_not_blur() {
        let config = AnalyzerConfig {
            model_dir: PathBuf::from("definitely/missing"),
            ..AnalyzerConfig::default()
        };
        let mut analyzer = Analyzer::new(config);

        let sharp = RgbImage::from_fn(64, 64, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let result = analyzer.analyze(&sharp, CropType::Corn);
        assert!(matches!(result, Err(AnalysisError::ModelLoad(_))));
    }
}
