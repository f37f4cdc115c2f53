/// Common types and errors shared across the analysis pipeline
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Supported crop types. Each crop has its own classifier model and label set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropType {
    Corn,
    Potato,
    Wheat,
}

impl CropType {
    /// All supported crops, in preload order
    pub const ALL: [CropType; 3] = [CropType::Corn, CropType::Potato, CropType::Wheat];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CropType::Corn => "corn",
            CropType::Potato => "potato",
            CropType::Wheat => "wheat",
        }
    }
}

impl std::fmt::Display for CropType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CropType {
    type Err = UnknownCrop;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "corn" => Ok(CropType::Corn),
            "potato" => Ok(CropType::Potato),
            "wheat" => Ok(CropType::Wheat),
            other => Err(UnknownCrop(other.to_string())),
        }
    }
}

/// Error for unrecognized crop names
#[derive(Debug, Error)]
#[error("unknown crop type: {0} (expected corn, potato or wheat)")]
pub struct UnknownCrop(pub String);

/// Display languages supported by the disease database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Bn,
}

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "en" => Ok(Language::En),
            "bn" => Ok(Language::Bn),
            other => Err(UnknownLanguage(other.to_string())),
        }
    }
}

/// Error for unrecognized language codes
#[derive(Debug, Error)]
#[error("unknown language: {0} (expected en or bn)")]
pub struct UnknownLanguage(pub String);

/// Display-ready information about one disease, in a single language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseInfo {
    /// Human-readable disease name
    pub name: String,
    /// Short description of symptoms
    pub description: String,
    /// Ordered remediation steps
    pub solutions: Vec<String>,
}

/// Final structured output of one successful pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Crop that was analyzed
    pub crop: CropType,
    /// Winning label in exact model-output form, e.g. `Corn___Common_Rust`
    pub disease_key: String,
    /// Winning probability scaled to 0-100
    pub confidence: f32,
    /// Resolved description in the requested display language
    pub disease_info: DiseaseInfo,
}

/// Pipeline error taxonomy
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Sharpness gate rejection. Raised before any model cost is incurred;
    /// the only remedy is retaking the photo.
    #[error("image too blurry for analysis (variance {score:.2} below threshold {threshold:.2})")]
    TooBlurry { score: f64, threshold: f64 },

    #[error("failed to load model: {0}")]
    ModelLoad(String),

    #[error("inference error: {0}")]
    Inference(String),

    /// The classifier produced a probability vector whose length does not
    /// match the crop's label set. Indicates a wrong or corrupt model artifact.
    #[error("classifier output length {actual} does not match label set length {expected}")]
    OutputMismatch { expected: usize, actual: usize },

    /// The winning label has no entry in the disease database. This is a
    /// deployment defect (model and database out of sync), not a bad photo.
    #[error("no disease entry for {crop} label {key:?}: model and database are out of sync")]
    UnknownDiseaseKey { crop: CropType, key: String },

    #[error("image error: {0}")]
    Image(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for AnalysisError {
    fn from(err: image::ImageError) -> Self {
        AnalysisError::Image(err.to_string())
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, AnalysisError>;
