//! Per-crop disease classifiers
//!
//! Covers the classifier half of the pipeline: the fixed label sets, tensor
//! preprocessing, the single-resident model lifecycle manager, and the
//! inference call itself.
//!
//! # Example
//! ```no_run
//! use agridoctor_classifier::{prepare, classify, ModelManager, CLASSIFIER_INPUT_SIZE};
//! use agridoctor_common::CropType;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut manager = ModelManager::new("models");
//! let region = image::open("cropped_leaf.jpg")?.to_rgb8();
//!
//! let tensor = prepare(&region, CLASSIFIER_INPUT_SIZE);
//! let session = manager.resolve_classifier(CropType::Corn)?;
//! let probabilities = classify(session, CropType::Corn, &tensor)?;
//! # Ok(())
//! # }
//! ```

pub mod labels;
pub mod manager;
pub mod preprocess;

use agridoctor_common::AnalysisError;
use ndarray::Array4;
use ort::{session::Session, value::TensorRef};
use thiserror::Error;
use tracing::debug;

pub use labels::{labels_for, CORN_LABELS, POTATO_LABELS, WHEAT_LABELS};
pub use manager::{ModelCatalog, ModelManager};
pub use preprocess::{prepare, CLASSIFIER_INPUT_SIZE};

/// Errors for classifier loading and inference
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Failed to load classifier model: {0}")]
    ModelLoad(String),

    #[error("Classifier inference error: {0}")]
    Inference(String),

    #[error("classifier output length {actual} does not match label set length {expected}")]
    OutputMismatch { expected: usize, actual: usize },
}

impl From<ClassifierError> for AnalysisError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::ModelLoad(msg) => AnalysisError::ModelLoad(msg),
            ClassifierError::Inference(msg) => AnalysisError::Inference(msg),
            ClassifierError::OutputMismatch { expected, actual } => {
                AnalysisError::OutputMismatch { expected, actual }
            }
        }
    }
}

/// Run one classifier over a prepared tensor and return the raw probabilities
///
/// Only plain numeric data survives this call; the output tensor is dropped
/// with the session outputs before returning.
///
/// # Errors
/// Returns an error if inference fails.
pub fn infer(session: &mut Session, input: &Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
    let input_tensor = TensorRef::from_array_view(input.view())
        .map_err(|e| ClassifierError::Inference(e.to_string()))?;

    let outputs = session
        .run(ort::inputs![input_tensor])
        .map_err(|e| ClassifierError::Inference(e.to_string()))?;

    let (_, data) = outputs[0]
        .try_extract_tensor::<f32>()
        .map_err(|e| ClassifierError::Inference(format!("Failed to extract tensor: {e}")))?;

    Ok(data.to_vec())
}

/// Run inference and validate the probability vector against the crop's
/// label set
///
/// The vector length must exactly equal the label set length; index
/// correspondence is positional and a mismatch means the deployed model
/// artifact is wrong for this crop.
///
/// # Errors
/// Returns an error if inference fails or the output length is wrong.
pub fn classify(
    session: &mut Session,
    crop: agridoctor_common::CropType,
    input: &Array4<f32>,
) -> Result<Vec<f32>, ClassifierError> {
    let probabilities = infer(session, input)?;
    let expected = labels_for(crop).len();
    if probabilities.len() != expected {
        return Err(ClassifierError::OutputMismatch {
            expected,
            actual: probabilities.len(),
        });
    }

    debug!("Classifier output for {crop}: {probabilities:?}");
    Ok(probabilities)
}
