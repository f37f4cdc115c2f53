//! ONNX Runtime utilities for optimized model loading
//!
//! Helper functions for creating ONNX Runtime sessions with graph
//! optimizations, execution-provider fallback and thread tuning. Every model
//! in the pipeline (the leaf detector and the per-crop classifiers) goes
//! through one of these constructors.

use ort::execution_providers::{CPU as CPUExecutionProvider, CUDA as CUDAExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use std::path::Path;
use tracing::debug;

/// Error type for ONNX session construction
#[derive(Debug, thiserror::Error)]
pub enum OnnxError {
    #[error("Failed to create session builder: {0}")]
    SessionBuilder(String),

    #[error("Failed to load ONNX model from {path}: {error}")]
    ModelLoad { path: String, error: String },

    #[error("Model file not found: {0}")]
    ModelNotFound(String),
}

/// Intra-op thread count, overridable via `AGRIDOCTOR_THREADS`
fn intra_threads() -> usize {
    std::env::var("AGRIDOCTOR_THREADS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or_else(num_cpus::get_physical)
}

/// Create an optimized ONNX Runtime session
///
/// Configures maximum graph optimizations, intra-op parallelism matched to
/// physical cores, and execution providers in order CUDA then CPU. Used for
/// the per-crop classifier models.
///
/// # Errors
/// Returns an error if the model file is missing or session creation fails.
pub fn create_optimized_session(model_path: &Path) -> Result<Session, OnnxError> {
    if !model_path.exists() {
        return Err(OnnxError::ModelNotFound(model_path.display().to_string()));
    }

    debug!("Creating optimized session for {}", model_path.display());

    Session::builder()
        .map_err(|e| OnnxError::SessionBuilder(e.to_string()))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| OnnxError::SessionBuilder(e.to_string()))?
        .with_intra_threads(intra_threads())
        .map_err(|e| OnnxError::SessionBuilder(e.to_string()))?
        .with_memory_pattern(true)
        .map_err(|e| OnnxError::SessionBuilder(e.to_string()))?
        .with_execution_providers([
            CUDAExecutionProvider::default().build(),
            CPUExecutionProvider::default().build(),
        ])
        .map_err(|e| OnnxError::SessionBuilder(e.to_string()))?
        .commit_from_file(model_path)
        .map_err(|e| OnnxError::ModelLoad {
            path: model_path.display().to_string(),
            error: e.to_string(),
        })
}

/// Create an ONNX Runtime session with CPU-only execution
///
/// Used for the YOLOv8 leaf detector, which fails under accelerated
/// execution providers on some platforms.
///
/// # Errors
/// Returns an error if the model file is missing or session creation fails.
pub fn create_cpu_only_session(model_path: &Path) -> Result<Session, OnnxError> {
    if !model_path.exists() {
        return Err(OnnxError::ModelNotFound(model_path.display().to_string()));
    }

    debug!("Creating CPU-only session for {}", model_path.display());

    Session::builder()
        .map_err(|e| OnnxError::SessionBuilder(e.to_string()))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| OnnxError::SessionBuilder(e.to_string()))?
        .with_intra_threads(intra_threads())
        .map_err(|e| OnnxError::SessionBuilder(e.to_string()))?
        .with_memory_pattern(true)
        .map_err(|e| OnnxError::SessionBuilder(e.to_string()))?
        .with_execution_providers([CPUExecutionProvider::default().build()])
        .map_err(|e| OnnxError::SessionBuilder(e.to_string()))?
        .commit_from_file(model_path)
        .map_err(|e| OnnxError::ModelLoad {
            path: model_path.display().to_string(),
            error: e.to_string(),
        })
}
