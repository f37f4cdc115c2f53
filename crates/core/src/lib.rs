//! AgriDoctor core - shared infrastructure for the analysis pipeline
//!
//! Provides ONNX Runtime session construction, image decode helpers and the
//! persistent state directory used for the preload completion flag.

pub mod image_io;
pub mod onnx;
pub mod state;

pub use image_io::{decode_image, load_image, ImageIoError};
pub use onnx::{create_cpu_only_session, create_optimized_session, OnnxError};
pub use state::state_dir;
