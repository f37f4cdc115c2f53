//! Leaf detection using `YOLOv8` via ONNX Runtime
//!
//! Runs a generic 80-class COCO object detector over the full photo and
//! derives the leaf region to classify. COCO has no "leaf" class, so the
//! localizer works off a loose allow-list of plant-like classes with a
//! graceful fallback chain (see [`localizer`]).
//!
//! # Example
//! ```no_run
//! use agridoctor_leaf_detection::{LeafDetector, DetectorConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut detector = LeafDetector::new("models/yolov8n.onnx", DetectorConfig::default())?;
//!
//! let img = image::open("leaf.jpg")?.to_rgb8();
//! let cropped = detector.detect_and_crop(&img)?;
//! # Ok(())
//! # }
//! ```

pub mod localizer;

use agridoctor_common::AnalysisError;
use agridoctor_core::onnx::create_cpu_only_session;
use image::RgbImage;
use ndarray::Array;
use ort::{
    session::{Session, SessionOutputs},
    value::TensorRef,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

pub use localizer::{crop_to_subject, select_subject, PLANT_CLASSES};

/// Configuration for the leaf detector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Minimum confidence threshold for detections (0.0-1.0)
    pub confidence_threshold: f32,
    /// `IoU` threshold for non-maximum suppression (0.0-1.0)
    pub iou_threshold: f32,
    /// Maximum number of detections to keep per image
    pub max_detections: usize,
    /// Detector input size (`YOLOv8` default is 640x640)
    pub input_size: u32,
    /// Padding in pixels added around the chosen box before cropping
    pub crop_padding: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            max_detections: 300,
            input_size: 640,
            crop_padding: 20,
        }
    }
}

/// Bounding box with normalized coordinates (0-1)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X coordinate of top-left corner (normalized 0-1)
    pub x: f32,
    /// Y coordinate of top-left corner (normalized 0-1)
    pub y: f32,
    /// Width of box (normalized 0-1)
    pub width: f32,
    /// Height of box (normalized 0-1)
    pub height: f32,
}

impl BoundingBox {
    #[must_use]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Get area of bounding box
    #[must_use]
    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Calculate Intersection over Union (`IoU`) with another box
    #[must_use]
    #[inline]
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}

/// One candidate subject region
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    /// COCO class ID (0-79)
    pub class_id: u8,
    /// Human-readable class name
    pub class_name: String,
    /// Confidence score (0-1)
    pub confidence: f32,
    /// Bounding box with normalized coordinates
    pub bbox: BoundingBox,
}

/// Errors for leaf detection
#[derive(Debug, Error)]
pub enum LeafDetectionError {
    #[error("Failed to load detector model: {0}")]
    ModelLoad(String),

    #[error("Detector inference error: {0}")]
    Inference(String),

    #[error("ONNX Runtime error: {0}")]
    OnnxRuntime(#[from] ort::Error),
}

impl From<LeafDetectionError> for AnalysisError {
    fn from(err: LeafDetectionError) -> Self {
        match err {
            LeafDetectionError::ModelLoad(msg) => AnalysisError::ModelLoad(msg),
            LeafDetectionError::Inference(msg) => AnalysisError::Inference(msg),
            LeafDetectionError::OnnxRuntime(e) => AnalysisError::Inference(e.to_string()),
        }
    }
}

/// Leaf detector wrapping a `YOLOv8` ONNX session
pub struct LeafDetector {
    session: Session,
    config: DetectorConfig,
}

impl LeafDetector {
    /// Load the detector from an ONNX model file
    ///
    /// Uses CPU-only execution: `YOLOv8` exports are incompatible with some
    /// accelerated execution providers.
    ///
    /// # Errors
    /// Returns an error if the model cannot be loaded.
    pub fn new<P: AsRef<Path>>(
        model_path: P,
        config: DetectorConfig,
    ) -> Result<Self, LeafDetectionError> {
        info!("Loading leaf detector from {:?}", model_path.as_ref());
        let session = create_cpu_only_session(model_path.as_ref())
            .map_err(|e| LeafDetectionError::ModelLoad(e.to_string()))?;
        Ok(Self { session, config })
    }

    /// Detect candidate regions in an image
    ///
    /// # Errors
    /// Returns an error if inference fails.
    pub fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>, LeafDetectionError> {
        Self::detect_with_session(&mut self.session, image, &self.config)
    }

    /// Detect the subject and return the padded, clamped crop.
    /// Falls back to the full image when nothing usable is detected.
    ///
    /// # Errors
    /// Returns an error if inference fails; absence of detections is not an error.
    pub fn detect_and_crop(&mut self, image: &RgbImage) -> Result<RgbImage, LeafDetectionError> {
        let detections = self.detect(image)?;
        let subject = select_subject(&detections);
        Ok(crop_to_subject(image, subject, self.config.crop_padding))
    }

    /// Detect using a pre-loaded ONNX session (for model caching)
    ///
    /// # Errors
    /// Returns an error if preprocessing or inference fails.
    pub fn detect_with_session(
        session: &mut Session,
        image: &RgbImage,
        config: &DetectorConfig,
    ) -> Result<Vec<Detection>, LeafDetectionError> {
        debug!(
            "Running leaf detection on {}x{} image",
            image.width(),
            image.height()
        );

        let input_array = Self::preprocess(image, config);
        let outputs = Self::run_inference(session, &input_array)?;
        let detections = Self::postprocess(outputs, config)?;

        debug!("Detected {} candidate regions", detections.len());
        Ok(detections)
    }

    /// Preprocess image to `YOLOv8` input format (1, 3, H, W), normalized to [0, 1]
    fn preprocess(
        image: &RgbImage,
        config: &DetectorConfig,
    ) -> Array<f32, ndarray::Dim<[usize; 4]>> {
        let input_size = config.input_size;
        let resized = image::imageops::resize(
            image,
            input_size,
            input_size,
            image::imageops::FilterType::Triangle,
        );

        let mut input_array = Array::zeros((1, 3, input_size as usize, input_size as usize));
        for y in 0..input_size as usize {
            for x in 0..input_size as usize {
                let pixel = resized.get_pixel(x as u32, y as u32);
                input_array[[0, 0, y, x]] = f32::from(pixel[0]) / 255.0;
                input_array[[0, 1, y, x]] = f32::from(pixel[1]) / 255.0;
                input_array[[0, 2, y, x]] = f32::from(pixel[2]) / 255.0;
            }
        }
        input_array
    }

    fn run_inference<'a>(
        session: &'a mut Session,
        input: &Array<f32, ndarray::Dim<[usize; 4]>>,
    ) -> Result<SessionOutputs<'a>, LeafDetectionError> {
        // Zero-copy tensor: use view instead of clone
        let input_tensor = TensorRef::from_array_view(input.view())
            .map_err(|e| LeafDetectionError::Inference(e.to_string()))?;

        session
            .run(ort::inputs![input_tensor])
            .map_err(|e| LeafDetectionError::Inference(e.to_string()))
    }

    /// Decode the raw (1, 84, 8400) output tensor into detections
    fn postprocess(
        outputs: SessionOutputs,
        config: &DetectorConfig,
    ) -> Result<Vec<Detection>, LeafDetectionError> {
        // YOLOv8 output layout: (batch, 4 box coords + 80 class scores, anchors)
        let output = &outputs[0];
        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| LeafDetectionError::Inference(format!("Failed to extract tensor: {e}")))?;

        let dims = shape.as_ref();
        if dims.len() != 3 {
            return Err(LeafDetectionError::Inference(format!(
                "Expected 3D output tensor, got {}D",
                dims.len()
            )));
        }

        let num_anchors = dims[2] as usize;
        let mut raw_detections = Vec::with_capacity(num_anchors / 10);

        for anchor_idx in 0..num_anchors {
            // Data layout is [batch, features, anchors], so anchor i's
            // feature f lives at data[f * num_anchors + i]
            let get_feature = |feature_idx: usize| data[feature_idx * num_anchors + anchor_idx];

            let x_center = get_feature(0);
            let y_center = get_feature(1);
            let width = get_feature(2);
            let height = get_feature(3);

            let mut max_prob = 0.0f32;
            let mut max_class_id = 0usize;
            for class_id in 0..COCO_CLASSES.len() {
                let prob = get_feature(4 + class_id);
                if prob > max_prob {
                    max_prob = prob;
                    max_class_id = class_id;
                }
            }

            if max_prob < config.confidence_threshold {
                continue;
            }

            // Convert from center format to corner format and normalize
            let size = config.input_size as f32;
            let bbox = BoundingBox::new(
                (x_center - width / 2.0) / size,
                (y_center - height / 2.0) / size,
                width / size,
                height / size,
            );

            raw_detections.push(Detection {
                class_id: max_class_id as u8,
                class_name: coco_class_name(max_class_id as u8).to_string(),
                confidence: max_prob,
                bbox,
            });
        }

        let detections = Self::apply_nms(raw_detections, config);
        Ok(detections
            .into_iter()
            .take(config.max_detections)
            .collect())
    }

    /// Non-maximum suppression to remove duplicate detections
    fn apply_nms(mut detections: Vec<Detection>, config: &DetectorConfig) -> Vec<Detection> {
        detections.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut keep = Vec::with_capacity(detections.len());
        while !detections.is_empty() {
            let current = detections.swap_remove(0);
            detections.retain(|det| {
                det.class_id != current.class_id
                    || det.bbox.iou(&current.bbox) < config.iou_threshold
            });
            keep.push(current);
        }
        keep
    }
}

/// Get COCO class name from class ID (0-79)
#[must_use]
pub fn coco_class_name(class_id: u8) -> &'static str {
    COCO_CLASSES.get(class_id as usize).unwrap_or(&"unknown")
}

/// 80 COCO object classes (in order)
pub const COCO_CLASSES: &[&str] = &[
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "airplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "couch",
    "potted plant",
    "bed",
    "dining table",
    "toilet",
    "tv",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = DetectorConfig::default();
        assert_eq!(config.confidence_threshold, 0.25);
        assert_eq!(config.iou_threshold, 0.45);
        assert_eq!(config.max_detections, 300);
        assert_eq!(config.input_size, 640);
        assert_eq!(config.crop_padding, 20);
    }

    #[test]
    fn test_bbox_iou() {
        let box1 = BoundingBox::new(0.0, 0.0, 0.5, 0.5);
        let box2 = BoundingBox::new(0.25, 0.25, 0.5, 0.5);

        let iou = box1.iou(&box2);
        assert!(iou > 0.0 && iou < 1.0);

        let identical = BoundingBox::new(0.0, 0.0, 0.5, 0.5);
        assert!((box1.iou(&identical) - 1.0).abs() < 0.001);

        let disjoint = BoundingBox::new(0.6, 0.6, 0.3, 0.3);
        assert_eq!(box1.iou(&disjoint), 0.0);
    }

    #[test]
    fn test_bbox_area() {
        let bbox = BoundingBox::new(0.0, 0.0, 0.5, 0.4);
        assert_eq!(bbox.area(), 0.2);
    }

    #[test]
    fn test_coco_classes() {
        assert_eq!(COCO_CLASSES.len(), 80);
        assert_eq!(COCO_CLASSES[58], "potted plant");
        assert_eq!(COCO_CLASSES[46], "banana");
        assert_eq!(coco_class_name(49), "orange");
        assert_eq!(coco_class_name(200), "unknown");
    }

    #[test]
    fn test_nms_keeps_highest_confidence() {
        let config = DetectorConfig::default();
        let near_duplicate = |conf: f32| Detection {
            class_id: 58,
            class_name: "potted plant".to_string(),
            confidence: conf,
            bbox: BoundingBox::new(0.1, 0.1, 0.5, 0.5),
        };

        let kept = LeafDetector::apply_nms(
            vec![near_duplicate(0.4), near_duplicate(0.9), near_duplicate(0.6)],
            &config,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn test_nms_keeps_distinct_classes() {
        let config = DetectorConfig::default();
        let det = |class_id: u8, name: &str| Detection {
            class_id,
            class_name: name.to_string(),
            confidence: 0.8,
            bbox: BoundingBox::new(0.1, 0.1, 0.5, 0.5),
        };

        let kept = LeafDetector::apply_nms(vec![det(58, "potted plant"), det(46, "banana")], &config);
        assert_eq!(kept.len(), 2);
    }
}
