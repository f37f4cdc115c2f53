//! Subject selection and cropping policy
//!
//! COCO has no "leaf" class, so the localizer applies a deliberately loose
//! three-tier fallback, in this exact order:
//!
//! 1. first detection whose class is on the plant-like allow-list
//! 2. first detection of any class
//! 3. the whole image, uncropped
//!
//! "First" means detector output order, which upstream does not guarantee to
//! be sorted by confidence; it is a documented heuristic, not a contract.
//! Changing the tier order silently changes cropping behavior, so keep it.

use crate::Detection;
use image::RgbImage;
use tracing::debug;

/// Plant-like COCO classes used as a proxy for "leaf"
pub const PLANT_CLASSES: &[&str] = &["potted plant", "broccoli", "orange", "apple", "banana"];

/// Pick the detection that should drive cropping, or `None` for full image
#[must_use]
pub fn select_subject(detections: &[Detection]) -> Option<&Detection> {
    if let Some(plant) = detections
        .iter()
        .find(|d| PLANT_CLASSES.contains(&d.class_name.as_str()))
    {
        return Some(plant);
    }

    let fallback = detections.first();
    if let Some(det) = fallback {
        debug!("No plant class found, falling back to: {}", det.class_name);
    }
    fallback
}

/// Crop the image around the chosen subject
///
/// The box is expanded by `padding` pixels on every side and clamped to the
/// image bounds, so the result is always a valid sub-rectangle with strictly
/// positive dimensions. With no subject the full image is returned.
#[must_use]
pub fn crop_to_subject(image: &RgbImage, subject: Option<&Detection>, padding: u32) -> RgbImage {
    let Some(det) = subject else {
        debug!("No detection, using full image");
        return image.clone();
    };

    let (img_w, img_h) = (image.width() as f32, image.height() as f32);
    let pad = padding as f32;

    // Normalized box to pixel coordinates, clamped into the image
    let box_x = (det.bbox.x * img_w).clamp(0.0, img_w - 1.0);
    let box_y = (det.bbox.y * img_h).clamp(0.0, img_h - 1.0);
    let box_w = (det.bbox.width * img_w).max(0.0);
    let box_h = (det.bbox.height * img_h).max(0.0);

    let crop_x = (box_x - pad).max(0.0);
    let crop_y = (box_y - pad).max(0.0);
    let crop_w = (box_w + pad * 2.0).min(img_w - crop_x).max(1.0);
    let crop_h = (box_h + pad * 2.0).min(img_h - crop_y).max(1.0);

    let x = crop_x.floor() as u32;
    let y = crop_y.floor() as u32;
    let w = (crop_w.floor() as u32).clamp(1, image.width() - x);
    let h = (crop_h.floor() as u32).clamp(1, image.height() - y);

    debug!("Cropping region: [{x}, {y}, {w}, {h}]");
    image::imageops::crop_imm(image, x, y, w, h).to_image()
}
