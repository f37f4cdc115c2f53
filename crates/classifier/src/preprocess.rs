//! Tensor preprocessing for the disease classifiers
//!
//! Every classifier takes the same input: (1, 224, 224, 3) NHWC, f32,
//! normalized to [0, 1] by dividing by 255. The transform is deterministic
//! and independent of the crop type.

use image::RgbImage;
use ndarray::Array4;
use tracing::debug;

/// Classifier input side length (models are exported for 224x224)
pub const CLASSIFIER_INPUT_SIZE: u32 = 224;

/// Convert a pixel region into a classifier input tensor
///
/// Bilinear resize to `input_size` square, f32 conversion, /255
/// normalization, leading batch dimension of 1. The intermediate resized
/// buffer is dropped when this function returns.
#[must_use]
pub fn prepare(region: &RgbImage, input_size: u32) -> Array4<f32> {
    debug!(
        "Preparing {}x{} region as ({}, {}, {}, 3) tensor",
        region.width(),
        region.height(),
        1,
        input_size,
        input_size
    );

    let resized = if region.dimensions() == (input_size, input_size) {
        region.clone()
    } else {
        image::imageops::resize(
            region,
            input_size,
            input_size,
            image::imageops::FilterType::Triangle,
        )
    };

    let side = input_size as usize;
    let mut tensor = Array4::zeros((1, side, side, 3));
    for (x, y, pixel) in resized.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        tensor[[0, y, x, 0]] = f32::from(pixel[0]) / 255.0;
        tensor[[0, y, x, 1]] = f32::from(pixel[1]) / 255.0;
        tensor[[0, y, x, 2]] = f32::from(pixel[2]) / 255.0;
    }
    tensor
}
