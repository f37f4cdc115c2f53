//! Sharpness gate - blur rejection via Laplacian variance
//!
//! Sharp images carry high-frequency content, so the variance of their
//! Laplacian response is high; blurry images have low variance. The gate
//! runs before any model is loaded, so an unusable photo costs no inference
//! time.
//!
//! # Example
//! ```no_run
//! use agridoctor_sharpness::{assess_sharpness, is_too_blurry, SharpnessConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SharpnessConfig::default();
//! let img = image::open("leaf.jpg")?.to_rgb8();
//!
//! let score = assess_sharpness(&img, &config);
//! if is_too_blurry(score, config.blur_threshold) {
//!     println!("retake the photo");
//! }
//! # Ok(())
//! # }
//! ```

use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for the sharpness gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharpnessConfig {
    /// Longer image side is downscaled to at most this before scoring.
    /// Bounds cost only; the full-resolution image continues down the pipeline.
    pub max_dimension: u32,
    /// Variance threshold below which an image is rejected as blurry
    pub blur_threshold: f64,
}

impl Default for SharpnessConfig {
    fn default() -> Self {
        Self {
            max_dimension: 256,
            blur_threshold: 100.0,
        }
    }
}

/// Compute the Laplacian-variance focus score for an image
///
/// The image is downscaled so its longer side does not exceed
/// `config.max_dimension` (aspect preserved), converted to luminance with
/// the fixed weights 0.299 R + 0.587 G + 0.114 B, convolved with the
/// discrete Laplacian kernel over interior pixels only, and the population
/// variance of the response is returned.
#[must_use]
pub fn assess_sharpness(image: &RgbImage, config: &SharpnessConfig) -> f64 {
    let scaled = downscale_for_scoring(image, config.max_dimension);
    let (width, height) = (scaled.width() as usize, scaled.height() as usize);

    let gray = luminance(&scaled);
    let laplacian = laplacian_interior(&gray, width, height);

    let score = population_variance(&laplacian);
    debug!(
        "Sharpness score {:.2} at {}x{} (threshold {:.2})",
        score, width, height, config.blur_threshold
    );
    score
}

/// Whether a focus score falls below the blur threshold
#[must_use]
#[inline]
pub fn is_too_blurry(score: f64, threshold: f64) -> bool {
    score < threshold
}

/// Downscale so the longer side is at most `max_dimension`, preserving aspect.
/// Images already within bounds are passed through untouched.
fn downscale_for_scoring(image: &RgbImage, max_dimension: u32) -> RgbImage {
    let (w, h) = image.dimensions();
    let max_dim = f64::from(max_dimension);
    let scale = (max_dim / f64::from(w)).min(max_dim / f64::from(h)).min(1.0);

    if scale >= 1.0 {
        return image.clone();
    }

    let new_w = ((f64::from(w) * scale).floor() as u32).max(1);
    let new_h = ((f64::from(h) * scale).floor() as u32).max(1);
    image::imageops::resize(image, new_w, new_h, image::imageops::FilterType::Triangle)
}

/// Luminosity-weighted grayscale conversion
fn luminance(image: &RgbImage) -> Vec<f64> {
    image
        .pixels()
        .map(|p| {
            0.299 * f64::from(p[0]) + 0.587 * f64::from(p[1]) + 0.114 * f64::from(p[2])
        })
        .collect()
}

/// Laplacian kernel [[0,1,0],[1,-4,1],[0,1,0]] over interior pixels only,
/// no border padding: yields a (W-2) x (H-2) response.
fn laplacian_interior(gray: &[f64], width: usize, height: usize) -> Vec<f64> {
    if width < 3 || height < 3 {
        return Vec::new();
    }

    let mut response = Vec::with_capacity((width - 2) * (height - 2));
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let idx = y * width + x;
            let lap = gray[idx - width] + gray[idx - 1] + gray[idx + 1] + gray[idx + width]
                - 4.0 * gray[idx];
            response.push(lap);
        }
    }
    response
}

/// Population variance; empty input scores 0 (treated as maximally blurry)
fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use imageproc::filter::gaussian_blur_f32;

    /// High-frequency checkerboard, maximally sharp
    fn checkerboard(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        })
    }

    #[test]
    fn test_flat_image_scores_zero() {
        let img = RgbImage::from_pixel(64, 64, Rgb([120, 180, 90]));
        let score = assess_sharpness(&img, &SharpnessConfig::default());
        assert!(score < 1e-6, "flat image scored {score}");
    }

    #[test]
    fn test_flat_image_is_rejected() {
        let config = SharpnessConfig::default();
        let img = RgbImage::from_pixel(64, 64, Rgb([120, 180, 90]));
        let score = assess_sharpness(&img, &config);
        assert!(is_too_blurry(score, config.blur_threshold));
    }

    #[test]
    fn test_checkerboard_passes_gate() {
        let config = SharpnessConfig::default();
        let score = assess_sharpness(&checkerboard(64, 64), &config);
        assert!(
            !is_too_blurry(score, config.blur_threshold),
            "checkerboard scored {score}, below threshold {}",
            config.blur_threshold
        );
    }

    #[test]
    fn test_gaussian_blur_lowers_score() {
        let config = SharpnessConfig::default();
        let sharp = checkerboard(128, 128);
        let blurred = gaussian_blur_f32(&sharp, 4.0);

        let sharp_score = assess_sharpness(&sharp, &config);
        let blurred_score = assess_sharpness(&blurred, &config);

        assert!(
            blurred_score < sharp_score,
            "blurred {blurred_score} not below sharp {sharp_score}"
        );
        assert!(is_too_blurry(blurred_score, config.blur_threshold));
    }

    #[test]
    fn test_large_image_is_downscaled_not_upscaled() {
        // Same pattern at a size already under the bound should not change
        let config = SharpnessConfig::default();
        let small = checkerboard(100, 60);
        let score_small = assess_sharpness(&small, &config);

        // A 3000x2000 image is downscaled to fit within 256; the call must
        // still terminate quickly and produce a finite score
        let large = checkerboard(3000, 2000);
        let score_large = assess_sharpness(&large, &config);

        assert!(score_small.is_finite());
        assert!(score_large.is_finite());
    }

    #[test]
    fn test_tiny_image_scores_zero() {
        // 2x2 has no interior pixels, so the response is empty
        let img = checkerboard(2, 2);
        let score = assess_sharpness(&img, &SharpnessConfig::default());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_variance_is_population_variance() {
        // Values [1, 3] have mean 2 and population variance 1 (not 2)
        assert_eq!(population_variance(&[1.0, 3.0]), 1.0);
        assert_eq!(population_variance(&[]), 0.0);
    }
}
