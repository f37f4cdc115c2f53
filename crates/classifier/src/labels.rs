//! Fixed label sets, one per crop
//!
//! Output index IS the label identity: these arrays mirror the exported
//! model artifacts position by position. They are not alphabetical and must
//! never be reordered or re-derived.

use agridoctor_common::CropType;

pub const CORN_LABELS: &[&str] = &[
    "Corn___Common_Rust",
    "Corn___Gray_Leaf_Spot",
    "Corn___Healthy",
    "Corn___Leaf_Blight",
];

pub const POTATO_LABELS: &[&str] = &[
    "Potato___Early_Blight",
    "Potato___Healthy",
    "Potato___Late_Blight",
];

pub const WHEAT_LABELS: &[&str] = &[
    "Wheat___Brown_Rust",
    "Wheat___Healthy",
    "Wheat___Yellow_Rust",
];

/// Label set for a crop's classifier, in model output order
#[must_use]
pub fn labels_for(crop: CropType) -> &'static [&'static str] {
    match crop {
        CropType::Corn => CORN_LABELS,
        CropType::Potato => POTATO_LABELS,
        CropType::Wheat => WHEAT_LABELS,
    }
}
