//! Result resolution
//!
//! Turns a raw probability vector into the final `AnalysisResult`:
//! first-occurrence argmax over the crop's label set, confidence scaled to
//! 0-100, and an exact-string lookup in the disease database. A database
//! miss means the deployed model and database drifted apart, so it is
//! surfaced as a data-integrity error rather than swallowed.

use agridoctor_classifier::labels_for;
use agridoctor_common::{AnalysisError, AnalysisResult, CropType, Language, Result};
use tracing::debug;

/// Resolve a probability vector into the final result
///
/// # Errors
/// Returns `OutputMismatch` if the vector length does not match the crop's
/// label set, and `UnknownDiseaseKey` if the winning label has no database
/// entry.
pub fn resolve(crop: CropType, probabilities: &[f32], language: Language) -> Result<AnalysisResult> {
    resolve_with_labels(crop, labels_for(crop), probabilities, language)
}

fn resolve_with_labels(
    crop: CropType,
    labels: &[&str],
    probabilities: &[f32],
    language: Language,
) -> Result<AnalysisResult> {
    if probabilities.len() != labels.len() {
        return Err(AnalysisError::OutputMismatch {
            expected: labels.len(),
            actual: probabilities.len(),
        });
    }

    // First-occurrence argmax: strict > keeps the earliest index on ties
    let mut winner = 0usize;
    for (idx, &p) in probabilities.iter().enumerate() {
        if p > probabilities[winner] {
            winner = idx;
        }
    }

    let disease_key = labels[winner];
    let confidence = probabilities[winner] * 100.0;
    debug!("Resolved {crop} -> {disease_key} at {confidence:.1}%");

    let disease_info = agridoctor_disease_db::lookup(crop, disease_key, language)
        .ok_or_else(|| AnalysisError::UnknownDiseaseKey {
            crop,
            key: disease_key.to_string(),
        })?
        .clone();

    Ok(AnalysisResult {
        crop,
        disease_key: disease_key.to_string(),
        confidence,
        disease_info,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_picks_highest() {
        let result = resolve(
            CropType::Corn,
            &[0.05, 0.1, 0.8, 0.05],
            Language::En,
        )
        .unwrap();
        assert_eq!(result.disease_key, "Corn___Healthy");
        assert_eq!(result.confidence, 80.0);
        assert_eq!(result.disease_info.name, "Healthy Leaf");
    }

    #[test]
    fn test_tie_breaks_to_first_occurrence() {
        let result = resolve(
            CropType::Potato,
            &[0.4, 0.4, 0.2],
            Language::En,
        )
        .unwrap();
        assert_eq!(result.disease_key, "Potato___Early_Blight");
    }

    #[test]
    fn test_confidence_is_exact_scaling() {
        let result = resolve(
            CropType::Wheat,
            &[0.125, 0.25, 0.625],
            Language::En,
        )
        .unwrap();
        assert_eq!(result.confidence, 62.5);
    }

    #[test]
    fn test_bengali_lookup() {
        let result = resolve(
            CropType::Wheat,
            &[0.9, 0.05, 0.05],
            Language::Bn,
        )
        .unwrap();
        assert_eq!(result.disease_key, "Wheat___Brown_Rust");
        assert_eq!(result.disease_info.name, "বাদামী মরিচা");
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let result = resolve(CropType::Corn, &[0.5, 0.5], Language::En);
        assert!(matches!(
            result,
            Err(AnalysisError::OutputMismatch {
                expected: 4,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_unknown_label_is_data_integrity_error() {
        let labels = ["Corn___Common_Rust", "Corn___Made_Up_Disease"];
        let result = resolve_with_labels(CropType::Corn, &labels, &[0.1, 0.9], Language::En);
        match result {
            Err(AnalysisError::UnknownDiseaseKey { crop, key }) => {
                assert_eq!(crop, CropType::Corn);
                assert_eq!(key, "Corn___Made_Up_Disease");
            }
            other => panic!("expected UnknownDiseaseKey, got {other:?}"),
        }
    }
}
