//! Disease information database
//!
//! Two-level lookup: crop, then exact model-output label, then language.
//! Keys match the classifier label sets character for character; the lookup
//! never normalizes or fuzzes. A miss returns `None` and the caller decides
//! how to escalate (the pipeline treats it as a data-integrity failure).
//!
//! The table ships embedded in the binary so lookups work offline.

use agridoctor_common::{CropType, DiseaseInfo, Language};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;

/// One disease entry in both supported languages
#[derive(Debug, Clone, Deserialize)]
struct LocalizedEntry {
    en: DiseaseInfo,
    bn: DiseaseInfo,
}

/// crop name -> exact label -> localized entry
type RawDatabase = HashMap<String, HashMap<String, LocalizedEntry>>;

static DATABASE: Lazy<RawDatabase> = Lazy::new(|| {
    serde_json::from_str(include_str!("../data/diseases.json"))
        .expect("embedded disease database is valid JSON")
});

/// Look up display information for an exact label string
///
/// Returns `None` when the crop or label has no entry; never errors.
#[must_use]
pub fn lookup(crop: CropType, disease_key: &str, language: Language) -> Option<&'static DiseaseInfo> {
    let entry = DATABASE.get(crop.as_str())?.get(disease_key)?;
    Some(match language {
        Language::En => &entry.en,
        Language::Bn => &entry.bn,
    })
}

/// All known disease keys for a crop
#[must_use]
pub fn diseases_for(crop: CropType) -> Vec<&'static str> {
    DATABASE
        .get(crop.as_str())
        .map(|entries| {
            let mut keys: Vec<&'static str> = entries.keys().map(String::as_str).collect();
            keys.sort_unstable();
            keys
        })
        .unwrap_or_default()
}
