//! Bulk model preloading with progress events
//!
//! Loads the detector and all three classifiers in a fixed sequence so the
//! first real analysis does not pay cold-start cost, reporting progress
//! after each stage through a caller-supplied callback. Completion is
//! recorded as a flag file in the state directory; later runs short-circuit
//! on that flag. The flag is written only after every stage succeeds, so an
//! interrupted preload restarts from the first stage.

use agridoctor_classifier::ModelManager;
use agridoctor_common::{AnalysisError, CropType, Result};
use agridoctor_core::state::state_dir;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const FLAG_FILE: &str = "models_preloaded";

/// Stages of the preload sequence, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreloadStage {
    LeafDetector,
    Corn,
    Potato,
    Wheat,
    Complete,
}

impl PreloadStage {
    /// Loading stages, in order; `Complete` is the terminal event only
    const LOAD_ORDER: [PreloadStage; 4] = [
        PreloadStage::LeafDetector,
        PreloadStage::Corn,
        PreloadStage::Potato,
        PreloadStage::Wheat,
    ];

    #[must_use]
    pub fn percent(self) -> u8 {
        match self {
            PreloadStage::LeafDetector => 0,
            PreloadStage::Corn => 25,
            PreloadStage::Potato => 50,
            PreloadStage::Wheat => 75,
            PreloadStage::Complete => 100,
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            PreloadStage::LeafDetector => "Loading leaf detector...",
            PreloadStage::Corn => "Loading corn disease model...",
            PreloadStage::Potato => "Loading potato disease model...",
            PreloadStage::Wheat => "Loading wheat disease model...",
            PreloadStage::Complete => "All models ready",
        }
    }

    #[must_use]
    pub fn message_bn(self) -> &'static str {
        match self {
            PreloadStage::LeafDetector => "পাতা শনাক্তকারী লোড হচ্ছে...",
            PreloadStage::Corn => "ভুট্টার রোগ মডেল লোড হচ্ছে...",
            PreloadStage::Potato => "আলুর রোগ মডেল লোড হচ্ছে...",
            PreloadStage::Wheat => "গমের রোগ মডেল লোড হচ্ছে...",
            PreloadStage::Complete => "সব মডেল প্রস্তুত",
        }
    }
}

/// One progress event, emitted as each stage begins (and once on completion)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PreloadProgress {
    pub stage: PreloadStage,
    pub percent: u8,
    pub message: &'static str,
    pub message_bn: &'static str,
}

impl PreloadProgress {
    fn for_stage(stage: PreloadStage) -> Self {
        Self {
            stage,
            percent: stage.percent(),
            message: stage.message(),
            message_bn: stage.message_bn(),
        }
    }
}

fn flag_path() -> PathBuf {
    state_dir().join(FLAG_FILE)
}

/// Whether a previous preload ran to completion
#[must_use]
pub fn is_preloaded() -> bool {
    flag_path().exists()
}

/// Forget that a preload completed; the next run starts from stage one
pub fn reset() {
    let path = flag_path();
    if let Err(e) = std::fs::remove_file(&path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove preload flag {}: {}", path.display(), e);
        }
    }
}

/// Load every model through the manager, reporting progress
///
/// Short-circuits to a single `Complete` event if the preload flag is
/// already set.
///
/// # Errors
/// Returns the first stage failure; the flag stays unset in that case.
pub fn preload(
    manager: &mut ModelManager,
    on_progress: impl FnMut(&PreloadProgress),
) -> Result<()> {
    run(
        |stage| {
            match stage {
                PreloadStage::LeafDetector => {
                    manager.detector()?;
                }
                PreloadStage::Corn => {
                    manager.resolve_classifier(CropType::Corn)?;
                }
                PreloadStage::Potato => {
                    manager.resolve_classifier(CropType::Potato)?;
                }
                PreloadStage::Wheat => {
                    manager.resolve_classifier(CropType::Wheat)?;
                }
                PreloadStage::Complete => {}
            }
            Ok(())
        },
        on_progress,
        &flag_path(),
    )
}

/// Drive the preload sequence with an arbitrary stage loader.
/// Separated from [`preload`] so the sequencing rules are testable without
/// model files.
fn run(
    mut load: impl FnMut(PreloadStage) -> Result<()>,
    mut on_progress: impl FnMut(&PreloadProgress),
    flag: &Path,
) -> Result<()> {
    if flag.exists() {
        info!("Models already preloaded, skipping");
        on_progress(&PreloadProgress::for_stage(PreloadStage::Complete));
        return Ok(());
    }

    for stage in PreloadStage::LOAD_ORDER {
        on_progress(&PreloadProgress::for_stage(stage));
        load(stage).map_err(|e| {
            warn!("Preload aborted at {stage:?}: {e}");
            e
        })?;
    }

    // Flag only once everything is resident; a crash before this line
    // leaves the sequence restartable from the beginning
    std::fs::write(flag, b"1").map_err(AnalysisError::Io)?;
    info!("All models preloaded");
    on_progress(&PreloadProgress::for_stage(PreloadStage::Complete));
    Ok(())
}
