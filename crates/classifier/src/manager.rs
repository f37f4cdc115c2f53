//! Model lifecycle management
//!
//! The manager keeps at most one classifier session resident at a time,
//! bounding memory at the cost of a reload when the user switches crop.
//! The shared leaf detector is loaded once and never evicted. All state is
//! explicit here; there are no globals.

use crate::ClassifierError;
use agridoctor_common::CropType;
use agridoctor_core::onnx::{create_cpu_only_session, create_optimized_session};
use ort::session::Session;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Maps crops to their model artifacts under a single model directory
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    model_dir: PathBuf,
}

impl ModelCatalog {
    pub fn new(model_dir: impl AsRef<Path>) -> Self {
        Self {
            model_dir: model_dir.as_ref().to_path_buf(),
        }
    }

    /// Path to a crop's classifier model
    #[must_use]
    pub fn classifier_path(&self, crop: CropType) -> PathBuf {
        let filename = match crop {
            CropType::Corn => "corn.onnx",
            CropType::Potato => "potato.onnx",
            CropType::Wheat => "wheat.onnx",
        };
        self.model_dir.join(filename)
    }

    /// Path to the shared leaf detector model
    #[must_use]
    pub fn detector_path(&self) -> PathBuf {
        self.model_dir.join("yolov8n.onnx")
    }
}

/// Single-resident cache slot: `Empty -> Loaded(crop)`
///
/// Generic over the handle type so the eviction ordering is testable
/// without real model files.
struct ResidentSlot<H> {
    resident: Option<(CropType, H)>,
}

impl<H> ResidentSlot<H> {
    fn new() -> Self {
        Self { resident: None }
    }

    fn resident_crop(&self) -> Option<CropType> {
        self.resident.as_ref().map(|(crop, _)| *crop)
    }

    fn clear(&mut self) {
        self.resident = None;
    }

    /// Return the cached handle for `crop`, loading it if needed.
    ///
    /// A different resident crop is released fully before `load` runs, so at
    /// most one handle exists at any instant. If `load` fails the slot is
    /// left empty; no partial handle is ever cached.
    fn resolve<E>(
        &mut self,
        crop: CropType,
        load: impl FnOnce() -> Result<H, E>,
    ) -> Result<&mut H, E> {
        match &mut self.resident {
            Some((resident_crop, _)) if *resident_crop == crop => {}
            slot => {
                *slot = None;
                let handle = load()?;
                *slot = Some((crop, handle));
            }
        }
        Ok(&mut self.resident.as_mut().expect("slot populated above").1)
    }
}

/// Owns the resident classifier session and the shared detector session
pub struct ModelManager {
    catalog: ModelCatalog,
    classifier: ResidentSlot<Session>,
    detector: Option<Session>,
}

impl ModelManager {
    pub fn new(model_dir: impl AsRef<Path>) -> Self {
        Self {
            catalog: ModelCatalog::new(model_dir),
            classifier: ResidentSlot::new(),
            detector: None,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Crop whose classifier is currently resident, if any
    #[must_use]
    pub fn resident_crop(&self) -> Option<CropType> {
        self.classifier.resident_crop()
    }

    /// Whether the shared detector has been loaded
    #[must_use]
    pub fn detector_loaded(&self) -> bool {
        self.detector.is_some()
    }

    /// Release the resident classifier, if any
    pub fn evict_classifier(&mut self) {
        if let Some(crop) = self.classifier.resident_crop() {
            debug!("Evicting {crop} classifier");
        }
        self.classifier.clear();
    }

    /// Resolve the classifier session for a crop
    ///
    /// Cache hit costs no I/O. A different resident classifier is released
    /// before the requested one is loaded.
    ///
    /// # Errors
    /// Returns an error if the model cannot be loaded; the manager is left
    /// with no resident classifier in that case.
    pub fn resolve_classifier(&mut self, crop: CropType) -> Result<&mut Session, ClassifierError> {
        if self.classifier.resident_crop() == Some(crop) {
            debug!("Using cached {crop} classifier");
        }
        let path = self.catalog.classifier_path(crop);
        self.classifier.resolve(crop, || {
            info!("Loading {crop} classifier from {}", path.display());
            create_optimized_session(&path).map_err(|e| ClassifierError::ModelLoad(e.to_string()))
        })
    }

    /// Resolve the shared leaf detector session, loading it on first use.
    /// Once loaded it persists for the manager's lifetime.
    ///
    /// # Errors
    /// Returns an error if the detector model cannot be loaded.
    pub fn detector(&mut self) -> Result<&mut Session, ClassifierError> {
        match &mut self.detector {
            Some(session) => Ok(session),
            slot => {
                let path = self.catalog.detector_path();
                info!("Loading leaf detector from {}", path.display());
                let session = create_cpu_only_session(&path)
                    .map_err(|e| ClassifierError::ModelLoad(e.to_string()))?;
                Ok(slot.insert(session))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::convert::Infallible;
    use std::rc::Rc;

    /// Handle that records its own release
    struct TrackedHandle {
        id: u32,
        drops: Rc<Cell<u32>>,
    }

    impl Drop for TrackedHandle {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut slot: ResidentSlot<u32> = ResidentSlot::new();
        let loads = Cell::new(0u32);

        for _ in 0..3 {
            let handle = slot
                .resolve(CropType::Corn, || -> Result<u32, Infallible> {
                    loads.set(loads.get() + 1);
                    Ok(7)
                })
                .unwrap();
            assert_eq!(*handle, 7);
        }

        // Model I/O happened exactly once across repeated resolutions
        assert_eq!(loads.get(), 1);
        assert_eq!(slot.resident_crop(), Some(CropType::Corn));
    }

    #[test]
    fn test_switch_releases_previous_before_load() {
        let drops = Rc::new(Cell::new(0u32));
        let mut slot: ResidentSlot<TrackedHandle> = ResidentSlot::new();

        let drops_for_load = drops.clone();
        slot.resolve(CropType::Corn, || -> Result<_, Infallible> {
            Ok(TrackedHandle {
                id: 1,
                drops: drops_for_load.clone(),
            })
        })
        .unwrap();
        assert_eq!(drops.get(), 0);

        // Loading potato must observe corn already released
        let drops_for_assert = drops.clone();
        let handle = slot
            .resolve(CropType::Potato, || -> Result<_, Infallible> {
                assert_eq!(
                    drops_for_assert.get(),
                    1,
                    "previous classifier still resident during load"
                );
                Ok(TrackedHandle {
                    id: 2,
                    drops: drops_for_assert.clone(),
                })
            })
            .unwrap();
        assert_eq!(handle.id, 2);
        assert_eq!(slot.resident_crop(), Some(CropType::Potato));
    }

    #[test]
    fn test_failed_load_leaves_slot_empty() {
        let mut slot: ResidentSlot<u32> = ResidentSlot::new();
        slot.resolve(CropType::Corn, || -> Result<u32, Infallible> { Ok(1) })
            .unwrap();

        let result = slot.resolve(CropType::Wheat, || Err("artifact corrupt"));
        assert_eq!(result.unwrap_err(), "artifact corrupt");
        // No partial handle cached; next resolve must load again
        assert_eq!(slot.resident_crop(), None);

        let loads = Cell::new(0u32);
        slot.resolve(CropType::Corn, || -> Result<u32, Infallible> {
            loads.set(loads.get() + 1);
            Ok(1)
        })
        .unwrap();
        assert_eq!(loads.get(), 1);
    }

    #[test]
    fn test_clear_releases_handle() {
        let drops = Rc::new(Cell::new(0u32));
        let mut slot: ResidentSlot<TrackedHandle> = ResidentSlot::new();

        let drops_for_load = drops.clone();
        slot.resolve(CropType::Corn, || -> Result<_, Infallible> {
            Ok(TrackedHandle {
                id: 1,
                drops: drops_for_load.clone(),
            })
        })
        .unwrap();

        slot.clear();
        assert_eq!(drops.get(), 1);
        assert_eq!(slot.resident_crop(), None);
    }

    #[test]
    fn test_catalog_paths() {
        let catalog = ModelCatalog::new("models");
        assert_eq!(
            catalog.classifier_path(CropType::Corn),
            PathBuf::from("models/corn.onnx")
        );
        assert_eq!(
            catalog.classifier_path(CropType::Potato),
            PathBuf::from("models/potato.onnx")
        );
        assert_eq!(
            catalog.classifier_path(CropType::Wheat),
            PathBuf::from("models/wheat.onnx")
        );
        assert_eq!(catalog.detector_path(), PathBuf::from("models/yolov8n.onnx"));
    }

    #[test]
    fn test_manager_load_failure_keeps_no_resident() {
        // Point at a directory with no model files: load fails, manager
        // stays empty rather than caching a corrupt handle
        let mut manager = ModelManager::new("definitely/missing");
        let result = manager.resolve_classifier(CropType::Corn);
        assert!(matches!(result, Err(ClassifierError::ModelLoad(_))));
        assert_eq!(manager.resident_crop(), None);
        assert!(!manager.detector_loaded());
    }
}
