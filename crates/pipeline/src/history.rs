//! Analysis history persistence
//!
//! Append-only JSONL file: one completed analysis per line, with an id and
//! Unix timestamp. The pipeline only ever appends; reading and clearing
//! exist for the presentation layer. Corrupt lines are skipped with a
//! warning rather than poisoning the whole file.

use agridoctor_common::{AnalysisResult, Result};
use agridoctor_core::state::state_dir;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

const HISTORY_FILE: &str = "history.jsonl";

/// One recorded analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Millisecond timestamp at record time, as a string id
    pub id: String,
    /// Unix timestamp in seconds
    pub timestamp: u64,
    /// Source image path as given to the analyzer
    pub image_path: String,
    /// The completed result
    pub result: AnalysisResult,
}

/// Append-only store of completed analyses
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Store backed by the default file in the state directory
    #[must_use]
    pub fn default_location() -> Self {
        Self::new(state_dir().join(HISTORY_FILE))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record one completed analysis
    ///
    /// # Errors
    /// Returns an error if the file cannot be appended to.
    pub fn append(&self, image_path: &str, result: &AnalysisResult) -> Result<()> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let entry = HistoryEntry {
            id: now.as_millis().to_string(),
            timestamp: now.as_secs(),
            image_path: image_path.to_string(),
            result: result.clone(),
        };

        let line = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        debug!("Recorded analysis {} in history", entry.id);
        Ok(())
    }

    /// All recorded entries, oldest first. A missing file is an empty history.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read.
    pub fn entries(&self) -> Result<Vec<HistoryEntry>> {
        let file = match std::fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Skipping corrupt history line: {e}"),
            }
        }
        Ok(entries)
    }

    /// Delete the whole history. Clearing an empty history is not an error.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agridoctor_common::{CropType, DiseaseInfo};

    fn sample_result() -> AnalysisResult {
        AnalysisResult {
            crop: CropType::Potato,
            disease_key: "Potato___Late_Blight".to_string(),
            confidence: 88.5,
            disease_info: DiseaseInfo {
                name: "Late Blight".to_string(),
                description: "Water-soaked lesions.".to_string(),
                solutions: vec!["Apply systemic fungicides immediately.".to_string()],
            },
        }
    }

    #[test]
    fn test_append_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join(HISTORY_FILE));

        store.append("leaf1.jpg", &sample_result()).unwrap();
        store.append("leaf2.jpg", &sample_result()).unwrap();

        let entries = store.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].image_path, "leaf1.jpg");
        assert_eq!(entries[1].image_path, "leaf2.jpg");
        assert_eq!(entries[0].result.disease_key, "Potato___Late_Blight");
        assert!(entries[0].timestamp > 0);
    }

    #[test]
    fn test_missing_file_is_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("never_written.jsonl"));
        assert!(store.entries().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_line_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(HISTORY_FILE);
        let store = HistoryStore::new(&path);

        store.append("good.jpg", &sample_result()).unwrap();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{ not json").unwrap();
        drop(file);
        store.append("also_good.jpg", &sample_result()).unwrap();

        let entries = store.entries().unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join(HISTORY_FILE));

        store.append("leaf.jpg", &sample_result()).unwrap();
        store.clear().unwrap();
        assert!(store.entries().unwrap().is_empty());
        // Second clear with no file present
        store.clear().unwrap();
    }
}
