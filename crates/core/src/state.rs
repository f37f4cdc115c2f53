//! Persistent state directory
//!
//! Holds small flags that must survive restarts, such as the "models
//! preloaded" marker. Location priority:
//!
//! 1. `AGRIDOCTOR_STATE_DIR` environment variable, if set
//! 2. `$HOME/.local/state/agridoctor` (XDG state dir on Unix)
//! 3. `$TMPDIR/agridoctor` as a last resort
//!
//! The directory is created if it does not exist.

use std::path::PathBuf;
use tracing::warn;

/// Resolve the state directory, creating it if needed
#[must_use]
pub fn state_dir() -> PathBuf {
    let dir = if let Ok(dir) = std::env::var("AGRIDOCTOR_STATE_DIR") {
        PathBuf::from(dir)
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".local/state/agridoctor")
    } else {
        let tmp = std::env::var("TMPDIR").unwrap_or_else(|_| "/tmp".to_string());
        PathBuf::from(tmp).join("agridoctor")
    };

    if let Err(e) = std::fs::create_dir_all(&dir) {
        warn!("Failed to create state directory {}: {}", dir.display(), e);
    }
    dir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_dir_env_override() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("state");

        // Env vars are process-global; keep the mutation scoped to this test
        std::env::set_var("AGRIDOCTOR_STATE_DIR", &target);
        let dir = state_dir();
        std::env::remove_var("AGRIDOCTOR_STATE_DIR");

        assert_eq!(dir, target);
        assert!(dir.is_dir());
    }
}
