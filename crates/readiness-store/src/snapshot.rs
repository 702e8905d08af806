//! JSON snapshots of mutable records.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use readiness_core::model::{AttemptRecord, ProgressRecord};

/// Everything a [`crate::MemoryStore`] holds beyond the catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub progress: Vec<ProgressRecord>,
    #[serde(default)]
    pub attempts: Vec<AttemptRecord>,
    #[serde(default)]
    pub retracted_alerts: BTreeSet<String>,
}

impl Snapshot {
    /// Save the snapshot as JSON, creating parent directories as needed.
    ///
    /// The JSON goes to a temporary file in the same directory which is then
    /// renamed over `path`, so readers see either the old or the new state.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize snapshot")?;
        let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                parent
            }
            None => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("failed to create temp file in {}", parent.display()))?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path)
            .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
        tracing::debug!(
            path = %path.display(),
            progress = self.progress.len(),
            attempts = self.attempts.len(),
            "snapshot saved"
        );
        Ok(())
    }

    /// Load a snapshot from JSON. A missing file yields an empty snapshot.
    pub fn load_json(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no snapshot yet, starting empty");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot from {}", path.display()))?;
        let snapshot: Snapshot =
            serde_json::from_str(&content).context("failed to parse snapshot JSON")?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = Snapshot::load_json(&dir.path().join("state.json")).unwrap();
        assert!(snapshot.progress.is_empty());
        assert!(snapshot.attempts.is_empty());
    }

    #[test]
    fn save_creates_parent_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let mut snapshot = Snapshot::default();
        snapshot.progress.push(ProgressRecord::new("s1", "fire-101"));
        snapshot.retracted_alerts.insert("storm".into());
        snapshot.save_json(&path).unwrap();

        let loaded = Snapshot::load_json(&path).unwrap();
        assert_eq!(loaded.progress, snapshot.progress);
        assert!(loaded.retracted_alerts.contains("storm"));
    }

    #[test]
    fn save_replaces_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "stale").unwrap();

        let mut snapshot = Snapshot::default();
        snapshot.progress.push(ProgressRecord::new("s1", "fire-101"));
        snapshot.save_json(&path).unwrap();

        let loaded = Snapshot::load_json(&path).unwrap();
        assert_eq!(loaded.progress.len(), 1);
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Snapshot::load_json(&path).is_err());
    }
}
