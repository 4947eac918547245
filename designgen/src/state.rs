//! Generation state store.
//!
//! One entry per emitted artifact path, holding two fingerprints of its
//! generated region: the content this tool produced, and the region as it
//! sat on disk once post-generation hooks finished. The second one is the
//! baseline for detecting hand edits; the first one tells whether a rewrite
//! is needed at all. Internal format, not a public contract.

use crate::error::StoreError;
use crate::registry::write_store;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// Default state filename inside the state directory.
pub const STATE_FILENAME: &str = "state.json";

const STATE_VERSION: u32 = 1;

/// Fingerprints recorded for one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct StateEntry {
    /// Fingerprint of the generated region this tool emitted.
    pub generated: String,
    /// Fingerprint of the generated region found on disk after hooks.
    pub disk: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct GenerationState {
    version: u32,
    artifacts: BTreeMap<String, StateEntry>,
}

impl Default for GenerationState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            artifacts: BTreeMap::new(),
        }
    }
}

/// SHA-256 of a generated region, hex encoded.
pub(crate) fn fingerprint(region: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(region.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl StateEntry {
    /// Entry for a region that is on disk exactly as generated.
    pub fn emitted(generated_region: &str) -> Self {
        let fp = fingerprint(generated_region);
        Self {
            generated: fp.clone(),
            disk: fp,
        }
    }
}

impl GenerationState {
    /// Load the state; a missing file yields an empty state.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| StoreError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let state: Self = serde_json::from_str(&content)
            .map_err(|e| StoreError::corrupt(path.to_path_buf(), e.to_string()))?;
        if state.version != STATE_VERSION {
            return Err(StoreError::corrupt(
                path.to_path_buf(),
                format!("unsupported state version {}", state.version),
            ));
        }
        Ok(state)
    }

    /// Persist the state.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let mut json =
            serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string());
        json.push('\n');
        write_store(path, &json)
    }

    pub fn get(&self, path: &str) -> Option<&StateEntry> {
        self.artifacts.get(path)
    }

    pub fn record(&mut self, path: impl Into<String>, entry: StateEntry) {
        self.artifacts.insert(path.into(), entry);
    }

    pub fn remove(&mut self, path: &str) -> Option<StateEntry> {
        self.artifacts.remove(path)
    }

    /// Update the on-disk fingerprint of a tracked path.
    pub fn refresh_disk(&mut self, path: &str, disk_region: &str) -> bool {
        match self.artifacts.get_mut(path) {
            Some(entry) => {
                let fp = fingerprint(disk_region);
                let changed = entry.disk != fp;
                entry.disk = fp;
                changed
            }
            None => false,
        }
    }

    /// Tracked artifact paths, sorted.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.artifacts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fingerprint_is_stable_hex() {
        let fp = fingerprint("export const colors = {} as const;\n");
        assert_eq!(fp.len(), 64);
        assert_eq!(fp, fingerprint("export const colors = {} as const;\n"));
        assert_ne!(fp, fingerprint("export const colors = {};\n"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".designgen").join(STATE_FILENAME);

        let mut state = GenerationState::default();
        state.record("tokens/colors.ts", StateEntry::emitted("a"));
        state.save(&path).unwrap();

        let loaded = GenerationState::load(&path).unwrap();
        assert_eq!(loaded, state);
        assert_eq!(loaded.get("tokens/colors.ts").unwrap().disk, fingerprint("a"));
    }

    #[test]
    fn test_refresh_disk_reports_change() {
        let mut state = GenerationState::default();
        state.record("index.ts", StateEntry::emitted("a"));

        assert!(!state.refresh_disk("index.ts", "a"));
        assert!(state.refresh_disk("index.ts", "a formatted"));
        let entry = state.get("index.ts").unwrap();
        assert_eq!(entry.generated, fingerprint("a"));
        assert_eq!(entry.disk, fingerprint("a formatted"));
        assert!(!state.refresh_disk("missing.ts", "x"));
    }

    #[test]
    fn test_unknown_version_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(STATE_FILENAME);
        std::fs::write(&path, r#"{"version": 9, "artifacts": {}}"#).unwrap();
        assert!(matches!(
            GenerationState::load(&path),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
