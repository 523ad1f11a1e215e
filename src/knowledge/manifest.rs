//! Sync manifest stored at `specifications/version.json`.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::KnowledgeError;
use super::files::write_atomic;

/// Sync metadata written after every sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionManifest {
    /// All known protocol versions.
    pub versions: Vec<String>,
    /// The designated latest version.
    pub latest_version: String,
    /// When the sync finished.
    pub last_updated: DateTime<Utc>,
    /// Absolute local path to whether that file was obtained.
    pub sync_results: BTreeMap<String, bool>,
}

impl VersionManifest {
    /// Path of the manifest relative to the knowledge base root.
    pub const RELATIVE_PATH: &'static str = "specifications/version.json";

    /// Load a manifest from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self, KnowledgeError> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save the manifest atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn save(&self, path: &Path) -> Result<(), KnowledgeError> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, json.as_bytes()).await
    }

    /// Number of files recorded as failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.sync_results.values().filter(|ok| !**ok).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> VersionManifest {
        VersionManifest {
            versions: vec!["2024-11-05".to_string(), "2025-03-26".to_string()],
            latest_version: "2025-03-26".to_string(),
            last_updated: Utc::now(),
            sync_results: BTreeMap::from([
                ("/kb/a.json".to_string(), true),
                ("/kb/b.md".to_string(), false),
            ]),
        }
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("latestVersion").is_some());
        assert!(json.get("lastUpdated").is_some());
        assert_eq!(json["syncResults"]["/kb/b.md"], false);
    }

    #[test]
    fn test_failed_count() {
        assert_eq!(sample().failed_count(), 1);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(VersionManifest::RELATIVE_PATH);
        let manifest = sample();

        manifest.save(&path).await.unwrap();
        let loaded = VersionManifest::load(&path).await.unwrap();

        assert_eq!(loaded, manifest);
    }

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let err = VersionManifest::load(&temp_dir.path().join("nope.json"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
