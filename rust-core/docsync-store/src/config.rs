// SPDX-License-Identifier: PMPL-1.0-or-later
//! Datastore configuration.
//!
//! Defaults:
//! - root: `docsync-data`
//! - database_file: `docsync.redb`
//! - extensions_dir: `extensions`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Where a datastore keeps its files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatastoreConfig {
    /// Root directory; created on open.
    pub root: PathBuf,
    /// redb database file name, relative to `root`.
    pub database_file: String,
    /// Directory holding per-extension data folders, relative to `root`.
    pub extensions_dir: String,
}

impl DatastoreConfig {
    /// Default layout under the given root directory.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Load a configuration from a JSON file. Missing fields take their
    /// defaults.
    pub fn from_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Config(format!("read {}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| StoreError::Config(format!("parse {}: {e}", path.display())))
    }

    pub fn database_path(&self) -> PathBuf {
        self.root.join(&self.database_file)
    }

    pub fn extensions_path(&self) -> PathBuf {
        self.root.join(&self.extensions_dir)
    }
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("docsync-data"),
            database_file: "docsync.redb".to_string(),
            extensions_dir: "extensions".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DatastoreConfig::default();
        assert_eq!(config.database_path(), PathBuf::from("docsync-data/docsync.redb"));
        assert_eq!(config.extensions_path(), PathBuf::from("docsync-data/extensions"));
    }

    #[test]
    fn test_at_overrides_root_only() {
        let config = DatastoreConfig::at("/var/lib/docsync");
        assert_eq!(config.root, PathBuf::from("/var/lib/docsync"));
        assert_eq!(config.database_file, "docsync.redb");
    }

    #[test]
    fn test_from_file_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"root": "/data", "database_file": "main.redb"}"#).unwrap();

        let config = DatastoreConfig::from_file(&path).unwrap();
        assert_eq!(config.database_path(), PathBuf::from("/data/main.redb"));
        assert_eq!(config.extensions_dir, "extensions");
    }

    #[test]
    fn test_from_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            DatastoreConfig::from_file(&missing),
            Err(StoreError::Config(_))
        ));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{not json").unwrap();
        assert!(matches!(
            DatastoreConfig::from_file(&bad),
            Err(StoreError::Config(_))
        ));
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = DatastoreConfig::at("/tmp/x");
        let json = serde_json::to_string(&config).unwrap();
        let parsed: DatastoreConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
