//! Application Settings
//!
//! On-disk configuration for the annotation engine: where videos, pose
//! streams, export artifacts, and the label database live. Settings are
//! stored as pretty-printed JSON and written atomically. A missing or
//! unreadable settings file falls back to defaults so a fresh install
//! works without any setup step.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::fs::atomic_write_json_pretty;
use crate::core::CoreResult;

/// Settings file name inside the data directory.
pub const SETTINGS_FILE: &str = "settings.json";

// =============================================================================
// Settings
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Root directory for all persistent state
    pub data_dir: PathBuf,
    /// Optional override for the label schema file; defaults to the
    /// built-in vocabulary when absent or missing on disk
    pub schema_path: Option<PathBuf>,
    /// Delete source videos after a successful export by default
    pub delete_source_after_export: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            schema_path: None,
            delete_source_after_export: false,
        }
    }
}

impl Settings {
    /// Where uploaded video files are stored.
    pub fn videos_dir(&self) -> PathBuf {
        self.data_dir.join("videos")
    }

    /// Where pose measurement streams are stored.
    pub fn poses_dir(&self) -> PathBuf {
        self.data_dir.join("poses")
    }

    /// Where export artifacts are written.
    pub fn exports_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }

    /// Location of the annotation database.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("annotations.db")
    }

    /// Effective label schema path.
    pub fn schema_path(&self) -> PathBuf {
        self.schema_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("label_schema.json"))
    }

    /// Loads settings from `path`, falling back to defaults when the file
    /// is missing. A file that exists but fails to parse also falls back,
    /// with a warning, rather than blocking startup.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read settings, using defaults");
                return Self::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to parse settings, using defaults");
                Self::default()
            }
        }
    }

    /// Persists settings to `path` atomically.
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        atomic_write_json_pretty(path, self)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cruxlabel")
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.data_dir.ends_with("cruxlabel"));
        assert!(settings.schema_path.is_none());
        assert!(!settings.delete_source_after_export);
        assert_eq!(settings.db_path(), settings.data_dir.join("annotations.db"));
        assert_eq!(
            settings.schema_path(),
            settings.data_dir.join("label_schema.json")
        );
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("nope.json"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load(&path), Settings::default());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);

        let settings = Settings {
            data_dir: dir.path().join("data"),
            schema_path: Some(dir.path().join("custom_schema.json")),
            delete_source_after_export: true,
        };
        settings.save(&path).unwrap();

        assert_eq!(Settings::load(&path), settings);
    }

    #[test]
    fn test_partial_file_uses_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, r#"{"deleteSourceAfterExport": true}"#).unwrap();

        let settings = Settings::load(&path);
        assert!(settings.delete_source_after_export);
        assert_eq!(settings.data_dir, Settings::default().data_dir);
    }
}
