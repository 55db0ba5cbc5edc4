use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::primary_face_selector::FaceSelection;
use crate::expression::domain::expression_state::NotifyPolicy;
use crate::shared::constants::{
    DEFAULT_PROGRESS_EVERY, DEFAULT_RENDER_FPS, DEFAULT_THROTTLE_INTERVAL, SETTINGS_DIR_NAME,
    SETTINGS_FILE_NAME,
};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// User-tunable pipeline settings, persisted as JSON.
///
/// Fields missing from the file fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub throttle_interval: usize,
    pub notify_policy: NotifyPolicy,
    pub face_selection: FaceSelection,
    pub render_fps: f64,
    pub progress_every: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            throttle_interval: DEFAULT_THROTTLE_INTERVAL,
            notify_policy: NotifyPolicy::Always,
            face_selection: FaceSelection::First,
            render_fps: DEFAULT_RENDER_FPS,
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME))
    }

    /// Loads from the per-user config directory, or defaults when absent or unreadable.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                log::warn!("{e}; using default settings");
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.throttle_interval, 8);
        assert_eq!(s.notify_policy, NotifyPolicy::Always);
        assert_eq!(s.face_selection, FaceSelection::First);
        assert_eq!(s.progress_every, DEFAULT_PROGRESS_EVERY);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            throttle_interval: 4,
            notify_policy: NotifyPolicy::OnChange,
            face_selection: FaceSelection::Nearest,
            render_fps: 24.0,
            progress_every: 5,
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"notify_policy": "on_change"}"#).unwrap();

        let s = Settings::load_from(&path).unwrap();
        assert_eq!(s.notify_policy, NotifyPolicy::OnChange);
        assert_eq!(s.throttle_interval, DEFAULT_THROTTLE_INTERVAL);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Settings::load_from(&path),
            Err(SettingsError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Settings::load_from(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(SettingsError::Io { .. })));
    }
}
