use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use marksort_engine::write_atomic;
use marksort_logging::{mark_info, mark_warn};
use serde::{Deserialize, Serialize};

/// Overrides the stored key when set to a non-empty value.
pub const API_KEY_ENV: &str = "MARKSORT_API_KEY";
pub const DEFAULT_SETTINGS_FILE: &str = ".marksort_settings.ron";

/// User settings persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_key: Option<String>,
    pub max_folders: Option<u32>,
    pub validate_urls: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            max_folders: None,
            validate_urls: true,
        }
    }
}

impl Settings {
    /// The credential to use: a non-empty override first, then the stored key.
    pub fn api_key_with_override(&self, env_value: Option<String>) -> Option<String> {
        env_value
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .or_else(|| self.api_key.clone().filter(|key| !key.is_empty()))
    }
}

/// Missing or unreadable settings fall back to defaults.
pub fn load_settings(path: &Path) -> Settings {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => return Settings::default(),
        Err(err) => {
            mark_warn!("Failed to read settings from {:?}: {}", path, err);
            return Settings::default();
        }
    };

    match ron::from_str(&content) {
        Ok(settings) => {
            mark_info!("Loaded settings from {:?}", path);
            settings
        }
        Err(err) => {
            mark_warn!("Failed to parse settings from {:?}: {}", path, err);
            Settings::default()
        }
    }
}

pub fn save_settings(path: &Path, settings: &Settings) -> anyhow::Result<()> {
    let pretty = ron::ser::PrettyConfig::new();
    let content = ron::ser::to_string_pretty(settings, pretty)?;
    write_atomic(path, &content)?;
    mark_info!("Saved settings to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let settings = load_settings(&temp.path().join("absent.ron"));
        assert_eq!(settings, Settings::default());
        assert!(settings.validate_urls);
    }

    #[test]
    fn saved_settings_load_back() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.ron");
        let settings = Settings {
            api_key: Some("abc123".to_string()),
            max_folders: Some(8),
            validate_urls: false,
        };

        save_settings(&path, &settings).unwrap();
        assert_eq!(load_settings(&path), settings);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.ron");
        fs::write(&path, "(api_key: Some(\"k\"))").unwrap();

        let settings = load_settings(&path);
        assert_eq!(settings.api_key.as_deref(), Some("k"));
        assert!(settings.validate_urls);
    }

    #[test]
    fn garbage_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.ron");
        fs::write(&path, "not ron at all {").unwrap();
        assert_eq!(load_settings(&path), Settings::default());
    }

    #[test]
    fn override_wins_unless_blank() {
        let settings = Settings {
            api_key: Some("stored".to_string()),
            ..Settings::default()
        };
        assert_eq!(
            settings.api_key_with_override(Some("from-env".to_string())).as_deref(),
            Some("from-env")
        );
        assert_eq!(
            settings.api_key_with_override(Some("  ".to_string())).as_deref(),
            Some("stored")
        );
        assert_eq!(settings.api_key_with_override(None).as_deref(), Some("stored"));
        assert_eq!(Settings::default().api_key_with_override(None), None);
    }
}
