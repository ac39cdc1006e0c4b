use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, Result};

/// Application configuration for AuraFilm
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Frame acquisition settings
    pub capture: CaptureConfig,

    /// Preset lookup settings
    pub presets: PresetConfig,

    /// Photo and recording output settings
    pub export: ExportConfig,
}

impl Config {
    /// `$HOME/.aurafilm/config.toml`, or a relative path when `HOME` is unset
    pub fn default_path() -> PathBuf {
        let base = std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        base.join(".aurafilm").join("config.toml")
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|_| ConfigError::ParseFailed {
            path: path.display().to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults on any failure
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{}; using default configuration", e);
                Self::default()
            }
        }
    }

    /// Save configuration to a TOML file, creating parent directories
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue {
            key: "config".to_string(),
            value: e.to_string(),
        })?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.capture.validate()?;
        self.presets.validate()?;
        self.export.validate()?;
        Ok(())
    }
}

/// Frame acquisition configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Processing width in pixels
    pub width: u32,

    /// Processing height in pixels
    pub height: u32,

    /// Nominal frame rate, used for recordings
    pub fps: f64,

    /// Stop after this many frames (0 = until the source ends)
    pub max_frames: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 30.0,
            max_frames: 0,
        }
    }
}

impl CaptureConfig {
    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidValue {
                key: "capture.resolution".to_string(),
                value: format!("{}x{}", self.width, self.height),
            }
            .into());
        }

        if !(self.fps > 0.0 && self.fps <= 240.0) {
            return Err(ConfigError::InvalidValue {
                key: "capture.fps".to_string(),
                value: self.fps.to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Preset lookup configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetConfig {
    /// Preset applied at startup
    pub last_preset: String,

    /// Directory of user presets, loaded after the built-ins
    pub user_dir: Option<PathBuf>,
}

impl Default for PresetConfig {
    fn default() -> Self {
        Self {
            last_preset: "portra_00s".to_string(),
            user_dir: None,
        }
    }
}

impl PresetConfig {
    fn validate(&self) -> Result<()> {
        if self.last_preset.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "presets.last_preset".to_string(),
                value: self.last_preset.clone(),
            }
            .into());
        }
        Ok(())
    }
}

/// Photo and recording output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory photos and recordings are written to
    pub captures_dir: PathBuf,

    /// Still image format (`jpg`, `png` or `bmp`)
    pub photo_format: String,

    /// FFmpeg video codec for recordings
    pub video_codec: String,

    /// Keep the staged PNG sequence after encoding
    pub keep_frames: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            captures_dir: PathBuf::from("captures"),
            photo_format: "jpg".to_string(),
            video_codec: "libx264".to_string(),
            keep_frames: false,
        }
    }
}

impl ExportConfig {
    fn validate(&self) -> Result<()> {
        if !matches!(self.photo_format.as_str(), "jpg" | "jpeg" | "png" | "bmp") {
            return Err(ConfigError::InvalidValue {
                key: "export.photo_format".to_string(),
                value: self.photo_format.clone(),
            }
            .into());
        }

        if self.video_codec.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "export.video_codec".to_string(),
                value: self.video_codec.clone(),
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.capture.width, 1280);
        assert_eq!(config.presets.last_preset, "portra_00s");
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("nested").join("config.toml");

        let mut saved = Config::default();
        saved.capture.max_frames = 120;
        saved.presets.user_dir = Some(PathBuf::from("/tmp/presets"));
        saved.export.keep_frames = true;

        saved.save_to_file(&file_path).unwrap();
        let loaded = Config::from_file(&file_path).unwrap();
        assert_eq!(saved, loaded);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("config.toml");
        std::fs::write(&file_path, "[capture]\nwidth = 640\nheight = 360\n").unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert_eq!(config.capture.width, 640);
        assert_eq!(config.capture.fps, 30.0);
        assert_eq!(config.export.photo_format, "jpg");
    }

    #[test]
    fn test_load_or_default_on_bad_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("config.toml");
        std::fs::write(&file_path, "this is not [toml").unwrap();

        assert!(Config::from_file(&file_path).is_err());
        assert_eq!(Config::load_or_default(&file_path), Config::default());
        assert_eq!(
            Config::load_or_default(dir.path().join("missing.toml")),
            Config::default()
        );
    }

    #[test]
    fn test_invalid_resolution() {
        let mut config = Config::default();
        config.capture.height = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_photo_format() {
        let mut config = Config::default();
        config.export.photo_format = "gif".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_path() {
        assert!(Config::default_path().ends_with(".aurafilm/config.toml"));
    }
}
