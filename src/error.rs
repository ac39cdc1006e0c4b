use thiserror::Error;

/// Main error type for the AURAfilm library
///
/// The frame pipeline itself never fails; these errors come from the
/// surfaces around it (configuration, presets, frame sources and writers).
#[derive(Error, Debug)]
pub enum FilmError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Preset error: {0}")]
    Preset(#[from] PresetError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration and parameter errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Unknown parameter: {name}")]
    UnknownField { name: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Preset loading and saving errors
#[derive(Error, Debug)]
pub enum PresetError {
    #[error("Preset not found: {name}")]
    NotFound { name: String },

    #[error("Failed to parse preset file: {path} - {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("Failed to serialize preset: {name} - {reason}")]
    SerializeFailed { name: String, reason: String },

    #[error("Invalid preset name: {name}")]
    InvalidName { name: String },
}

/// Frame source errors
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to open frame source: {path}")]
    OpenFailed { path: String },

    #[error("Failed to decode frame: {path} - {reason}")]
    DecodeFailed { path: String, reason: String },

    #[error("No frames found in: {path}")]
    NoFrames { path: String },

    #[error("Invalid frame size: {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
}

/// Photo and recording writer errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No frame available to capture")]
    NoFrame,

    #[error("Failed to write image: {path} - {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("Video encoding failed: {reason}")]
    EncodingFailed { reason: String },

    #[error("Recording is not active")]
    NotRecording,

    #[error("Recording already in progress: {path}")]
    AlreadyRecording { path: String },

    #[error("Resolution is locked at {width}x{height} while recording")]
    ResolutionLocked { width: u32, height: u32 },
}

/// Convenience type alias for Results using FilmError
pub type Result<T> = std::result::Result<T, FilmError>;

impl FilmError {
    /// Check if this error is recoverable (the session can keep running)
    pub fn is_recoverable(&self) -> bool {
        match self {
            // IO errors might be temporary
            Self::Io(_) => true,
            // A single bad frame or a failed photo does not end the session
            Self::Capture(CaptureError::DecodeFailed { .. }) => true,
            Self::Export(ExportError::WriteFailed { .. }) => true,
            Self::Export(ExportError::NoFrame) => true,
            Self::Export(ExportError::ResolutionLocked { .. }) => true,
            Self::Preset(PresetError::NotFound { .. }) => true,
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Preset(PresetError::NotFound { name }) => {
                format!(
                    "Preset '{}' not found. Use --list-presets to see the available looks.",
                    name
                )
            }
            Self::Capture(CaptureError::OpenFailed { path }) => {
                format!(
                    "Could not open '{}'. Please check it is an image or a directory of images.",
                    path
                )
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            Self::Export(ExportError::EncodingFailed { .. }) => {
                "Video encoding failed. Make sure FFmpeg is installed and on your PATH.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        let err: FilmError = ExportError::NoFrame.into();
        assert!(err.is_recoverable());

        let err: FilmError = ConfigError::UnknownField { name: "tone.foo".into() }.into();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_user_message_mentions_preset() {
        let err: FilmError = PresetError::NotFound { name: "velvia".into() }.into();
        assert!(err.user_message().contains("velvia"));
    }
}
