use std::path::{Path, PathBuf};
use std::process::Stdio;

use chrono::Local;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{ExportError, Result};
use crate::video::types::Frame;

/// `<YYYYmmdd_HHMMSS>_<preset>` stem used for captures
pub fn capture_stem(preset_name: &str) -> String {
    format!("{}_{}", Local::now().format("%Y%m%d_%H%M%S"), preset_name)
}

/// Save a single processed frame as a still photo
///
/// Returns the written path, `<dir>/<timestamp>_<preset>.<format>`.
pub fn save_photo<P: AsRef<Path>>(
    frame: &Frame,
    dir: P,
    preset_name: &str,
    format: &str,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir.as_ref())?;
    let path = dir
        .as_ref()
        .join(format!("{}.{}", capture_stem(preset_name), format));

    frame.save(&path).map_err(|e| ExportError::WriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    info!("Photo saved to {:?}", path);
    Ok(path)
}

pub fn check_ffmpeg_available() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Result of a finished recording
#[derive(Debug, Clone, PartialEq)]
pub enum RecordingOutput {
    /// Encoded movie file
    Video { path: PathBuf, frame_count: usize },
    /// FFmpeg was unavailable; the staged PNG sequence is kept instead
    Frames { dir: PathBuf, frame_count: usize },
}

/// Records processed frames to a movie
///
/// Frames are staged as numbered PNGs while recording and encoded with an
/// external `ffmpeg` when the recording is finished.
pub struct Recorder {
    output_path: PathBuf,
    staging_dir: PathBuf,
    fps: f64,
    codec: String,
    keep_frames: bool,
    frame_count: usize,
    frame_size: Option<(u32, u32)>,
}

impl Recorder {
    /// Start a recording named `<timestamp>_<preset>.mp4` in `dir`
    pub fn start<P: AsRef<Path>>(dir: P, preset_name: &str, fps: f64, codec: &str) -> Result<Self> {
        let stem = capture_stem(preset_name);
        let output_path = dir.as_ref().join(format!("{}.mp4", stem));
        let staging_dir = dir.as_ref().join(format!("{}_frames", stem));
        std::fs::create_dir_all(&staging_dir)?;

        info!("Recording started: {:?}", output_path);
        Ok(Self {
            output_path,
            staging_dir,
            fps,
            codec: codec.to_string(),
            keep_frames: false,
            frame_count: 0,
            frame_size: None,
        })
    }

    /// Keep the staged PNGs after a successful encode
    pub fn keep_frames(mut self, keep: bool) -> Self {
        self.keep_frames = keep;
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Append one frame; all frames of a recording must share one size
    pub fn push_frame(&mut self, frame: &Frame) -> Result<()> {
        match self.frame_size {
            Some(size) if size != frame.dimensions() => {
                return Err(ExportError::WriteFailed {
                    path: self.output_path.display().to_string(),
                    reason: format!(
                        "frame size changed from {}x{} to {}x{} mid-recording",
                        size.0,
                        size.1,
                        frame.width(),
                        frame.height()
                    ),
                }
                .into());
            }
            None => self.frame_size = Some(frame.dimensions()),
            _ => {}
        }

        let path = self
            .staging_dir
            .join(format!("frame_{:06}.png", self.frame_count));
        frame.save(&path).map_err(|e| ExportError::WriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        self.frame_count += 1;
        Ok(())
    }

    /// Stop recording and encode the staged frames
    pub async fn finish(self) -> Result<RecordingOutput> {
        if self.frame_count == 0 {
            let _ = tokio::fs::remove_dir_all(&self.staging_dir).await;
            return Err(ExportError::EncodingFailed {
                reason: "no frames were recorded".to_string(),
            }
            .into());
        }

        if !check_ffmpeg_available() {
            warn!(
                "FFmpeg not found; keeping {} frames in {:?}",
                self.frame_count, self.staging_dir
            );
            return Ok(RecordingOutput::Frames {
                dir: self.staging_dir,
                frame_count: self.frame_count,
            });
        }

        self.encode().await?;

        if !self.keep_frames {
            if let Err(e) = tokio::fs::remove_dir_all(&self.staging_dir).await {
                warn!("Failed to remove staging directory: {}", e);
            }
        }

        info!(
            "Recording saved to {:?} ({} frames)",
            self.output_path, self.frame_count
        );
        Ok(RecordingOutput::Video {
            path: self.output_path,
            frame_count: self.frame_count,
        })
    }

    async fn encode(&self) -> Result<()> {
        let pattern = self.staging_dir.join("frame_%06d.png");
        debug!("Encoding {:?} -> {:?}", pattern, self.output_path);

        let output = Command::new("ffmpeg")
            .arg("-y")
            .args(["-framerate", &self.fps.to_string()])
            .arg("-i")
            .arg(&pattern)
            .args(["-c:v", &self.codec, "-pix_fmt", "yuv420p"])
            .arg(&self.output_path)
            .output()
            .await
            .map_err(|e| ExportError::EncodingFailed {
                reason: format!("FFmpeg execution failed: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExportError::EncodingFailed {
                reason: format!("FFmpeg failed: {}", stderr),
            }
            .into());
        }

        Ok(())
    }
}
