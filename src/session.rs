//! # Live Session
//!
//! The driving loop: pulls raw frames from a [`FrameSource`], runs them
//! through the [`FrameProcessor`] and routes the result to photo capture
//! and recording. Parameter edits go through the session so the processor
//! is always told which caches they made stale.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::{CaptureError, ExportError, Result};
use crate::params::{Invalidation, ParamStore, ParamValue, Params, Preset};
use crate::pipeline::FrameProcessor;
use crate::video::writer::{save_photo, Recorder, RecordingOutput};
use crate::video::{Frame, FrameSource};

/// Smoothed frames-per-second estimate
#[derive(Debug, Clone, Default)]
pub struct FpsMeter {
    last: Option<Instant>,
    fps: f64,
}

impl FpsMeter {
    const SMOOTHING: f64 = 0.1;

    pub fn new() -> Self {
        Self::default()
    }

    /// Register a frame finished at `now`
    pub fn record(&mut self, now: Instant) {
        if let Some(last) = self.last {
            let dt = now.saturating_duration_since(last).as_secs_f64();
            if dt > 0.0 {
                let instant = 1.0 / dt;
                self.fps = if self.fps == 0.0 {
                    instant
                } else {
                    self.fps + Self::SMOOTHING * (instant - self.fps)
                };
            }
        }
        self.last = Some(now);
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }
}

pub struct LiveSession {
    store: Arc<ParamStore>,
    processor: FrameProcessor,
    source: Box<dyn FrameSource>,
    recorder: Option<Recorder>,
    last_frame: Option<Frame>,
    meter: FpsMeter,
    frames: u64,
}

impl LiveSession {
    pub fn new(store: Arc<ParamStore>, source: Box<dyn FrameSource>) -> Self {
        info!("Session started with source '{}'", source.name());
        Self {
            processor: FrameProcessor::new(Arc::clone(&store)),
            store,
            source,
            recorder: None,
            last_frame: None,
            meter: FpsMeter::new(),
            frames: 0,
        }
    }

    pub fn store(&self) -> &Arc<ParamStore> {
        &self.store
    }

    pub fn processor(&self) -> &FrameProcessor {
        &self.processor
    }

    /// Most recent processed frame
    pub fn last_frame(&self) -> Option<&Frame> {
        self.last_frame.as_ref()
    }

    pub fn fps(&self) -> f64 {
        self.meter.fps()
    }

    /// Frames processed by this session
    pub fn frames_processed(&self) -> u64 {
        self.frames
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    /// Pull, process and route one frame
    ///
    /// Raw frames are scaled to the configured resolution first. Returns
    /// `Ok(None)` once the source is exhausted. A frame the recorder rejects
    /// is still kept as the last frame and counted before the error returns.
    pub fn tick(&mut self) -> Result<Option<&Frame>> {
        let raw = match self.source.next_frame()? {
            Some(frame) => frame,
            None => return Ok(None),
        };

        let params = self.store.snapshot();
        let (width, height) = (params.resolution.width, params.resolution.height);
        let raw = if raw.dimensions() != (width, height) {
            raw.resized(width, height)
        } else {
            raw
        };

        let out = self.processor.process_with(&raw, &params);
        self.meter.record(Instant::now());
        self.frames += 1;

        let out = &*self.last_frame.insert(out);
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.push_frame(out)?;
        }
        Ok(Some(out))
    }

    /// Process frames until the source ends or `max_frames` ticks have run
    ///
    /// Recoverable errors skip to the next tick; anything else stops the
    /// loop. Returns the number of frames processed.
    pub fn run(&mut self, max_frames: Option<u64>) -> Result<u64> {
        let start = self.frames;
        let mut ticks = 0;
        while max_frames.map_or(true, |max| ticks < max) {
            ticks += 1;
            match self.tick().map(|frame| frame.is_some()) {
                Ok(true) => {}
                Ok(false) => {
                    debug!("Source '{}' exhausted", self.source.name());
                    break;
                }
                Err(e) if e.is_recoverable() => warn!("Tick {} failed: {}", ticks, e),
                Err(e) => return Err(e),
            }
        }

        let processed = self.frames - start;
        info!("Processed {} frames ({:.1} fps)", processed, self.fps());
        Ok(processed)
    }

    /// Set one named parameter and notify the processor
    ///
    /// Resolution fields are refused while recording.
    pub fn set_param<V: Into<ParamValue>>(&mut self, name: &str, value: V) -> Result<()> {
        if name.starts_with("resolution.") {
            self.ensure_resolution_unlocked()?;
        }
        let invalidation = self.store.set_field(name, value)?;
        self.processor.invalidate(invalidation);
        Ok(())
    }

    /// Replace every parameter at once
    ///
    /// While recording, the new set must keep the current resolution.
    pub fn load_params(&mut self, params: Params) -> Result<()> {
        params.validate()?;
        let current = self.store.snapshot().resolution;
        if params.resolution != current {
            self.ensure_resolution_unlocked()?;
        }
        self.store.replace(params);
        self.processor.invalidate(Invalidation::ALL);
        Ok(())
    }

    /// Overlay a preset onto the current parameters
    pub fn apply_preset(&mut self, preset: &Preset) {
        self.store.update(|p| preset.apply_to(p));
        self.processor.invalidate(Invalidation::ALL);
        info!("Preset '{}' applied", preset.name);
    }

    /// Change the processing resolution; refused while recording
    pub fn set_resolution(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(CaptureError::InvalidSize { width, height }.into());
        }
        self.ensure_resolution_unlocked()?;
        self.store.update(|p| {
            p.resolution.width = width;
            p.resolution.height = height;
        });
        self.processor.params_changed(false, true);
        info!("Resolution set to {}x{}", width, height);
        Ok(())
    }

    fn ensure_resolution_unlocked(&self) -> Result<()> {
        if self.recorder.is_some() {
            let resolution = self.store.snapshot().resolution;
            return Err(ExportError::ResolutionLocked {
                width: resolution.width,
                height: resolution.height,
            }
            .into());
        }
        Ok(())
    }

    /// Save the last processed frame as `<dir>/<timestamp>_<preset>.<format>`
    pub fn capture_photo<P: AsRef<Path>>(&self, dir: P, format: &str) -> Result<PathBuf> {
        let frame = self.last_frame.as_ref().ok_or(ExportError::NoFrame)?;
        let preset = self.store.snapshot().preset_name.clone();
        save_photo(frame, dir, &preset, format)
    }

    /// Begin staging every processed frame for a recording
    pub fn start_recording<P: AsRef<Path>>(
        &mut self,
        dir: P,
        fps: f64,
        codec: &str,
        keep_frames: bool,
    ) -> Result<&Path> {
        if let Some(recorder) = &self.recorder {
            return Err(ExportError::AlreadyRecording {
                path: recorder.output_path().display().to_string(),
            }
            .into());
        }

        let preset = self.store.snapshot().preset_name.clone();
        let recorder = Recorder::start(dir, &preset, fps, codec)?.keep_frames(keep_frames);
        Ok(self.recorder.insert(recorder).output_path())
    }

    /// Stop recording and encode what was staged
    pub async fn stop_recording(&mut self) -> Result<RecordingOutput> {
        let recorder = self.recorder.take().ok_or(ExportError::NotRecording)?;
        info!("Recording stopped after {} frames", recorder.frame_count());
        recorder.finish().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilmError;
    use crate::params::{Params, PresetRegistry};
    use crate::video::TestPatternSource;
    use std::time::Duration;
    use tempfile::tempdir;

    fn session(frames: u64) -> LiveSession {
        let mut params = Params::default();
        params.resolution.width = 32;
        params.resolution.height = 18;
        let store = Arc::new(ParamStore::new(params));
        let source = TestPatternSource::new(64, 36).unwrap().with_limit(frames);
        LiveSession::new(store, Box::new(source))
    }

    #[test]
    fn test_fps_meter() {
        let mut meter = FpsMeter::new();
        let start = Instant::now();
        meter.record(start);
        assert_eq!(meter.fps(), 0.0);

        meter.record(start + Duration::from_millis(50));
        assert!((meter.fps() - 20.0).abs() < 1e-6);

        meter.record(start + Duration::from_millis(75));
        assert!((meter.fps() - 22.0).abs() < 1e-6);
    }

    #[test]
    fn test_run_until_source_ends() {
        let mut session = session(4);
        assert_eq!(session.run(None).unwrap(), 4);
        assert_eq!(session.frames_processed(), 4);
        assert_eq!(session.processor().frame_index(), 4);
        assert!(session.tick().unwrap().is_none());
    }

    #[test]
    fn test_run_respects_limit() {
        let mut session = session(10);
        assert_eq!(session.run(Some(3)).unwrap(), 3);
    }

    #[test]
    fn test_frames_scaled_to_resolution() {
        let mut session = session(2);
        let frame = session.tick().unwrap().unwrap();
        assert_eq!(frame.dimensions(), (32, 18));

        session.set_resolution(16, 10).unwrap();
        session.tick().unwrap();
        assert_eq!(session.last_frame().unwrap().dimensions(), (16, 10));
        assert_eq!(session.processor().mask().unwrap().dimensions(), (16, 10));
        assert!(session.set_resolution(0, 10).is_err());
    }

    #[test]
    fn test_set_param_invalidates_tone() {
        let mut session = session(2);
        session.tick().unwrap();
        let builds = session.processor().cache_stats().lut_builds;

        session.set_param("tone.contrast", 3.0).unwrap();
        assert_eq!(session.processor().cache_stats().lut_builds, builds + 1);
        assert_eq!(session.store().snapshot().tone.contrast, 3.0);

        assert!(session.set_param("tone.missing", 1.0).is_err());
    }

    #[test]
    fn test_apply_preset() {
        let mut session = session(1);
        let registry = PresetRegistry::new();
        session.apply_preset(registry.require("cinestill_800t").unwrap());

        let params = session.store().snapshot();
        assert_eq!(params.preset_name, "cinestill_800t");
        assert_eq!(params.resolution.width, 32);
    }

    #[test]
    fn test_capture_photo() {
        let dir = tempdir().unwrap();
        let mut session = session(1);

        let err = session.capture_photo(dir.path(), "png").unwrap_err();
        assert!(matches!(err, FilmError::Export(ExportError::NoFrame)));

        session.tick().unwrap();
        let path = session.capture_photo(dir.path(), "png").unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("_portra_00s.png"), "{}", name);
    }

    #[test]
    fn test_recording_stages_frames() {
        let dir = tempdir().unwrap();
        let mut session = session(3);

        session.start_recording(dir.path(), 30.0, "libx264", false).unwrap();
        assert!(session.is_recording());
        assert!(session.start_recording(dir.path(), 30.0, "libx264", false).is_err());

        session.run(None).unwrap();
        let staged = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .find(|e| e.path().is_dir())
            .unwrap();
        assert_eq!(std::fs::read_dir(staged.path()).unwrap().count(), 3);
    }

    #[test]
    fn test_resolution_locked_while_recording() {
        let dir = tempdir().unwrap();
        let mut session = session(6);

        session.start_recording(dir.path(), 30.0, "libx264", false).unwrap();
        session.tick().unwrap();

        let err = session.set_resolution(16, 10).unwrap_err();
        assert!(matches!(
            err,
            FilmError::Export(ExportError::ResolutionLocked { width: 32, height: 18 })
        ));
        assert!(session.set_param("resolution.width", 16u32).is_err());

        for _ in 0..5 {
            session.tick().unwrap().unwrap();
        }
        assert_eq!(session.frames_processed(), 6);
        assert_eq!(session.processor().frame_index(), 6);
        assert_eq!(session.last_frame().unwrap().dimensions(), (32, 18));
        assert_eq!(session.store().snapshot().resolution.width, 32);
    }

    #[test]
    fn test_rejected_frame_is_still_kept_and_counted() {
        let dir = tempdir().unwrap();
        let mut session = session(4);

        session.start_recording(dir.path(), 30.0, "libx264", false).unwrap();
        session.tick().unwrap();
        std::fs::remove_dir_all(session.recorder.as_ref().unwrap().staging_dir()).unwrap();

        assert!(session.tick().is_err());
        assert_eq!(session.frames_processed(), 2);
        assert_eq!(session.processor().frame_index(), 2);
        assert!(session.last_frame().is_some());

        // Recoverable write failures do not stop the loop.
        assert_eq!(session.run(None).unwrap(), 2);
        assert_eq!(session.frames_processed(), session.processor().frame_index());
    }

    #[test]
    fn test_load_params_replaces_everything() {
        let mut session = session(2);
        session.tick().unwrap();
        let builds = session.processor().cache_stats();

        let mut params = Params::default();
        params.resolution.width = 20;
        params.resolution.height = 12;
        params.tone.contrast = 3.0;
        session.load_params(params).unwrap();

        assert_eq!(session.processor().cache_stats().lut_builds, builds.lut_builds + 1);
        session.tick().unwrap();
        assert_eq!(session.last_frame().unwrap().dimensions(), (20, 12));

        let mut bad = Params::default();
        bad.tone.gamma = 0.0;
        assert!(session.load_params(bad).is_err());
    }

    #[tokio::test]
    async fn test_stop_without_recording() {
        let mut session = session(1);
        let err = session.stop_recording().await.unwrap_err();
        assert!(matches!(err, FilmError::Export(ExportError::NotRecording)));
    }
}
