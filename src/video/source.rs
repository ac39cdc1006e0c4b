use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{CaptureError, Result};
use crate::video::types::Frame;

/// A supplier of raw frames for the driving loop
///
/// Stands in for camera acquisition: any source that can hand out RGB
/// frames one at a time.
pub trait FrameSource {
    /// Short human-readable name for logs
    fn name(&self) -> &str;

    /// Next frame, or `None` once the source is exhausted
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// Frames read from a single image or a directory of images
pub struct ImageSequenceSource {
    name: String,
    paths: Vec<PathBuf>,
    position: usize,
    looping: bool,
    cached: Option<(usize, Frame)>,
}

impl ImageSequenceSource {
    /// Open an image file or a directory of images (sorted by file name)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let paths = if path.is_dir() {
            let mut files: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && !is_hidden_file(p) && is_image_file(p))
                .collect();
            files.sort();
            files
        } else if path.is_file() && is_image_file(path) {
            vec![path.to_path_buf()]
        } else {
            return Err(CaptureError::OpenFailed {
                path: path.display().to_string(),
            }
            .into());
        };

        if paths.is_empty() {
            return Err(CaptureError::NoFrames {
                path: path.display().to_string(),
            }
            .into());
        }

        info!("Opened image source {:?} ({} frames)", path, paths.len());
        Ok(Self {
            name: path.display().to_string(),
            paths,
            position: 0,
            looping: false,
            cached: None,
        })
    }

    /// Restart from the first image when the sequence ends
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    fn load(&mut self, index: usize) -> Result<Frame> {
        if let Some((cached_index, frame)) = &self.cached {
            if *cached_index == index {
                return Ok(frame.clone());
            }
        }

        let path = &self.paths[index];
        debug!("Decoding frame {:?}", path);
        let image = image::open(path).map_err(|e| CaptureError::DecodeFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let frame = Frame::new(image.to_rgb8());

        // A looping still image decodes once.
        if self.paths.len() == 1 {
            self.cached = Some((index, frame.clone()));
        }
        Ok(frame)
    }
}

impl FrameSource for ImageSequenceSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.position >= self.paths.len() {
            if !self.looping {
                return Ok(None);
            }
            self.position = 0;
        }

        let frame = self.load(self.position)?;
        self.position += 1;
        Ok(Some(frame))
    }
}

/// Synthetic moving test card for headless runs
///
/// Hue-swept colour bars over a luminance ramp with a small clipped
/// highlight that drifts across the frame, so every effect has something
/// to act on.
pub struct TestPatternSource {
    width: u32,
    height: u32,
    frame_index: u64,
    limit: Option<u64>,
}

impl TestPatternSource {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(CaptureError::InvalidSize { width, height }.into());
        }
        Ok(Self {
            width,
            height,
            frame_index: 0,
            limit: None,
        })
    }

    /// Stop after `frames` frames
    pub fn with_limit(mut self, frames: u64) -> Self {
        self.limit = Some(frames);
        self
    }

    fn render(&self) -> Frame {
        let (w, h) = (self.width, self.height);
        let t = self.frame_index as f32;
        let bars = 7.0;

        let spot_x = ((t * 3.0) as u32 + w / 4) % w.max(1);
        let spot_y = h / 3;
        let spot_r = (w.min(h) / 12).max(2);

        Frame::from_fn(w, h, |x, y| {
            if x.abs_diff(spot_x) <= spot_r && y.abs_diff(spot_y) <= spot_r {
                return [255, 250, 240];
            }
            let bar = ((x as f32 / w as f32) * bars).floor();
            let hue = (bar * 360.0 / bars + t * 2.0) % 360.0;
            let value = 0.15 + 0.8 * (1.0 - y as f32 / h as f32);
            hsv_to_rgb(hue, 0.6, value)
        })
    }
}

impl FrameSource for TestPatternSource {
    fn name(&self) -> &str {
        "test-pattern"
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.limit.map_or(false, |limit| self.frame_index >= limit) {
            return Ok(None);
        }
        let frame = self.render();
        self.frame_index += 1;
        Ok(Some(frame))
    }
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    [
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    ]
}

pub fn is_image_file<P: AsRef<Path>>(path: P) -> bool {
    match path.as_ref().extension().and_then(|ext| ext.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "bmp"
        ),
        None => false,
    }
}

fn is_hidden_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}
