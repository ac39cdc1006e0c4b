//! # Video Surfaces
//!
//! Frames in and frames out: the shared [`Frame`] type, raw frame sources
//! for the driving loop, and photo/recording export.

pub mod source;
pub mod types;
pub mod writer;

pub use source::{FrameSource, ImageSequenceSource, TestPatternSource};
pub use types::Frame;
pub use writer::{save_photo, Recorder, RecordingOutput};
