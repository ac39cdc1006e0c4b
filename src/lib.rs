//! # AuraFilm
//!
//! Real-time analog film emulation for live camera frames.
//!
//! Every frame runs through a fixed chain of film effects (tone curve,
//! grain, halation, bloom, chromatic aberration, flicker, gate weave and
//! vignette) driven by a shared, live-editable parameter set.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use aurafilm::{
//!     params::{ParamStore, PresetRegistry},
//!     session::LiveSession,
//!     video::TestPatternSource,
//! };
//!
//! # fn main() -> aurafilm::Result<()> {
//! let store = Arc::new(ParamStore::default());
//! let source = TestPatternSource::new(1280, 720)?.with_limit(90);
//! let mut session = LiveSession::new(store, Box::new(source));
//!
//! let registry = PresetRegistry::new();
//! session.apply_preset(registry.require("cinestill_800t")?);
//! session.run(None)?;
//! session.capture_photo("captures", "jpg")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`effects`] - stateless effect kernels
//! - [`pipeline`] - the stateful per-frame processor and its stage order
//! - [`params`] - parameter snapshots, the shared store and presets
//! - [`video`] - frame type, frame sources and photo/recording output
//! - [`session`] - the driving loop tying them together
//! - [`config`] - application configuration
//!
//! The processor can also be used on its own:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use aurafilm::{FrameProcessor, ParamStore, video::Frame};
//!
//! let store = Arc::new(ParamStore::default());
//! let mut processor = FrameProcessor::new(Arc::clone(&store));
//!
//! let frame = Frame::new_filled(640, 360, [128, 128, 128]);
//! let filmic = processor.process(&frame);
//!
//! // Tone edits must be reported so the curve is re-derived.
//! let stale = store.set_field("tone.contrast", 6.0).unwrap();
//! processor.invalidate(stale);
//! ```

pub mod config;
pub mod effects;
pub mod error;
pub mod params;
pub mod pipeline;
pub mod session;
pub mod video;

pub use crate::{
    config::Config,
    error::{FilmError, Result},
    params::{ParamStore, Params, Preset, PresetRegistry},
    pipeline::FrameProcessor,
    session::LiveSession,
};
