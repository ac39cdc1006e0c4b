//! # Frame Pipeline
//!
//! The stateful per-frame orchestrator. [`FrameProcessor`] keeps the derived
//! caches and noise streams and runs the [`Stage`]s in their fixed order:
//!
//! 1. tone curve
//! 2. grain
//! 3. halation, then bloom
//! 4. chromatic aberration
//! 5. flicker
//! 6. gate weave
//! 7. vignette

pub mod processor;
pub mod stages;

pub use processor::{CacheStats, FrameProcessor, LIVE_GRAIN_SEED, LOCKED_GRAIN_SEED};
pub use stages::{Stage, StageContext};
