//! # Effect Kernels
//!
//! Stateless film-emulation effects. Each kernel takes a frame and explicit
//! parameters and returns a new frame; none keeps state between calls.
//!
//! - [`tone`] - characteristic curve as a 256-entry lookup table
//! - [`grain`] - monochrome multiplicative grain from a seeded noise stream
//! - [`glow`] - halation and bloom around highlights
//! - [`optics`] - lateral chromatic aberration and mirrored translation
//! - [`temporal`] - flicker and gate weave phased by the frame counter
//! - [`vignette`] - elliptical corner falloff mask
//!
//! Kernels work on normalized `f32` planes internally and requantize to
//! 8 bits by truncation after every stage.

pub mod glow;
pub mod grain;
pub mod optics;
pub mod plane;
pub mod temporal;
pub mod tone;
pub mod vignette;

pub use glow::{bloom, halation, BLOOM_THRESHOLD};
pub use grain::{film_grain, GRAIN_SMOOTHING_SIGMA};
pub use optics::{chromatic_aberration, translate};
pub use plane::Plane;
pub use temporal::{apply_flicker, apply_weave, TEMPORAL_EPSILON};
pub use tone::ToneLut;
pub use vignette::{VignetteMask, VIGNETTE_FALLOFF};
