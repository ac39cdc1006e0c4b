//! # Parameters
//!
//! The effect parameter model and its outer surfaces:
//!
//! - [`Params`] - one immutable snapshot of every effect parameter
//! - [`ParamStore`] - the shared source the driving loop writes and the
//!   frame processor reads, with copy-on-read snapshots
//! - [`Preset`] and [`PresetRegistry`] - named looks persisted as TOML

pub mod preset;
pub mod registry;
pub mod snapshot;
pub mod store;

pub use preset::Preset;
pub use registry::PresetRegistry;
pub use snapshot::{
    BloomParams, GrainParams, HalationParams, OpticsParams, Params, Resolution, TemporalParams,
    ToneParams,
};
pub use store::{Invalidation, ParamStore, ParamValue};
