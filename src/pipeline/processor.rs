use std::sync::Arc;
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, trace};

use crate::effects::{ToneLut, VignetteMask};
use crate::params::{Invalidation, ParamStore, Params};
use crate::pipeline::stages::{Stage, StageContext};
use crate::video::types::Frame;

/// Seed of the grain stream used while grain is locked
pub const LOCKED_GRAIN_SEED: u64 = 0;

/// Seed of the grain stream used while grain is live
pub const LIVE_GRAIN_SEED: u64 = 12345;

/// How often each derived cache has been (re)built
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub lut_builds: u64,
    pub mask_builds: u64,
}

/// Stateful per-frame film pipeline
///
/// Owns the derived caches (tone table, vignette mask), the two grain noise
/// streams and the frame counter that phases flicker and weave.
///
/// Only the stream selected by the grain lock draws noise for a frame; the
/// other one stays where it was. Neither is ever frozen, so "locked" grain
/// still changes from frame to frame and only follows a different seeded
/// sequence than live grain. It does not hold the grain still between
/// frames.
pub struct FrameProcessor {
    store: Arc<ParamStore>,
    lut: Option<ToneLut>,
    mask: Option<VignetteMask>,
    rng_locked: SmallRng,
    rng_live: SmallRng,
    frame_index: u64,
    stats: CacheStats,
}

impl FrameProcessor {
    /// Bind to a parameter source; caches start empty and the counter at zero
    pub fn new(store: Arc<ParamStore>) -> Self {
        Self {
            store,
            lut: None,
            mask: None,
            rng_locked: SmallRng::seed_from_u64(LOCKED_GRAIN_SEED),
            rng_live: SmallRng::seed_from_u64(LIVE_GRAIN_SEED),
            frame_index: 0,
            stats: CacheStats::default(),
        }
    }

    pub fn store(&self) -> &Arc<ParamStore> {
        &self.store
    }

    /// Frames processed so far; the phase of flicker and weave
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.stats
    }

    /// Current tone table, if derived
    pub fn lut(&self) -> Option<&ToneLut> {
        self.lut.as_ref()
    }

    /// Current vignette mask, if built
    pub fn mask(&self) -> Option<&VignetteMask> {
        self.mask.as_ref()
    }

    /// Tell the processor which caches a parameter edit made stale
    ///
    /// The tone table is re-derived immediately from a fresh snapshot; the
    /// vignette mask is dropped and rebuilt on the next frame, once the
    /// frame size is known.
    pub fn params_changed(&mut self, recompute_tone: bool, recompute_vignette: bool) {
        if recompute_tone {
            let params = self.store.snapshot();
            self.lut = Some(ToneLut::from_params(&params.tone));
            self.stats.lut_builds += 1;
            debug!("Tone curve re-derived (contrast {:.2})", params.tone.contrast);
        }
        if recompute_vignette {
            self.mask = None;
            debug!("Vignette mask invalidated");
        }
    }

    /// [`params_changed`](Self::params_changed) driven by an [`Invalidation`]
    pub fn invalidate(&mut self, invalidation: Invalidation) {
        if invalidation != Invalidation::NONE {
            self.params_changed(invalidation.tone, invalidation.vignette);
        }
    }

    /// Process one frame with the store's current parameters
    pub fn process(&mut self, frame: &Frame) -> Frame {
        let params = self.store.snapshot();
        self.process_with(frame, &params)
    }

    /// Process one frame with an explicit parameter snapshot
    ///
    /// The input is left untouched; the returned frame belongs to the
    /// caller. Advances the frame counter by exactly one.
    pub fn process_with(&mut self, frame: &Frame, params: &Params) -> Frame {
        let started = Instant::now();
        let (width, height) = frame.dimensions();

        let stats = &mut self.stats;
        let lut = &*self.lut.get_or_insert_with(|| {
            stats.lut_builds += 1;
            debug!("Tone curve derived");
            ToneLut::from_params(&params.tone)
        });

        if self
            .mask
            .as_ref()
            .map_or(false, |m| m.dimensions() != (width, height))
        {
            self.mask = None;
        }
        let mask = &*self.mask.get_or_insert_with(|| {
            stats.mask_builds += 1;
            debug!("Vignette mask built for {}x{}", width, height);
            VignetteMask::new(
                width,
                height,
                params.optics.vignette_strength,
                params.optics.vignette_roundness,
            )
        });

        let grain_rng = if params.grain.lock {
            &mut self.rng_locked
        } else {
            &mut self.rng_live
        };

        let mut ctx = StageContext {
            params,
            lut,
            mask,
            grain_rng,
            frame_index: self.frame_index,
        };

        let mut out = frame.clone();
        for stage in Stage::ORDER {
            let t = Instant::now();
            out = stage.apply(out, &mut ctx);
            trace!("{} stage took {:?}", stage, t.elapsed());
        }

        self.frame_index += 1;
        trace!(
            "Frame {} processed in {:?}",
            self.frame_index - 1,
            started.elapsed()
        );
        out
    }
}
