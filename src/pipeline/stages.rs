use rand::rngs::SmallRng;

use crate::effects::{
    bloom, chromatic_aberration, film_grain, halation, temporal, ToneLut, VignetteMask,
};
use crate::params::Params;
use crate::video::types::Frame;

/// Everything a stage may read (and the grain stream it may advance)
pub struct StageContext<'a> {
    pub params: &'a Params,
    pub lut: &'a ToneLut,
    pub mask: &'a VignetteMask,
    pub grain_rng: &'a mut SmallRng,
    pub frame_index: u64,
}

/// One step of the per-frame chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Tone,
    Grain,
    Halation,
    Bloom,
    ChromaticAberration,
    Flicker,
    Weave,
    Vignette,
}

impl Stage {
    /// The fixed application order
    ///
    /// Halation must come before bloom: bloom thresholds the image halation
    /// already brightened, so their highlights compound.
    pub const ORDER: [Stage; 8] = [
        Stage::Tone,
        Stage::Grain,
        Stage::Halation,
        Stage::Bloom,
        Stage::ChromaticAberration,
        Stage::Flicker,
        Stage::Weave,
        Stage::Vignette,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Tone => "tone",
            Stage::Grain => "grain",
            Stage::Halation => "halation",
            Stage::Bloom => "bloom",
            Stage::ChromaticAberration => "chromatic_aberration",
            Stage::Flicker => "flicker",
            Stage::Weave => "weave",
            Stage::Vignette => "vignette",
        }
    }

    /// Run this stage on `frame`
    pub fn apply(self, frame: Frame, ctx: &mut StageContext<'_>) -> Frame {
        let p = ctx.params;
        match self {
            Stage::Tone => ctx.lut.apply(&frame),
            Stage::Grain => film_grain(&frame, &p.grain, &mut *ctx.grain_rng),
            Stage::Halation => halation(&frame, &p.halation),
            Stage::Bloom => bloom(&frame, &p.bloom),
            Stage::ChromaticAberration => chromatic_aberration(&frame, p.optics.ca_pixels),
            Stage::Flicker => temporal::apply_flicker(frame, p.temporal.flicker, ctx.frame_index),
            Stage::Weave => temporal::apply_weave(frame, p.temporal.weave, ctx.frame_index),
            Stage::Vignette => ctx.mask.apply(&frame),
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_halation_precedes_bloom() {
        let pos = |s| Stage::ORDER.iter().position(|&x| x == s).unwrap();
        assert!(pos(Stage::Halation) < pos(Stage::Bloom));
        assert_eq!(Stage::ORDER[0], Stage::Tone);
        assert_eq!(Stage::ORDER[7], Stage::Vignette);
    }

    #[test]
    fn test_order_changes_output() {
        // A white patch on a light-grey field: halation lifts the surround
        // past the bloom threshold only when it runs first.
        let frame = Frame::from_fn(40, 40, |x, y| {
            if (16..24).contains(&x) && (16..24).contains(&y) {
                [255, 255, 255]
            } else {
                [180, 180, 180]
            }
        });
        let mut params = Params::default();
        params.halation.strength = 0.5;
        params.bloom.strength = 0.5;

        let lut = ToneLut::identity();
        let mask = VignetteMask::new(40, 40, 0.0, 1.0);
        let mut rng = SmallRng::seed_from_u64(0);
        let mut ctx = StageContext {
            params: &params,
            lut: &lut,
            mask: &mask,
            grain_rng: &mut rng,
            frame_index: 0,
        };

        let hb = Stage::Bloom.apply(Stage::Halation.apply(frame.clone(), &mut ctx), &mut ctx);
        let bh = Stage::Halation.apply(Stage::Bloom.apply(frame, &mut ctx), &mut ctx);
        assert_ne!(hb, bh);
    }

    #[test]
    fn test_stage_names_unique() {
        let mut names: Vec<_> = Stage::ORDER.iter().map(|s| s.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Stage::ORDER.len());
    }
}
