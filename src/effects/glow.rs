//! Highlight glows: halation (soft threshold, per-channel scatter) and
//! bloom (hard threshold, one shared blur).

use crate::effects::plane::{luma, merge_quantized, split_normalized, Plane};
use crate::params::{BloomParams, HalationParams};
use crate::video::types::Frame;

/// Luma above which a pixel feeds the bloom
pub const BLOOM_THRESHOLD: f32 = 0.85;

const MIN_SIGMA: f32 = 1e-6;

/// Red-fringed glow bleeding out of bright areas
///
/// Each channel is masked by a soft luma ramp starting at `threshold`,
/// blurred with its own radius (red scatters furthest) and added back.
pub fn halation(frame: &Frame, params: &HalationParams) -> Frame {
    let planes = split_normalized(frame);
    let y = luma(&planes);

    let ramp = 1.0 - params.threshold + 1e-6;
    let mut mask = y;
    for v in mask.data_mut() {
        *v = ((*v - params.threshold) / ramp).clamp(0.0, 1.0);
    }

    let radii = [params.radius_r, params.radius_g, params.radius_b];
    let out: [Plane; 3] = std::array::from_fn(|c| {
        let glow = mask.multiplied(&planes[c]).gaussian_blur(radii[c].max(MIN_SIGMA));
        add_scaled(&planes[c], &glow, params.strength)
    });

    merge_quantized(&out)
}

/// Glow around hard-clipped highlights
///
/// Pixels with luma above [`BLOOM_THRESHOLD`] are kept, blurred with one
/// shared radius and added to all channels.
pub fn bloom(frame: &Frame, params: &BloomParams) -> Frame {
    let planes = split_normalized(frame);
    let y = luma(&planes);

    let mut mask = y;
    for v in mask.data_mut() {
        *v = if *v > BLOOM_THRESHOLD { 1.0 } else { 0.0 };
    }

    let sigma = params.radius.max(MIN_SIGMA);
    let out: [Plane; 3] = std::array::from_fn(|c| {
        let glow = mask.multiplied(&planes[c]).gaussian_blur(sigma);
        add_scaled(&planes[c], &glow, params.strength)
    });

    merge_quantized(&out)
}

fn add_scaled(base: &Plane, glow: &Plane, strength: f32) -> Plane {
    let mut out = base.clone();
    for (o, g) in out.data_mut().iter_mut().zip(glow.data()) {
        *o = (*o + strength * g).clamp(0.0, 1.0);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spot(size: u32, color: [u8; 3]) -> Frame {
        let c = size / 2;
        Frame::from_fn(size, size, |x, y| {
            if x.abs_diff(c) <= 1 && y.abs_diff(c) <= 1 {
                color
            } else {
                [20, 20, 20]
            }
        })
    }

    #[test]
    fn test_halation_leaves_dark_frame_alone() {
        let frame = Frame::new_filled(16, 16, [90, 90, 90]);
        let out = halation(&frame, &HalationParams::default());
        for y in 0..16 {
            for x in 0..16 {
                let p = out.get_pixel(x, y);
                assert!(p.iter().all(|&v| (89..=90).contains(&v)));
            }
        }
    }

    #[test]
    fn test_halation_red_spreads_furthest() {
        let frame = spot(41, [255, 255, 255]);
        let params = HalationParams { strength: 1.0, ..HalationParams::default() };
        let out = halation(&frame, &params);

        // Eight pixels away the red radius (8) still reaches, blue (3) does not.
        let p = out.get_pixel(20 + 8, 20);
        assert!(p[0] > p[2], "red {} should exceed blue {}", p[0], p[2]);
        assert!(p[0] > 20);
    }

    #[test]
    fn test_bloom_ignores_midtones() {
        let frame = Frame::new_filled(16, 16, [200, 200, 200]);
        let out = bloom(&frame, &BloomParams { radius: 4.0, strength: 1.0 });
        assert!(out.get_pixel(8, 8)[1] <= 200);
        assert!(out.get_pixel(8, 8)[1] >= 199);
    }

    #[test]
    fn test_bloom_glows_around_highlight() {
        let frame = spot(31, [250, 250, 250]);
        let out = bloom(&frame, &BloomParams { radius: 3.0, strength: 1.0 });
        let near = out.get_pixel(15 + 3, 15);
        assert!(near[0] > 20, "expected glow, got {:?}", near);
        assert_eq!(near[0], near[2]);
    }

    #[test]
    fn test_zero_strength_is_near_identity() {
        let frame = spot(21, [255, 240, 230]);
        let out = bloom(&frame, &BloomParams { radius: 5.0, strength: 0.0 });
        for y in 0..21 {
            for x in 0..21 {
                let (a, b) = (frame.get_pixel(x, y), out.get_pixel(x, y));
                for c in 0..3 {
                    assert!(a[c].abs_diff(b[c]) <= 1);
                }
            }
        }
    }
}
