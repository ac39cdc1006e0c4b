//! Projector instability driven by the frame counter: exposure flicker and
//! gate weave. Both are exact no-ops below [`TEMPORAL_EPSILON`].

use crate::effects::optics::translate;
use crate::video::types::Frame;

/// Amounts at or below this are treated as switched off
pub const TEMPORAL_EPSILON: f32 = 1e-4;

/// Angular rates (rad/frame) and weights of the two flicker waves
const FLICKER_FAST: (f64, f64) = (0.21, 0.6);
const FLICKER_SLOW: (f64, f64) = (0.037, 0.4);

/// Angular rates (rad/frame) of the horizontal and vertical weave
const WEAVE_RATE_X: f64 = 0.013;
const WEAVE_RATE_Y: f64 = 0.017;

/// Exposure multiplier for a frame
pub fn flicker_gain(frame_index: u64, amount: f32) -> f32 {
    let t = frame_index as f64;
    let fast = (t * FLICKER_FAST.0).sin() * FLICKER_FAST.1;
    let slow = (t * FLICKER_SLOW.0).sin() * FLICKER_SLOW.1;
    let wave = fast + slow;
    (1.0 + amount as f64 * wave) as f32
}

/// Whole-pixel gate offset for a frame, truncated toward zero
pub fn weave_offset(frame_index: u64, amplitude: f32) -> (i32, i32) {
    let t = frame_index as f64;
    let amplitude = amplitude as f64;
    let dx = ((t * WEAVE_RATE_X).sin() * amplitude) as i32;
    let dy = ((t * WEAVE_RATE_Y).cos() * amplitude) as i32;
    (dx, dy)
}

/// Scale the whole frame by the flicker gain
pub fn apply_flicker(frame: Frame, amount: f32, frame_index: u64) -> Frame {
    if amount <= TEMPORAL_EPSILON {
        return frame;
    }
    let k = flicker_gain(frame_index, amount);
    let raw = frame
        .as_raw()
        .iter()
        .map(|&v| (v as f32 * k).clamp(0.0, 255.0) as u8)
        .collect();
    Frame::from_rgb_bytes(frame.width(), frame.height(), raw).unwrap_or(frame)
}

/// Shift the whole frame by the weave offset, mirroring the borders
pub fn apply_weave(frame: Frame, amplitude: f32, frame_index: u64) -> Frame {
    if amplitude <= TEMPORAL_EPSILON {
        return frame;
    }
    let (dx, dy) = weave_offset(frame_index, amplitude);
    if dx == 0 && dy == 0 {
        return frame;
    }
    translate(&frame, dx, dy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern() -> Frame {
        Frame::from_fn(12, 10, |x, y| [(x * 20) as u8, (y * 25) as u8, ((x + y) * 10) as u8])
    }

    #[test]
    fn test_zero_flicker_and_weave_are_exact_no_ops() {
        let frame = pattern();
        for i in [0, 1, 17, 500, 10_000] {
            assert_eq!(apply_flicker(frame.clone(), 0.0, i), frame);
            assert_eq!(apply_weave(frame.clone(), 0.0, i), frame);
            assert_eq!(apply_flicker(frame.clone(), 5e-5, i), frame);
        }
    }

    #[test]
    fn test_flicker_gain_starts_at_unity() {
        assert_eq!(flicker_gain(0, 0.5), 1.0);
    }

    #[test]
    fn test_flicker_gain_bounded_by_amount() {
        for i in 0..2000 {
            let k = flicker_gain(i, 0.1);
            assert!((0.9..=1.1).contains(&k), "frame {} gain {}", i, k);
        }
    }

    #[test]
    fn test_flicker_scales_pixels() {
        let frame = Frame::new_filled(4, 4, [100, 100, 100]);
        let i = 7;
        let k = flicker_gain(i, 0.3);
        let out = apply_flicker(frame, 0.3, i);
        assert_eq!(out.get_pixel(0, 0)[0], (100.0 * k) as u8);
    }

    #[test]
    fn test_default_weave_never_moves() {
        // Half a pixel of amplitude truncates to zero on every frame.
        for i in 0..5000 {
            assert_eq!(weave_offset(i, 0.5), (0, 0));
        }
    }

    #[test]
    fn test_weave_offset_follows_phase() {
        assert_eq!(weave_offset(0, 4.0), (0, 4));
        // sin(100 * 0.013) * 4 = 3.85, cos(100 * 0.017) * 4 = -0.52
        assert_eq!(weave_offset(100, 4.0), (3, 0));
    }

    #[test]
    fn test_weave_translates_frame() {
        let frame = pattern();
        let out = apply_weave(frame.clone(), 4.0, 0);
        // Offset (0, 4): row 6 now holds what row 2 held.
        assert_eq!(out.get_pixel(5, 6), frame.get_pixel(5, 2));
    }
}
