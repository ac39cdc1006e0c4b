use crate::effects::plane::reflect;
use crate::video::types::Frame;

/// Whole-pixel lateral shift for a chromatic aberration amount
///
/// Rounds half to even and never drops below one pixel.
pub fn aberration_shift(pixels: f32) -> i32 {
    (pixels.round_ties_even() as i32).max(1)
}

/// Lateral chromatic aberration
///
/// Red moves right and blue moves left by the same whole-pixel amount;
/// green stays put. Uncovered edges are filled by mirroring the frame.
pub fn chromatic_aberration(frame: &Frame, pixels: f32) -> Frame {
    let shift = aberration_shift(pixels);
    shift_channels(frame, [(shift, 0), (0, 0), (-shift, 0)])
}

/// Translate the whole frame by `(dx, dy)` with mirrored borders
pub fn translate(frame: &Frame, dx: i32, dy: i32) -> Frame {
    if dx == 0 && dy == 0 {
        return frame.clone();
    }
    shift_channels(frame, [(dx, dy); 3])
}

/// Move each channel by its own offset: `out(x, y) = in(x - dx, y - dy)`
fn shift_channels(frame: &Frame, offsets: [(i32, i32); 3]) -> Frame {
    let (w, h) = (frame.width() as usize, frame.height() as usize);
    let src = frame.as_raw();
    let mut raw = vec![0u8; src.len()];

    for y in 0..h {
        for (c, &(dx, dy)) in offsets.iter().enumerate() {
            let sy = reflect(y as isize - dy as isize, h);
            for x in 0..w {
                let sx = reflect(x as isize - dx as isize, w);
                raw[(y * w + x) * 3 + c] = src[(sy * w + sx) * 3 + c];
            }
        }
    }

    Frame::from_rgb_bytes(frame.width(), frame.height(), raw).unwrap_or_else(|| frame.clone())
}
