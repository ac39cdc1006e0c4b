use rand::Rng;

use crate::effects::plane::{quantize, Plane};
use crate::params::GrainParams;
use crate::video::types::Frame;

/// Gaussian softening applied to every noise field
pub const GRAIN_SMOOTHING_SIGMA: f32 = 0.6;

/// Draw a zero-mean, unit-variance Gaussian field (Box-Muller)
pub fn gaussian_field<R: Rng + ?Sized>(rng: &mut R, width: usize, height: usize) -> Plane {
    let n = width * height;
    let mut data = Vec::with_capacity(n + 1);
    while data.len() < n {
        // 1 - [0, 1) keeps the log argument away from zero.
        let u1 = 1.0 - rng.gen::<f64>();
        let u2 = rng.gen::<f64>();
        let radius = (-2.0 * u1.ln()).sqrt();
        let theta = std::f64::consts::TAU * u2;
        data.push((radius * theta.cos()) as f32);
        data.push((radius * theta.sin()) as f32);
    }
    data.truncate(n);
    Plane::from_vec(width, height, data).unwrap_or_else(|| Plane::filled(width, height, 0.0))
}

/// Whether a grain scale goes through the down/up-sample round trip
pub fn needs_resample(scale: f32) -> bool {
    scale > 1.0
}

/// Size of the coarse grid for a grain scale
pub fn coarse_size(width: usize, height: usize, scale: f32) -> (usize, usize) {
    let w = ((width as f32 / scale) as usize).max(1);
    let h = ((height as f32 / scale) as usize).max(1);
    (w, h)
}

/// Shape a raw Gaussian field into grain
///
/// Scales above one average the field down and stretch it back, clumping
/// the noise into larger blobs; every field is then softened slightly.
pub fn shape_noise(raw: Plane, scale: f32) -> Plane {
    let (w, h) = (raw.width(), raw.height());
    let noise = if needs_resample(scale) {
        let (cw, ch) = coarse_size(w, h, scale);
        raw.resize_area(cw, ch).resize_linear(w, h)
    } else {
        raw
    };
    noise.gaussian_blur(GRAIN_SMOOTHING_SIGMA)
}

/// Draw and shape one frame's grain field, advancing `rng`
pub fn noise_field<R: Rng + ?Sized>(rng: &mut R, width: usize, height: usize, scale: f32) -> Plane {
    shape_noise(gaussian_field(rng, width, height), scale)
}

/// Multiplicative monochrome grain: `clamp(v * (1 + strength * n))`
pub fn apply_grain(frame: &Frame, strength: f32, noise: &Plane) -> Frame {
    debug_assert_eq!(noise.data().len(), frame.pixel_count());
    let raw = frame
        .as_raw()
        .chunks_exact(3)
        .zip(noise.data())
        .flat_map(|(px, &n)| {
            let k = 1.0 + strength * n;
            px.iter().map(move |&v| quantize(v as f32 / 255.0 * k))
        })
        .collect();
    Frame::from_rgb_bytes(frame.width(), frame.height(), raw).unwrap_or_else(|| frame.clone())
}

/// Film grain for one frame drawn from `rng`
pub fn film_grain<R: Rng + ?Sized>(frame: &Frame, params: &GrainParams, rng: &mut R) -> Frame {
    let noise = noise_field(
        rng,
        frame.width() as usize,
        frame.height() as usize,
        params.scale,
    );
    apply_grain(frame, params.strength, &noise)
}
