use crate::video::types::Frame;

/// Fixed falloff exponent of the lens vignette
pub const VIGNETTE_FALLOFF: f64 = 1.2;

const MIN_RADIUS: f64 = 1e-6;

/// Per-pixel multiplicative darkening weights for one resolution
#[derive(Debug, Clone, PartialEq)]
pub struct VignetteMask {
    width: u32,
    height: u32,
    weights: Vec<f32>,
}

impl VignetteMask {
    /// Elliptical mask centred on the frame
    ///
    /// The horizontal radius is half the width scaled by `roundness`, the
    /// vertical radius half the height; weight is `1 - strength * r^1.2`
    /// clamped to `[0, 1]`.
    pub fn new(width: u32, height: u32, strength: f32, roundness: f32) -> Self {
        let (cx, cy) = (width as f64 / 2.0, height as f64 / 2.0);
        let rx = (cx * roundness as f64).max(MIN_RADIUS);
        let ry = cy.max(MIN_RADIUS);
        let strength = strength as f64;

        let mut weights = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            let dy = (y as f64 - cy) / ry;
            for x in 0..width {
                let dx = (x as f64 - cx) / rx;
                let r = (dx * dx + dy * dy).sqrt();
                let w = 1.0 - strength * r.powf(VIGNETTE_FALLOFF);
                weights.push(w.clamp(0.0, 1.0) as f32);
            }
        }

        Self { width, height, weights }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn weight(&self, x: u32, y: u32) -> f32 {
        self.weights[(y * self.width + x) as usize]
    }

    /// Mean weight over the frame
    pub fn mean(&self) -> f32 {
        if self.weights.is_empty() {
            return 1.0;
        }
        self.weights.iter().sum::<f32>() / self.weights.len() as f32
    }

    /// Darkest weight (the corner falloff)
    pub fn min_weight(&self) -> f32 {
        self.weights.iter().copied().fold(1.0, f32::min)
    }

    /// Multiply every channel by the mask and requantize
    ///
    /// The frame must have the mask's resolution.
    pub fn apply(&self, frame: &Frame) -> Frame {
        debug_assert_eq!(frame.dimensions(), self.dimensions());
        let raw = frame
            .as_raw()
            .chunks_exact(3)
            .zip(&self.weights)
            .flat_map(|(px, &m)| {
                px.iter()
                    .map(move |&v| ((v as f32 / 255.0 * m).clamp(0.0, 1.0) * 255.0) as u8)
            })
            .collect();
        Frame::from_rgb_bytes(frame.width(), frame.height(), raw)
            .unwrap_or_else(|| frame.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centre_is_unity_and_corners_darken() {
        let mask = VignetteMask::new(64, 64, 0.18, 0.7);
        assert_eq!(mask.weight(32, 32), 1.0);
        assert!(mask.weight(0, 0) < mask.weight(16, 16));
        assert!(mask.weight(0, 0) < 1.0);
    }

    #[test]
    fn test_corner_falloff_matches_formula() {
        let mask = VignetteMask::new(64, 64, 0.18, 0.7);
        let r = ((32.0f64 / 22.4).powi(2) + 1.0).sqrt();
        let expected = 1.0 - 0.18 * r.powf(1.2);
        assert!((mask.weight(0, 0) as f64 - expected).abs() < 1e-6);
        assert_eq!(mask.min_weight(), mask.weight(0, 0));
    }

    #[test]
    fn test_zero_strength_is_flat() {
        let mask = VignetteMask::new(16, 9, 0.0, 0.7);
        assert!(mask.weights().iter().all(|&w| w == 1.0));
    }

    #[test]
    fn test_weights_clamped() {
        let mask = VignetteMask::new(32, 32, 5.0, 0.2);
        assert!(mask.weights().iter().all(|&w| (0.0..=1.0).contains(&w)));
        assert_eq!(mask.weight(0, 0), 0.0);
    }

    #[test]
    fn test_zero_roundness_does_not_blow_up() {
        let mask = VignetteMask::new(8, 8, 0.5, 0.0);
        assert!(mask.weights().iter().all(|w| w.is_finite()));
    }

    #[test]
    fn test_apply_darkens_corner_only() {
        let mask = VignetteMask::new(32, 32, 0.3, 1.0);
        let frame = Frame::new_filled(32, 32, [200, 200, 200]);
        let out = mask.apply(&frame);
        assert!(out.get_pixel(0, 0)[0] < 200);
        assert!(out.get_pixel(16, 16)[0] >= 199);
    }
}
