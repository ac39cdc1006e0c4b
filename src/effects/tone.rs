use crate::params::ToneParams;
use crate::video::types::Frame;

/// Smallest denominator allowed when normalizing the curve
const MIN_DENOMINATOR: f32 = 1e-6;

/// 256-entry film characteristic curve
///
/// Derived only from the tone parameters and shared by all three channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToneLut {
    table: [u8; 256],
}

fn sigmoid(contrast: f32, x: f32) -> f32 {
    1.0 / (1.0 + (-(contrast * (x - 0.5))).exp())
}

impl ToneLut {
    /// Build the curve: a logistic response rescaled so `toe` lands on black
    /// and `shoulder` on white, then lift, inverse gamma and gain.
    pub fn from_params(tone: &ToneParams) -> Self {
        let amin = sigmoid(tone.contrast, tone.toe);
        let amax = sigmoid(tone.contrast, tone.shoulder);
        let span = (amax - amin).max(MIN_DENOMINATOR);
        let inv_gamma = 1.0 / tone.gamma.max(MIN_DENOMINATOR);

        let mut table = [0u8; 256];
        for (i, out) in table.iter_mut().enumerate() {
            let x = i as f32 / 255.0;
            let y = (sigmoid(tone.contrast, x) - amin) / span;
            // Below-black values have no real power; pin them to black.
            let y = (y + tone.lift).max(0.0).powf(inv_gamma) * tone.gain;
            *out = (y.clamp(0.0, 1.0) * 255.0) as u8;
        }

        Self { table }
    }

    /// Identity mapping
    pub fn identity() -> Self {
        let mut table = [0u8; 256];
        for (i, out) in table.iter_mut().enumerate() {
            *out = i as u8;
        }
        Self { table }
    }

    pub fn table(&self) -> &[u8; 256] {
        &self.table
    }

    #[inline]
    pub fn map(&self, value: u8) -> u8 {
        self.table[value as usize]
    }

    /// Look up every sample of every channel
    pub fn apply(&self, frame: &Frame) -> Frame {
        let raw = frame.as_raw().iter().map(|&v| self.map(v)).collect();
        Frame::from_rgb_bytes(frame.width(), frame.height(), raw)
            .unwrap_or_else(|| frame.clone())
    }
}
