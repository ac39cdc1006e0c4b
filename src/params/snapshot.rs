use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// One immutable, internally consistent set of effect parameters
///
/// A snapshot is read once at the start of each frame and every kernel
/// consumes only this value. Defaults reproduce the `portra_00s` look.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub resolution: Resolution,
    pub tone: ToneParams,
    pub grain: GrainParams,
    pub halation: HalationParams,
    pub bloom: BloomParams,
    pub optics: OpticsParams,
    pub temporal: TemporalParams,
    pub preset_name: String,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            tone: ToneParams::default(),
            grain: GrainParams::default(),
            halation: HalationParams::default(),
            bloom: BloomParams::default(),
            optics: OpticsParams::default(),
            temporal: TemporalParams::default(),
            preset_name: "portra_00s".to_string(),
        }
    }
}

/// Frame size the capture layer delivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self { width: 1280, height: 720 }
    }
}

/// Film characteristic curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneParams {
    /// Input level mapped to black
    pub toe: f32,
    /// Input level mapped to white
    pub shoulder: f32,
    /// Sigmoid slope
    pub contrast: f32,
    pub lift: f32,
    pub gamma: f32,
    pub gain: f32,
}

impl Default for ToneParams {
    fn default() -> Self {
        Self {
            toe: 0.12,
            shoulder: 0.88,
            contrast: 5.2,
            lift: 0.01,
            gamma: 1.02,
            gain: 1.03,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrainParams {
    pub strength: f32,
    /// Grain size in pixels; values above 1 produce coarser clumps
    pub scale: f32,
    /// Use the locked noise stream instead of the live one
    pub lock: bool,
}

impl Default for GrainParams {
    fn default() -> Self {
        Self {
            strength: 0.12,
            scale: 1.2,
            lock: true,
        }
    }
}

/// Red-weighted glow scattered back from the film base
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HalationParams {
    pub threshold: f32,
    pub radius_r: f32,
    pub radius_g: f32,
    pub radius_b: f32,
    pub strength: f32,
}

impl Default for HalationParams {
    fn default() -> Self {
        Self {
            threshold: 0.80,
            radius_r: 8.0,
            radius_g: 5.0,
            radius_b: 3.0,
            strength: 0.18,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomParams {
    pub radius: f32,
    pub strength: f32,
}

impl Default for BloomParams {
    fn default() -> Self {
        Self {
            radius: 7.0,
            strength: 0.15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpticsParams {
    /// Red/blue lateral shift in pixels
    pub ca_pixels: f32,
    pub vignette_strength: f32,
    /// Horizontal radius factor; 1.0 follows the frame aspect
    pub vignette_roundness: f32,
}

impl Default for OpticsParams {
    fn default() -> Self {
        Self {
            ca_pixels: 0.6,
            vignette_strength: 0.18,
            vignette_roundness: 0.7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporalParams {
    pub flicker: f32,
    /// Gate weave amplitude in pixels
    pub weave: f32,
}

impl Default for TemporalParams {
    fn default() -> Self {
        Self {
            flicker: 0.02,
            weave: 0.5,
        }
    }
}

impl Params {
    /// Check parameter ranges before they reach the frame pipeline
    ///
    /// The pipeline itself tolerates degenerate values; this is the gate the
    /// config and preset layers use to reject nonsense input.
    pub fn validate(&self) -> Result<()> {
        if self.resolution.width == 0 || self.resolution.height == 0 {
            return Err(invalid(
                "resolution",
                format!("{}x{}", self.resolution.width, self.resolution.height),
            ));
        }

        if self.tone.gamma <= 0.0 {
            return Err(invalid("tone.gamma", self.tone.gamma));
        }

        if self.grain.scale < 1.0 {
            return Err(invalid("grain.scale", self.grain.scale));
        }

        if !(0.0..1.0).contains(&self.halation.threshold) {
            return Err(invalid("halation.threshold", self.halation.threshold));
        }

        let non_negative = [
            ("grain.strength", self.grain.strength),
            ("halation.radius_r", self.halation.radius_r),
            ("halation.radius_g", self.halation.radius_g),
            ("halation.radius_b", self.halation.radius_b),
            ("halation.strength", self.halation.strength),
            ("bloom.radius", self.bloom.radius),
            ("bloom.strength", self.bloom.strength),
            ("optics.ca_pixels", self.optics.ca_pixels),
            ("optics.vignette_strength", self.optics.vignette_strength),
            ("optics.vignette_roundness", self.optics.vignette_roundness),
            ("temporal.flicker", self.temporal.flicker),
            ("temporal.weave", self.temporal.weave),
        ];
        for (key, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(key, value));
            }
        }

        Ok(())
    }
}

fn invalid(key: &str, value: impl ToString) -> crate::error::FilmError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
    .into()
}
