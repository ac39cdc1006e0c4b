use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PresetError, Result};
use crate::params::Params;

/// A named film look stored on disk
///
/// Every field is optional: a preset only overrides what it names and leaves
/// the rest of the current parameters alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<ToneSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grain: Option<GrainSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub halation: Option<HalationSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bloom: Option<BloomSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optics: Option<OpticsSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal: Option<TemporalSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToneSection {
    pub toe: Option<f32>,
    pub shoulder: Option<f32>,
    pub contrast: Option<f32>,
    pub lift: Option<f32>,
    pub gamma: Option<f32>,
    pub gain: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrainSection {
    pub strength: Option<f32>,
    pub scale: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HalationSection {
    pub thresh: Option<f32>,
    pub r: Option<f32>,
    pub g: Option<f32>,
    pub b: Option<f32>,
    pub strength: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BloomSection {
    pub radius: Option<f32>,
    pub strength: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpticsSection {
    pub ca_pixels: Option<f32>,
    pub vignette_strength: Option<f32>,
    pub vignette_round: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemporalSection {
    pub flicker: Option<f32>,
    pub weave: Option<f32>,
}

fn set(target: &mut f32, value: Option<f32>) {
    if let Some(v) = value {
        *target = v;
    }
}

impl Preset {
    /// Overlay this preset onto `params`
    ///
    /// The grain lock flag and the resolution are session state, not part of
    /// a look, so they are never touched.
    pub fn apply_to(&self, params: &mut Params) {
        if let Some(t) = &self.tone {
            set(&mut params.tone.toe, t.toe);
            set(&mut params.tone.shoulder, t.shoulder);
            set(&mut params.tone.contrast, t.contrast);
            set(&mut params.tone.lift, t.lift);
            set(&mut params.tone.gamma, t.gamma);
            set(&mut params.tone.gain, t.gain);
        }
        if let Some(g) = &self.grain {
            set(&mut params.grain.strength, g.strength);
            set(&mut params.grain.scale, g.scale);
        }
        if let Some(h) = &self.halation {
            set(&mut params.halation.threshold, h.thresh);
            set(&mut params.halation.radius_r, h.r);
            set(&mut params.halation.radius_g, h.g);
            set(&mut params.halation.radius_b, h.b);
            set(&mut params.halation.strength, h.strength);
        }
        if let Some(b) = &self.bloom {
            set(&mut params.bloom.radius, b.radius);
            set(&mut params.bloom.strength, b.strength);
        }
        if let Some(o) = &self.optics {
            set(&mut params.optics.ca_pixels, o.ca_pixels);
            set(&mut params.optics.vignette_strength, o.vignette_strength);
            set(&mut params.optics.vignette_roundness, o.vignette_round);
        }
        if let Some(t) = &self.temporal {
            set(&mut params.temporal.flicker, t.flicker);
            set(&mut params.temporal.weave, t.weave);
        }
        if !self.name.is_empty() {
            params.preset_name = self.name.clone();
        }
    }

    /// Capture the current look as a fully populated preset
    pub fn from_params(name: &str, p: &Params) -> Self {
        Self {
            name: name.to_string(),
            tone: Some(ToneSection {
                toe: Some(p.tone.toe),
                shoulder: Some(p.tone.shoulder),
                contrast: Some(p.tone.contrast),
                lift: Some(p.tone.lift),
                gamma: Some(p.tone.gamma),
                gain: Some(p.tone.gain),
            }),
            grain: Some(GrainSection {
                strength: Some(p.grain.strength),
                scale: Some(p.grain.scale),
            }),
            halation: Some(HalationSection {
                thresh: Some(p.halation.threshold),
                r: Some(p.halation.radius_r),
                g: Some(p.halation.radius_g),
                b: Some(p.halation.radius_b),
                strength: Some(p.halation.strength),
            }),
            bloom: Some(BloomSection {
                radius: Some(p.bloom.radius),
                strength: Some(p.bloom.strength),
            }),
            optics: Some(OpticsSection {
                ca_pixels: Some(p.optics.ca_pixels),
                vignette_strength: Some(p.optics.vignette_strength),
                vignette_round: Some(p.optics.vignette_roundness),
            }),
            temporal: Some(TemporalSection {
                flicker: Some(p.temporal.flicker),
                weave: Some(p.temporal.weave),
            }),
        }
    }

    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load a preset from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| {
            PresetError::ParseFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Save this preset to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| PresetError::SerializeFailed {
            name: self.name.clone(),
            reason: e.to_string(),
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_fields_keep_current_values() {
        let preset = Preset::from_toml_str(
            r#"
            name = "soft"

            [tone]
            contrast = 3.0

            [temporal]
            weave = 2.0
            "#,
        )
        .unwrap();

        let mut params = Params::default();
        preset.apply_to(&mut params);

        assert_eq!(params.tone.contrast, 3.0);
        assert_eq!(params.tone.toe, 0.12);
        assert_eq!(params.temporal.weave, 2.0);
        assert_eq!(params.temporal.flicker, 0.02);
        assert_eq!(params.preset_name, "soft");
    }

    #[test]
    fn test_apply_leaves_lock_and_resolution() {
        let mut params = Params::default();
        params.grain.lock = false;
        params.resolution.width = 640;

        let mut other = Params::default();
        other.grain.strength = 0.4;
        Preset::from_params("heavy", &other).apply_to(&mut params);

        assert!(!params.grain.lock);
        assert_eq!(params.resolution.width, 640);
        assert_eq!(params.grain.strength, 0.4);
    }

    #[test]
    fn test_export_then_apply_restores_look() {
        let mut look = Params::default();
        look.halation.radius_r = 12.0;
        look.optics.vignette_roundness = 1.0;

        let dir = tempdir().unwrap();
        let path = dir.path().join("mine.toml");
        Preset::from_params("mine", &look).save_to_file(&path).unwrap();

        let mut params = Params::default();
        Preset::from_file(&path).unwrap().apply_to(&mut params);

        assert_eq!(params.halation, look.halation);
        assert_eq!(params.optics, look.optics);
        assert_eq!(params.preset_name, "mine");
    }

    #[test]
    fn test_bad_preset_file_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "name = [").unwrap();

        let err = Preset::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }
}
