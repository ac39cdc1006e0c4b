use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::params::Params;

/// Shared, versioned parameter source
///
/// Readers take an `Arc` to one complete `Params` value; writers build a new
/// value and swap the pointer. A frame that took a snapshot keeps seeing the
/// same values for its whole duration, whatever the UI does meanwhile.
#[derive(Debug)]
pub struct ParamStore {
    current: RwLock<Arc<Params>>,
}

/// Which derived processor caches a parameter change makes stale
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Invalidation {
    pub tone: bool,
    pub vignette: bool,
}

impl Invalidation {
    pub const NONE: Self = Self {
        tone: false,
        vignette: false,
    };
    pub const ALL: Self = Self {
        tone: true,
        vignette: true,
    };
}

/// A value written to a single named parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Integer(i64),
    Float(f32),
    String(String),
}

impl ParamValue {
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            ParamValue::Float(f) => Some(*f),
            ParamValue::Integer(i) => Some(*i as f32),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            ParamValue::Integer(i) => u32::try_from(*i).ok(),
            ParamValue::Float(f) if *f >= 0.0 && f.fract() == 0.0 => Some(*f as u32),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        ParamValue::Float(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value as f32)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Integer(value as i64)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Integer(value as i64)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::String(value)
    }
}

const FIELD_NAMES: &[&str] = &[
    "resolution.width",
    "resolution.height",
    "tone.toe",
    "tone.shoulder",
    "tone.contrast",
    "tone.lift",
    "tone.gamma",
    "tone.gain",
    "grain.strength",
    "grain.scale",
    "grain.lock",
    "halation.threshold",
    "halation.radius_r",
    "halation.radius_g",
    "halation.radius_b",
    "halation.strength",
    "bloom.radius",
    "bloom.strength",
    "optics.ca_pixels",
    "optics.vignette_strength",
    "optics.vignette_roundness",
    "temporal.flicker",
    "temporal.weave",
    "preset_name",
];

impl ParamStore {
    pub fn new(params: Params) -> Self {
        Self {
            current: RwLock::new(Arc::new(params)),
        }
    }

    /// Take one consistent view of every parameter
    pub fn snapshot(&self) -> Arc<Params> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Replace the whole parameter set
    pub fn replace(&self, params: Params) {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(params);
    }

    /// Apply an edit to a copy of the current parameters and publish it
    pub fn update<F>(&self, edit: F)
    where
        F: FnOnce(&mut Params),
    {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        let mut next = Params::clone(&guard);
        edit(&mut next);
        *guard = Arc::new(next);
    }

    /// Names accepted by [`ParamStore::set_field`]
    pub fn field_names() -> &'static [&'static str] {
        FIELD_NAMES
    }

    /// Set one named field, e.g. `tone.contrast` or `grain.lock`
    ///
    /// Returns the caches the processor has to drop for the change to show.
    pub fn set_field<V: Into<ParamValue>>(&self, name: &str, value: V) -> Result<Invalidation> {
        let value = value.into();
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        let mut next = Params::clone(&guard);
        let invalidation = write_field(&mut next, name, &value)?;
        *guard = Arc::new(next);

        debug!("Parameter {} set to {:?}", name, value);
        Ok(invalidation)
    }
}

impl Default for ParamStore {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

fn write_field(p: &mut Params, name: &str, value: &ParamValue) -> Result<Invalidation> {
    let float = || value.as_f32().ok_or_else(|| bad_value(name, value));

    let tone = Invalidation {
        tone: true,
        vignette: false,
    };
    let vignette = Invalidation {
        tone: false,
        vignette: true,
    };

    match name {
        "resolution.width" | "resolution.height" => {
            let v = value
                .as_u32()
                .filter(|v| *v > 0)
                .ok_or_else(|| bad_value(name, value))?;
            if name.ends_with("width") {
                p.resolution.width = v;
            } else {
                p.resolution.height = v;
            }
            Ok(vignette)
        }
        "tone.toe" => {
            p.tone.toe = float()?;
            Ok(tone)
        }
        "tone.shoulder" => {
            p.tone.shoulder = float()?;
            Ok(tone)
        }
        "tone.contrast" => {
            p.tone.contrast = float()?;
            Ok(tone)
        }
        "tone.lift" => {
            p.tone.lift = float()?;
            Ok(tone)
        }
        "tone.gamma" => {
            p.tone.gamma = float()?;
            Ok(tone)
        }
        "tone.gain" => {
            p.tone.gain = float()?;
            Ok(tone)
        }
        "grain.strength" => {
            p.grain.strength = float()?;
            Ok(Invalidation::NONE)
        }
        "grain.scale" => {
            p.grain.scale = float()?;
            Ok(Invalidation::NONE)
        }
        "grain.lock" => {
            p.grain.lock = value.as_bool().ok_or_else(|| bad_value(name, value))?;
            Ok(Invalidation::NONE)
        }
        "halation.threshold" => {
            p.halation.threshold = float()?;
            Ok(Invalidation::NONE)
        }
        "halation.radius_r" => {
            p.halation.radius_r = float()?;
            Ok(Invalidation::NONE)
        }
        "halation.radius_g" => {
            p.halation.radius_g = float()?;
            Ok(Invalidation::NONE)
        }
        "halation.radius_b" => {
            p.halation.radius_b = float()?;
            Ok(Invalidation::NONE)
        }
        "halation.strength" => {
            p.halation.strength = float()?;
            Ok(Invalidation::NONE)
        }
        "bloom.radius" => {
            p.bloom.radius = float()?;
            Ok(Invalidation::NONE)
        }
        "bloom.strength" => {
            p.bloom.strength = float()?;
            Ok(Invalidation::NONE)
        }
        "optics.ca_pixels" => {
            p.optics.ca_pixels = float()?;
            Ok(Invalidation::NONE)
        }
        "optics.vignette_strength" => {
            p.optics.vignette_strength = float()?;
            Ok(vignette)
        }
        "optics.vignette_roundness" => {
            p.optics.vignette_roundness = float()?;
            Ok(vignette)
        }
        "temporal.flicker" => {
            p.temporal.flicker = float()?;
            Ok(Invalidation::NONE)
        }
        "temporal.weave" => {
            p.temporal.weave = float()?;
            Ok(Invalidation::NONE)
        }
        "preset_name" => {
            p.preset_name = value
                .as_string()
                .ok_or_else(|| bad_value(name, value))?
                .to_string();
            Ok(Invalidation::NONE)
        }
        _ => Err(ConfigError::UnknownField {
            name: name.to_string(),
        }
        .into()),
    }
}

fn bad_value(name: &str, value: &ParamValue) -> crate::error::FilmError {
    ConfigError::InvalidValue {
        key: name.to_string(),
        value: format!("{:?}", value),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_is_isolated_from_later_writes() {
        let store = ParamStore::default();
        let before = store.snapshot();

        store.set_field("tone.contrast", 9.0).unwrap();

        assert_eq!(before.tone.contrast, 5.2);
        assert_eq!(store.snapshot().tone.contrast, 9.0);
    }

    #[test]
    fn test_invalidation_by_field_group() {
        let store = ParamStore::default();

        let inv = store.set_field("tone.gamma", 1.2).unwrap();
        assert_eq!(
            inv,
            Invalidation {
                tone: true,
                vignette: false,
            }
        );

        let inv = store.set_field("optics.vignette_strength", 0.4).unwrap();
        assert_eq!(
            inv,
            Invalidation {
                tone: false,
                vignette: true,
            }
        );

        let inv = store.set_field("resolution.width", 640u32).unwrap();
        assert!(inv.vignette);

        let inv = store.set_field("bloom.strength", 0.3).unwrap();
        assert_eq!(inv, Invalidation::NONE);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let store = ParamStore::default();
        assert!(store.set_field("tone.saturation", 1.0).is_err());
    }

    #[test]
    fn test_wrong_value_kind_rejected() {
        let store = ParamStore::default();
        assert!(store.set_field("grain.lock", 1.0).is_err());
        assert!(store.set_field("resolution.width", -3i64).is_err());
        assert!(store.snapshot().grain.lock);
    }

    #[test]
    fn test_every_listed_field_is_settable() {
        let store = ParamStore::default();
        for name in ParamStore::field_names() {
            let value = match *name {
                "grain.lock" => ParamValue::Bool(false),
                "preset_name" => ParamValue::from("custom"),
                n if n.starts_with("resolution.") => ParamValue::Integer(320),
                _ => ParamValue::Float(0.5),
            };
            assert!(store.set_field(name, value).is_ok(), "{} should be settable", name);
        }
    }

    #[test]
    fn test_update_swaps_whole_value() {
        let store = ParamStore::default();
        store.update(|p| {
            p.resolution.width = 640;
            p.resolution.height = 480;
        });
        let snap = store.snapshot();
        assert_eq!((snap.resolution.width, snap.resolution.height), (640, 480));
    }
}
