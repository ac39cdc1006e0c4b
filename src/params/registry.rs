use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{PresetError, Result};
use crate::params::{Params, Preset};

const PORTRA_00S: &str = r#"
name = "portra_00s"

[tone]
toe = 0.12
shoulder = 0.88
contrast = 5.2
lift = 0.01
gamma = 1.02
gain = 1.03

[grain]
strength = 0.12
scale = 1.2

[halation]
thresh = 0.80
r = 8.0
g = 5.0
b = 3.0
strength = 0.18

[bloom]
radius = 7.0
strength = 0.15

[optics]
ca_pixels = 0.6
vignette_strength = 0.18
vignette_round = 0.7

[temporal]
flicker = 0.02
weave = 0.5
"#;

const CINESTILL_800T: &str = r#"
name = "cinestill_800t"

[tone]
toe = 0.08
shoulder = 0.92
contrast = 6.0
lift = 0.02
gamma = 0.98
gain = 1.0

[grain]
strength = 0.2
scale = 1.6

[halation]
thresh = 0.65
r = 14.0
g = 6.0
b = 2.0
strength = 0.45

[bloom]
radius = 9.0
strength = 0.2

[optics]
ca_pixels = 0.8
vignette_strength = 0.22
vignette_round = 0.8

[temporal]
flicker = 0.03
weave = 0.8
"#;

const EKTACHROME_E100: &str = r#"
name = "ektachrome_e100"

[tone]
toe = 0.15
shoulder = 0.85
contrast = 7.0
lift = 0.0
gamma = 1.05
gain = 1.02

[grain]
strength = 0.06
scale = 1.0

[halation]
thresh = 0.85
r = 6.0
g = 4.0
b = 3.0
strength = 0.08

[bloom]
radius = 5.0
strength = 0.1

[optics]
ca_pixels = 0.4
vignette_strength = 0.25
vignette_round = 0.75

[temporal]
flicker = 0.01
weave = 0.3
"#;

/// Registry of available film looks
///
/// Built-in looks are always present; directories added later are scanned
/// for `*.toml` presets and override built-ins of the same name.
pub struct PresetRegistry {
    presets: BTreeMap<String, Preset>,
}

impl PresetRegistry {
    /// Create a registry holding the built-in looks
    pub fn new() -> Self {
        let mut registry = Self {
            presets: BTreeMap::new(),
        };

        registry.register_builtin_presets();
        registry
    }

    fn register_builtin_presets(&mut self) {
        for source in [PORTRA_00S, CINESTILL_800T, EKTACHROME_E100] {
            match Preset::from_toml_str(source) {
                Ok(preset) => self.register(preset),
                Err(e) => warn!("Skipping malformed built-in preset: {}", e),
            }
        }
    }

    /// Register (or replace) a preset under its own name
    pub fn register(&mut self, preset: Preset) {
        self.presets.insert(preset.name.clone(), preset);
    }

    /// Load every `*.toml` preset in `dir`, in file-name order
    ///
    /// Unreadable or nameless files are skipped with a warning. Returns the
    /// number of presets loaded.
    pub fn load_dir<P: AsRef<Path>>(&mut self, dir: P) -> Result<usize> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            debug!("Preset directory {:?} does not exist", dir);
            return Ok(0);
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("toml"))
            .collect();
        files.sort();

        let mut loaded = 0;
        for path in files {
            match Preset::from_file(&path) {
                Ok(preset) if !preset.name.is_empty() => {
                    debug!("Loaded preset '{}' from {:?}", preset.name, path);
                    self.register(preset);
                    loaded += 1;
                }
                Ok(_) => warn!("Preset {:?} has no name, skipping", path),
                Err(e) => warn!("Skipping preset {:?}: {}", path, e),
            }
        }

        Ok(loaded)
    }

    /// Get a preset by name
    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.get(name)
    }

    /// Get a preset by name or fail with [`PresetError::NotFound`]
    pub fn require(&self, name: &str) -> Result<&Preset> {
        self.get(name).ok_or_else(|| {
            PresetError::NotFound {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// All preset names, sorted
    pub fn names(&self) -> Vec<String> {
        self.presets.keys().cloned().collect()
    }

    pub fn has_preset(&self, name: &str) -> bool {
        self.presets.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Export `params` as `<dir>/<name>.toml` and register it
    pub fn save_user_preset<P: AsRef<Path>>(
        &mut self,
        dir: P,
        name: &str,
        params: &Params,
    ) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(PresetError::InvalidName {
                name: name.to_string(),
            }
            .into());
        }

        std::fs::create_dir_all(dir.as_ref())?;
        let path = dir.as_ref().join(format!("{}.toml", name));
        let preset = Preset::from_params(name, params);
        preset.save_to_file(&path)?;
        self.register(preset);

        Ok(path)
    }
}

impl Default for PresetRegistry {
    fn default() -> Self {
        Self::new()
    }
}
