//! Variant manifest: which files make up each avatar variant.
//!
//! The built-in manifest declares the `red` variant. Custom manifests are read
//! from JSON:
//!
//! ```json
//! {
//!   "variants": {
//!     "red": {
//!       "files": { "base": "lobster-base.glb", "idle": "lobster-idle.glb" },
//!       "extra_animations": { "dance-funny2": "lobster-dance-funny2.glb" },
//!       "ring_color": "#c45033"
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::errors::{AssetError, Result};
use crate::resources::color::parse_hex_rgb;

/// Ground-ring colour used when a variant declares none or an invalid one.
pub const DEFAULT_RING_COLOR: &str = "#c45033";

/// Core files of a variant. Only `base` is mandatory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantFiles {
    pub base: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub walk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,
}

/// A bone-anchored attachment point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotDef {
    pub name: String,
    pub bone: String,
    #[serde(default)]
    pub offset: [f32; 3],
}

impl SlotDef {
    pub fn new(name: &str, bone: &str, offset: [f32; 3]) -> Self {
        Self {
            name: name.to_string(),
            bone: bone.to_string(),
            offset,
        }
    }

    #[must_use]
    pub fn offset(&self) -> Vec3 {
        Vec3::from_array(self.offset)
    }
}

/// Offsets are in bone space, which is tiny because the model is scaled up.
fn default_slots() -> Vec<SlotDef> {
    vec![
        SlotDef::new("head", "Head", [0.0, 0.005, 0.0]),
        SlotDef::new("face", "headfront", [0.0, 0.0, 0.0]),
        SlotDef::new("back", "Spine", [0.0, 0.0, -0.005]),
        SlotDef::new("left-claw", "LeftHand", [0.0, 0.0, 0.0]),
        SlotDef::new("right-claw", "RightHand", [0.0, 0.0, 0.0]),
    ]
}

fn default_ring_color() -> String {
    DEFAULT_RING_COLOR.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantDef {
    pub files: VariantFiles,
    /// Extra clip name → file, fetched on first use.
    #[serde(default)]
    pub extra_animations: BTreeMap<String, String>,
    #[serde(default = "default_slots")]
    pub slots: Vec<SlotDef>,
    #[serde(default = "default_ring_color")]
    pub ring_color: String,
}

impl VariantDef {
    /// Parsed ring colour, falling back to [`DEFAULT_RING_COLOR`].
    #[must_use]
    pub fn ring_rgb(&self) -> Vec3 {
        parse_hex_rgb(&self.ring_color)
            .or_else(|| parse_hex_rgb(DEFAULT_RING_COLOR))
            .unwrap_or(Vec3::ONE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantManifest {
    pub variants: BTreeMap<String, VariantDef>,
}

impl VariantManifest {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn variant(&self, name: &str) -> std::result::Result<&VariantDef, AssetError> {
        self.variants
            .get(name)
            .ok_or_else(|| AssetError::UnknownVariant(name.to_string()))
    }

    pub fn variant_names(&self) -> impl Iterator<Item = &str> {
        self.variants.keys().map(String::as_str)
    }
}

impl Default for VariantManifest {
    fn default() -> Self {
        let red = VariantDef {
            files: VariantFiles {
                base: "lobster-base.glb".to_string(),
                idle: Some("lobster-idle.glb".to_string()),
                walk: Some("lobster-walk.glb".to_string()),
                run: Some("lobster-run.glb".to_string()),
            },
            extra_animations: BTreeMap::from([(
                "dance-funny2".to_string(),
                "lobster-dance-funny2.glb".to_string(),
            )]),
            slots: default_slots(),
            ring_color: DEFAULT_RING_COLOR.to_string(),
        };
        Self {
            variants: BTreeMap::from([("red".to_string(), red)]),
        }
    }
}
