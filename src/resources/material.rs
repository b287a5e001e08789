use std::sync::Arc;

use glam::Vec3;
use uuid::Uuid;

use crate::resources::texture::Texture;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    /// Unlit colour (ground ring).
    Basic,
    /// Metallic-roughness PBR.
    Standard,
}

/// Material parameters consumed by the renderer.
///
/// `map` is an `Arc` so duplicating a material never duplicates texture data.
#[derive(Debug, Clone)]
pub struct Material {
    pub uuid: Uuid,
    pub name: String,
    pub kind: MaterialKind,
    pub color: Vec3,
    pub opacity: f32,
    pub roughness: f32,
    pub metalness: f32,
    pub transparent: bool,
    pub depth_write: bool,
    pub alpha_test: f32,
    pub side: Side,
    pub map: Option<Arc<Texture>>,
}

impl Material {
    #[must_use]
    pub fn new_standard(color: Vec3) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: "StandardMaterial".to_string(),
            kind: MaterialKind::Standard,
            color,
            opacity: 1.0,
            roughness: 1.0,
            metalness: 0.0,
            transparent: false,
            depth_write: true,
            alpha_test: 0.0,
            side: Side::Front,
            map: None,
        }
    }

    #[must_use]
    pub fn new_basic(color: Vec3) -> Self {
        Self {
            name: "BasicMaterial".to_string(),
            kind: MaterialKind::Basic,
            ..Self::new_standard(color)
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_map(mut self, map: Arc<Texture>) -> Self {
        self.map = Some(map);
        self
    }

    /// Independent copy with a fresh identity. The texture stays shared.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            ..self.clone()
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new_standard(Vec3::ONE)
    }
}
