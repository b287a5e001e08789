use std::sync::Arc;

use crate::resources::geometry::Geometry;
use crate::resources::material::Material;

/// A renderable attached to a scene node.
///
/// Geometry is reference counted: loaded geometry is shared with the asset
/// cache, while the material is owned by this mesh alone.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    pub geometry: Arc<Geometry>,
    pub material: Material,
    pub skinned: bool,
    pub visible: bool,
}

impl Mesh {
    #[must_use]
    pub fn new(geometry: Arc<Geometry>, material: Material) -> Self {
        Self {
            name: "Mesh".to_string(),
            geometry,
            material,
            skinned: false,
            visible: true,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
