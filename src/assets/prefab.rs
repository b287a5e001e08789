use std::sync::Arc;

use glam::Affine3A;

use crate::resources::geometry::Geometry;
use crate::resources::material::Material;
use crate::scene::transform::Transform;

/// Mesh data of a prefab node. Both halves are shared; instantiation
/// duplicates the material and keeps the geometry `Arc`.
#[derive(Debug, Clone)]
pub struct PrefabMesh {
    pub geometry: Arc<Geometry>,
    pub material: Arc<Material>,
    pub skinned: bool,
}

/// Prefab node: plain data, children referenced by index.
#[derive(Debug, Clone, Default)]
pub struct PrefabNode {
    pub name: String,
    pub transform: Transform,
    /// Indices into `Prefab::nodes`.
    pub children_indices: Vec<usize>,
    pub mesh: Option<PrefabMesh>,
    /// Index into `Prefab::skeletons`.
    pub skin_index: Option<usize>,
    pub is_bone: bool,
}

impl PrefabNode {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct PrefabSkeleton {
    pub name: String,
    pub root_bone_index: usize,
    /// Bone node indices into `Prefab::nodes`.
    pub bone_indices: Vec<usize>,
    pub inverse_bind_matrices: Arc<[Affine3A]>,
}

/// Decoded scene template.
///
/// A prefab holds no scene handles and is never mutated after load, so it can
/// be shared across threads and instantiated any number of times with
/// [`Scene::instantiate`](crate::scene::Scene::instantiate).
#[derive(Debug, Clone, Default)]
pub struct Prefab {
    pub nodes: Vec<PrefabNode>,
    pub root_indices: Vec<usize>,
    pub skeletons: Vec<PrefabSkeleton>,
}

impl Prefab {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node and returns its index.
    pub fn push_node(&mut self, node: PrefabNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    #[must_use]
    pub fn find_node(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.name == name)
    }

    /// Largest vertical bounding extent over all mesh-bearing nodes, measured
    /// in geometry space (skinned bounds are unreliable once posed).
    #[must_use]
    pub fn reference_height(&self) -> f32 {
        self.nodes
            .iter()
            .filter_map(|n| n.mesh.as_ref())
            .filter_map(|m| m.geometry.bounding_box())
            .map(|b| b.height())
            .fold(0.0_f32, f32::max)
    }
}

/// Thread-safe prefab reference.
pub type SharedPrefab = Arc<Prefab>;
