use bitflags::bitflags;
use glam::Affine3A;

use crate::scene::transform::Transform;
use crate::scene::{MeshKey, NodeHandle, SkeletonKey};

bitflags! {
    /// Markers the avatar runtime looks for on nodes it does not own.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct NodeFlags: u32 {
        /// Pivot of a back-slot accessory that receives flutter motion.
        const FLUTTER_PIVOT = 1 << 0;
    }
}

/// A scene node.
///
/// Keeps the hierarchy, the transform and optional component keys; the
/// components themselves live in [`Scene`](crate::scene::Scene) storage.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,

    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,

    pub transform: Transform,
    pub visible: bool,

    pub mesh: Option<MeshKey>,
    pub skin: Option<SkeletonKey>,
    pub is_bone: bool,
    pub flags: NodeFlags,
}

impl Node {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            transform: Transform::new(),
            visible: true,
            mesh: None,
            skin: None,
            is_bone: false,
            flags: NodeFlags::empty(),
        }
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.transform.world_matrix
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new("Node")
    }
}
