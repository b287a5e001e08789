use std::sync::Arc;

use glam::{Affine3A, Mat4};
use slotmap::SlotMap;

use crate::scene::{Node, NodeHandle};

/// Bone list of one skinned hierarchy.
///
/// Each instance gets its own `Skeleton` pointing at its own bone nodes, so
/// poses are independent. The inverse bind matrices are static load data and
/// are shared with the prefab.
#[derive(Debug, Clone)]
pub struct Skeleton {
    pub name: String,
    /// `bones[i]` corresponds to joint `i` in the skinned geometry.
    pub bones: Vec<NodeHandle>,
    pub(crate) inverse_bind_matrices: Arc<[Affine3A]>,
    pub(crate) root_bone_index: usize,
    pub(crate) joint_matrices: Vec<Mat4>,
}

impl Skeleton {
    #[must_use]
    pub fn new(
        name: &str,
        bones: Vec<NodeHandle>,
        inverse_bind_matrices: Arc<[Affine3A]>,
        root_bone_index: usize,
    ) -> Self {
        let count = bones.len();
        Self {
            name: name.to_string(),
            bones,
            inverse_bind_matrices,
            root_bone_index,
            joint_matrices: vec![Mat4::IDENTITY; count],
        }
    }

    #[inline]
    #[must_use]
    pub fn root_bone(&self) -> Option<NodeHandle> {
        self.bones.get(self.root_bone_index).copied()
    }

    #[inline]
    #[must_use]
    pub fn joint_matrices(&self) -> &[Mat4] {
        &self.joint_matrices
    }

    #[inline]
    #[must_use]
    pub fn inverse_bind_matrices(&self) -> &Arc<[Affine3A]> {
        &self.inverse_bind_matrices
    }

    /// Recomputes joint matrices from the bones' current world matrices.
    ///
    /// `root_matrix_inv` is the inverse world matrix of the skinned mesh node.
    pub fn compute_joint_matrices(
        &mut self,
        nodes: &SlotMap<NodeHandle, Node>,
        root_matrix_inv: Affine3A,
    ) {
        for (i, &bone) in self.bones.iter().enumerate() {
            let Some(bone_node) = nodes.get(bone) else {
                continue;
            };
            let ibm = self
                .inverse_bind_matrices
                .get(i)
                .copied()
                .unwrap_or(Affine3A::IDENTITY);
            self.joint_matrices[i] = (root_matrix_inv * bone_node.transform.world_matrix * ibm).into();
        }
    }
}
