use glam::{Affine3A, Vec3};
use slotmap::SlotMap;

use crate::assets::prefab::Prefab;
use crate::resources::mesh::Mesh;
use crate::scene::node::Node;
use crate::scene::skeleton::Skeleton;
use crate::scene::{MeshKey, NodeHandle, SkeletonKey};

/// Handles created by [`Scene::instantiate`].
#[derive(Debug, Clone)]
pub struct PrefabInstance {
    /// Group node holding every prefab root.
    pub root: NodeHandle,
    /// `nodes[i]` is the instance of `prefab.nodes[i]`.
    pub nodes: Vec<NodeHandle>,
    pub skeletons: Vec<SkeletonKey>,
}

/// What [`Scene::remove_subtree`] released.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RemovedSubtree {
    pub nodes: usize,
    pub meshes: usize,
    pub skeletons: usize,
}

/// Scene container.
///
/// Pure data: hierarchy plus component storage. Nodes, meshes and skeletons
/// are addressed by slot-map keys so stale handles are detected.
#[derive(Debug, Default)]
pub struct Scene {
    pub nodes: SlotMap<NodeHandle, Node>,
    pub meshes: SlotMap<MeshKey, Mesh>,
    pub skins: SlotMap<SkeletonKey, Skeleton>,
    pub root_nodes: Vec<NodeHandle>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Nodes & hierarchy
    // ========================================================================

    /// Adds a node at the scene root.
    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        let handle = self.nodes.insert(node);
        self.root_nodes.push(handle);
        handle
    }

    pub fn create_node(&mut self, name: &str) -> NodeHandle {
        self.add_node(Node::new(name))
    }

    pub fn add_to_parent(&mut self, child: Node, parent: NodeHandle) -> NodeHandle {
        let handle = self.add_node(child);
        self.attach(handle, parent);
        handle
    }

    #[inline]
    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    #[inline]
    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    /// Re-parents `child` under `parent`.
    ///
    /// Returns `false` (and changes nothing) if either handle is stale or the
    /// move would create a cycle.
    pub fn attach(&mut self, child: NodeHandle, parent: NodeHandle) -> bool {
        if child == parent
            || !self.nodes.contains_key(child)
            || !self.nodes.contains_key(parent)
            || self.is_ancestor(child, parent)
        {
            return false;
        }

        self.unlink(child);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
            c.transform.mark_dirty();
        }
        true
    }

    /// Moves `child` back to the scene root.
    pub fn detach(&mut self, child: NodeHandle) {
        if !self.nodes.contains_key(child) {
            return;
        }
        self.unlink(child);
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = None;
            c.transform.mark_dirty();
        }
        self.root_nodes.push(child);
    }

    fn unlink(&mut self, child: NodeHandle) {
        match self.nodes.get(child).and_then(|n| n.parent) {
            Some(old_parent) => {
                if let Some(p) = self.nodes.get_mut(old_parent) {
                    p.children.retain(|&c| c != child);
                }
            }
            None => self.root_nodes.retain(|&r| r != child),
        }
    }

    /// Whether `ancestor` is `node` or one of its parents.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeHandle, node: NodeHandle) -> bool {
        let mut current = Some(node);
        while let Some(handle) = current {
            if handle == ancestor {
                return true;
            }
            current = self.nodes.get(handle).and_then(|n| n.parent);
        }
        false
    }

    /// Depth-first pre-order walk of `root` and its descendants.
    pub fn traverse(&self, root: NodeHandle, mut visit: impl FnMut(NodeHandle, &Node)) {
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            visit(handle, node);
            stack.extend(node.children.iter().rev().copied());
        }
    }

    /// `root` followed by all its descendants, pre-order.
    #[must_use]
    pub fn descendants(&self, root: NodeHandle) -> Vec<NodeHandle> {
        let mut out = Vec::new();
        self.traverse(root, |handle, _| out.push(handle));
        out
    }

    #[must_use]
    pub fn find_node_by_name(&self, root: NodeHandle, name: &str) -> Option<NodeHandle> {
        self.find_descendant(root, |node| node.name == name)
    }

    #[must_use]
    pub fn find_descendant(
        &self,
        root: NodeHandle,
        predicate: impl Fn(&Node) -> bool,
    ) -> Option<NodeHandle> {
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            if predicate(node) {
                return Some(handle);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    // ========================================================================
    // Components
    // ========================================================================

    /// Stores `mesh` and attaches it to `node`, replacing any previous mesh.
    pub fn set_mesh(&mut self, node: NodeHandle, mesh: Mesh) -> Option<MeshKey> {
        let target = self.nodes.get_mut(node)?;
        let key = self.meshes.insert(mesh);
        if let Some(old) = target.mesh.replace(key) {
            self.meshes.remove(old);
        }
        Some(key)
    }

    #[must_use]
    pub fn mesh_of(&self, node: NodeHandle) -> Option<&Mesh> {
        let key = self.nodes.get(node)?.mesh?;
        self.meshes.get(key)
    }

    pub fn mesh_of_mut(&mut self, node: NodeHandle) -> Option<&mut Mesh> {
        let key = self.nodes.get(node)?.mesh?;
        self.meshes.get_mut(key)
    }

    // ========================================================================
    // Prefabs
    // ========================================================================

    /// Instantiates `prefab` as a new root-level group named `name`.
    ///
    /// Nodes, bones and skeletons are fresh per call. Geometry and textures
    /// are shared with the prefab; every material is duplicated.
    pub fn instantiate(&mut self, prefab: &Prefab, name: &str) -> PrefabInstance {
        let root = self.create_node(name);

        let nodes: Vec<NodeHandle> = prefab
            .nodes
            .iter()
            .map(|src| {
                let mut node = Node::new(src.name.clone());
                node.transform = src.transform.clone();
                node.is_bone = src.is_bone;
                self.nodes.insert(node)
            })
            .collect();

        for (index, src) in prefab.nodes.iter().enumerate() {
            let parent = nodes[index];
            for &child_index in &src.children_indices {
                let Some(&child) = nodes.get(child_index) else {
                    continue;
                };
                if let Some(p) = self.nodes.get_mut(parent) {
                    p.children.push(child);
                }
                if let Some(c) = self.nodes.get_mut(child) {
                    c.parent = Some(parent);
                }
            }
        }

        for &root_index in &prefab.root_indices {
            if let Some(&handle) = nodes.get(root_index) {
                self.adopt(root, handle);
            }
        }

        // Nodes outside the prefab's hierarchy still belong to the instance,
        // hidden, so removing the instance root releases them.
        for &handle in &nodes {
            if let Some(node) = self.nodes.get_mut(handle)
                && node.parent.is_none()
            {
                node.visible = false;
                self.adopt(root, handle);
            }
        }

        let skeletons: Vec<SkeletonKey> = prefab
            .skeletons
            .iter()
            .map(|src| {
                let bones = src
                    .bone_indices
                    .iter()
                    .filter_map(|&i| nodes.get(i).copied())
                    .collect();
                self.skins.insert(Skeleton::new(
                    &src.name,
                    bones,
                    src.inverse_bind_matrices.clone(),
                    src.root_bone_index,
                ))
            })
            .collect();

        for (index, src) in prefab.nodes.iter().enumerate() {
            let handle = nodes[index];
            if let Some(prefab_mesh) = &src.mesh {
                let mut mesh = Mesh::new(prefab_mesh.geometry.clone(), prefab_mesh.material.duplicate())
                    .with_name(src.name.clone());
                mesh.skinned = prefab_mesh.skinned;
                self.set_mesh(handle, mesh);
            }
            if let Some(skin_index) = src.skin_index
                && let Some(node) = self.nodes.get_mut(handle)
            {
                node.skin = skeletons.get(skin_index).copied();
            }
        }

        PrefabInstance {
            root,
            nodes,
            skeletons,
        }
    }

    fn adopt(&mut self, parent: NodeHandle, child: NodeHandle) {
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
        }
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(child);
        }
    }

    /// Removes `root` and all descendants together with their meshes and
    /// skeletons. Shared geometry is only released when its last `Arc` drops.
    pub fn remove_subtree(&mut self, root: NodeHandle) -> RemovedSubtree {
        if !self.nodes.contains_key(root) {
            return RemovedSubtree::default();
        }
        self.unlink(root);

        let mut removed = RemovedSubtree::default();
        for handle in self.descendants(root) {
            let Some(node) = self.nodes.remove(handle) else {
                continue;
            };
            removed.nodes += 1;
            if let Some(key) = node.mesh
                && self.meshes.remove(key).is_some()
            {
                removed.meshes += 1;
            }
            if let Some(key) = node.skin
                && self.skins.remove(key).is_some()
            {
                removed.skeletons += 1;
            }
        }
        removed
    }

    // ========================================================================
    // Transforms
    // ========================================================================

    /// Propagates world matrices from every root, then refreshes skeletons.
    pub fn update_matrix_world(&mut self) {
        let mut stack: Vec<(NodeHandle, Affine3A)> = self
            .root_nodes
            .iter()
            .map(|&r| (r, Affine3A::IDENTITY))
            .collect();

        while let Some((handle, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(handle) else {
                continue;
            };
            node.transform.update_local_matrix();
            let world = parent_world * node.transform.local_matrix;
            node.transform.set_world_matrix(world);
            stack.extend(node.children.iter().map(|&c| (c, world)));
        }

        let skinned: Vec<(SkeletonKey, Affine3A)> = self
            .nodes
            .values()
            .filter_map(|n| n.skin.map(|s| (s, n.transform.world_matrix.inverse())))
            .collect();
        for (key, root_inv) in skinned {
            if let Some(skeleton) = self.skins.get_mut(key) {
                skeleton.compute_joint_matrices(&self.nodes, root_inv);
            }
        }
    }

    /// World-space position as of the last [`Scene::update_matrix_world`].
    #[must_use]
    pub fn world_position(&self, handle: NodeHandle) -> Option<Vec3> {
        self.nodes
            .get(handle)
            .map(|n| n.transform.world_matrix.translation.into())
    }
}
