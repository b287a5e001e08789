//! Named bone pivots.
//!
//! Skeletons differ between exports, so every pivot is resolved through an
//! ordered candidate list. The first bone present wins; otherwise the
//! fallback node is used.

use rustc_hash::FxHashMap;

use crate::scene::{NodeHandle, Scene};

pub const HEAD_CHAIN: &[&str] = &["Head", "neck"];
pub const BODY_CHAIN: &[&str] = &["Spine02", "Hips"];
pub const LEFT_ARM_CHAIN: &[&str] = &["LeftArm"];
pub const RIGHT_ARM_CHAIN: &[&str] = &["RightArm"];
pub const LEFT_LEG_CHAIN: &[&str] = &["LeftUpLeg"];
pub const RIGHT_LEG_CHAIN: &[&str] = &["RightUpLeg"];
pub const LEFT_FOREARM_CHAIN: &[&str] = &["LeftForeArm"];
pub const RIGHT_FOREARM_CHAIN: &[&str] = &["RightForeArm"];

/// Bone name → node, for every bone under a root.
pub type BoneMap = FxHashMap<String, NodeHandle>;

/// Collects bones below `root`. On duplicate names the first one in
/// pre-order wins.
#[must_use]
pub fn collect_bones(scene: &Scene, root: NodeHandle) -> BoneMap {
    let mut bones = BoneMap::default();
    scene.traverse(root, |handle, node| {
        if node.is_bone {
            bones.entry(node.name.clone()).or_insert(handle);
        }
    });
    bones
}

/// First bone of `candidates` present in `bones`.
#[must_use]
pub fn find_bone(bones: &BoneMap, candidates: &[&str]) -> Option<NodeHandle> {
    candidates.iter().find_map(|name| bones.get(*name).copied())
}

/// First bone of `candidates` present in `bones`, else `fallback`.
#[must_use]
pub fn resolve_bone(bones: &BoneMap, candidates: &[&str], fallback: NodeHandle) -> NodeHandle {
    find_bone(bones, candidates).unwrap_or(fallback)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BonePivots {
    pub head: NodeHandle,
    pub body: NodeHandle,
    pub left_arm: NodeHandle,
    pub right_arm: NodeHandle,
    pub left_leg: NodeHandle,
    pub right_leg: NodeHandle,
    /// Forearms have no sensible fallback.
    pub left_forearm: Option<NodeHandle>,
    pub right_forearm: Option<NodeHandle>,
}

impl BonePivots {
    #[must_use]
    pub fn resolve(bones: &BoneMap, fallback: NodeHandle) -> Self {
        Self {
            head: resolve_bone(bones, HEAD_CHAIN, fallback),
            body: resolve_bone(bones, BODY_CHAIN, fallback),
            left_arm: resolve_bone(bones, LEFT_ARM_CHAIN, fallback),
            right_arm: resolve_bone(bones, RIGHT_ARM_CHAIN, fallback),
            left_leg: resolve_bone(bones, LEFT_LEG_CHAIN, fallback),
            right_leg: resolve_bone(bones, RIGHT_LEG_CHAIN, fallback),
            left_forearm: find_bone(bones, LEFT_FOREARM_CHAIN),
            right_forearm: find_bone(bones, RIGHT_FOREARM_CHAIN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Node;

    fn bone(scene: &mut Scene, name: &str, parent: NodeHandle) -> NodeHandle {
        let mut node = Node::new(name);
        node.is_bone = true;
        scene.add_to_parent(node, parent)
    }

    #[test]
    fn chains_prefer_earlier_candidates_then_fall_back() {
        let mut scene = Scene::new();
        let root = scene.create_node("root");
        let hips = bone(&mut scene, "Hips", root);
        let neck = bone(&mut scene, "neck", hips);
        // Not a bone: must not be picked up.
        scene.add_to_parent(Node::new("Head"), neck);

        let bones = collect_bones(&scene, root);
        let pivots = BonePivots::resolve(&bones, root);

        assert_eq!(pivots.head, neck);
        assert_eq!(pivots.body, hips);
        assert_eq!(pivots.left_arm, root);
        assert_eq!(pivots.left_forearm, None);
    }
}
