use rustc_hash::FxHashMap;

use crate::animation::binding::PropertyBinding;
use crate::animation::clip::AnimationClip;
use crate::scene::{NodeHandle, Scene};

/// Node name → node for one animated hierarchy. The first node of a name in
/// pre-order wins.
pub type BindTargets = FxHashMap<String, NodeHandle>;

pub struct Binder;

impl Binder {
    /// Snapshot of every named node under `root`, `root` included.
    #[must_use]
    pub fn targets(scene: &Scene, root: NodeHandle) -> BindTargets {
        let mut targets = BindTargets::default();
        scene.traverse(root, |handle, node| {
            targets.entry(node.name.clone()).or_insert(handle);
        });
        targets
    }

    /// Resolves each track of `clip` to a node under `root` by name.
    ///
    /// Tracks whose node does not exist in this hierarchy are skipped.
    #[must_use]
    pub fn bind(scene: &Scene, root: NodeHandle, clip: &AnimationClip) -> Vec<PropertyBinding> {
        Self::bind_with(clip, |name| scene.find_node_by_name(root, name))
    }

    /// Resolves each track of `clip` against a fixed target snapshot.
    #[must_use]
    pub fn bind_targets(targets: &BindTargets, clip: &AnimationClip) -> Vec<PropertyBinding> {
        Self::bind_with(clip, |name| targets.get(name).copied())
    }

    fn bind_with(clip: &AnimationClip, resolve: impl Fn(&str) -> Option<NodeHandle>) -> Vec<PropertyBinding> {
        let mut bindings = Vec::with_capacity(clip.tracks.len());

        for (track_index, track) in clip.tracks.iter().enumerate() {
            match resolve(&track.meta.node_name) {
                Some(node) => bindings.push(PropertyBinding {
                    track_index,
                    node,
                    target: track.meta.target,
                }),
                None => log::trace!(
                    "clip '{}': no node named '{}'",
                    clip.name,
                    track.meta.node_name
                ),
            }
        }

        bindings
    }
}
