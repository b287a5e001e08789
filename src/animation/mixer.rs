use std::sync::Arc;

use glam::{Quat, Vec3};
use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};
use uuid::Uuid;

use crate::animation::action::{AnimationAction, TrackValue};
use crate::animation::binder::{BindTargets, Binder};
use crate::animation::binding::TargetPath;
use crate::animation::clip::AnimationClip;
use crate::scene::{NodeHandle, Scene};

new_key_type! {
    pub struct ActionHandle;
}

enum Blend {
    Vector(Vec3, f32),
    Rotation(Quat, f32),
}

/// Plays clips on one node hierarchy.
///
/// A mixer is bound to a single root; clips are shared `Arc`s but every
/// mixer keeps its own actions, cursors and bindings. While several actions
/// are active (crossfade) their samples are blended by weight.
pub struct AnimationMixer {
    root: NodeHandle,
    targets: Option<BindTargets>,
    actions: SlotMap<ActionHandle, AnimationAction>,
    by_clip: FxHashMap<Uuid, ActionHandle>,
}

impl AnimationMixer {
    /// Binds clips by searching the hierarchy under `root` at bind time.
    #[must_use]
    pub fn new(root: NodeHandle) -> Self {
        Self {
            root,
            targets: None,
            actions: SlotMap::with_key(),
            by_clip: FxHashMap::default(),
        }
    }

    /// Binds clips against a fixed snapshot, so nodes attached under the
    /// hierarchy later are never animated.
    #[must_use]
    pub fn with_targets(root: NodeHandle, targets: BindTargets) -> Self {
        Self {
            targets: Some(targets),
            ..Self::new(root)
        }
    }

    #[must_use]
    pub fn root(&self) -> NodeHandle {
        self.root
    }

    /// Returns the action for `clip`, creating and binding it on first use.
    pub fn clip_action(&mut self, scene: &Scene, clip: &Arc<AnimationClip>) -> ActionHandle {
        if let Some(&handle) = self.by_clip.get(&clip.uuid) {
            return handle;
        }
        let mut action = AnimationAction::new(Arc::clone(clip));
        action.bindings = match &self.targets {
            Some(targets) => Binder::bind_targets(targets, clip),
            None => Binder::bind(scene, self.root, clip),
        };
        let handle = self.actions.insert(action);
        self.by_clip.insert(clip.uuid, handle);
        handle
    }

    #[must_use]
    pub fn action(&self, handle: ActionHandle) -> Option<&AnimationAction> {
        self.actions.get(handle)
    }

    pub fn action_mut(&mut self, handle: ActionHandle) -> Option<&mut AnimationAction> {
        self.actions.get_mut(handle)
    }

    /// Restarts `handle` from time zero at full weight.
    pub fn play(&mut self, handle: ActionHandle) {
        if let Some(action) = self.actions.get_mut(handle) {
            action.reset().play();
        }
    }

    /// Restarts `to` from time zero and blends it in while `from` blends out.
    pub fn cross_fade(&mut self, from: ActionHandle, to: ActionHandle, duration: f32) {
        if from == to {
            self.play(to);
            return;
        }
        if let Some(action) = self.actions.get_mut(to) {
            action.reset().fade_in(duration);
        }
        if let Some(action) = self.actions.get_mut(from)
            && action.enabled
        {
            action.fade_out(duration);
        }
    }

    pub fn fade_out(&mut self, handle: ActionHandle, duration: f32) {
        if let Some(action) = self.actions.get_mut(handle) {
            action.fade_out(duration);
        }
    }

    pub fn stop_all(&mut self) {
        for action in self.actions.values_mut() {
            action.stop();
        }
    }

    /// Whether any action is still driving the hierarchy.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.actions.values().any(|a| a.enabled)
    }

    pub fn running_actions(&self) -> impl Iterator<Item = (ActionHandle, &AnimationAction)> {
        self.actions.iter().filter(|(_, a)| a.enabled)
    }

    /// Advances every action and writes the blended pose into `scene`.
    pub fn update(&mut self, dt: f32, scene: &mut Scene) {
        for action in self.actions.values_mut() {
            action.update(dt);
        }

        let mut blends: FxHashMap<(NodeHandle, TargetPath), Blend> = FxHashMap::default();

        for action in self.actions.values_mut() {
            let weight = action.weight;
            if !action.enabled || weight <= 0.0 {
                continue;
            }

            action.sample_bindings(|binding, value| {
                let entry = blends.entry((binding.node, binding.target));
                match value {
                    TrackValue::Vector3(v) => {
                        if let Blend::Vector(sum, total) = entry.or_insert(Blend::Vector(Vec3::ZERO, 0.0)) {
                            *sum += v * weight;
                            *total += weight;
                        }
                    }
                    TrackValue::Quaternion(q) => {
                        if let Blend::Rotation(acc, total) = entry.or_insert(Blend::Rotation(q, 0.0)) {
                            let combined = *total + weight;
                            *acc = acc.slerp(q, weight / combined);
                            *total = combined;
                        }
                    }
                }
            });
        }

        for ((handle, target), blend) in blends {
            let Some(node) = scene.get_node_mut(handle) else {
                continue;
            };
            let transform = &mut node.transform;
            match (target, blend) {
                (TargetPath::Translation, Blend::Vector(sum, total)) => {
                    transform.position = transform.position.lerp(sum / total, total.min(1.0));
                }
                (TargetPath::Scale, Blend::Vector(sum, total)) => {
                    transform.scale = transform.scale.lerp(sum / total, total.min(1.0));
                }
                (TargetPath::Rotation, Blend::Rotation(q, total)) => {
                    transform.rotation = transform.rotation.slerp(q, total.min(1.0));
                }
                _ => continue,
            }
            transform.mark_dirty();
        }
    }
}
