use glam::Vec3;

use crate::assets::manifest::SlotDef;
use crate::avatar::pivots::BoneMap;
use crate::scene::{Node, NodeFlags, NodeHandle, Scene};

pub const BACK_SLOT: &str = "back";

/// Rest pitch of a fluttering back accessory.
const FLUTTER_BASE_PITCH: f32 = 0.40;

/// Euler XYZ rotation of a back-slot flutter pivot at time `t`.
///
/// Locomotion adds faster, larger terms on top of the idle sway.
#[must_use]
pub fn flutter_rotation(t: f32, moving: bool) -> Vec3 {
    let mut rotation = Vec3::new(
        FLUTTER_BASE_PITCH + 0.03 * (1.6 * t + 0.4).sin(),
        0.04 * (1.9 * t).sin(),
        0.015 * (2.3 * t + 0.7).sin(),
    );
    if moving {
        rotation += Vec3::new(
            0.08 * (5.5 * t).sin(),
            0.06 * (4.2 * t).sin(),
            0.03 * (6.0 * t + 1.0).sin(),
        );
    }
    rotation
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub name: String,
    /// Node the anchor hangs from: the bone, or the model root on fallback.
    pub parent: NodeHandle,
    pub anchor: NodeHandle,
    pub equipped: Option<NodeHandle>,
}

/// Named attachment points of one entity. Each holds at most one node.
#[derive(Debug, Clone, Default)]
pub struct SlotTable {
    slots: Vec<Slot>,
    flutter_elapsed: f32,
}

impl SlotTable {
    /// Creates one anchor node per definition, parented to its bone or, if the
    /// bone is missing, to `fallback`.
    pub fn build(scene: &mut Scene, defs: &[SlotDef], bones: &BoneMap, fallback: NodeHandle) -> Self {
        let slots = defs
            .iter()
            .map(|def| {
                let parent = match bones.get(&def.bone) {
                    Some(&bone) => bone,
                    None => {
                        log::warn!("Slot '{}': bone '{}' not found, using model root", def.name, def.bone);
                        fallback
                    }
                };
                let mut anchor = Node::new(format!("slot-{}", def.name));
                anchor.transform.position = def.offset();
                let anchor = scene.add_to_parent(anchor, parent);
                Slot {
                    name: def.name.clone(),
                    parent,
                    anchor,
                    equipped: None,
                }
            })
            .collect();

        Self {
            slots,
            flutter_elapsed: 0.0,
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.name == name)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|s| s.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    #[must_use]
    pub fn anchor(&self, name: &str) -> Option<NodeHandle> {
        self.get(name).map(|s| s.anchor)
    }

    #[must_use]
    pub fn equipped(&self, name: &str) -> Option<NodeHandle> {
        self.get(name).and_then(|s| s.equipped)
    }

    /// Parents `node` under the slot anchor, unequipping any occupant first.
    /// A node moved from another slot leaves that slot empty.
    ///
    /// Returns `false` for unknown slots, stale nodes and nodes that contain
    /// the anchor itself.
    pub fn equip(&mut self, scene: &mut Scene, name: &str, node: NodeHandle) -> bool {
        let Some(anchor) = self.anchor(name) else {
            return false;
        };
        if scene.get_node(node).is_none() || scene.is_ancestor(node, anchor) {
            return false;
        }
        if self.equipped(name) == Some(node) {
            return true;
        }

        self.unequip(scene, name);
        if !scene.attach(node, anchor) {
            return false;
        }
        // A node occupies at most one slot.
        for slot in &mut self.slots {
            if slot.equipped == Some(node) {
                slot.equipped = None;
            }
        }
        if let Some(slot) = self.get_mut(name) {
            slot.equipped = Some(node);
        }
        true
    }

    /// Detaches the occupant to the scene root and returns it.
    pub fn unequip(&mut self, scene: &mut Scene, name: &str) -> Option<NodeHandle> {
        let node = self.get_mut(name)?.equipped.take()?;
        scene.detach(node);
        Some(node)
    }

    /// Unequips every slot, returning the released nodes.
    pub fn unequip_all(&mut self, scene: &mut Scene) -> Vec<NodeHandle> {
        let names: Vec<String> = self.slots.iter().map(|s| s.name.clone()).collect();
        names
            .iter()
            .filter_map(|name| self.unequip(scene, name))
            .collect()
    }

    /// Flutter pivot inside the back-slot occupant, if any.
    #[must_use]
    pub fn flutter_pivot(&self, scene: &Scene) -> Option<NodeHandle> {
        let occupant = self.equipped(BACK_SLOT)?;
        scene.find_descendant(occupant, |node| node.flags.contains(NodeFlags::FLUTTER_PIVOT))
    }

    #[inline]
    #[must_use]
    pub fn flutter_elapsed(&self) -> f32 {
        self.flutter_elapsed
    }

    /// Animates the back-slot flutter pivot. The clock only runs while one
    /// is equipped.
    pub fn tick_flutter(&mut self, scene: &mut Scene, dt: f32, moving: bool) {
        let Some(pivot) = self.flutter_pivot(scene) else {
            return;
        };
        self.flutter_elapsed += dt;
        let rotation = flutter_rotation(self.flutter_elapsed, moving);
        if let Some(node) = scene.get_node_mut(pivot) {
            node.transform.set_rotation_euler(rotation.x, rotation.y, rotation.z);
        }
    }
}
