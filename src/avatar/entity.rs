use std::f32::consts::FRAC_PI_2;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use glam::{Quat, Vec3};

use crate::assets::cache::VariantAssets;
use crate::avatar::motion::{MotionController, MotionStep};
use crate::avatar::options::AvatarOptions;
use crate::avatar::oscillator::Oscillator;
use crate::avatar::pivots::{BoneMap, BonePivots, collect_bones};
use crate::avatar::slots::SlotTable;
use crate::avatar::state::{AnimationStateMachine, AvatarState};
use crate::errors::{Error, Result};
use crate::resources::color::hsl_to_rgb;
use crate::resources::geometry::Geometry;
use crate::resources::material::{Material, Side};
use crate::resources::mesh::Mesh;
use crate::scene::{Node, NodeHandle, RemovedSubtree, Scene, TransformChannel};

/// Colour multiplier applied to textured materials when no tint is set.
const WARM_BOOST: Vec3 = Vec3::new(1.15, 1.05, 1.0);

const RING_INNER_RADIUS: f32 = 0.20;
const RING_OUTER_RADIUS: f32 = 0.24;
const RING_SEGMENTS: u32 = 32;
const RING_HEIGHT: f32 = 0.005;
const RING_OPACITY: f32 = 0.3;

/// Surface look of an entity's meshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureMode {
    /// The loaded textured material.
    #[default]
    Textured,
    /// Untextured orange clay.
    Clay,
    /// Untextured neutral grey, for captures that get retextured later.
    SpriteClay,
}

impl TextureMode {
    fn clay_color(self) -> Option<Vec3> {
        match self {
            Self::Textured => None,
            Self::Clay => Some(hsl_to_rgb(6.0 / 360.0, 0.78, 0.45)),
            Self::SpriteClay => Some(Vec3::splat(0.65)),
        }
    }
}

impl FromStr for TextureMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "textured" => Ok(Self::Textured),
            "clay" => Ok(Self::Clay),
            "sprite-clay" => Ok(Self::SpriteClay),
            other => Err(format!("unknown texture mode '{other}'")),
        }
    }
}

impl fmt::Display for TextureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Textured => "textured",
            Self::Clay => "clay",
            Self::SpriteClay => "sprite-clay",
        })
    }
}

/// What [`AnimatedEntity::dispose`] released and handed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisposedAvatar {
    /// Previously equipped accessories, now scene roots owned by the caller.
    pub accessories: Vec<NodeHandle>,
    pub removed: RemovedSubtree,
}

/// One independently animated avatar.
///
/// Owns a subtree of the caller's [`Scene`]:
///
/// ```text
/// root (position, heading, bob)
/// ├── model (prefab instance, scaled to the target height)
/// │   └── ... bones, skinned meshes, slot anchors
/// └── ground-ring
/// ```
///
/// Geometry, textures and clips are shared with the [`VariantAssets`] it was
/// created from; materials, bones and the mixer belong to this entity alone.
pub struct AnimatedEntity {
    assets: Arc<VariantAssets>,
    root: NodeHandle,
    model_root: NodeHandle,
    ground_ring: NodeHandle,
    bones: BoneMap,
    pivots: BonePivots,

    mesh_nodes: Vec<NodeHandle>,
    textured_materials: Vec<Material>,
    texture_mode: TextureMode,
    tint: Option<Vec3>,

    animation: AnimationStateMachine,
    motion: MotionController,
    heading: f32,
    oscillators: Vec<Oscillator>,
    external_animation: bool,
    slots: SlotTable,
}

impl AnimatedEntity {
    /// Instantiates `assets` into `scene` as a new root-level subtree.
    pub fn new(scene: &mut Scene, assets: Arc<VariantAssets>, options: &AvatarOptions) -> Self {
        let root = scene.create_node(&format!("avatar-{}", assets.variant()));

        let instance = scene.instantiate(assets.base(), "model");
        let model_root = instance.root;
        scene.attach(model_root, root);

        let reference_height = assets.reference_height();
        let model_scale = if reference_height > 0.0 {
            options.target_height / reference_height
        } else {
            1.0
        };
        if let Some(node) = scene.get_node_mut(model_root) {
            node.transform.scale = Vec3::splat(model_scale);
        }

        let bones = collect_bones(scene, model_root);
        let pivots = BonePivots::resolve(&bones, root);

        let tint = options.hue.map(|hue| hsl_to_rgb(hue / 360.0, 0.6, 0.7));
        let (mesh_nodes, textured_materials) = prepare_materials(scene, &instance.nodes, tint);

        let ring_color = tint.unwrap_or_else(|| assets.definition().ring_rgb());
        let ground_ring = build_ground_ring(scene, root, ring_color);

        let slots = SlotTable::build(scene, &assets.definition().slots, &bones, model_root);
        let oscillators = idle_oscillators(scene, root, &bones, &pivots);
        let animation = AnimationStateMachine::new(scene, model_root, &assets);

        log::debug!(
            "Created '{}' avatar: {} bones, {} meshes, scale {:.3}",
            assets.variant(),
            bones.len(),
            mesh_nodes.len(),
            model_scale
        );

        Self {
            assets,
            root,
            model_root,
            ground_ring,
            bones,
            pivots,
            mesh_nodes,
            textured_materials,
            texture_mode: TextureMode::Textured,
            tint,
            animation,
            motion: MotionController::new(options.motion),
            heading: 0.0,
            oscillators,
            external_animation: options.external_animation,
            slots,
        }
    }

    // ========================================================================
    // Frame update
    // ========================================================================

    /// Advances clips, steering, procedural motion and accessory flutter.
    pub fn tick(&mut self, dt: f32, scene: &mut Scene) {
        let locomotion = self.animation.state().is_locomotion();

        self.animation.update(dt, scene);

        if *self.animation.state() == AvatarState::Moving {
            self.tick_motion(dt, scene);
        } else if self.motion.target().is_some() {
            self.motion.clear_target();
        }

        if !self.external_animation && !self.animation.is_clip_driven() {
            for oscillator in &mut self.oscillators {
                oscillator.tick(dt, scene);
            }
        }

        self.slots.tick_flutter(scene, dt, locomotion);
    }

    fn tick_motion(&mut self, dt: f32, scene: &mut Scene) {
        let Some(node) = scene.get_node_mut(self.root) else {
            return;
        };
        let transform = &mut node.transform;
        let step = self.motion.step(&mut transform.position, &mut self.heading, dt);
        transform.rotation = Quat::from_rotation_y(self.heading);

        if step == MotionStep::Arrived {
            self.animation.arrive();
        }
    }

    // ========================================================================
    // State transitions
    // ========================================================================

    /// In-place walk. No-op while already walking.
    pub fn start_walk(&mut self) {
        self.motion.clear_target();
        self.animation.start_walk();
    }

    /// In-place run. No-op while already running.
    pub fn start_run(&mut self) {
        self.motion.clear_target();
        self.animation.start_run();
    }

    pub fn stop_walk(&mut self) {
        self.motion.clear_target();
        self.animation.stop();
    }

    /// Walks to `target` on the ground plane; `y` is ignored.
    pub fn move_to(&mut self, target: Vec3) {
        self.motion.set_target(target);
        self.animation.start_moving();
    }

    /// Plays a named extra clip, loading it first if needed.
    ///
    /// A cached clip starts crossfading immediately. Otherwise the load is
    /// started (or joined) and the clip starts on the first [`tick`] after it
    /// resolves, unless another transition was requested in the meantime.
    /// The returned future only reports the load outcome; dropping it does
    /// not cancel anything.
    ///
    /// [`tick`]: Self::tick
    pub fn play_extra(&mut self, scene: &Scene, name: &str) -> BoxFuture<'static, Result<()>> {
        match self.animation.request_extra(scene, &self.assets, name) {
            Ok(None) => future::ready(Ok(())).boxed(),
            Ok(Some(load)) => load.map(|r| r.map(|_| ()).map_err(Error::from)).boxed(),
            Err(err) => future::ready(Err(Error::from(err))).boxed(),
        }
    }

    #[must_use]
    pub fn extra_clip_names(&self) -> Vec<String> {
        self.assets.extra_clip_names()
    }

    // ========================================================================
    // Accessories
    // ========================================================================

    /// Equips `node` into `slot`, releasing any previous occupant to the
    /// scene root. `false` if the slot does not exist.
    pub fn equip(&mut self, scene: &mut Scene, slot: &str, node: NodeHandle) -> bool {
        self.slots.equip(scene, slot, node)
    }

    /// Releases the occupant of `slot` to the scene root.
    pub fn unequip(&mut self, scene: &mut Scene, slot: &str) -> Option<NodeHandle> {
        self.slots.unequip(scene, slot)
    }

    #[must_use]
    pub fn slot_anchor(&self, slot: &str) -> Option<NodeHandle> {
        self.slots.anchor(slot)
    }

    #[must_use]
    pub fn equipped(&self, slot: &str) -> Option<NodeHandle> {
        self.slots.equipped(slot)
    }

    #[must_use]
    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }

    // ========================================================================
    // Materials
    // ========================================================================

    /// Swaps every mesh material. Returning to `Textured` restores a fresh
    /// copy of the prepared textured material.
    pub fn set_texture_mode(&mut self, scene: &mut Scene, mode: TextureMode) {
        for (node, textured) in self.mesh_nodes.iter().zip(&self.textured_materials) {
            let Some(mesh) = scene.mesh_of_mut(*node) else {
                continue;
            };
            mesh.material = match mode.clay_color() {
                Some(color) => {
                    let mut clay = Material::new_standard(color).with_name(mode.to_string());
                    clay.roughness = 0.85;
                    clay.metalness = 0.0;
                    clay
                }
                None => textured.duplicate(),
            };
        }
        self.texture_mode = mode;
    }

    #[inline]
    #[must_use]
    pub fn texture_mode(&self) -> TextureMode {
        self.texture_mode
    }

    #[inline]
    #[must_use]
    pub fn tint(&self) -> Option<Vec3> {
        self.tint
    }

    #[must_use]
    pub fn mesh_nodes(&self) -> &[NodeHandle] {
        &self.mesh_nodes
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Wrapper node to attach into the render graph.
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeHandle {
        self.root
    }

    /// Scaled prefab instance, parent of the skeleton.
    #[inline]
    #[must_use]
    pub fn model_root(&self) -> NodeHandle {
        self.model_root
    }

    #[inline]
    #[must_use]
    pub fn ground_ring(&self) -> NodeHandle {
        self.ground_ring
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> &AvatarState {
        self.animation.state()
    }

    #[must_use]
    pub fn pending_extra(&self) -> Option<&str> {
        self.animation.pending_extra()
    }

    #[must_use]
    pub fn is_clip_driven(&self) -> bool {
        self.animation.is_clip_driven()
    }

    #[must_use]
    pub fn animation(&self) -> &AnimationStateMachine {
        &self.animation
    }

    #[must_use]
    pub fn position(&self, scene: &Scene) -> Vec3 {
        scene
            .get_node(self.root)
            .map_or(Vec3::ZERO, |node| node.transform.position)
    }

    /// Yaw in radians; zero faces +Z.
    #[inline]
    #[must_use]
    pub fn heading(&self) -> f32 {
        self.heading
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> Option<Vec3> {
        self.motion.target()
    }

    #[inline]
    #[must_use]
    pub fn pivots(&self) -> &BonePivots {
        &self.pivots
    }

    #[must_use]
    pub fn bone(&self, name: &str) -> Option<NodeHandle> {
        self.bones.get(name).copied()
    }

    #[must_use]
    pub fn oscillators(&self) -> &[Oscillator] {
        &self.oscillators
    }

    #[must_use]
    pub fn assets(&self) -> &Arc<VariantAssets> {
        &self.assets
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Stops playback and removes everything this entity created.
    ///
    /// Equipped accessories are detached first and returned; shared assets
    /// stay in the cache.
    pub fn dispose(mut self, scene: &mut Scene) -> DisposedAvatar {
        self.animation.stop_all();
        let accessories = self.slots.unequip_all(scene);
        let removed = scene.remove_subtree(self.root);
        log::debug!(
            "Disposed '{}' avatar: {} nodes, {} meshes, {} skeletons",
            self.assets.variant(),
            removed.nodes,
            removed.meshes,
            removed.skeletons
        );
        DisposedAvatar { accessories, removed }
    }
}

/// Duplicated materials are made opaque and given the tint (or the warm
/// boost). Returns the mesh nodes and a pristine copy of each prepared
/// material for texture-mode restores.
fn prepare_materials(scene: &mut Scene, nodes: &[NodeHandle], tint: Option<Vec3>) -> (Vec<NodeHandle>, Vec<Material>) {
    let mut mesh_nodes = Vec::new();
    let mut textured = Vec::new();

    for &node in nodes {
        let Some(mesh) = scene.mesh_of_mut(node) else {
            continue;
        };
        let material = &mut mesh.material;
        material.depth_write = true;
        material.transparent = false;
        material.alpha_test = 0.0;
        material.opacity = 1.0;
        material.color = tint.unwrap_or(WARM_BOOST);
        material.roughness = 0.75;
        material.metalness = 0.0;

        textured.push(material.duplicate());
        mesh_nodes.push(node);
    }

    (mesh_nodes, textured)
}

fn build_ground_ring(scene: &mut Scene, root: NodeHandle, color: Vec3) -> NodeHandle {
    let geometry = Arc::new(Geometry::ring(RING_INNER_RADIUS, RING_OUTER_RADIUS, RING_SEGMENTS));
    let mut material = Material::new_basic(color).with_name("ground-ring");
    material.transparent = true;
    material.opacity = RING_OPACITY;
    material.side = Side::Double;

    let mut node = Node::new("ground-ring");
    node.transform.position.y = RING_HEIGHT;
    node.transform.rotation = Quat::from_rotation_x(-FRAC_PI_2);
    let handle = scene.add_to_parent(node, root);
    scene.set_mesh(handle, Mesh::new(geometry, material).with_name("ground-ring"));
    handle
}

/// Breathing bob on the root, plus arm sway and head motion where those
/// bones exist.
fn idle_oscillators(scene: &Scene, root: NodeHandle, bones: &BoneMap, pivots: &BonePivots) -> Vec<Oscillator> {
    let mut oscillators = vec![Oscillator::new(root, TransformChannel::PositionY, 0.0, 0.012, 2.2)];

    let arms = [("LeftArm", pivots.left_arm, 0.0), ("RightArm", pivots.right_arm, 0.5)];
    for (name, pivot, phase) in arms {
        if bones.contains_key(name) {
            oscillators.push(Oscillator::around_rest(scene, pivot, TransformChannel::RotationX, 0.04, 3.0).with_phase(phase));
        }
    }

    if bones.contains_key("Head") {
        oscillators.push(Oscillator::around_rest(scene, pivots.head, TransformChannel::RotationZ, 0.015, 4.5));
        oscillators.push(
            Oscillator::around_rest(scene, pivots.head, TransformChannel::RotationY, 0.02, 5.0).with_phase(0.3),
        );
    }

    oscillators
}
