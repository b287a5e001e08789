//! Shared fixtures: an in-memory loader and a small lobster rig.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::channel::oneshot;
use futures::future::{self, BoxFuture, FutureExt};
use glam::{Affine3A, Quat, Vec3};
use parking_lot::Mutex;

use myth_avatar::animation::binding::TargetPath;
use myth_avatar::animation::clip::{AnimationClip, Track, TrackData, TrackMeta};
use myth_avatar::animation::tracks::{InterpolationMode, KeyframeTrack};
use myth_avatar::assets::{
    AssetCache, AssetLoader, LoadedAsset, Prefab, PrefabMesh, PrefabNode, PrefabSkeleton, VariantManifest,
};
use myth_avatar::errors::AssetError;
use myth_avatar::resources::{ColorSpace, Geometry, Material, Texture};
use myth_avatar::scene::Transform;

pub const BASE_PATH: &str = "/models";
pub const BASE_FILE: &str = "/models/lobster-base.glb";
pub const IDLE_FILE: &str = "/models/lobster-idle.glb";
pub const WALK_FILE: &str = "/models/lobster-walk.glb";
pub const RUN_FILE: &str = "/models/lobster-run.glb";
pub const DANCE: &str = "dance-funny2";
pub const DANCE_FILE: &str = "/models/lobster-dance-funny2.glb";
pub const WAVE: &str = "wave";
pub const WAVE_FILE: &str = "/models/lobster-wave.glb";

/// Height of the fixture body mesh.
pub const RAW_HEIGHT: f32 = 1.7;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// In-memory [`AssetLoader`] that counts calls and can fail or hold loads.
#[derive(Default)]
pub struct MockLoader {
    assets: Mutex<HashMap<String, LoadedAsset>>,
    calls: Mutex<HashMap<String, usize>>,
    failures: Mutex<HashSet<String>>,
    gated: Mutex<HashSet<String>>,
    waiting: Mutex<HashMap<String, Vec<oneshot::Sender<()>>>>,
}

impl MockLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: &str, asset: LoadedAsset) {
        self.assets.lock().insert(path.to_string(), asset);
    }

    pub fn calls(&self, path: &str) -> usize {
        self.calls.lock().get(path).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    /// The next load of `path` fails with `NotFound`.
    pub fn fail_next(&self, path: &str) {
        self.failures.lock().insert(path.to_string());
    }

    /// Loads of `path` stay pending until [`release`](Self::release).
    pub fn gate(&self, path: &str) {
        self.gated.lock().insert(path.to_string());
    }

    pub fn release(&self, path: &str) {
        self.gated.lock().remove(path);
        let senders = self.waiting.lock().remove(path).unwrap_or_default();
        for tx in senders {
            let _ = tx.send(());
        }
    }
}

impl AssetLoader for MockLoader {
    fn load(&self, path: &str) -> BoxFuture<'static, Result<LoadedAsset, AssetError>> {
        *self.calls.lock().entry(path.to_string()).or_default() += 1;

        if self.failures.lock().remove(path) {
            return future::ready(Err(AssetError::NotFound(path.to_string()))).boxed();
        }

        let asset = self.assets.lock().get(path).cloned();
        let gate = if self.gated.lock().contains(path) {
            let (tx, rx) = oneshot::channel();
            self.waiting.lock().entry(path.to_string()).or_default().push(tx);
            Some(rx)
        } else {
            None
        };

        let path = path.to_string();
        async move {
            if let Some(rx) = gate {
                let _ = rx.await;
            }
            asset.ok_or(AssetError::NotFound(path))
        }
        .boxed()
    }
}

// ============================================================================
// Rig
// ============================================================================

fn bone(name: &str, position: Vec3, children: Vec<usize>) -> PrefabNode {
    let mut node = PrefabNode::new(name);
    node.transform = Transform::from_trs(position, Quat::IDENTITY, Vec3::ONE);
    node.children_indices = children;
    node.is_bone = true;
    node
}

/// `Armature > Hips > Spine > Spine02 > {Head > headfront, LeftArm > LeftHand,
/// RightArm > RightHand}` plus a skinned `Body` mesh 1.7 units tall.
pub fn lobster_prefab() -> Prefab {
    let mut prefab = Prefab::new();

    let mut armature = PrefabNode::new("Armature");
    armature.children_indices = vec![1];
    prefab.push_node(armature); // 0
    prefab.push_node(bone("Hips", Vec3::new(0.0, 0.5, 0.0), vec![2])); // 1
    prefab.push_node(bone("Spine", Vec3::new(0.0, 0.2, 0.0), vec![3])); // 2
    prefab.push_node(bone("Spine02", Vec3::new(0.0, 0.2, 0.0), vec![4, 5, 7])); // 3
    prefab.push_node(bone("Head", Vec3::new(0.0, 0.3, 0.0), vec![10])); // 4
    prefab.push_node(bone("LeftArm", Vec3::new(0.2, 0.0, 0.0), vec![6])); // 5
    prefab.push_node(bone("LeftHand", Vec3::new(0.2, 0.0, 0.0), vec![])); // 6
    prefab.push_node(bone("RightArm", Vec3::new(-0.2, 0.0, 0.0), vec![8])); // 7
    prefab.push_node(bone("RightHand", Vec3::new(-0.2, 0.0, 0.0), vec![])); // 8

    let texture = Arc::new(Texture::new("lobster_basecolor", 1024, 1024, ColorSpace::Srgb));
    let mut material = Material::new_standard(Vec3::new(0.8, 0.4, 0.3))
        .with_name("lobster")
        .with_map(texture);
    material.transparent = true;
    material.opacity = 0.5;
    let geometry = Geometry::new(
        "Body",
        vec![Vec3::new(-0.3, 0.0, -0.2), Vec3::new(0.3, RAW_HEIGHT, 0.2)],
    );
    let mut body = PrefabNode::new("Body");
    body.mesh = Some(PrefabMesh {
        geometry: Arc::new(geometry),
        material: Arc::new(material),
        skinned: true,
    });
    body.skin_index = Some(0);
    prefab.push_node(body); // 9
    prefab.push_node(bone("headfront", Vec3::new(0.0, 0.0, 0.1), vec![])); // 10

    prefab.root_indices = vec![0, 9];
    prefab.skeletons.push(PrefabSkeleton {
        name: "Armature".to_string(),
        root_bone_index: 0,
        bone_indices: vec![1, 2, 3, 4, 5, 6, 7, 8, 10],
        inverse_bind_matrices: vec![Affine3A::IDENTITY; 9].into(),
    });
    prefab
}

pub fn translation_clip(name: &str, node: &str, from: Vec3, to: Vec3, duration: f32) -> AnimationClip {
    AnimationClip::new(
        name,
        vec![Track {
            meta: TrackMeta {
                node_name: node.to_string(),
                target: TargetPath::Translation,
            },
            data: TrackData::Vector3(KeyframeTrack::new(
                vec![0.0, duration],
                vec![from, to],
                InterpolationMode::Linear,
            )),
        }],
    )
}

pub fn rotation_clip(name: &str, node: &str, angle: f32, duration: f32) -> AnimationClip {
    AnimationClip::new(
        name,
        vec![Track {
            meta: TrackMeta {
                node_name: node.to_string(),
                target: TargetPath::Rotation,
            },
            data: TrackData::Quaternion(KeyframeTrack::new(
                vec![0.0, duration],
                vec![Quat::IDENTITY, Quat::from_rotation_z(angle)],
                InterpolationMode::Linear,
            )),
        }],
    )
}

pub fn clip_file(clip: AnimationClip) -> LoadedAsset {
    LoadedAsset {
        scene: None,
        animations: vec![clip],
    }
}

pub fn scene_file(prefab: Prefab) -> LoadedAsset {
    LoadedAsset {
        scene: Some(prefab),
        animations: Vec::new(),
    }
}

/// Loader serving every file of the built-in `red` variant, plus a `wave`
/// clip used by [`two_extra_manifest`].
pub fn lobster_loader() -> Arc<MockLoader> {
    let loader = Arc::new(MockLoader::new());
    loader.insert(BASE_FILE, scene_file(lobster_prefab()));
    loader.insert(IDLE_FILE, clip_file(translation_clip("idle", "Hips", Vec3::new(0.0, 0.5, 0.0), Vec3::new(0.0, 0.52, 0.0), 2.0)));
    loader.insert(WALK_FILE, clip_file(translation_clip("walk", "Hips", Vec3::new(0.0, 0.5, 0.0), Vec3::new(0.0, 0.55, 0.0), 1.0)));
    loader.insert(RUN_FILE, clip_file(translation_clip("run", "Hips", Vec3::new(0.0, 0.5, 0.0), Vec3::new(0.0, 0.6, 0.0), 0.8)));
    loader.insert(DANCE_FILE, clip_file(rotation_clip(DANCE, "Head", 0.5, 1.5)));
    loader.insert(WAVE_FILE, clip_file(rotation_clip(WAVE, "RightArm", 0.8, 1.0)));
    loader
}

pub fn cache_with(loader: &Arc<MockLoader>, manifest: VariantManifest) -> AssetCache {
    let dyn_loader: Arc<dyn AssetLoader> = loader.clone();
    AssetCache::new(dyn_loader, manifest)
}

/// Built-in manifest with a second extra clip.
pub fn two_extra_manifest() -> VariantManifest {
    let mut manifest = VariantManifest::default();
    if let Some(red) = manifest.variants.get_mut("red") {
        red.extra_animations
            .insert(WAVE.to_string(), "lobster-wave.glb".to_string());
    }
    manifest
}

/// A variant whose only clip is a walk: no idle, so it can fade to rest.
pub fn bare_manifest() -> VariantManifest {
    VariantManifest::from_json_str(
        r#"{
            "variants": {
                "bare": {
                    "files": { "base": "lobster-base.glb", "walk": "lobster-walk.glb" },
                    "slots": [
                        { "name": "back", "bone": "Spine", "offset": [0.0, 0.0, -0.005] },
                        { "name": "tail", "bone": "Tail" }
                    ]
                }
            }
        }"#,
    )
    .expect("valid manifest")
}

/// Cache with `variant` already preloaded from [`BASE_PATH`].
pub fn ready_cache(loader: &Arc<MockLoader>, manifest: VariantManifest, variant: &str) -> AssetCache {
    let cache = cache_with(loader, manifest);
    pollster::block_on(cache.preload(BASE_PATH, variant)).expect("preload succeeds");
    cache
}
