//! glTF 2.0 decoding into [`Prefab`] and [`AnimationClip`] data.
//!
//! Only what the avatar runtime consumes is read: the node hierarchy with TRS
//! transforms, mesh positions and indices, metallic-roughness material
//! factors, base-colour texture references, skins and TRS animation channels.
//! Pixel data is not decoded; the renderer owns image upload.

use std::sync::Arc;

use futures::future::BoxFuture;
use glam::{Affine3A, Mat4, Quat, Vec3};
use rustc_hash::FxHashSet;

use crate::animation::binding::TargetPath;
use crate::animation::clip::{AnimationClip, Track, TrackData, TrackMeta};
use crate::animation::tracks::{InterpolationMode, KeyframeTrack};
use crate::animation::values::Interpolatable;
use crate::assets::io::AssetReader;
use crate::assets::loader::{AssetLoader, LoadedAsset};
use crate::assets::prefab::{Prefab, PrefabMesh, PrefabNode, PrefabSkeleton};
use crate::errors::AssetError;
use crate::resources::geometry::Geometry;
use crate::resources::material::{Material, Side};
use crate::resources::texture::{ColorSpace, Texture};
use crate::scene::transform::Transform;

/// Loads `.glb` / `.gltf` files through an [`AssetReader`].
#[derive(Clone)]
pub struct GltfAssetLoader {
    reader: Arc<dyn AssetReader>,
}

impl GltfAssetLoader {
    pub fn new(reader: Arc<dyn AssetReader>) -> Self {
        Self { reader }
    }

    /// Loader over a local directory or, with the `http` feature, a URL.
    pub fn from_source(source: &str) -> Result<Self, AssetError> {
        let reader = crate::assets::io::AssetReaderVariant::from_source(source)?;
        Ok(Self::new(Arc::new(reader)))
    }
}

impl AssetLoader for GltfAssetLoader {
    fn load(&self, path: &str) -> BoxFuture<'static, Result<LoadedAsset, AssetError>> {
        let reader = Arc::clone(&self.reader);
        let path = path.to_string();
        Box::pin(async move {
            let bytes = reader.read_bytes(&path).await?;
            let gltf = gltf::Gltf::from_slice(&bytes).map_err(|e| decode_error(&path, e))?;
            let buffers = load_buffers(&gltf, reader.as_ref(), &path).await?;
            decode_gltf(&gltf, &buffers, &path)
        })
    }
}

fn decode_error(path: &str, message: impl ToString) -> AssetError {
    AssetError::Decode {
        path: path.to_string(),
        message: message.to_string(),
    }
}

/// Resolves `uri` against the directory of `path`.
fn sibling_path(path: &str, uri: &str) -> String {
    match path.rfind('/') {
        Some(i) => format!("{}/{}", &path[..i], uri),
        None => uri.to_string(),
    }
}

async fn load_buffers(
    gltf: &gltf::Gltf,
    reader: &dyn AssetReader,
    path: &str,
) -> Result<Vec<Vec<u8>>, AssetError> {
    let mut buffers = Vec::with_capacity(gltf.buffers().len());
    for buffer in gltf.buffers() {
        let data = match buffer.source() {
            gltf::buffer::Source::Bin => gltf
                .blob
                .clone()
                .ok_or_else(|| decode_error(path, "missing binary chunk"))?,
            gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => {
                return Err(decode_error(path, "embedded data URIs are not supported"));
            }
            gltf::buffer::Source::Uri(uri) => reader.read_bytes(&sibling_path(path, uri)).await?,
        };
        if data.len() < buffer.length() {
            return Err(decode_error(path, format!("buffer {} is truncated", buffer.index())));
        }
        buffers.push(data);
    }
    Ok(buffers)
}

/// Decodes an already-parsed document with its resolved buffers.
pub fn decode_gltf(
    gltf: &gltf::Gltf,
    buffers: &[Vec<u8>],
    path: &str,
) -> Result<LoadedAsset, AssetError> {
    let textures = load_textures(gltf);
    let materials = load_materials(gltf, &textures);
    let scene = load_scene(gltf, buffers, &materials, path)?;
    let animations = load_animations(gltf, buffers, path)?;

    log::debug!(
        "Decoded '{}': {} nodes, {} animations",
        path,
        scene.as_ref().map_or(0, |s| s.nodes.len()),
        animations.len()
    );

    Ok(LoadedAsset { scene, animations })
}

fn load_textures(gltf: &gltf::Gltf) -> Vec<Arc<Texture>> {
    gltf.textures()
        .map(|texture| {
            let image = texture.source();
            let name = texture
                .name()
                .or(image.name())
                .map_or_else(|| format!("Texture_{}", texture.index()), str::to_string);
            // Dimensions are filled in by the renderer once pixels are decoded.
            Arc::new(Texture::new(name, 0, 0, ColorSpace::Srgb))
        })
        .collect()
}

fn load_materials(gltf: &gltf::Gltf, textures: &[Arc<Texture>]) -> Vec<Arc<Material>> {
    gltf.materials()
        .map(|mat| {
            let pbr = mat.pbr_metallic_roughness();
            let [r, g, b, a] = pbr.base_color_factor();
            let mut material = Material::new_standard(Vec3::new(r, g, b))
                .with_name(mat.name().unwrap_or("Material"));
            material.opacity = a;
            material.roughness = pbr.roughness_factor();
            material.metalness = pbr.metallic_factor();
            material.side = if mat.double_sided() { Side::Double } else { Side::Front };
            match mat.alpha_mode() {
                gltf::material::AlphaMode::Opaque => {}
                gltf::material::AlphaMode::Mask => {
                    material.alpha_test = mat.alpha_cutoff().unwrap_or(0.5);
                }
                gltf::material::AlphaMode::Blend => {
                    material.transparent = true;
                    material.depth_write = false;
                }
            }
            if let Some(info) = pbr.base_color_texture()
                && let Some(texture) = textures.get(info.texture().index())
            {
                material.map = Some(Arc::clone(texture));
            }
            Arc::new(material)
        })
        .collect()
}

fn load_scene(
    gltf: &gltf::Gltf,
    buffers: &[Vec<u8>],
    materials: &[Arc<Material>],
    path: &str,
) -> Result<Option<Prefab>, AssetError> {
    let Some(scene) = gltf.default_scene().or_else(|| gltf.scenes().next()) else {
        return Ok(None);
    };

    let joint_nodes: FxHashSet<usize> = gltf
        .skins()
        .flat_map(|skin| skin.joints().map(|j| j.index()))
        .collect();

    let mut prefab = Prefab::new();
    let default_material = Arc::new(Material::default());

    // Node indices in the prefab match glTF node indices.
    for node in gltf.nodes() {
        let (t, r, s) = node.transform().decomposed();
        let mut prefab_node = PrefabNode::new(
            node.name()
                .map_or_else(|| format!("Node_{}", node.index()), str::to_string),
        );
        prefab_node.transform =
            Transform::from_trs(Vec3::from_array(t), Quat::from_array(r), Vec3::from_array(s));
        prefab_node.children_indices = node.children().map(|c| c.index()).collect();
        prefab_node.is_bone = joint_nodes.contains(&node.index());
        prefab_node.skin_index = node.skin().map(|s| s.index());
        prefab.nodes.push(prefab_node);
    }

    // One glTF mesh may hold several primitives; extra primitives become
    // child nodes so every node carries at most one mesh.
    for node in gltf.nodes() {
        let Some(mesh) = node.mesh() else {
            continue;
        };
        let skinned = node.skin().is_some();
        for (i, primitive) in mesh.primitives().enumerate() {
            let geometry = load_primitive_geometry(&primitive, buffers, mesh.name(), path)?;
            let material = primitive
                .material()
                .index()
                .and_then(|idx| materials.get(idx))
                .unwrap_or(&default_material);
            let prefab_mesh = PrefabMesh {
                geometry: Arc::new(geometry),
                material: Arc::clone(material),
                skinned,
            };

            if i == 0 {
                prefab.nodes[node.index()].mesh = Some(prefab_mesh);
            } else {
                let mut child = PrefabNode::new(format!("{}_primitive_{i}", prefab.nodes[node.index()].name));
                child.mesh = Some(prefab_mesh);
                child.skin_index = prefab.nodes[node.index()].skin_index;
                let child_index = prefab.push_node(child);
                prefab.nodes[node.index()].children_indices.push(child_index);
            }
        }
    }

    prefab.skeletons = load_skins(gltf, buffers);
    prefab.root_indices = scene.nodes().map(|n| n.index()).collect();

    Ok(Some(prefab))
}

fn load_primitive_geometry(
    primitive: &gltf::Primitive,
    buffers: &[Vec<u8>],
    mesh_name: Option<&str>,
    path: &str,
) -> Result<Geometry, AssetError> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
    let positions: Vec<Vec3> = reader
        .read_positions()
        .ok_or_else(|| decode_error(path, "primitive has no POSITION attribute"))?
        .map(Vec3::from_array)
        .collect();

    let geometry = Geometry::new(mesh_name.unwrap_or("Geometry"), positions);
    Ok(match reader.read_indices() {
        Some(indices) => geometry.with_indices(indices.into_u32().collect()),
        None => geometry,
    })
}

fn load_skins(gltf: &gltf::Gltf, buffers: &[Vec<u8>]) -> Vec<PrefabSkeleton> {
    gltf.skins()
        .map(|skin| {
            let reader = skin.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
            let joints: Vec<gltf::Node> = skin.joints().collect();

            let inverse_bind_matrices: Arc<[Affine3A]> = match reader.read_inverse_bind_matrices() {
                Some(iter) => iter
                    .map(|m| Affine3A::from_mat4(Mat4::from_cols_array_2d(&m)))
                    .collect(),
                None => vec![Affine3A::IDENTITY; joints.len()].into(),
            };

            let joint_indices: FxHashSet<usize> = joints.iter().map(|n| n.index()).collect();
            let child_joints: FxHashSet<usize> = joints
                .iter()
                .flat_map(|n| n.children())
                .map(|c| c.index())
                .filter(|i| joint_indices.contains(i))
                .collect();

            // Explicit skeleton root first, else the first joint without a
            // joint parent.
            let root_bone_index = skin
                .skeleton()
                .and_then(|root| joints.iter().position(|n| n.index() == root.index()))
                .or_else(|| joints.iter().position(|n| !child_joints.contains(&n.index())))
                .unwrap_or(0);

            PrefabSkeleton {
                name: skin.name().unwrap_or("Skeleton").to_string(),
                root_bone_index,
                bone_indices: joints.iter().map(|n| n.index()).collect(),
                inverse_bind_matrices,
            }
        })
        .collect()
}

fn load_animations(
    gltf: &gltf::Gltf,
    buffers: &[Vec<u8>],
    path: &str,
) -> Result<Vec<AnimationClip>, AssetError> {
    use gltf::animation::util::ReadOutputs;

    let mut animations = Vec::new();

    for anim in gltf.animations() {
        let mut tracks = Vec::new();

        for channel in anim.channels() {
            let reader = channel.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
            let target = channel.target();
            let node = target.node();
            let node_name = node
                .name()
                .map_or_else(|| format!("Node_{}", node.index()), str::to_string);

            let times: Vec<f32> = reader
                .read_inputs()
                .ok_or_else(|| decode_error(path, "animation sampler has no input"))?
                .collect();

            let interpolation = match channel.sampler().interpolation() {
                gltf::animation::Interpolation::Linear => InterpolationMode::Linear,
                gltf::animation::Interpolation::Step => InterpolationMode::Step,
                gltf::animation::Interpolation::CubicSpline => InterpolationMode::CubicSpline,
            };

            let (target_path, data) = match reader.read_outputs() {
                Some(ReadOutputs::Translations(iter)) => (
                    TargetPath::Translation,
                    TrackData::Vector3(checked_track(times, iter.map(Vec3::from_array).collect(), interpolation, &node_name, path)?),
                ),
                Some(ReadOutputs::Rotations(iter)) => (
                    TargetPath::Rotation,
                    TrackData::Quaternion(checked_track(
                        times,
                        iter.into_f32().map(Quat::from_array).collect(),
                        interpolation,
                        &node_name,
                        path,
                    )?),
                ),
                Some(ReadOutputs::Scales(iter)) => (
                    TargetPath::Scale,
                    TrackData::Vector3(checked_track(times, iter.map(Vec3::from_array).collect(), interpolation, &node_name, path)?),
                ),
                // Morph weights are not used by avatars.
                Some(ReadOutputs::MorphTargetWeights(_)) | None => continue,
            };

            tracks.push(Track {
                meta: TrackMeta {
                    node_name,
                    target: target_path,
                },
                data,
            });
        }

        animations.push(AnimationClip::new(anim.name().unwrap_or("anim"), tracks));
    }

    Ok(animations)
}

/// Rejects channels whose output count does not match the keyframe count.
fn checked_track<T: Interpolatable>(
    times: Vec<f32>,
    values: Vec<T>,
    interpolation: InterpolationMode,
    node_name: &str,
    path: &str,
) -> Result<KeyframeTrack<T>, AssetError> {
    let track = KeyframeTrack::new(times, values, interpolation);
    if !track.is_well_formed() {
        return Err(decode_error(
            path,
            format!(
                "animation channel for '{}' has {} keys but {} values",
                node_name,
                track.times.len(),
                track.values.len()
            ),
        ));
    }
    Ok(track)
}
