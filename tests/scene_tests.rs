//! Scene Integration Tests
//!
//! Tests for:
//! - Hierarchy: attach/detach, cycle rejection, traversal and lookup
//! - Prefab instantiation: fresh nodes and skeletons, shared geometry
//! - Subtree removal bookkeeping
//! - Transform channels and world matrix propagation

mod common;

use std::sync::Arc;

use glam::{Quat, Vec3};

use myth_avatar::assets::PrefabNode;
use myth_avatar::resources::{Geometry, Material, Mesh};
use myth_avatar::scene::{Node, Scene, TransformChannel};

// ============================================================================
// Hierarchy
// ============================================================================

#[test]
fn attach_moves_node_out_of_roots() {
    let mut scene = Scene::new();
    let parent = scene.create_node("parent");
    let child = scene.create_node("child");

    assert!(scene.attach(child, parent));
    assert!(!scene.root_nodes.contains(&child));
    assert_eq!(scene.get_node(child).unwrap().parent(), Some(parent));
    assert_eq!(scene.get_node(parent).unwrap().children(), &[child]);
}

#[test]
fn attach_rejects_cycles() {
    let mut scene = Scene::new();
    let a = scene.create_node("a");
    let b = scene.add_to_parent(Node::new("b"), a);
    let c = scene.add_to_parent(Node::new("c"), b);

    assert!(!scene.attach(a, c));
    assert!(!scene.attach(a, a));
    assert_eq!(scene.get_node(a).unwrap().parent(), None);
}

#[test]
fn detach_returns_node_to_roots() {
    let mut scene = Scene::new();
    let parent = scene.create_node("parent");
    let child = scene.add_to_parent(Node::new("child"), parent);

    scene.detach(child);

    assert!(scene.root_nodes.contains(&child));
    assert!(scene.get_node(parent).unwrap().children().is_empty());
    assert_eq!(scene.get_node(child).unwrap().parent(), None);
}

#[test]
fn find_node_by_name_searches_only_the_subtree() {
    let mut scene = Scene::new();
    let a = scene.create_node("a");
    let b = scene.create_node("b");
    let target = scene.add_to_parent(Node::new("Head"), b);

    assert_eq!(scene.find_node_by_name(b, "Head"), Some(target));
    assert_eq!(scene.find_node_by_name(a, "Head"), None);
    assert_eq!(scene.descendants(b), vec![b, target]);
}

// ============================================================================
// Prefabs
// ============================================================================

#[test]
fn instantiate_creates_independent_hierarchies() {
    let prefab = common::lobster_prefab();
    let mut scene = Scene::new();

    let first = scene.instantiate(&prefab, "first");
    let second = scene.instantiate(&prefab, "second");

    assert_eq!(first.nodes.len(), prefab.nodes.len());
    assert_eq!(scene.nodes.len(), 2 * (prefab.nodes.len() + 1));
    assert_eq!(scene.skins.len(), 2);
    assert_ne!(first.nodes[1], second.nodes[1]);

    let hips_a = scene.find_node_by_name(first.root, "Hips").unwrap();
    let hips_b = scene.find_node_by_name(second.root, "Hips").unwrap();
    scene.get_node_mut(hips_a).unwrap().transform.position = Vec3::new(5.0, 0.0, 0.0);
    assert_eq!(scene.get_node(hips_b).unwrap().transform.position, Vec3::new(0.0, 0.5, 0.0));

    let skeleton = &scene.skins[first.skeletons[0]];
    assert_eq!(skeleton.root_bone(), Some(hips_a));
    assert_eq!(skeleton.bones.len(), 9);
}

#[test]
fn instantiate_shares_geometry_and_duplicates_materials() {
    let prefab = common::lobster_prefab();
    let mut scene = Scene::new();

    let first = scene.instantiate(&prefab, "first");
    let second = scene.instantiate(&prefab, "second");

    let mesh_a = scene.mesh_of(first.nodes[9]).unwrap();
    let mesh_b = scene.mesh_of(second.nodes[9]).unwrap();
    let source = prefab.nodes[9].mesh.as_ref().unwrap();

    assert!(Arc::ptr_eq(&mesh_a.geometry, &mesh_b.geometry));
    assert!(Arc::ptr_eq(&mesh_a.geometry, &source.geometry));
    assert_ne!(mesh_a.material.uuid, mesh_b.material.uuid);
    assert_ne!(mesh_a.material.uuid, source.material.uuid);
    assert!(Arc::ptr_eq(
        mesh_a.material.map.as_ref().unwrap(),
        source.material.map.as_ref().unwrap()
    ));
    assert!(mesh_a.skinned);
    assert!(scene.get_node(first.nodes[9]).unwrap().skin.is_some());
}

#[test]
fn prefab_reference_height_is_tallest_mesh() {
    let prefab = common::lobster_prefab();
    assert!((prefab.reference_height() - common::RAW_HEIGHT).abs() < 1e-6);
}

#[test]
fn remove_subtree_releases_nodes_meshes_and_skeletons() {
    let prefab = common::lobster_prefab();
    let mut scene = Scene::new();
    let keep = scene.create_node("keep");
    let instance = scene.instantiate(&prefab, "doomed");

    let removed = scene.remove_subtree(instance.root);

    assert_eq!(removed.nodes, prefab.nodes.len() + 1);
    assert_eq!(removed.meshes, 1);
    assert_eq!(removed.skeletons, 1);
    assert_eq!(scene.nodes.len(), 1);
    assert!(scene.meshes.is_empty());
    assert!(scene.skins.is_empty());
    assert_eq!(scene.root_nodes, vec![keep]);
}

#[test]
fn nodes_outside_the_prefab_hierarchy_go_with_the_instance() {
    let mut prefab = common::lobster_prefab();
    let stray_mesh = prefab.nodes[9].mesh.clone();
    let mut stray = PrefabNode::new("Stray");
    stray.mesh = stray_mesh;
    prefab.push_node(stray);
    let mut scene = Scene::new();

    let instance = scene.instantiate(&prefab, "lobster");
    let stray = *instance.nodes.last().unwrap();
    assert_eq!(scene.get_node(stray).unwrap().parent(), Some(instance.root));
    assert!(!scene.get_node(stray).unwrap().visible);
    assert!(scene.get_node(instance.nodes[0]).unwrap().visible);
    assert_eq!(scene.meshes.len(), 2);

    let removed = scene.remove_subtree(instance.root);
    assert_eq!(removed.nodes, prefab.nodes.len() + 1);
    assert_eq!(removed.meshes, 2);
    assert!(scene.nodes.is_empty());
    assert!(scene.meshes.is_empty());
}

#[test]
fn set_mesh_replaces_previous_mesh() {
    let mut scene = Scene::new();
    let node = scene.create_node("ring");
    let geometry = Arc::new(Geometry::ring(0.2, 0.24, 32));

    scene.set_mesh(node, Mesh::new(geometry.clone(), Material::default()));
    scene.set_mesh(node, Mesh::new(geometry, Material::new_basic(Vec3::X)));

    assert_eq!(scene.meshes.len(), 1);
    assert_eq!(scene.mesh_of(node).unwrap().material.color, Vec3::X);
}

// ============================================================================
// Transforms
// ============================================================================

#[test]
fn transform_channels_parse_from_paths() {
    assert_eq!("position.y".parse::<TransformChannel>(), Ok(TransformChannel::PositionY));
    assert_eq!("rotation.z".parse::<TransformChannel>(), Ok(TransformChannel::RotationZ));
    assert_eq!("scale.x".parse::<TransformChannel>(), Ok(TransformChannel::ScaleX));
    assert!("position".parse::<TransformChannel>().is_err());
    assert!("colour.r".parse::<TransformChannel>().is_err());
}

#[test]
fn rotation_channel_preserves_other_axes() {
    let mut scene = Scene::new();
    let node = scene.create_node("n");
    let transform = &mut scene.get_node_mut(node).unwrap().transform;
    transform.set_rotation_euler(0.1, 0.2, 0.0);

    transform.set_channel(TransformChannel::RotationZ, 0.3);

    let euler = transform.rotation_euler();
    assert!((euler.x - 0.1).abs() < 1e-4);
    assert!((euler.y - 0.2).abs() < 1e-4);
    assert!((euler.z - 0.3).abs() < 1e-4);
}

#[test]
fn world_matrices_compose_down_the_hierarchy() {
    let mut scene = Scene::new();
    let parent = scene.create_node("parent");
    let child = scene.add_to_parent(Node::new("child"), parent);
    {
        let p = &mut scene.get_node_mut(parent).unwrap().transform;
        p.position = Vec3::new(1.0, 0.0, 0.0);
        p.rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        p.scale = Vec3::splat(2.0);
    }
    scene.get_node_mut(child).unwrap().transform.position = Vec3::new(0.0, 0.0, 1.0);

    scene.update_matrix_world();

    let world = scene.world_position(child).unwrap();
    assert!((world - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-5, "got {world}");
}
