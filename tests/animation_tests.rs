//! Animation System Tests
//!
//! Tests for:
//! - KeyframeTrack linear/step/cubic interpolation and clamping
//! - KeyframeCursor sequential access and seek fallback
//! - AnimationAction loop modes and fades
//! - AnimationMixer binding, crossfade and weighted blending

use std::f32::consts::PI;
use std::sync::Arc;

use glam::{Quat, Vec3};

use myth_avatar::animation::action::{AnimationAction, Fade, LoopMode};
use myth_avatar::animation::binding::TargetPath;
use myth_avatar::animation::clip::{AnimationClip, Track, TrackData, TrackMeta};
use myth_avatar::animation::mixer::AnimationMixer;
use myth_avatar::animation::tracks::{InterpolationMode, KeyframeCursor, KeyframeTrack};
use myth_avatar::scene::{Node, Scene};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn translation_clip(name: &str, node: &str, from: Vec3, to: Vec3, duration: f32) -> AnimationClip {
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

// ============================================================================
// KeyframeTrack: Interpolation
// ============================================================================

#[test]
fn track_linear_f32_midpoint() {
    let track = KeyframeTrack::new(vec![0.0, 1.0], vec![0.0_f32, 10.0], InterpolationMode::Linear);

    let mut cursor = KeyframeCursor::default();
    let val = track.sample_with_cursor(0.5, &mut cursor).unwrap();
    assert!(approx(val, 5.0), "Expected 5.0, got {val}");
}

#[test]
fn track_linear_f32_clamps_outside_range() {
    let track = KeyframeTrack::new(vec![1.0, 2.0], vec![10.0_f32, 20.0], InterpolationMode::Linear);

    let mut cursor = KeyframeCursor::default();
    assert!(approx(track.sample_with_cursor(0.5, &mut cursor).unwrap(), 10.0));
    assert!(approx(track.sample_with_cursor(5.0, &mut cursor).unwrap(), 20.0));
    assert!(approx(track.sample(0.0).unwrap(), 10.0));
    assert!(approx(track.sample(9.0).unwrap(), 20.0));
}

#[test]
fn track_step_holds_value() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0, 2.0],
        vec![0.0_f32, 100.0, 200.0],
        InterpolationMode::Step,
    );

    let mut cursor = KeyframeCursor::default();
    assert!(approx(track.sample_with_cursor(0.5, &mut cursor).unwrap(), 0.0));
    assert!(approx(track.sample_with_cursor(0.99, &mut cursor).unwrap(), 0.0));
    assert!(approx(track.sample_with_cursor(1.0, &mut cursor).unwrap(), 100.0));
    assert!(approx(track.sample_with_cursor(1.5, &mut cursor).unwrap(), 100.0));
    assert!(approx(track.sample(2.0).unwrap(), 200.0));
}

#[test]
fn track_with_missing_values_samples_none() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0, 2.0],
        vec![Vec3::ZERO, Vec3::ONE],
        InterpolationMode::Linear,
    );
    assert!(!track.is_well_formed());

    let mut cursor = KeyframeCursor::default();
    assert!(track.sample_with_cursor(0.5, &mut cursor).is_some());
    assert!(track.sample_with_cursor(1.5, &mut cursor).is_none());
    assert!(track.sample(2.0).is_none());

    let cubic = KeyframeTrack::new(vec![0.0, 1.0], vec![0.0_f32, 1.0, 2.0], InterpolationMode::CubicSpline);
    assert!(!cubic.is_well_formed());
    assert!(cubic.sample(0.5).is_none());
}

#[test]
fn track_linear_vec3() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![Vec3::ZERO, Vec3::new(10.0, 20.0, 30.0)],
        InterpolationMode::Linear,
    );

    let val = track.sample(0.5).unwrap();
    assert!(approx(val.x, 5.0));
    assert!(approx(val.y, 10.0));
    assert!(approx(val.z, 15.0));
}

#[test]
fn track_linear_quat_slerp() {
    let q0 = Quat::IDENTITY;
    let q1 = Quat::from_rotation_y(PI);
    let track = KeyframeTrack::new(vec![0.0, 1.0], vec![q0, q1], InterpolationMode::Linear);

    let mut cursor = KeyframeCursor::default();
    let val = track.sample_with_cursor(0.5, &mut cursor).unwrap();
    let angle = val.angle_between(q0.slerp(q1, 0.5));
    assert!(angle < 0.01, "Quaternion slerp mismatch: angle={angle}");
}

#[test]
fn track_cubic_f32_endpoints_and_midpoint() {
    // values = [in_tangent0, value0, out_tangent0, in_tangent1, value1, out_tangent1]
    let track = KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![0.0_f32, 0.0, 0.0, 0.0, 10.0, 0.0],
        InterpolationMode::CubicSpline,
    );

    let mut cursor = KeyframeCursor::default();
    assert!(approx(track.sample_with_cursor(0.0, &mut cursor).unwrap(), 0.0));
    assert!(approx(track.sample_with_cursor(1.0, &mut cursor).unwrap(), 10.0));
    // Zero tangents: Hermite midpoint is exactly halfway.
    assert!(approx(track.sample(0.5).unwrap(), 5.0));
}

#[test]
fn empty_track_samples_nothing() {
    let track: KeyframeTrack<f32> = KeyframeTrack::new(vec![], vec![], InterpolationMode::Linear);
    assert!(track.sample(0.5).is_none());
    assert!(track.sample_with_cursor(0.5, &mut KeyframeCursor::default()).is_none());
}

// ============================================================================
// KeyframeCursor
// ============================================================================

#[test]
fn cursor_matches_stateless_sampling_forward_and_backward() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0],
        vec![0.0_f32, 10.0, 5.0, 20.0, 15.0, 0.0, 30.0, 40.0],
        InterpolationMode::Linear,
    );

    let mut cursor = KeyframeCursor::default();
    for i in 0..=70 {
        let t = i as f32 * 0.1;
        let with_cursor = track.sample_with_cursor(t, &mut cursor).unwrap();
        let stateless = track.sample(t).unwrap();
        assert!(approx(with_cursor, stateless), "forward t={t}: {with_cursor} != {stateless}");
    }

    // Loop wrap: a large backward seek falls back to binary search.
    for &t in &[0.3_f32, 6.5, 1.2, 4.9] {
        let with_cursor = track.sample_with_cursor(t, &mut cursor).unwrap();
        let stateless = track.sample(t).unwrap();
        assert!(approx(with_cursor, stateless), "seek t={t}: {with_cursor} != {stateless}");
    }
}

// ============================================================================
// AnimationAction
// ============================================================================

#[test]
fn clip_duration_is_latest_keyframe() {
    let clip = translation_clip("walk", "Hips", Vec3::ZERO, Vec3::X, 1.5);
    assert!(approx(clip.duration, 1.5));
}

#[test]
fn action_starts_disabled() {
    let clip = Arc::new(translation_clip("walk", "Hips", Vec3::ZERO, Vec3::X, 1.0));
    let action = AnimationAction::new(clip);
    assert!(!action.enabled);
    assert!(!action.is_running());
}

#[test]
fn action_loop_wraps_time() {
    let clip = Arc::new(translation_clip("walk", "Hips", Vec3::ZERO, Vec3::X, 1.0));
    let mut action = AnimationAction::new(clip);
    action.play();

    action.update(1.25);
    assert!(approx(action.time, 0.25), "got {}", action.time);
}

#[test]
fn action_once_clamps_and_pauses() {
    let clip = Arc::new(translation_clip("wave", "Hips", Vec3::ZERO, Vec3::X, 1.0));
    let mut action = AnimationAction::new(clip);
    action.loop_mode = LoopMode::Once;
    action.play();

    action.update(1.5);
    assert!(approx(action.time, 1.0));
    assert!(action.paused);
}

#[test]
fn action_ping_pong_reflects() {
    let clip = Arc::new(translation_clip("sway", "Hips", Vec3::ZERO, Vec3::X, 1.0));
    let mut action = AnimationAction::new(clip);
    action.loop_mode = LoopMode::PingPong;
    action.play();

    action.update(1.25);
    assert!(approx(action.time, 0.75), "got {}", action.time);
}

#[test]
fn action_time_scale_speeds_up_playback() {
    let clip = Arc::new(translation_clip("run", "Hips", Vec3::ZERO, Vec3::X, 2.0));
    let mut action = AnimationAction::new(clip);
    action.time_scale = 1.2;
    action.play();

    action.update(0.5);
    assert!(approx(action.time, 0.6));
}

#[test]
fn fade_out_disables_action_when_complete() {
    let clip = Arc::new(translation_clip("walk", "Hips", Vec3::ZERO, Vec3::X, 1.0));
    let mut action = AnimationAction::new(clip);
    action.play();
    action.fade_out(0.3);

    action.update(0.15);
    assert!(action.enabled);
    assert!(approx(action.weight, 0.5), "got {}", action.weight);

    action.update(0.2);
    assert!(!action.enabled);
    assert!(action.fade().is_none());
}

#[test]
fn fade_weight_is_linear() {
    let mut fade = Fade::new(0.0, 1.0, 0.25);
    fade.elapsed = 0.125;
    assert!(approx(fade.weight(), 0.5));
    assert!(!fade.is_finished());
    fade.elapsed = 0.25;
    assert!(fade.is_finished());
    assert!(approx(fade.weight(), 1.0));
}

// ============================================================================
// AnimationMixer
// ============================================================================

fn rig() -> (Scene, myth_avatar::scene::NodeHandle, myth_avatar::scene::NodeHandle) {
    let mut scene = Scene::new();
    let root = scene.create_node("model");
    let mut hips = Node::new("Hips");
    hips.is_bone = true;
    let hips = scene.add_to_parent(hips, root);
    (scene, root, hips)
}

#[test]
fn mixer_binds_tracks_by_name_under_its_root() {
    let (scene, root, hips) = rig();
    let clip = Arc::new(AnimationClip::new(
        "mixed",
        vec![
            translation_clip("a", "Hips", Vec3::ZERO, Vec3::X, 1.0).tracks.remove(0),
            translation_clip("b", "Tail", Vec3::ZERO, Vec3::X, 1.0).tracks.remove(0),
        ],
    ));

    let mut mixer = AnimationMixer::new(root);
    let handle = mixer.clip_action(&scene, &clip);

    let action = mixer.action(handle).unwrap();
    assert_eq!(action.bindings.len(), 1);
    assert_eq!(action.bindings[0].node, hips);

    // Same clip returns the same action.
    assert_eq!(mixer.clip_action(&scene, &clip), handle);
}

#[test]
fn mixer_update_writes_sampled_pose() {
    let (mut scene, root, hips) = rig();
    let clip = Arc::new(translation_clip("walk", "Hips", Vec3::ZERO, Vec3::new(0.0, 0.0, 2.0), 1.0));

    let mut mixer = AnimationMixer::new(root);
    let handle = mixer.clip_action(&scene, &clip);
    mixer.play(handle);
    mixer.update(0.5, &mut scene);

    let pos = scene.get_node(hips).unwrap().transform.position;
    assert!(approx(pos.z, 1.0), "got {pos}");
}

#[test]
fn crossfade_blends_then_disables_faded_action() {
    let (mut scene, root, hips) = rig();
    let idle = Arc::new(translation_clip("idle", "Hips", Vec3::ZERO, Vec3::ZERO, 1.0));
    let walk = Arc::new(translation_clip("walk", "Hips", Vec3::X, Vec3::X, 1.0));

    let mut mixer = AnimationMixer::new(root);
    let idle_h = mixer.clip_action(&scene, &idle);
    let walk_h = mixer.clip_action(&scene, &walk);
    mixer.play(idle_h);
    mixer.update(0.1, &mut scene);

    mixer.cross_fade(idle_h, walk_h, 0.25);
    mixer.update(0.125, &mut scene);

    assert!(mixer.action(idle_h).unwrap().enabled);
    assert!(mixer.action(walk_h).unwrap().enabled);
    let mid = scene.get_node(hips).unwrap().transform.position;
    assert!(mid.x > 0.3 && mid.x < 0.7, "mid-fade blend, got {mid}");

    mixer.update(0.2, &mut scene);
    assert!(!mixer.action(idle_h).unwrap().enabled);
    assert!(mixer.action(walk_h).unwrap().enabled);
    let end = scene.get_node(hips).unwrap().transform.position;
    assert!(approx(end.x, 1.0), "got {end}");
    assert_eq!(mixer.running_actions().count(), 1);
}

#[test]
fn stop_all_leaves_mixer_inactive() {
    let (scene, root, _) = rig();
    let clip = Arc::new(translation_clip("walk", "Hips", Vec3::ZERO, Vec3::X, 1.0));

    let mut mixer = AnimationMixer::new(root);
    let handle = mixer.clip_action(&scene, &clip);
    mixer.play(handle);
    assert!(mixer.is_active());

    mixer.stop_all();
    assert!(!mixer.is_active());
}
