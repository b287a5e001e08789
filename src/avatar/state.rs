//! Clip selection for one entity.
//!
//! The state machine owns the entity's [`AnimationMixer`] and keeps one
//! looping action per clip. Every clip change crossfades; entering a clip
//! restarts it. Extra clips that are still loading are held as a pending
//! request, which any later transition replaces, so the most recent request
//! always wins.

use std::fmt;
use std::sync::Arc;

use futures::FutureExt;
use rustc_hash::FxHashMap;

use crate::animation::action::LoopMode;
use crate::animation::binder::Binder;
use crate::animation::clip::AnimationClip;
use crate::animation::mixer::{ActionHandle, AnimationMixer};
use crate::assets::cache::{ClipRequest, SharedClipLoad, VariantAssets};
use crate::errors::AssetError;
use crate::scene::{NodeHandle, Scene};

/// Blend time of every clip change.
pub const CROSSFADE_SECONDS: f32 = 0.25;
/// Fade used when returning to idle without an idle clip.
pub const FADE_OUT_SECONDS: f32 = 0.3;
pub const RUN_TIME_SCALE: f32 = 1.2;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum AvatarState {
    #[default]
    Idle,
    Walk,
    Run,
    /// Walking towards a target.
    Moving,
    /// A named extra clip, looping until replaced.
    Extra(String),
}

impl AvatarState {
    /// Walk, run and moving all count as locomotion.
    #[must_use]
    pub fn is_locomotion(&self) -> bool {
        matches!(self, Self::Walk | Self::Run | Self::Moving)
    }
}

impl fmt::Display for AvatarState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Walk => f.write_str("walk"),
            Self::Run => f.write_str("run"),
            Self::Moving => f.write_str("moving"),
            Self::Extra(name) => write!(f, "extra:{name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ClipKey {
    Idle,
    Walk,
    Run,
    Extra(String),
}

struct PendingExtra {
    name: String,
    load: SharedClipLoad,
}

pub struct AnimationStateMachine {
    mixer: AnimationMixer,
    actions: FxHashMap<ClipKey, ActionHandle>,
    active: Option<ActionHandle>,
    /// Action fading out with nothing replacing it.
    fading_out: Option<ActionHandle>,
    state: AvatarState,
    pending: Option<PendingExtra>,
}

impl AnimationStateMachine {
    /// Binds the core clips to `root` and starts idle if there is an idle clip.
    ///
    /// Clip targets are the nodes under `root` now; anything equipped later
    /// is out of reach of every clip, extras included.
    pub fn new(scene: &Scene, root: NodeHandle, assets: &VariantAssets) -> Self {
        let mut machine = Self {
            mixer: AnimationMixer::with_targets(root, Binder::targets(scene, root)),
            actions: FxHashMap::default(),
            active: None,
            fading_out: None,
            state: AvatarState::Idle,
            pending: None,
        };

        let core = [
            (ClipKey::Idle, assets.idle()),
            (ClipKey::Walk, assets.walk()),
            (ClipKey::Run, assets.run()),
        ];
        for (key, clip) in core {
            if let Some(clip) = clip {
                machine.register(scene, key, clip);
            }
        }

        if let Some(&idle) = machine.actions.get(&ClipKey::Idle) {
            machine.mixer.play(idle);
            machine.active = Some(idle);
        }
        machine
    }

    fn register(&mut self, scene: &Scene, key: ClipKey, clip: &Arc<AnimationClip>) -> ActionHandle {
        if let Some(&handle) = self.actions.get(&key) {
            return handle;
        }
        let handle = self.mixer.clip_action(scene, clip);
        if let Some(action) = self.mixer.action_mut(handle) {
            action.loop_mode = LoopMode::Loop;
            if key == ClipKey::Run {
                action.time_scale = RUN_TIME_SCALE;
            }
        }
        self.actions.insert(key, handle);
        handle
    }

    /// Crossfades to `key` from whatever is active. Missing clips are ignored.
    fn play(&mut self, key: &ClipKey) {
        let Some(&next) = self.actions.get(key) else {
            return;
        };
        match self.active {
            Some(current) if current != next => self.mixer.cross_fade(current, next, CROSSFADE_SECONDS),
            _ => self.mixer.play(next),
        }
        self.active = Some(next);
        self.fading_out = None;
    }

    fn is_active(&self, key: &ClipKey) -> bool {
        self.active.is_some() && self.active == self.actions.get(key).copied()
    }

    fn enter_idle(&mut self) {
        self.state = AvatarState::Idle;
        if self.actions.contains_key(&ClipKey::Idle) {
            if !self.is_active(&ClipKey::Idle) {
                self.play(&ClipKey::Idle);
            }
        } else if let Some(current) = self.active.take() {
            self.mixer.fade_out(current, FADE_OUT_SECONDS);
            self.fading_out = Some(current);
        }
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> &AvatarState {
        &self.state
    }

    /// Extra clip requested but not yet playing.
    #[must_use]
    pub fn pending_extra(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.name.as_str())
    }

    #[inline]
    #[must_use]
    pub fn mixer(&self) -> &AnimationMixer {
        &self.mixer
    }

    /// Handle of the clip currently faded in, if any.
    #[inline]
    #[must_use]
    pub fn active_action(&self) -> Option<ActionHandle> {
        self.active
    }

    /// Whether any clip (including one fading out) poses the hierarchy.
    #[must_use]
    pub fn is_clip_driven(&self) -> bool {
        self.mixer.is_active()
    }

    pub fn start_walk(&mut self) {
        self.pending = None;
        if self.state == AvatarState::Walk {
            return;
        }
        self.state = AvatarState::Walk;
        self.play(&ClipKey::Walk);
    }

    pub fn start_run(&mut self) {
        self.pending = None;
        if self.state == AvatarState::Run {
            return;
        }
        self.state = AvatarState::Run;
        self.play(&ClipKey::Run);
    }

    /// Caller-requested return to idle.
    pub fn stop(&mut self) {
        self.pending = None;
        self.enter_idle();
    }

    /// Arrival at a move target. A pending extra survives arrival.
    pub fn arrive(&mut self) {
        self.enter_idle();
    }

    pub fn start_moving(&mut self) {
        self.pending = None;
        self.state = AvatarState::Moving;
        if !self.is_active(&ClipKey::Walk) {
            self.play(&ClipKey::Walk);
        }
    }

    /// Plays `name` now if its clip is available, otherwise records it as
    /// pending and returns the shared load.
    pub fn request_extra(
        &mut self,
        scene: &Scene,
        assets: &Arc<VariantAssets>,
        name: &str,
    ) -> Result<Option<SharedClipLoad>, AssetError> {
        let key = ClipKey::Extra(name.to_string());
        if self.actions.contains_key(&key) {
            self.pending = None;
            self.enter_extra(name);
            return Ok(None);
        }

        match assets.extra_clip(name)? {
            ClipRequest::Ready(clip) => {
                self.pending = None;
                self.register(scene, key, &clip);
                self.enter_extra(name);
                Ok(None)
            }
            ClipRequest::Pending(load) => {
                self.pending = Some(PendingExtra {
                    name: name.to_string(),
                    load: load.clone(),
                });
                Ok(Some(load))
            }
        }
    }

    fn enter_extra(&mut self, name: &str) {
        self.state = AvatarState::Extra(name.to_string());
        self.play(&ClipKey::Extra(name.to_string()));
    }

    /// Starts the pending extra once its load has resolved.
    ///
    /// Polls the shared load without blocking, which also drives it when no
    /// caller awaits the future returned by `play_extra`.
    fn apply_pending(&mut self, scene: &Scene) {
        let Some(pending) = &self.pending else {
            return;
        };
        let Some(result) = pending.load.clone().now_or_never() else {
            return;
        };
        let Some(pending) = self.pending.take() else {
            return;
        };

        match result {
            Ok(clip) => {
                self.register(scene, ClipKey::Extra(pending.name.clone()), &clip);
                self.enter_extra(&pending.name);
            }
            Err(err) => {
                log::warn!("Extra clip '{}' unavailable, keeping {}: {}", pending.name, self.state, err);
            }
        }
    }

    /// Applies a resolved pending extra, then advances the mixer.
    pub fn update(&mut self, dt: f32, scene: &mut Scene) {
        self.apply_pending(scene);
        self.mixer.update(dt, scene);

        if let Some(handle) = self.fading_out
            && !self.mixer.action(handle).is_some_and(|a| a.enabled)
        {
            self.fading_out = None;
        }
    }

    pub fn stop_all(&mut self) {
        self.pending = None;
        self.mixer.stop_all();
        self.active = None;
        self.fading_out = None;
    }
}
