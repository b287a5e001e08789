use std::sync::Arc;

use glam::{Quat, Vec3};

use crate::animation::binding::PropertyBinding;
use crate::animation::clip::{AnimationClip, TrackData};
use crate::animation::tracks::KeyframeCursor;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoopMode {
    Once,
    Loop,
    PingPong,
}

/// A linear weight ramp advanced by [`AnimationAction::update`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    pub from: f32,
    pub to: f32,
    pub duration: f32,
    pub elapsed: f32,
}

impl Fade {
    #[must_use]
    pub fn new(from: f32, to: f32, duration: f32) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.0),
            elapsed: 0.0,
        }
    }

    #[must_use]
    pub fn weight(&self) -> f32 {
        if self.duration <= 0.0 {
            return self.to;
        }
        let t = (self.elapsed / self.duration).min(1.0);
        self.from + (self.to - self.from) * t
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Playback state of one clip on one mixer.
#[derive(Debug, Clone)]
pub struct AnimationAction {
    clip: Arc<AnimationClip>,

    pub time: f32,
    pub time_scale: f32,
    pub weight: f32,
    pub loop_mode: LoopMode,
    pub paused: bool,
    pub enabled: bool,

    pub bindings: Vec<PropertyBinding>,

    pub(crate) track_cursors: Vec<KeyframeCursor>,
    fade: Option<Fade>,
}

pub enum TrackValue {
    Vector3(Vec3),
    Quaternion(Quat),
}

impl AnimationAction {
    /// A new action is disabled until [`play`](Self::play) is called.
    #[must_use]
    pub fn new(clip: Arc<AnimationClip>) -> Self {
        let track_count = clip.tracks.len();
        Self {
            clip,
            time: 0.0,
            time_scale: 1.0,
            weight: 1.0,
            loop_mode: LoopMode::Loop,
            paused: false,
            enabled: false,
            bindings: Vec::new(),
            track_cursors: vec![KeyframeCursor::default(); track_count],
            fade: None,
        }
    }

    #[must_use]
    pub fn clip(&self) -> &Arc<AnimationClip> {
        &self.clip
    }

    #[must_use]
    pub fn fade(&self) -> Option<&Fade> {
        self.fade.as_ref()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.enabled && !self.paused
    }

    /// Rewinds to the start at full weight and cancels any fade.
    pub fn reset(&mut self) -> &mut Self {
        self.time = 0.0;
        self.weight = 1.0;
        self.paused = false;
        self.fade = None;
        for cursor in &mut self.track_cursors {
            cursor.last_index = 0;
        }
        self
    }

    pub fn play(&mut self) -> &mut Self {
        self.enabled = true;
        self
    }

    pub fn stop(&mut self) -> &mut Self {
        self.enabled = false;
        self.fade = None;
        self
    }

    pub fn fade_in(&mut self, duration: f32) -> &mut Self {
        self.enabled = true;
        self.fade = Some(Fade::new(0.0, 1.0, duration));
        self.weight = 0.0;
        self
    }

    /// Ramps the weight to zero; the action disables itself when done.
    pub fn fade_out(&mut self, duration: f32) -> &mut Self {
        self.fade = Some(Fade::new(self.weight, 0.0, duration));
        self
    }

    /// Advances playback time and any active fade.
    pub fn update(&mut self, dt: f32) {
        if !self.enabled {
            return;
        }

        if let Some(fade) = &mut self.fade {
            fade.elapsed += dt;
            self.weight = fade.weight();
            if fade.is_finished() {
                let target = fade.to;
                self.fade = None;
                if target <= 0.0 {
                    self.enabled = false;
                    return;
                }
            }
        }

        if self.paused {
            return;
        }

        let duration = self.clip.duration;
        if duration <= 0.0 {
            return;
        }

        self.time += dt * self.time_scale;

        match self.loop_mode {
            LoopMode::Once => {
                if self.time >= duration {
                    self.time = duration;
                    self.paused = true;
                } else if self.time < 0.0 {
                    self.time = 0.0;
                    self.paused = true;
                }
            }
            LoopMode::Loop => {
                self.time = self.time.rem_euclid(duration);
            }
            LoopMode::PingPong => {
                let cycle = duration * 2.0;
                let t = self.time.rem_euclid(cycle);
                self.time = if t > duration { cycle - t } else { t };
            }
        }
    }

    /// Samples every bound track at the current time.
    pub(crate) fn sample_bindings(&mut self, mut sink: impl FnMut(&PropertyBinding, TrackValue)) {
        let time = self.time;
        for binding in &self.bindings {
            let Some(track) = self.clip.tracks.get(binding.track_index) else {
                continue;
            };
            let Some(cursor) = self.track_cursors.get_mut(binding.track_index) else {
                continue;
            };
            let value = match &track.data {
                TrackData::Vector3(t) => t.sample_with_cursor(time, cursor).map(TrackValue::Vector3),
                TrackData::Quaternion(t) => t.sample_with_cursor(time, cursor).map(TrackValue::Quaternion),
            };
            if let Some(value) = value {
                sink(binding, value);
            }
        }
    }
}
