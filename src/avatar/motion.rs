use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::avatar::options::MotionTuning;

/// Cubic ease `t²(3 − 2t)` on `[0, 1]`.
#[inline]
#[must_use]
pub fn smooth_step(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Signed shortest rotation from `from` to `to`, in `(−π, π]`.
#[must_use]
pub fn shortest_angle(from: f32, to: f32) -> f32 {
    let diff = (to - from).rem_euclid(TAU);
    if diff > PI { diff - TAU } else { diff }
}

/// Heading that faces along `(dx, dz)`; zero faces +Z.
#[inline]
#[must_use]
pub fn heading_towards(dx: f32, dz: f32) -> f32 {
    dx.atan2(dz)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionStep {
    /// No target set.
    Idle,
    Moving,
    /// Target reached this step and cleared.
    Arrived,
}

/// Planar steering towards a target on the XZ plane.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionController {
    tuning: MotionTuning,
    target: Option<Vec3>,
}

impl MotionController {
    #[must_use]
    pub fn new(tuning: MotionTuning) -> Self {
        Self { tuning, target: None }
    }

    #[inline]
    #[must_use]
    pub fn tuning(&self) -> &MotionTuning {
        &self.tuning
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> Option<Vec3> {
        self.target
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = Some(target);
    }

    pub fn clear_target(&mut self) {
        self.target = None;
    }

    /// Turns and advances `position`/`heading` by one tick.
    ///
    /// The turn is limited to `turn_rate * dt`. Speed scales with how well the
    /// entity faces the target and eases out inside the slowdown radius. A
    /// step never exceeds the remaining distance.
    pub fn step(&mut self, position: &mut Vec3, heading: &mut f32, dt: f32) -> MotionStep {
        let Some(target) = self.target else {
            return MotionStep::Idle;
        };

        let dx = target.x - position.x;
        let dz = target.z - position.z;
        let distance = dx.hypot(dz);

        if distance < self.tuning.arrival_radius {
            self.target = None;
            return MotionStep::Arrived;
        }

        let error = shortest_angle(*heading, heading_towards(dx, dz));
        let turn = error.signum() * error.abs().min(self.tuning.turn_rate * dt);
        *heading = shortest_angle(0.0, *heading + turn);

        let facing = (1.0 - error.abs() / PI).max(0.0);
        let approach = if self.tuning.slowdown_radius > 0.0 {
            (distance / self.tuning.slowdown_radius).min(1.0)
        } else {
            1.0
        };
        let speed = self.tuning.move_speed * facing * smooth_step(approach);
        let advance = (speed * dt).min(distance);

        position.x += heading.sin() * advance;
        position.z += heading.cos() * advance;
        MotionStep::Moving
    }
}
