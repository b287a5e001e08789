use std::f32::consts::TAU;

use crate::scene::{NodeHandle, Scene, TransformChannel};

/// Sine generator driving one transform channel of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct Oscillator {
    pub target: NodeHandle,
    pub channel: TransformChannel,
    pub center: f32,
    pub amplitude: f32,
    /// Seconds per cycle.
    pub period: f32,
    /// Fraction of a cycle.
    pub phase: f32,
    elapsed: f32,
}

impl Oscillator {
    #[must_use]
    pub fn new(target: NodeHandle, channel: TransformChannel, center: f32, amplitude: f32, period: f32) -> Self {
        Self {
            target,
            channel,
            center,
            amplitude,
            period,
            phase: 0.0,
            elapsed: 0.0,
        }
    }

    /// Oscillates around the channel's current value in `scene`.
    #[must_use]
    pub fn around_rest(scene: &Scene, target: NodeHandle, channel: TransformChannel, amplitude: f32, period: f32) -> Self {
        let center = scene
            .get_node(target)
            .map_or(0.0, |node| node.transform.channel(channel));
        Self::new(target, channel, center, amplitude, period)
    }

    #[must_use]
    pub fn with_phase(mut self, phase: f32) -> Self {
        self.phase = phase;
        self
    }

    #[inline]
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// `center + amplitude * sin(2π (t / period + phase))`.
    #[must_use]
    pub fn value_at(&self, t: f32) -> f32 {
        if self.period <= 0.0 {
            return self.center;
        }
        self.center + self.amplitude * (TAU * (t / self.period + self.phase)).sin()
    }

    /// Advances the clock and writes the new value. Stale targets are skipped.
    pub fn tick(&mut self, dt: f32, scene: &mut Scene) {
        self.elapsed += dt;
        let value = self.value_at(self.elapsed);
        if let Some(node) = scene.get_node_mut(self.target) {
            node.transform.set_channel(self.channel, value);
        }
    }
}
