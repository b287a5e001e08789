use serde::{Deserialize, Serialize};

/// Steering constants for [`MotionController`](crate::avatar::MotionController).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionTuning {
    /// Ground speed in world units per second at full facing.
    pub move_speed: f32,
    /// Maximum turn rate in radians per second.
    pub turn_rate: f32,
    /// Distance at which the target counts as reached.
    pub arrival_radius: f32,
    /// Distance over which the approach speed eases out.
    pub slowdown_radius: f32,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            move_speed: 0.6,
            turn_rate: 5.0,
            arrival_radius: 0.08,
            slowdown_radius: 0.3,
        }
    }
}

/// Per-instance construction options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarOptions {
    pub variant: String,
    /// Hue in degrees. Tints every material of the instance and its ring.
    pub hue: Option<f32>,
    /// Procedural oscillators are disabled when something else poses the bones.
    pub external_animation: bool,
    /// Height the model is uniformly scaled to.
    pub target_height: f32,
    pub motion: MotionTuning,
}

impl Default for AvatarOptions {
    fn default() -> Self {
        Self {
            variant: "red".to_string(),
            hue: None,
            external_animation: false,
            target_height: 0.85,
            motion: MotionTuning::default(),
        }
    }
}

impl AvatarOptions {
    #[must_use]
    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = variant.into();
        self
    }

    #[must_use]
    pub fn with_hue(mut self, hue: f32) -> Self {
        self.hue = Some(hue);
        self
    }

    #[must_use]
    pub fn with_external_animation(mut self, external: bool) -> Self {
        self.external_animation = external;
        self
    }
}
