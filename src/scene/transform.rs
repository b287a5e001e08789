use std::str::FromStr;

use glam::{Affine3A, EulerRot, Mat4, Quat, Vec3};

/// Transform component.
///
/// Wraps position / rotation / scale together with cached local and world
/// matrices. The local matrix is recomputed lazily when any TRS field changed.
#[derive(Debug, Clone)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,

    pub(crate) local_matrix: Affine3A,
    pub(crate) world_matrix: Affine3A,

    last_position: Vec3,
    last_rotation: Quat,
    last_scale: Vec3,
    force_update: bool,
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            local_matrix: Affine3A::IDENTITY,
            world_matrix: Affine3A::IDENTITY,
            last_position: Vec3::ZERO,
            last_rotation: Quat::IDENTITY,
            last_scale: Vec3::ONE,
            force_update: true,
        }
    }

    #[must_use]
    pub fn from_trs(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
            ..Self::new()
        }
    }

    /// Recomputes the local matrix if TRS changed. Returns whether it did.
    pub fn update_local_matrix(&mut self) -> bool {
        let changed = self.position != self.last_position
            || self.rotation != self.last_rotation
            || self.scale != self.last_scale
            || self.force_update;

        if changed {
            self.local_matrix =
                Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.position);
            self.last_position = self.position;
            self.last_rotation = self.rotation;
            self.last_scale = self.scale;
            self.force_update = false;
        }

        changed
    }

    pub fn set_rotation_euler(&mut self, x: f32, y: f32, z: f32) {
        self.rotation = Quat::from_euler(EulerRot::XYZ, x, y, z);
    }

    /// Current rotation as XYZ euler angles.
    #[must_use]
    pub fn rotation_euler(&self) -> Vec3 {
        let (x, y, z) = self.rotation.to_euler(EulerRot::XYZ);
        Vec3::new(x, y, z)
    }

    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> &Affine3A {
        &self.local_matrix
    }

    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.world_matrix
    }

    #[inline]
    #[must_use]
    pub fn world_matrix_as_mat4(&self) -> Mat4 {
        Mat4::from(self.world_matrix)
    }

    pub fn set_world_matrix(&mut self, mat: Affine3A) {
        self.world_matrix = mat;
    }

    pub fn mark_dirty(&mut self) {
        self.force_update = true;
    }

    /// Reads one scalar channel.
    #[must_use]
    pub fn channel(&self, channel: TransformChannel) -> f32 {
        use TransformChannel as C;
        match channel {
            C::PositionX => self.position.x,
            C::PositionY => self.position.y,
            C::PositionZ => self.position.z,
            C::RotationX => self.rotation_euler().x,
            C::RotationY => self.rotation_euler().y,
            C::RotationZ => self.rotation_euler().z,
            C::ScaleX => self.scale.x,
            C::ScaleY => self.scale.y,
            C::ScaleZ => self.scale.z,
        }
    }

    /// Writes one scalar channel. Rotation channels are XYZ euler angles.
    pub fn set_channel(&mut self, channel: TransformChannel, value: f32) {
        use TransformChannel as C;
        match channel {
            C::PositionX => self.position.x = value,
            C::PositionY => self.position.y = value,
            C::PositionZ => self.position.z = value,
            C::RotationX | C::RotationY | C::RotationZ => {
                let mut euler = self.rotation_euler();
                match channel {
                    C::RotationX => euler.x = value,
                    C::RotationY => euler.y = value,
                    _ => euler.z = value,
                }
                self.set_rotation_euler(euler.x, euler.y, euler.z);
            }
            C::ScaleX => self.scale.x = value,
            C::ScaleY => self.scale.y = value,
            C::ScaleZ => self.scale.z = value,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

/// A single scalar property of a [`Transform`], addressed by a dotted path
/// such as `"position.y"` or `"rotation.z"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformChannel {
    PositionX,
    PositionY,
    PositionZ,
    RotationX,
    RotationY,
    RotationZ,
    ScaleX,
    ScaleY,
    ScaleZ,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChannel(pub String);

impl std::fmt::Display for UnknownChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown transform channel '{}'", self.0)
    }
}

impl std::error::Error for UnknownChannel {}

impl FromStr for TransformChannel {
    type Err = UnknownChannel;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        use TransformChannel as C;
        let (property, axis) = path
            .split_once('.')
            .ok_or_else(|| UnknownChannel(path.to_string()))?;
        let channel = match (property, axis) {
            ("position", "x") => C::PositionX,
            ("position", "y") => C::PositionY,
            ("position", "z") => C::PositionZ,
            ("rotation", "x") => C::RotationX,
            ("rotation", "y") => C::RotationY,
            ("rotation", "z") => C::RotationZ,
            ("scale", "x") => C::ScaleX,
            ("scale", "y") => C::ScaleY,
            ("scale", "z") => C::ScaleZ,
            _ => return Err(UnknownChannel(path.to_string())),
        };
        Ok(channel)
    }
}
