use std::f32::consts::TAU;

use glam::{Affine3A, Vec3};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    /// Smallest box enclosing `points`. `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        let mut any = false;
        for p in points {
            min = min.min(p);
            max = max.max(p);
            any = true;
        }
        any.then_some(Self { min, max })
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Vertical (Y) extent.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[must_use]
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    #[must_use]
    pub fn transform(&self, matrix: &Affine3A) -> Self {
        let corners = (0..8).map(|i| {
            Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        });
        // Eight corners, never empty.
        Self::from_points(corners.map(|c| matrix.transform_point3(c))).unwrap_or(*self)
    }
}

/// Vertex positions plus a cached bounding box.
///
/// Loaded geometry is shared read-only between instances; only geometry
/// generated per instance (e.g. the ground ring) is owned by one entity.
#[derive(Debug, Clone)]
pub struct Geometry {
    pub uuid: Uuid,
    pub name: String,
    positions: Vec<Vec3>,
    indices: Option<Vec<u32>>,
    bounding_box: Option<BoundingBox>,
}

impl Geometry {
    #[must_use]
    pub fn new(name: impl Into<String>, positions: Vec<Vec3>) -> Self {
        let mut geometry = Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            positions,
            indices: None,
            bounding_box: None,
        };
        geometry.compute_bounding_box();
        geometry
    }

    #[must_use]
    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = Some(indices);
        self
    }

    #[inline]
    #[must_use]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    #[inline]
    #[must_use]
    pub fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn bounding_box(&self) -> Option<&BoundingBox> {
        self.bounding_box.as_ref()
    }

    pub fn compute_bounding_box(&mut self) -> Option<BoundingBox> {
        self.bounding_box = BoundingBox::from_points(self.positions.iter().copied());
        self.bounding_box
    }

    /// Flat annulus in the XY plane, facing +Z.
    #[must_use]
    pub fn ring(inner_radius: f32, outer_radius: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let mut positions = Vec::with_capacity(segments as usize * 2);
        for i in 0..segments {
            let theta = i as f32 / segments as f32 * TAU;
            let (sin, cos) = theta.sin_cos();
            positions.push(Vec3::new(cos * inner_radius, sin * inner_radius, 0.0));
            positions.push(Vec3::new(cos * outer_radius, sin * outer_radius, 0.0));
        }

        let mut indices = Vec::with_capacity(segments as usize * 6);
        for i in 0..segments {
            let a = i * 2;
            let b = a + 1;
            let c = (a + 2) % (segments * 2);
            let d = c + 1;
            indices.extend_from_slice(&[a, b, d, a, d, c]);
        }

        Self::new("RingGeometry", positions).with_indices(indices)
    }
}
