//! CPU-side resource descriptions
//!
//! The avatar runtime never talks to the GPU. These types describe what the
//! external renderer needs (geometry extents, material parameters, texture
//! references) and encode which parts are shared between instances:
//!
//! - [`Geometry`] and [`Texture`] are loaded once and shared through `Arc`.
//! - [`Material`] is duplicated per instance so tinting never leaks.

pub mod color;
pub mod geometry;
pub mod material;
pub mod mesh;
pub mod texture;

pub use color::hsl_to_rgb;
pub use geometry::{BoundingBox, Geometry};
pub use material::{Material, MaterialKind, Side};
pub use mesh::Mesh;
pub use texture::{ColorSpace, Texture};
