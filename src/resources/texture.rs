use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSpace {
    #[default]
    Srgb,
    Linear,
}

/// A texture reference decoded by the loader.
///
/// Textures are immutable once loaded and shared between every instance
/// of a variant via `Arc<Texture>`.
#[derive(Debug, Clone)]
pub struct Texture {
    pub uuid: Uuid,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
}

impl Texture {
    #[must_use]
    pub fn new(name: impl Into<String>, width: u32, height: u32, color_space: ColorSpace) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            width,
            height,
            color_space,
        }
    }
}
