use std::sync::Arc;

use futures::future::BoxFuture;

use crate::animation::clip::AnimationClip;
use crate::assets::prefab::Prefab;
use crate::errors::AssetError;

/// Result of decoding one asset file.
#[derive(Debug, Clone, Default)]
pub struct LoadedAsset {
    pub scene: Option<Prefab>,
    pub animations: Vec<AnimationClip>,
}

impl LoadedAsset {
    /// First clip in the file, which is how single-animation files are read.
    #[must_use]
    pub fn into_first_clip(self) -> Option<AnimationClip> {
        self.animations.into_iter().next()
    }
}

/// Fetches and decodes a file into a [`LoadedAsset`].
///
/// The returned future is `'static` so it can be shared between callers.
pub trait AssetLoader: Send + Sync {
    fn load(&self, path: &str) -> BoxFuture<'static, Result<LoadedAsset, AssetError>>;
}

impl<T: AssetLoader + ?Sized> AssetLoader for Arc<T> {
    fn load(&self, path: &str) -> BoxFuture<'static, Result<LoadedAsset, AssetError>> {
        (**self).load(path)
    }
}
