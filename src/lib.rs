#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod animation;
pub mod assets;
pub mod avatar;
pub mod errors;
pub mod resources;
pub mod scene;

pub use animation::{AnimationAction, AnimationClip, AnimationMixer, BindTargets, Binder, LoopMode};
pub use assets::{AssetCache, AssetLoader, AssetReader, LoadedAsset, Prefab, VariantAssets, VariantManifest};
#[cfg(feature = "gltf")]
pub use assets::GltfAssetLoader;
pub use avatar::{AnimatedEntity, AvatarOptions, AvatarState, DisposedAvatar, MotionTuning, TextureMode};
pub use errors::{AssetError, Error, Result};
pub use resources::{Geometry, Material, Mesh, Texture};
pub use scene::{Node, NodeFlags, NodeHandle, Scene};
