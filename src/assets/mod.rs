//! Asset loading: readers, decoders, prefabs and the variant cache.

pub mod cache;
pub mod io;
pub mod loader;
pub mod loaders;
pub mod manifest;
pub mod prefab;

pub use cache::{AssetCache, ClipRequest, SharedClipLoad, VariantAssets};
#[cfg(feature = "http")]
pub use io::HttpAssetReader;
pub use io::{AssetReader, AssetReaderVariant, FileAssetReader};
pub use loader::{AssetLoader, LoadedAsset};
#[cfg(feature = "gltf")]
pub use loaders::GltfAssetLoader;
pub use manifest::{SlotDef, VariantDef, VariantFiles, VariantManifest};
pub use prefab::{Prefab, PrefabMesh, PrefabNode, PrefabSkeleton, SharedPrefab};
