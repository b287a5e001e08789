//! Variant asset cache.
//!
//! [`AssetCache`] resolves each variant once: the base prefab and the core
//! clips are fetched together, concurrent requests join the same in-flight
//! load, and failures leave nothing behind so the next request starts over.
//! Extra clips are only recorded as paths and fetched on first use through
//! [`VariantAssets::extra_clip`], again once per `(variant, clip)`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

use futures::future::{self, BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::animation::clip::AnimationClip;
use crate::assets::loader::AssetLoader;
use crate::assets::manifest::{VariantDef, VariantManifest};
use crate::assets::prefab::Prefab;
use crate::avatar::entity::AnimatedEntity;
use crate::avatar::options::AvatarOptions;
use crate::errors::{AssetError, Error, Result};
use crate::scene::Scene;

type SharedLoad<T> = Shared<BoxFuture<'static, std::result::Result<T, AssetError>>>;

/// In-flight extra clip load; every joiner observes the same result.
pub type SharedClipLoad = SharedLoad<Arc<AnimationClip>>;

fn join_path(base_path: &str, file: &str) -> String {
    let base = base_path.trim_end_matches('/');
    if base.is_empty() {
        file.to_string()
    } else {
        format!("{base}/{file}")
    }
}

/// Result of asking for an extra clip.
pub enum ClipRequest {
    /// Already in the shared map.
    Ready(Arc<AnimationClip>),
    /// Loading; the future is shared with every other requester.
    Pending(SharedClipLoad),
}

#[derive(Default)]
struct ExtraClips {
    ready: FxHashMap<String, Arc<AnimationClip>>,
    loading: FxHashMap<String, SharedClipLoad>,
}

/// Everything one variant shares between its instances.
///
/// Never mutated after load except for the extra-clip map, which only grows.
pub struct VariantAssets {
    variant: String,
    definition: VariantDef,
    base: Arc<Prefab>,
    idle: Option<Arc<AnimationClip>>,
    walk: Option<Arc<AnimationClip>>,
    run: Option<Arc<AnimationClip>>,
    extra_clip_paths: BTreeMap<String, String>,
    extra_clips: Mutex<ExtraClips>,
    reference_height: f32,
    loader: Arc<dyn AssetLoader>,
}

impl fmt::Debug for VariantAssets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantAssets")
            .field("variant", &self.variant)
            .field("nodes", &self.base.nodes.len())
            .field("reference_height", &self.reference_height)
            .field("extra_clips", &self.extra_clip_paths.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl VariantAssets {
    #[inline]
    #[must_use]
    pub fn variant(&self) -> &str {
        &self.variant
    }

    #[inline]
    #[must_use]
    pub fn definition(&self) -> &VariantDef {
        &self.definition
    }

    #[inline]
    #[must_use]
    pub fn base(&self) -> &Arc<Prefab> {
        &self.base
    }

    #[must_use]
    pub fn idle(&self) -> Option<&Arc<AnimationClip>> {
        self.idle.as_ref()
    }

    #[must_use]
    pub fn walk(&self) -> Option<&Arc<AnimationClip>> {
        self.walk.as_ref()
    }

    #[must_use]
    pub fn run(&self) -> Option<&Arc<AnimationClip>> {
        self.run.as_ref()
    }

    /// Maximum vertical extent of the base geometry, `0.0` if it has none.
    #[inline]
    #[must_use]
    pub fn reference_height(&self) -> f32 {
        self.reference_height
    }

    /// Declared extra clips, sorted by name.
    #[must_use]
    pub fn extra_clip_names(&self) -> Vec<String> {
        self.extra_clip_paths.keys().cloned().collect()
    }

    #[must_use]
    pub fn extra_clip_path(&self, name: &str) -> Option<&str> {
        self.extra_clip_paths.get(name).map(String::as_str)
    }

    /// The extra clip if it has already been loaded.
    #[must_use]
    pub fn cached_extra_clip(&self, name: &str) -> Option<Arc<AnimationClip>> {
        self.extra_clips.lock().ready.get(name).cloned()
    }

    #[must_use]
    pub fn is_extra_loading(&self, name: &str) -> bool {
        self.extra_clips.lock().loading.contains_key(name)
    }

    /// Returns the extra clip, starting or joining its load if needed.
    ///
    /// On success the clip is stored for every current and future instance;
    /// on failure the in-flight entry is dropped so a later request retries.
    pub fn extra_clip(self: &Arc<Self>, name: &str) -> std::result::Result<ClipRequest, AssetError> {
        let path = self
            .extra_clip_path(name)
            .ok_or_else(|| AssetError::UnknownClip {
                variant: self.variant.clone(),
                clip: name.to_string(),
            })?
            .to_string();

        let mut clips = self.extra_clips.lock();
        if let Some(clip) = clips.ready.get(name) {
            return Ok(ClipRequest::Ready(Arc::clone(clip)));
        }
        if let Some(load) = clips.loading.get(name) {
            log::debug!("Joining in-flight load of '{}' for '{}'", name, self.variant);
            return Ok(ClipRequest::Pending(load.clone()));
        }

        log::debug!("Loading extra clip '{}' from '{}'", name, path);
        let load = Self::load_extra(Arc::downgrade(self), name.to_string(), path).shared();
        clips.loading.insert(name.to_string(), load.clone());
        Ok(ClipRequest::Pending(load))
    }

    fn load_extra(
        owner: Weak<Self>,
        name: String,
        path: String,
    ) -> BoxFuture<'static, std::result::Result<Arc<AnimationClip>, AssetError>> {
        let fetch = owner.upgrade().map(|assets| assets.loader.load(&path));
        async move {
            let result = match fetch {
                Some(fetch) => fetch
                    .await
                    .and_then(|asset| asset.into_first_clip().ok_or(AssetError::MissingClip(path)))
                    .map(Arc::new),
                None => Err(AssetError::NotPreloaded(name.clone())),
            };

            if let Some(assets) = owner.upgrade() {
                let mut clips = assets.extra_clips.lock();
                clips.loading.remove(&name);
                if let Ok(clip) = &result {
                    clips.ready.insert(name, Arc::clone(clip));
                }
            }
            result
        }
        .boxed()
    }
}

#[derive(Default)]
struct CacheState {
    ready: FxHashMap<String, Arc<VariantAssets>>,
    loading: FxHashMap<String, SharedLoad<Arc<VariantAssets>>>,
}

struct CacheInner {
    loader: Arc<dyn AssetLoader>,
    manifest: VariantManifest,
    state: Mutex<CacheState>,
}

/// Process-lifetime store of loaded variants.
///
/// Cloning is cheap and every clone sees the same entries. Entries are never
/// evicted.
#[derive(Clone)]
pub struct AssetCache {
    inner: Arc<CacheInner>,
}

impl AssetCache {
    pub fn new(loader: Arc<dyn AssetLoader>, manifest: VariantManifest) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                loader,
                manifest,
                state: Mutex::new(CacheState::default()),
            }),
        }
    }

    #[must_use]
    pub fn manifest(&self) -> &VariantManifest {
        &self.inner.manifest
    }

    /// Resolves `variant`, loading its files from `base_path` if needed.
    ///
    /// Concurrent calls share one load and resolve to the same `Arc`. Unknown
    /// variants fail immediately without touching the loader.
    pub fn preload(&self, base_path: &str, variant: &str) -> BoxFuture<'static, Result<Arc<VariantAssets>>> {
        let mut state = self.inner.state.lock();

        if let Some(assets) = state.ready.get(variant) {
            log::debug!("Variant '{}' already cached", variant);
            return future::ready(Ok(Arc::clone(assets))).boxed();
        }
        if let Some(load) = state.loading.get(variant) {
            log::debug!("Joining in-flight load of variant '{}'", variant);
            return load.clone().map(|r| r.map_err(Error::from)).boxed();
        }

        let definition = match self.inner.manifest.variant(variant) {
            Ok(def) => def.clone(),
            Err(err) => return future::ready(Err(Error::from(err))).boxed(),
        };

        let load = Self::load_variant(
            Arc::downgrade(&self.inner),
            base_path.to_string(),
            variant.to_string(),
            definition,
        )
        .shared();
        state.loading.insert(variant.to_string(), load.clone());
        drop(state);

        load.map(|r| r.map_err(Error::from)).boxed()
    }

    fn load_variant(
        owner: Weak<CacheInner>,
        base_path: String,
        variant: String,
        definition: VariantDef,
    ) -> BoxFuture<'static, std::result::Result<Arc<VariantAssets>, AssetError>> {
        let loader = owner.upgrade().map(|inner| Arc::clone(&inner.loader));
        async move {
            let result = match loader {
                Some(loader) => fetch_variant(loader, &base_path, &variant, definition).await,
                None => Err(AssetError::NotPreloaded(variant.clone())),
            };

            if let Some(inner) = owner.upgrade() {
                let mut state = inner.state.lock();
                state.loading.remove(&variant);
                if let Ok(assets) = &result {
                    state.ready.insert(variant.clone(), Arc::clone(assets));
                }
            }

            match &result {
                Ok(assets) => log::info!(
                    "Loaded variant '{}' (reference height {:.3}, {} extra clips)",
                    variant,
                    assets.reference_height,
                    assets.extra_clip_paths.len()
                ),
                Err(err) => log::warn!("Failed to load variant '{}': {}", variant, err),
            }
            result
        }
        .boxed()
    }

    /// Non-blocking readiness check.
    #[must_use]
    pub fn is_ready(&self, variant: &str) -> bool {
        self.inner.state.lock().ready.contains_key(variant)
    }

    #[must_use]
    pub fn get(&self, variant: &str) -> Option<Arc<VariantAssets>> {
        self.inner.state.lock().ready.get(variant).cloned()
    }

    /// Builds an entity from an already-loaded variant. Never loads.
    pub fn create_sync(&self, scene: &mut Scene, options: AvatarOptions) -> Result<AnimatedEntity> {
        let assets = self
            .get(&options.variant)
            .ok_or_else(|| AssetError::NotPreloaded(options.variant.clone()))?;
        Ok(AnimatedEntity::new(scene, assets, &options))
    }
}

async fn fetch_variant(
    loader: Arc<dyn AssetLoader>,
    base_path: &str,
    variant: &str,
    definition: VariantDef,
) -> std::result::Result<Arc<VariantAssets>, AssetError> {
    let files = &definition.files;
    let base_file = join_path(base_path, &files.base);

    let core_clip = |file: Option<&String>| -> BoxFuture<'static, std::result::Result<Option<Arc<AnimationClip>>, AssetError>> {
        match file {
            Some(file) => loader
                .load(&join_path(base_path, file))
                .map(|r| r.map(|asset| asset.into_first_clip().map(Arc::new)))
                .boxed(),
            None => future::ready(Ok(None)).boxed(),
        }
    };

    let (base, idle, walk, run) = futures::try_join!(
        loader.load(&base_file),
        core_clip(files.idle.as_ref()),
        core_clip(files.walk.as_ref()),
        core_clip(files.run.as_ref()),
    )?;

    let base = base.scene.ok_or(AssetError::MissingScene(base_file))?;
    let reference_height = base.reference_height();

    let extra_clip_paths = definition
        .extra_animations
        .iter()
        .map(|(name, file)| (name.clone(), join_path(base_path, file)))
        .collect();

    Ok(Arc::new(VariantAssets {
        variant: variant.to_string(),
        definition,
        base: Arc::new(base),
        idle,
        walk,
        run,
        extra_clip_paths,
        extra_clips: Mutex::new(ExtraClips::default()),
        reference_height,
        loader,
    }))
}

#[cfg(test)]
mod tests {
    use super::join_path;

    #[test]
    fn join_path_handles_trailing_and_empty_bases() {
        assert_eq!(join_path("/models", "a.glb"), "/models/a.glb");
        assert_eq!(join_path("/models/", "a.glb"), "/models/a.glb");
        assert_eq!(join_path("", "a.glb"), "a.glb");
    }
}
