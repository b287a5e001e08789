use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::errors::AssetError;

#[cfg(not(target_arch = "wasm32"))]
use std::sync::OnceLock;
#[cfg(not(target_arch = "wasm32"))]
use tokio::runtime::Runtime;

/// Dedicated runtime for file IO so callers can drive loads from any
/// executor (or none: a frame loop polling `Shared` futures).
#[cfg(not(target_arch = "wasm32"))]
fn asset_runtime() -> Result<&'static Runtime, AssetError> {
    static RUNTIME: OnceLock<Result<Runtime, String>> = OnceLock::new();
    RUNTIME
        .get_or_init(|| Runtime::new().map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|e| AssetError::Io {
            path: "<asset runtime>".to_string(),
            message: e.clone(),
        })
}

/// Byte source for asset files.
///
/// Returns boxed futures so readers can sit behind `Arc<dyn AssetReader>`.
pub trait AssetReader: Send + Sync {
    fn read_bytes<'a>(&'a self, uri: &'a str) -> BoxFuture<'a, Result<Vec<u8>, AssetError>>;
}

/// Local file reader rooted at a directory.
pub struct FileAssetReader {
    root_path: PathBuf,
}

impl FileAssetReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            root_path: path.as_ref().to_path_buf(),
        }
    }

    #[inline]
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl AssetReader for FileAssetReader {
    fn read_bytes<'a>(&'a self, uri: &'a str) -> BoxFuture<'a, Result<Vec<u8>, AssetError>> {
        let path = self.root_path.join(uri.trim_start_matches('/'));
        Box::pin(async move {
            let display = path.display().to_string();
            let result = asset_runtime()?.spawn(tokio::fs::read(path)).await?;

            result.map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => AssetError::NotFound(display),
                _ => AssetError::Io {
                    path: display,
                    message: e.to_string(),
                },
            })
        })
    }
}

/// The browser has no file system: every read fails.
#[cfg(target_arch = "wasm32")]
impl AssetReader for FileAssetReader {
    fn read_bytes<'a>(&'a self, uri: &'a str) -> BoxFuture<'a, Result<Vec<u8>, AssetError>> {
        let path = self.root_path.join(uri.trim_start_matches('/'));
        Box::pin(async move {
            Err(AssetError::FeatureNotEnabled(format!(
                "local file access on wasm32 ({})",
                path.display()
            )))
        })
    }
}

/// HTTP reader (conditional compilation).
#[cfg(feature = "http")]
pub struct HttpAssetReader {
    root_url: url::Url,
}

#[cfg(feature = "http")]
impl HttpAssetReader {
    pub fn new(url_str: &str) -> Result<Self, AssetError> {
        let mut root_url = url::Url::parse(url_str).map_err(|e| AssetError::Io {
            path: url_str.to_string(),
            message: e.to_string(),
        })?;
        if !root_url.path().ends_with('/') {
            let path = format!("{}/", root_url.path());
            root_url.set_path(&path);
        }
        Ok(Self { root_url })
    }

    #[inline]
    #[must_use]
    pub fn root_url(&self) -> &url::Url {
        &self.root_url
    }
}

#[cfg(feature = "http")]
impl AssetReader for HttpAssetReader {
    fn read_bytes<'a>(&'a self, uri: &'a str) -> BoxFuture<'a, Result<Vec<u8>, AssetError>> {
        Box::pin(async move {
            let url = self
                .root_url
                .join(uri.trim_start_matches('/'))
                .map_err(|e| AssetError::Io {
                    path: uri.to_string(),
                    message: e.to_string(),
                })?;
            let response = ehttp::fetch_async(ehttp::Request::get(url.as_str()))
                .await
                .map_err(|message| AssetError::Io {
                    path: url.to_string(),
                    message,
                })?;
            if !response.ok {
                return Err(AssetError::HttpStatus {
                    url: url.to_string(),
                    status: response.status,
                });
            }
            Ok(response.bytes)
        })
    }
}

/// Reader chosen from a path or URL.
#[derive(Clone)]
pub enum AssetReaderVariant {
    File(Arc<FileAssetReader>),
    #[cfg(feature = "http")]
    Http(Arc<HttpAssetReader>),
}

impl AssetReaderVariant {
    pub fn from_source(source: &str) -> Result<Self, AssetError> {
        if source.starts_with("http://") || source.starts_with("https://") {
            #[cfg(feature = "http")]
            {
                Ok(Self::Http(Arc::new(HttpAssetReader::new(source)?)))
            }
            #[cfg(not(feature = "http"))]
            {
                Err(AssetError::FeatureNotEnabled(
                    "HTTP feature is not enabled. Enable it with `features = [\"http\"]`".to_string(),
                ))
            }
        } else {
            Ok(Self::File(Arc::new(FileAssetReader::new(source))))
        }
    }
}

impl AssetReader for AssetReaderVariant {
    fn read_bytes<'a>(&'a self, uri: &'a str) -> BoxFuture<'a, Result<Vec<u8>, AssetError>> {
        match self {
            Self::File(r) => r.read_bytes(uri),
            #[cfg(feature = "http")]
            Self::Http(r) => r.read_bytes(uri),
        }
    }
}
