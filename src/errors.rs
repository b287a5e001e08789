//! Error Types
//!
//! This module defines the error types used throughout the avatar runtime.
//!
//! # Overview
//!
//! - [`AssetError`] covers everything that can go wrong while resolving a
//!   variant or one of its clips. It is `Clone` because a single in-flight load
//!   is observed by every caller that joined it.
//! - [`Error`] is the crate-level error returned by public APIs.
//!
//! ```rust,ignore
//! use myth_avatar::errors::{Error, Result};
//!
//! fn create() -> Result<()> {
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Failures while locating, reading or decoding avatar assets.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    // ========================================================================
    // Configuration / precondition errors
    // ========================================================================
    /// The variant is not declared in the manifest.
    #[error("Unknown model variant: {0}")]
    UnknownVariant(String),

    /// The extra clip is not declared for this variant.
    #[error("Unknown extra animation '{clip}' for variant '{variant}'")]
    UnknownClip {
        /// Variant the clip was requested for
        variant: String,
        /// Requested clip name
        clip: String,
    },

    /// An instance was requested before its variant finished preloading.
    #[error("preload('{0}') must complete before instances can be created")]
    NotPreloaded(String),

    // ========================================================================
    // IO errors
    // ========================================================================
    /// The requested asset was not found.
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// File or stream IO failed.
    #[error("IO error reading '{path}': {message}")]
    Io {
        /// Path that was being read
        path: String,
        /// Underlying error message
        message: String,
    },

    /// HTTP response error with status code.
    #[error("HTTP response error for '{url}': status {status}")]
    HttpStatus {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    // ========================================================================
    // Format errors
    // ========================================================================
    /// The file could not be decoded.
    #[error("Failed to decode '{path}': {message}")]
    Decode {
        /// Path of the file
        path: String,
        /// Decoder message
        message: String,
    },

    /// The base file contains no scene.
    #[error("'{0}' contains no scene")]
    MissingScene(String),

    /// An extra animation file contains no clip.
    #[error("'{0}' contains no animation clip")]
    MissingClip(String),

    // ========================================================================
    // Platform errors
    // ========================================================================
    /// Feature not enabled.
    #[error("Feature not enabled: {0}")]
    FeatureNotEnabled(String),

    /// Background IO task failed to complete.
    #[error("Task join error: {0}")]
    TaskJoin(String),
}

/// The main error type for the avatar runtime.
#[derive(Error, Debug)]
pub enum Error {
    /// Asset resolution failed.
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Variant manifest could not be parsed.
    #[error("Manifest parse error: {0}")]
    Manifest(#[from] serde_json::Error),

    /// File IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the asset error if this is one.
    #[must_use]
    pub fn as_asset(&self) -> Option<&AssetError> {
        match self {
            Error::Asset(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl From<tokio::task::JoinError> for AssetError {
    fn from(err: tokio::task::JoinError) -> Self {
        AssetError::TaskJoin(err.to_string())
    }
}

/// Alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
