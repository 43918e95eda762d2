//! Photo decoding/encoding backend trait and shared error taxonomy.
//!
//! The [`PhotoBackend`] trait defines the three operations the resize stage
//! needs: decode a sensor-raw container, decode a standard image, and encode
//! a JPEG. The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend); tests use the mock in
//! this module's `tests` submodule.
//!
//! The error variants carry the distinctions the resize worker acts on:
//! [`BackendError::Unsupported`] triggers the raw → standard decode fallback,
//! [`BackendError::NotFound`] marks a per-item "photo missing" outcome, and
//! everything else is an unreadable or unwritable file.

use image::DynamicImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),
    #[error("unsupported format: {0}")]
    Unsupported(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Trait for photo decode/encode backends.
///
/// `Sync` so a single backend can be shared across rayon resize workers.
pub trait PhotoBackend: Sync {
    /// Decode a sensor-raw container (DNG etc.).
    ///
    /// Returns [`BackendError::Unsupported`] for files the raw decoder does
    /// not recognize, so callers can fall back to [`Self::decode_image`].
    fn decode_raw(&self, path: &Path) -> Result<DynamicImage, BackendError>;

    /// Decode a standard image format (JPEG, PNG, TIFF, GIF).
    fn decode_image(&self, path: &Path) -> Result<DynamicImage, BackendError>;

    /// Encode to JPEG at the given quality (1-100).
    fn encode_jpeg(
        &self,
        image: &DynamicImage,
        output: &Path,
        quality: u8,
    ) -> Result<(), BackendError>;
}
