//! Image decoding and encoding.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Raw decode** | `rawloader::decode_file` (DNG and other sensor-raw containers) |
//! | **Standard decode** | `image` crate (JPEG, PNG, TIFF, GIF decoders) |
//! | **Encode → JPEG** | `image::codecs::jpeg::JpegEncoder` at configured quality |
//!
//! The module is split into:
//! - **Backend**: [`PhotoBackend`] trait + error taxonomy (mockable seam)
//! - **Calculations**: pure dimension math, testable without images
//! - **Rust backend**: the production implementation

pub mod backend;
mod calculations;
pub mod rust_backend;

pub use backend::{BackendError, PhotoBackend};
pub use calculations::scaled_dimensions;
pub use rust_backend::RustBackend;
