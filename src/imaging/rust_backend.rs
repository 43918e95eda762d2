//! Production decode/encode backend — pure Rust, statically linked.
//!
//! Raw containers go through `rawloader`, everything else through the `image`
//! crate's decoders. Output is always JPEG via `JpegEncoder`.
//!
//! Raw files are rendered without demosaicing: CFA sensor mosaics come out as
//! grayscale, and raws that already develop to three components per pixel
//! come out RGB. The annotations this feeds care about crop geometry, not
//! color fidelity.

use super::backend::{BackendError, PhotoBackend};
use image::{DynamicImage, GrayImage, ImageReader, RgbImage};
use std::path::Path;

/// Pure Rust backend using rawloader and the `image` crate.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PhotoBackend for RustBackend {
    fn decode_raw(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        if !path.exists() {
            return Err(BackendError::NotFound(path.to_path_buf()));
        }
        // rawloader does not distinguish "not a raw file" from other decode
        // problems, so any failure here is treated as unsupported and the
        // caller falls through to the standard decoders.
        let raw = rawloader::decode_file(path)
            .map_err(|_| BackendError::Unsupported(path.to_path_buf()))?;
        render_raw(raw, path)
    }

    fn decode_image(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        if !path.exists() {
            return Err(BackendError::NotFound(path.to_path_buf()));
        }
        ImageReader::open(path)
            .map_err(BackendError::Io)?
            .decode()
            .map_err(|e| BackendError::Decode(format!("{}: {e}", path.display())))
    }

    fn encode_jpeg(
        &self,
        image: &DynamicImage,
        output: &Path,
        quality: u8,
    ) -> Result<(), BackendError> {
        let file = std::fs::File::create(output)?;
        let writer = std::io::BufWriter::new(file);
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality);
        encoder
            .encode_image(&image.to_rgb8())
            .map_err(|e| BackendError::Encode(format!("{}: {e}", output.display())))
    }
}

/// Render decoded sensor data to an 8-bit image, normalized by white level.
fn render_raw(raw: rawloader::RawImage, path: &Path) -> Result<DynamicImage, BackendError> {
    let width = raw.width as u32;
    let height = raw.height as u32;
    let white = f32::from(raw.whitelevels[0].max(1));

    let data: Vec<u16> = match raw.data {
        rawloader::RawImageData::Integer(data) => data,
        rawloader::RawImageData::Float(data) => data
            .into_iter()
            .map(|v| v.clamp(0.0, f32::from(u16::MAX)) as u16)
            .collect(),
    };

    let pixels: Vec<u8> = data
        .iter()
        .map(|&v| ((f32::from(v) / white) * 255.0).clamp(0.0, 255.0) as u8)
        .collect();

    let image = match raw.cpp {
        3 => RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8),
        1 => GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8),
        n => {
            return Err(BackendError::Decode(format!(
                "{}: unexpected {n} components per pixel",
                path.display()
            )));
        }
    };

    image.ok_or_else(|| {
        BackendError::Decode(format!(
            "{}: sensor data does not match reported dimensions",
            path.display()
        ))
    })
}
