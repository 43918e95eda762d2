//! Shared fixtures for unit tests: synthetic images and canned metadata.

use crate::extract::{FieldSpec, Target};
use crate::metadata::RawMetadata;
use std::collections::BTreeMap;
use std::path::Path;

/// Create a small valid JPEG file with the given dimensions.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    use image::{ImageEncoder, RgbImage};

    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// The field spec used throughout the tests: exiftool group-prefixed primary
/// keys with `XMP-crs` fallbacks, matching the sample `config.json`.
pub fn test_field_spec() -> FieldSpec {
    let mut map = BTreeMap::new();
    for target in [
        Target::CropLeft,
        Target::CropTop,
        Target::CropRight,
        Target::CropBottom,
    ] {
        map.insert(
            target.name().to_string(),
            [
                format!("XMP:{}", target.name()),
                format!("XMP-crs:{}", target.name()),
            ],
        );
    }
    map.insert(
        Target::ExifFileName.name().to_string(),
        ["File:FileName".to_string(), "SourceFile".to_string()],
    );
    map.insert(
        Target::RawFileName.name().to_string(),
        ["XMP:RawFileName".to_string(), "XMP-crs:RawFileName".to_string()],
    );
    FieldSpec::from_map(&map).unwrap()
}

/// Metadata for a photo carrying its own crop fields.
pub fn photo_metadata(file_name: &str, left: f64, top: f64, right: f64, bottom: f64) -> RawMetadata {
    let mut meta = RawMetadata::new();
    meta.insert("File:FileName".to_string(), file_name.into());
    meta.insert("XMP:CropLeft".to_string(), left.into());
    meta.insert("XMP:CropTop".to_string(), top.into());
    meta.insert("XMP:CropRight".to_string(), right.into());
    meta.insert("XMP:CropBottom".to_string(), bottom.into());
    meta
}

/// Metadata for an XMP sidecar referring to a separate photo file.
pub fn sidecar_metadata(
    sidecar_name: &str,
    raw_file_name: &str,
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
) -> RawMetadata {
    let mut meta = photo_metadata(sidecar_name, left, top, right, bottom);
    meta.insert("XMP:RawFileName".to_string(), raw_file_name.into());
    meta
}
