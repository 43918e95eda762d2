//! Resize-and-record: one cropped photo in, one annotated record out.
//!
//! Each work item is a pure function of (record, settings) with no shared
//! mutable state, which is what lets the orchestrator fan items out across a
//! rayon pool. A photo that cannot be located or read produces a record with
//! an absent output filename — a per-item outcome, never a batch abort.

use crate::imaging::{BackendError, PhotoBackend, scaled_dimensions};
use crate::types::{CropRecord, ResizeSettings};
use image::DynamicImage;
use image::imageops::FilterType;
use std::path::Path;

/// Resize the photo a record refers to and fold the outcome back in.
///
/// The returned record always carries the merged settings; `output_filename`
/// is set only when a resized JPEG was actually written.
pub fn resize_and_record(
    backend: &impl PhotoBackend,
    mut record: CropRecord,
    settings: &ResizeSettings,
) -> CropRecord {
    record.output_filename = write_resized(backend, &record.source_filename, settings);
    record.settings = Some(settings.clone());
    record
}

/// Load, downsample, and encode one photo. `None` is the per-item failure
/// marker: photo missing, unreadable, or unwritable.
fn write_resized(
    backend: &impl PhotoBackend,
    source_filename: &str,
    settings: &ResizeSettings,
) -> Option<String> {
    let input = settings.source_dir.join(source_filename);

    let image = match load_photo(backend, &input) {
        Ok(image) => image,
        Err(BackendError::NotFound(_)) => {
            log::debug!("photo not found: {}", input.display());
            return None;
        }
        Err(e) => {
            log::warn!("cannot read {}: {e}", input.display());
            return None;
        }
    };

    let (width, height) = scaled_dimensions(
        (image.width(), image.height()),
        settings.dim_max,
    );
    let resized = image.resize_exact(width, height, FilterType::Lanczos3);

    let output_name = output_name(source_filename);
    let output_path = settings.dest_dir.join(&output_name);
    match backend.encode_jpeg(&resized, &output_path, settings.quality) {
        Ok(()) => Some(output_name),
        Err(e) => {
            log::warn!("cannot write {}: {e}", output_path.display());
            None
        }
    }
}

/// Raw decode first; unrecognized containers fall through to the standard
/// decoders. Not-found short-circuits — there is nothing to fall back to.
fn load_photo(backend: &impl PhotoBackend, path: &Path) -> Result<DynamicImage, BackendError> {
    match backend.decode_raw(path) {
        Ok(image) => Ok(image),
        Err(BackendError::Unsupported(_)) => backend.decode_image(path),
        Err(e) => Err(e),
    }
}

/// Output filename: the input's stem with a `.jpg` extension. The original
/// extension is discarded on purpose, JPEG inputs included — a second pass
/// re-encodes under the same name.
fn output_name(source_filename: &str) -> String {
    let stem = Path::new(source_filename)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| source_filename.to_string());
    format!("{stem}.jpg")
}
