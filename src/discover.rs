//! Candidate file discovery.
//!
//! Builds the list of metadata-bearing files in a source directory in two
//! priority tiers, concatenated:
//!
//! 1. XMP sidecar files.
//! 2. Photo files that can carry embedded metadata, per extension in the
//!    order of [`PHOTO_EXTENSIONS`].
//!
//! Matching is case-insensitive and non-recursive. The tiers are *not*
//! deduplicated: a photo that has a sidecar is listed once per tier and will
//! be processed twice downstream, yielding two manifest rows. The crop-factor
//! filter keeps the duplicate work harmless; collapsing the tiers would be a
//! product decision, not a cleanup.

use std::fs;
use std::path::{Path, PathBuf};

/// Extension of sidecar metadata files (tier 1).
pub const SIDECAR_EXTENSION: &str = "xmp";

/// Photo formats that can carry embedded crop metadata (tier 2), including
/// the DNG raw container. Other raw formats are only reachable through their
/// sidecars.
pub const PHOTO_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tiff", "gif", "dng"];

/// List candidate metadata files in `source_dir`, sidecars first.
///
/// Returns an empty list when the directory holds nothing of interest;
/// callers must treat that as "no supported images found", not as an error.
pub fn discover(source_dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(source_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();

    // Stable tier contents regardless of directory iteration order.
    files.sort();

    let mut candidates: Vec<PathBuf> =
        files.iter().filter(|p| has_extension(p, SIDECAR_EXTENSION)).cloned().collect();

    for ext in PHOTO_EXTENSIONS {
        candidates.extend(files.iter().filter(|p| has_extension(p, ext)).cloned());
    }

    Ok(candidates)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case(ext))
}
