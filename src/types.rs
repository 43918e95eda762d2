//! Shared types serialized between pipeline stages.
//!
//! A [`CropRecord`] is created by the extraction stage, updated once by the
//! resize stage, and finally serialized into the [`Manifest`]. It is never
//! mutated after serialization.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One photo's crop annotation as it flows through the pipeline.
///
/// The crop fractions are the retained window as reported by the editing
/// tool: `crop_left`/`crop_top` are the near edges, `crop_right`/
/// `crop_bottom` the far edges, all in `[0, 1]`. The amount removed from a
/// far edge is therefore `1 - value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRecord {
    pub crop_left: f64,
    pub crop_top: f64,
    pub crop_right: f64,
    pub crop_bottom: f64,
    /// Mean fraction removed per edge; 0 means uncropped.
    pub crop_factor: f64,
    /// The photo the crop applies to. For XMP sidecars this is the referenced
    /// raw file; otherwise the metadata carrier is the photo itself.
    pub source_filename: String,
    /// Set by the resize stage on success; `null` in the manifest when the
    /// photo could not be located or written.
    pub output_filename: Option<String>,
    /// Resize settings merged in after the resize stage so each manifest row
    /// is self-describing.
    #[serde(flatten)]
    pub settings: Option<ResizeSettings>,
}

impl CropRecord {
    /// Whether this record survives the extraction-stage filter.
    ///
    /// Exactly zero is "uncropped" and discarded; any positive factor is kept.
    pub fn is_cropped(&self) -> bool {
        self.crop_factor > 0.0
    }
}

/// Resize parameters for one run: the `SETTINGS` config section merged with
/// the caller-supplied source directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResizeSettings {
    pub source_dir: PathBuf,
    pub dest_dir: PathBuf,
    /// Target size of the longer edge in pixels.
    pub dim_max: u32,
    /// JPEG encoding quality (1-100).
    pub quality: u8,
}

/// The pipeline's durable output: the finalized records, in the order the
/// resize stage collected them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    pub records: Vec<CropRecord>,
}
