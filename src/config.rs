//! Pipeline configuration loaded from `config.json`.
//!
//! The file has three sections:
//!
//! ```json
//! {
//!     "SETTINGS": {
//!         "dest_dir": "resized",
//!         "dim_max": 1000,
//!         "quality": 95,
//!         "max_workers": 4
//!     },
//!     "EXTRACTABLES": {
//!         "CropLeft": ["XMP:CropLeft", "XMP-crs:CropLeft"],
//!         "CropTop": ["XMP:CropTop", "XMP-crs:CropTop"],
//!         "CropRight": ["XMP:CropRight", "XMP-crs:CropRight"],
//!         "CropBottom": ["XMP:CropBottom", "XMP-crs:CropBottom"],
//!         "ExifFileName": ["File:FileName", "SourceFile"],
//!         "RawFileName": ["XMP:RawFileName", "XMP-crs:RawFileName"]
//!     },
//!     "ANNOTATIONS_FILE": "labels.json"
//! }
//! ```
//!
//! - `SETTINGS` holds the resize parameters. The source directory is not part
//!   of the file; it comes from the command line and is merged in at runtime.
//!   `max_workers` optionally caps the parallel resize pool (downward only).
//! - `EXTRACTABLES` maps each target field the pipeline consumes to a
//!   `[primary, fallback]` pair of exiftool lookup keys. The target names form
//!   a closed set, validated on load — see [`crate::extract::FieldSpec`].
//! - `ANNOTATIONS_FILE` is the manifest output path (default `labels.json`).
//!
//! Unknown keys are rejected to catch typos early.

use crate::extract::FieldSpec;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Resize parameters from the `SETTINGS` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Directory the resized JPEGs are written into.
    pub dest_dir: PathBuf,
    /// Target size of the longer edge in pixels.
    pub dim_max: u32,
    /// JPEG encoding quality (1-100).
    pub quality: u8,
    /// Maximum number of parallel resize workers.
    /// When absent, defaults to the number of CPU cores.
    #[serde(default)]
    pub max_workers: Option<usize>,
}

impl Settings {
    /// Validate values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quality == 0 || self.quality > 100 {
            return Err(ConfigError::Validation(
                "SETTINGS.quality must be 1-100".into(),
            ));
        }
        if self.dim_max == 0 {
            return Err(ConfigError::Validation(
                "SETTINGS.dim_max must be non-zero".into(),
            ));
        }
        if self.dest_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "SETTINGS.dest_dir must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Merge the caller-supplied source directory into run-ready settings.
    pub fn resize_settings(&self, source_dir: &Path) -> crate::types::ResizeSettings {
        crate::types::ResizeSettings {
            source_dir: source_dir.to_path_buf(),
            dest_dir: self.dest_dir.clone(),
            dim_max: self.dim_max,
            quality: self.quality,
        }
    }
}

/// Resolve the effective resize thread count.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(settings: &Settings) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    settings.max_workers.map(|n| n.min(cores)).unwrap_or(cores)
}

/// On-disk shape of `config.json`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(rename = "SETTINGS")]
    settings: Settings,
    #[serde(rename = "EXTRACTABLES")]
    extractables: BTreeMap<String, [String; 2]>,
    #[serde(rename = "ANNOTATIONS_FILE", default = "default_annotations_file")]
    annotations_file: PathBuf,
}

fn default_annotations_file() -> PathBuf {
    PathBuf::from("labels.json")
}

/// Validated pipeline configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub field_spec: FieldSpec,
    pub annotations_file: PathBuf,
}

impl Config {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate configuration from a JSON string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_str(content)?;
        file.settings.validate()?;
        let field_spec =
            FieldSpec::from_map(&file.extractables).map_err(ConfigError::Validation)?;
        Ok(Config {
            settings: file.settings,
            field_spec,
            annotations_file: file.annotations_file,
        })
    }
}
