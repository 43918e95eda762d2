//! Crop metadata extraction.
//!
//! Turns the raw field mapping produced by a [`crate::metadata::MetadataReader`]
//! into a typed [`CropRecord`], driven by a [`FieldSpec`] loaded from
//! configuration rather than a hardcoded schema.
//!
//! ## Lookup semantics
//!
//! Each spec rule names a primary lookup key and a fallback key. The fallback
//! is a second *key*, not a default value: if neither resolves, the field is
//! missing. A missing crop fraction is a metadata-integrity error — it aborts
//! extraction with a typed error instead of being coerced to zero, because
//! "the config points at the wrong tags" must never masquerade as "this photo
//! is uncropped".
//!
//! ## Source filename resolution
//!
//! XMP sidecars describe a photo stored elsewhere, so their records resolve
//! `source_filename` from the raw-photo-filename field. For every other input
//! the metadata carrier *is* the photo and its own filename is used.

use crate::discover::SIDECAR_EXTENSION;
use crate::metadata::RawMetadata;
use crate::types::CropRecord;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("required metadata field {target} missing (looked up {primary:?}, then {fallback:?})")]
    MissingField {
        target: &'static str,
        primary: String,
        fallback: String,
    },
    #[error("metadata field {target} is not numeric: {value}")]
    NotNumeric { target: &'static str, value: String },
    #[error("metadata field {target} has an unusable value: {value}")]
    InvalidValue { target: &'static str, value: String },
}

/// The closed set of fields the pipeline consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    CropLeft,
    CropTop,
    CropRight,
    CropBottom,
    /// The metadata file's own name; decides sidecar-vs-photo resolution.
    ExifFileName,
    /// The photo a sidecar refers to.
    RawFileName,
}

impl Target {
    pub const ALL: [Target; 6] = [
        Target::CropLeft,
        Target::CropTop,
        Target::CropRight,
        Target::CropBottom,
        Target::ExifFileName,
        Target::RawFileName,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Target::CropLeft => "CropLeft",
            Target::CropTop => "CropTop",
            Target::CropRight => "CropRight",
            Target::CropBottom => "CropBottom",
            Target::ExifFileName => "ExifFileName",
            Target::RawFileName => "RawFileName",
        }
    }

    pub fn from_name(name: &str) -> Option<Target> {
        Target::ALL.iter().copied().find(|t| t.name() == name)
    }
}

/// One extraction rule: where a target field's value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    pub target: Target,
    pub primary: String,
    pub fallback: String,
}

/// Validated extraction rules, one per [`Target`], in [`Target::ALL`] order.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    rules: Vec<FieldRule>,
}

impl FieldSpec {
    /// Build a spec from the `EXTRACTABLES` config section.
    ///
    /// Every key must name a known target and every target must be present.
    pub fn from_map(map: &BTreeMap<String, [String; 2]>) -> Result<FieldSpec, String> {
        for key in map.keys() {
            if Target::from_name(key).is_none() {
                return Err(format!("EXTRACTABLES: unknown target field {key:?}"));
            }
        }
        let rules = Target::ALL
            .iter()
            .map(|&target| {
                let [primary, fallback] = map
                    .get(target.name())
                    .ok_or_else(|| format!("EXTRACTABLES: missing target field {:?}", target.name()))?;
                Ok(FieldRule {
                    target,
                    primary: primary.clone(),
                    fallback: fallback.clone(),
                })
            })
            .collect::<Result<Vec<_>, String>>()?;
        Ok(FieldSpec { rules })
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    fn rule(&self, target: Target) -> &FieldRule {
        // Rules are stored in Target::ALL order.
        &self.rules[target as usize]
    }
}

/// Mean fraction removed per edge. `right` and `bottom` are far edges, so the
/// amount cropped there is `1 - value`.
pub fn crop_factor(left: f64, top: f64, right: f64, bottom: f64) -> f64 {
    (left + (1.0 - right) + top + (1.0 - bottom)) / 4.0
}

/// Extract a [`CropRecord`] from one file's raw metadata.
pub fn extract(raw: &RawMetadata, spec: &FieldSpec) -> Result<CropRecord, ExtractError> {
    let crop_left = numeric_field(raw, spec, Target::CropLeft)?;
    let crop_top = numeric_field(raw, spec, Target::CropTop)?;
    let crop_right = numeric_field(raw, spec, Target::CropRight)?;
    let crop_bottom = numeric_field(raw, spec, Target::CropBottom)?;

    let exif_file_name = required_string_field(raw, spec, Target::ExifFileName)?;

    let source_filename = if is_sidecar_name(&exif_file_name) {
        required_string_field(raw, spec, Target::RawFileName)?
    } else {
        exif_file_name
    };

    Ok(CropRecord {
        crop_left,
        crop_top,
        crop_right,
        crop_bottom,
        crop_factor: crop_factor(crop_left, crop_top, crop_right, crop_bottom),
        source_filename,
        output_filename: None,
        settings: None,
    })
}

fn is_sidecar_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case(SIDECAR_EXTENSION))
}

fn lookup<'a>(raw: &'a RawMetadata, rule: &FieldRule) -> Option<&'a Value> {
    raw.get(&rule.primary).or_else(|| raw.get(&rule.fallback))
}

/// Look up a required numeric field. Numeric strings are accepted — exiftool
/// emits them when invoked without `-n`.
fn numeric_field(raw: &RawMetadata, spec: &FieldSpec, target: Target) -> Result<f64, ExtractError> {
    let rule = spec.rule(target);
    let value = lookup(raw, rule).ok_or_else(|| ExtractError::MissingField {
        target: rule.target.name(),
        primary: rule.primary.clone(),
        fallback: rule.fallback.clone(),
    })?;

    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| ExtractError::NotNumeric {
            target: rule.target.name(),
            value: value.to_string(),
        }),
        Value::String(s) => s.trim().parse().map_err(|_| ExtractError::NotNumeric {
            target: rule.target.name(),
            value: value.to_string(),
        }),
        _ => Err(ExtractError::NotNumeric {
            target: rule.target.name(),
            value: value.to_string(),
        }),
    }
}

/// Look up a required string field; absent or whitespace-only is missing.
fn required_string_field(
    raw: &RawMetadata,
    spec: &FieldSpec,
    target: Target,
) -> Result<String, ExtractError> {
    let rule = spec.rule(target);
    let missing = || ExtractError::MissingField {
        target: rule.target.name(),
        primary: rule.primary.clone(),
        fallback: rule.fallback.clone(),
    };
    match lookup(raw, rule) {
        None => Err(missing()),
        Some(Value::String(s)) if s.trim().is_empty() => Err(missing()),
        Some(Value::String(s)) => Ok(s.clone()),
        // Some tools emit bare numbers for numeric-looking filenames.
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(ExtractError::InvalidValue {
            target: rule.target.name(),
            value: other.to_string(),
        }),
    }
}
