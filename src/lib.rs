//! # Crop Annotator
//!
//! A batch pipeline for building a training dataset of crop examples from an
//! edited photo library. It scans a directory of photographs and their XMP
//! sidecars, extracts the crop window recorded by the editing tool, keeps the
//! images that were actually cropped, and writes a resized JPEG copy of each
//! alongside a JSON manifest describing every transformation.
//!
//! # Architecture: Two-Stage Pipeline
//!
//! ```text
//! 1. Extract   source_dir  →  Vec<CropRecord>   (exiftool session → crop factors)
//! 2. Resize    records     →  dest_dir + labels.json
//! ```
//!
//! The extraction stage is strictly sequential: all metadata reads go through
//! a single long-lived exiftool process, so the expensive tool startup is paid
//! once per run instead of once per file. The resize stage fans out across
//! CPU cores with rayon (or runs sequentially on request) — each work item
//! reads one input file and writes one distinct output file, so there is no
//! shared mutable state and a failed item never takes down the batch.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`discover`] | Tiered candidate listing: XMP sidecars first, then photo files by extension |
//! | [`metadata`] | `MetadataReader` trait and the exiftool `-stay_open` session |
//! | [`extract`] | Raw field mapping → typed [`types::CropRecord`], crop-factor derivation |
//! | [`resize`] | Per-record load → downsample → JPEG encode, with raw-format fallback |
//! | [`imaging`] | Decode/encode backends: production rawloader + `image` crate, mock for tests |
//! | [`pipeline`] | Stage orchestration, cropped/uncropped accounting, manifest persistence |
//! | [`config`] | `config.json` loading and validation (settings + extractable field spec) |
//! | [`types`] | `CropRecord`, `ResizeSettings`, `Manifest` — the data serialized between stages |
//! | [`output`] | Operator-facing console output — pure format functions plus print wrappers |
//!
//! # Design Decisions
//!
//! ## One exiftool session per run
//!
//! Spawning exiftool per file is the dominant cost of naive metadata sweeps.
//! [`metadata::ExifToolSession`] holds one `exiftool -stay_open True` child
//! for the whole extraction pass and shuts it down on drop, so the session is
//! released on every exit path including extraction errors.
//!
//! ## Configuration-driven extraction
//!
//! Which metadata fields feed the pipeline is not hardcoded. The
//! `EXTRACTABLES` section of `config.json` maps each target field to a
//! primary lookup key and a fallback key, validated at load time against the
//! closed set of targets the pipeline consumes (four crop fractions plus two
//! filename fields). Editing-tool vendors disagree on tag names; the config
//! absorbs that variance.
//!
//! ## Per-item failure isolation
//!
//! A referenced photo that is missing or unreadable produces a manifest row
//! with a `null` output filename, counted and reported in aggregate. Only
//! structural problems halt the run: a bad config, an unresolvable metadata
//! field, or a destination directory that cannot be created.
//!
//! ## Accepted limitations
//!
//! A photo that carries embedded crop metadata *and* has an XMP sidecar is
//! discovered twice and yields two manifest rows — discovery tiers are
//! concatenated, not deduplicated. Two different sources with the same file
//! stem map to the same output JPEG; the last writer wins. Both behaviors are
//! inherited from the annotation workflow this tool serves and are left
//! as-is.

pub mod config;
pub mod discover;
pub mod extract;
pub mod imaging;
pub mod metadata;
pub mod output;
pub mod pipeline;
pub mod resize;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
