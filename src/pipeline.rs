//! Pipeline orchestration: discovery → extraction → resize → manifest.
//!
//! The extraction stage runs strictly sequentially through one exiftool
//! session. The resize stage runs either sequentially or fanned out across a
//! rayon pool, selected by [`ResizeMode`]; each item is independent, so
//! per-item failures are isolated and only aggregate counts reach the
//! operator.
//!
//! A record moves through the states
//! `Discovered → MetadataExtracted → {Discarded | Cropped} → {Resized | NotFound}`
//! and never backwards. `Discarded` records are only counted; the other two
//! terminal states land in the manifest.

use crate::config::{Config, ConfigError};
use crate::discover;
use crate::extract::{self, ExtractError, FieldSpec};
use crate::imaging::{PhotoBackend, RustBackend};
use crate::metadata::{ExifToolSession, MetadataError, MetadataReader};
use crate::output;
use crate::resize;
use crate::types::{CropRecord, Manifest, ResizeSettings};
use indicatif::ProgressBar;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),
    #[error("extraction error: {0}")]
    Extract(#[from] ExtractError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to create destination directory {0}: {1}")]
    DestDir(PathBuf, std::io::Error),
}

/// Scheduling model for the resize stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeMode {
    /// One worker, input order preserved, simplest failure attribution.
    Sequential,
    /// Fan out across available cores. Collection order is not guaranteed;
    /// callers must not depend on it.
    Parallel,
}

/// Caller-supplied run parameters (the config file provides the rest).
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub source_dir: PathBuf,
    pub mode: ResizeMode,
    /// Resize and persist results. Off by default: a bare run only scans and
    /// reports crop counts.
    pub save: bool,
}

/// What the extraction stage found.
#[derive(Debug)]
pub struct ExtractOutcome {
    /// Records with a positive crop factor, in discovery order.
    pub records: Vec<CropRecord>,
    /// Files scanned and discarded as uncropped.
    pub uncropped: usize,
}

/// Aggregate result of a full run, for callers and tests.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Candidate files examined; zero means nothing to scan.
    pub scanned: usize,
    pub cropped: usize,
    pub uncropped: usize,
    pub resized: usize,
    pub not_found: usize,
    /// Where the manifest was written, when it was.
    pub manifest: Option<PathBuf>,
}

/// Extraction stage: read metadata for every candidate and keep the cropped.
///
/// Returns `None` when discovery finds zero candidates — "nothing to scan"
/// is distinct from "scanned, found nothing cropped" (an empty record list).
///
/// A metadata-integrity failure (unresolvable field, broken session) aborts
/// the pass: it means the configuration points at the wrong tags, and
/// skipping files would silently misreport the whole sweep.
pub fn extract_all(
    reader: &mut dyn MetadataReader,
    source_dir: &Path,
    spec: &FieldSpec,
) -> Result<Option<ExtractOutcome>, PipelineError> {
    let candidates = discover::discover(source_dir)?;
    if candidates.is_empty() {
        return Ok(None);
    }

    let bar = ProgressBar::new(candidates.len() as u64);
    let mut records = Vec::new();
    let mut uncropped = 0usize;

    for path in &candidates {
        let raw = reader.read(path)?;
        let record = extract::extract(&raw, spec)?;
        if record.is_cropped() {
            records.push(record);
        } else {
            uncropped += 1;
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    Ok(Some(ExtractOutcome { records, uncropped }))
}

/// Resize stage: apply the worker to every record and collect the results.
///
/// The destination directory is created once before any worker runs, so the
/// parallel path has no creation race; failure to create it is fatal.
pub fn resize_all(
    backend: &(impl PhotoBackend + Sync),
    records: Vec<CropRecord>,
    settings: &ResizeSettings,
    mode: ResizeMode,
) -> Result<Vec<CropRecord>, PipelineError> {
    std::fs::create_dir_all(&settings.dest_dir)
        .map_err(|e| PipelineError::DestDir(settings.dest_dir.clone(), e))?;

    let bar = ProgressBar::new(records.len() as u64);
    let worker = |record: CropRecord| {
        let result = resize::resize_and_record(backend, record, settings);
        bar.inc(1);
        result
    };

    let results = match mode {
        ResizeMode::Sequential => records.into_iter().map(worker).collect(),
        ResizeMode::Parallel => records.into_par_iter().map(worker).collect(),
    };
    bar.finish_and_clear();

    Ok(results)
}

/// Run the full pipeline with the production components: one exiftool
/// session scoped to the extraction pass, and the rawloader/`image` backend.
pub fn run(config: &Config, opts: &RunOptions) -> Result<RunReport, PipelineError> {
    let outcome = {
        let mut session = ExifToolSession::open()?;
        output::print_extract_banner();
        extract_all(&mut session, &opts.source_dir, &config.field_spec)?
        // Session dropped here: released before any resize work starts.
    };
    finish(&RustBackend::new(), config, opts, outcome)
}

/// Same composition with injected components, for tests and embedding.
pub fn run_with(
    reader: &mut dyn MetadataReader,
    backend: &(impl PhotoBackend + Sync),
    config: &Config,
    opts: &RunOptions,
) -> Result<RunReport, PipelineError> {
    output::print_extract_banner();
    let outcome = extract_all(reader, &opts.source_dir, &config.field_spec)?;
    finish(backend, config, opts, outcome)
}

fn finish(
    backend: &(impl PhotoBackend + Sync),
    config: &Config,
    opts: &RunOptions,
    outcome: Option<ExtractOutcome>,
) -> Result<RunReport, PipelineError> {
    let Some(outcome) = outcome else {
        output::print_no_candidates(&opts.source_dir);
        return Ok(RunReport::default());
    };

    let cropped = outcome.records.len();
    let uncropped = outcome.uncropped;
    output::print_extract_summary(cropped, uncropped);

    let mut report = RunReport {
        scanned: cropped + uncropped,
        cropped,
        uncropped,
        ..RunReport::default()
    };

    if !opts.save {
        output::print_not_saved();
        return Ok(report);
    }
    if outcome.records.is_empty() {
        // Nothing cropped: the resize and manifest steps are skipped outright.
        output::print_nothing_to_resize();
        return Ok(report);
    }

    output::print_resize_banner();
    let settings = config.settings.resize_settings(&opts.source_dir);
    let annotations = resize_all(backend, outcome.records, &settings, opts.mode)?;

    report.not_found = annotations
        .iter()
        .filter(|r| r.output_filename.is_none())
        .count();
    report.resized = annotations.len() - report.not_found;
    output::print_resize_summary(report.resized, report.not_found);

    let manifest = Manifest {
        records: annotations,
    };
    let json = serde_json::to_string_pretty(&manifest)?;
    std::fs::write(&config.annotations_file, json)?;
    output::print_manifest_saved(&config.annotations_file);
    report.manifest = Some(config.annotations_file.clone());

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use crate::metadata::tests::MockReader;
    use crate::test_helpers::{
        create_test_jpeg, photo_metadata, sidecar_metadata, test_field_spec,
    };
    use std::collections::BTreeSet;
    use std::fs;
    use tempfile::TempDir;

    fn test_config(tmp: &TempDir) -> Config {
        let json = format!(
            r#"{{
                "SETTINGS": {{
                    "dest_dir": {dest:?},
                    "dim_max": 100,
                    "quality": 90
                }},
                "EXTRACTABLES": {{
                    "CropLeft": ["XMP:CropLeft", "XMP-crs:CropLeft"],
                    "CropTop": ["XMP:CropTop", "XMP-crs:CropTop"],
                    "CropRight": ["XMP:CropRight", "XMP-crs:CropRight"],
                    "CropBottom": ["XMP:CropBottom", "XMP-crs:CropBottom"],
                    "ExifFileName": ["File:FileName", "SourceFile"],
                    "RawFileName": ["XMP:RawFileName", "XMP-crs:RawFileName"]
                }},
                "ANNOTATIONS_FILE": {labels:?}
            }}"#,
            dest = tmp.path().join("resized").to_string_lossy(),
            labels = tmp.path().join("labels.json").to_string_lossy(),
        );
        Config::parse(&json).unwrap()
    }

    fn settings(tmp: &TempDir, source: &Path) -> ResizeSettings {
        ResizeSettings {
            source_dir: source.to_path_buf(),
            dest_dir: tmp.path().join("resized"),
            dim_max: 100,
            quality: 90,
        }
    }

    fn record(name: &str, crop_factor: f64) -> CropRecord {
        CropRecord {
            crop_left: 0.0,
            crop_top: 0.0,
            crop_right: 1.0,
            crop_bottom: 1.0,
            crop_factor,
            source_filename: name.to_string(),
            output_filename: None,
            settings: None,
        }
    }

    // =========================================================================
    // extract_all tests
    // =========================================================================

    #[test]
    fn empty_directory_yields_none() {
        let tmp = TempDir::new().unwrap();
        let mut reader = MockReader::new();

        let outcome = extract_all(&mut reader, tmp.path(), &test_field_spec()).unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn zero_crop_factor_discarded_positive_kept() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("flat.jpg"), b"x").unwrap();
        fs::write(tmp.path().join("cut.jpg"), b"x").unwrap();

        let mut reader = MockReader::new();
        reader.insert("flat.jpg", photo_metadata("flat.jpg", 0.0, 0.0, 1.0, 1.0));
        // Epsilon past the boundary is kept.
        reader.insert("cut.jpg", photo_metadata("cut.jpg", 0.004, 0.0, 1.0, 1.0));

        let outcome = extract_all(&mut reader, tmp.path(), &test_field_spec())
            .unwrap()
            .unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.uncropped, 1);
        assert_eq!(outcome.records[0].source_filename, "cut.jpg");
    }

    #[test]
    fn all_uncropped_yields_empty_records_not_none() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("flat.jpg"), b"x").unwrap();

        let mut reader = MockReader::new();
        reader.insert("flat.jpg", photo_metadata("flat.jpg", 0.0, 0.0, 1.0, 1.0));

        let outcome = extract_all(&mut reader, tmp.path(), &test_field_spec())
            .unwrap()
            .unwrap();
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.uncropped, 1);
    }

    #[test]
    fn metadata_integrity_error_aborts_the_pass() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("bad.jpg"), b"x").unwrap();

        let mut reader = MockReader::new();
        let mut meta = photo_metadata("bad.jpg", 0.1, 0.0, 1.0, 1.0);
        meta.remove("XMP:CropLeft");
        reader.insert("bad.jpg", meta);

        let err = extract_all(&mut reader, tmp.path(), &test_field_spec()).unwrap_err();
        assert!(matches!(err, PipelineError::Extract(_)));
    }

    #[test]
    fn sidecar_and_photo_pair_produce_two_records() {
        // Discovery tiers are not deduplicated; both rows are kept.
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("shot.xmp"), b"x").unwrap();
        fs::write(tmp.path().join("shot.jpg"), b"x").unwrap();

        let mut reader = MockReader::new();
        reader.insert(
            "shot.xmp",
            sidecar_metadata("shot.xmp", "shot.jpg", 0.1, 0.0, 1.0, 1.0),
        );
        reader.insert("shot.jpg", photo_metadata("shot.jpg", 0.1, 0.0, 1.0, 1.0));

        let outcome = extract_all(&mut reader, tmp.path(), &test_field_spec())
            .unwrap()
            .unwrap();
        assert_eq!(outcome.records.len(), 2);
        assert!(
            outcome
                .records
                .iter()
                .all(|r| r.source_filename == "shot.jpg")
        );
    }

    // =========================================================================
    // resize_all tests
    // =========================================================================

    #[test]
    fn resize_all_creates_destination_directory() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("src");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("a.jpg"), b"x").unwrap();

        let backend = MockBackend::standard(400, 300);
        let settings = settings(&tmp, &source);
        let results = resize_all(
            &backend,
            vec![record("a.jpg", 0.1)],
            &settings,
            ResizeMode::Sequential,
        )
        .unwrap();

        assert!(settings.dest_dir.is_dir());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].output_filename.as_deref(), Some("a.jpg"));
    }

    #[test]
    fn unwritable_destination_is_fatal() {
        let tmp = TempDir::new().unwrap();
        // A file where the destination directory should go.
        let blocked = tmp.path().join("resized");
        fs::write(&blocked, b"in the way").unwrap();

        let backend = MockBackend::standard(400, 300);
        let settings = ResizeSettings {
            source_dir: tmp.path().to_path_buf(),
            dest_dir: blocked.join("sub"),
            dim_max: 100,
            quality: 90,
        };
        let result = resize_all(
            &backend,
            vec![record("a.jpg", 0.1)],
            &settings,
            ResizeMode::Sequential,
        );
        assert!(matches!(result, Err(PipelineError::DestDir(_, _))));
    }

    #[test]
    fn per_item_failures_never_abort_the_batch() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("src");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("here.jpg"), b"x").unwrap();
        // "gone.jpg" is never created.

        let backend = MockBackend::standard(400, 300);
        let results = resize_all(
            &backend,
            vec![record("here.jpg", 0.1), record("gone.jpg", 0.2)],
            &settings(&tmp, &source),
            ResizeMode::Parallel,
        )
        .unwrap();

        assert_eq!(results.len(), 2);
        let by_name: std::collections::HashMap<_, _> = results
            .iter()
            .map(|r| (r.source_filename.as_str(), r.output_filename.is_some()))
            .collect();
        assert!(by_name["here.jpg"]);
        assert!(!by_name["gone.jpg"]);
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("src");
        fs::create_dir_all(&source).unwrap();
        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            fs::write(source.join(name), b"x").unwrap();
        }

        let records = || {
            vec![
                record("a.jpg", 0.1),
                record("missing.jpg", 0.2),
                record("b.jpg", 0.3),
                record("c.jpg", 0.4),
            ]
        };
        let settings = settings(&tmp, &source);

        let backend = MockBackend::standard(400, 300);
        let sequential = resize_all(&backend, records(), &settings, ResizeMode::Sequential).unwrap();
        let backend = MockBackend::standard(400, 300);
        let parallel = resize_all(&backend, records(), &settings, ResizeMode::Parallel).unwrap();

        let key = |rs: &[CropRecord]| -> BTreeSet<(String, bool)> {
            rs.iter()
                .map(|r| (r.source_filename.clone(), r.output_filename.is_some()))
                .collect()
        };
        assert_eq!(key(&sequential), key(&parallel));
    }

    // =========================================================================
    // End-to-end run_with tests
    // =========================================================================

    #[test]
    fn end_to_end_sidecar_to_manifest() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("photos");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("shot.xmp"), b"<xmp/>").unwrap();
        create_test_jpeg(&source.join("shot.jpg"), 400, 300);

        let mut reader = MockReader::new();
        // Sidecar carries a 0.1 crop factor; the photo itself reports none.
        reader.insert(
            "shot.xmp",
            sidecar_metadata("shot.xmp", "shot.jpg", 0.1, 0.1, 0.9, 0.9),
        );
        reader.insert("shot.jpg", photo_metadata("shot.jpg", 0.0, 0.0, 1.0, 1.0));

        let config = test_config(&tmp);
        let opts = RunOptions {
            source_dir: source.clone(),
            mode: ResizeMode::Sequential,
            save: true,
        };
        let report = run_with(
            &mut reader,
            &crate::imaging::RustBackend::new(),
            &config,
            &opts,
        )
        .unwrap();

        assert_eq!(report.scanned, 2);
        assert_eq!(report.cropped, 1);
        assert_eq!(report.uncropped, 1);
        assert_eq!(report.resized, 1);
        assert_eq!(report.not_found, 0);
        assert_eq!(report.manifest.as_deref(), Some(config.annotations_file.as_path()));

        // One resized file in the destination directory.
        assert!(tmp.path().join("resized").join("shot.jpg").exists());

        // Exactly one manifest entry, with the output set and settings merged.
        let manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&config.annotations_file).unwrap()).unwrap();
        let rows = manifest.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["source_filename"], "shot.jpg");
        assert_eq!(rows[0]["output_filename"], "shot.jpg");
        assert_eq!(rows[0]["dim_max"], 100);
        assert!((rows[0]["crop_factor"].as_f64().unwrap() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn zero_cropped_skips_manifest_entirely() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("photos");
        fs::create_dir_all(&source).unwrap();
        create_test_jpeg(&source.join("flat.jpg"), 100, 100);

        let mut reader = MockReader::new();
        reader.insert("flat.jpg", photo_metadata("flat.jpg", 0.0, 0.0, 1.0, 1.0));

        let config = test_config(&tmp);
        let opts = RunOptions {
            source_dir: source,
            mode: ResizeMode::Sequential,
            save: true,
        };
        let report = run_with(
            &mut reader,
            &crate::imaging::RustBackend::new(),
            &config,
            &opts,
        )
        .unwrap();

        assert_eq!(report.cropped, 0);
        assert_eq!(report.uncropped, 1);
        assert!(report.manifest.is_none());
        assert!(!config.annotations_file.exists());
        assert!(!tmp.path().join("resized").exists());
    }

    #[test]
    fn no_candidates_is_a_non_error_early_return() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("empty");
        fs::create_dir_all(&source).unwrap();

        let config = test_config(&tmp);
        let opts = RunOptions {
            source_dir: source,
            mode: ResizeMode::Parallel,
            save: true,
        };
        let mut reader = MockReader::new();
        let report = run_with(
            &mut reader,
            &MockBackend::standard(10, 10),
            &config,
            &opts,
        )
        .unwrap();

        assert_eq!(report, RunReport::default());
    }

    #[test]
    fn without_save_nothing_is_written() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("photos");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("cut.jpg"), b"x").unwrap();

        let mut reader = MockReader::new();
        reader.insert("cut.jpg", photo_metadata("cut.jpg", 0.2, 0.0, 1.0, 1.0));

        let config = test_config(&tmp);
        let opts = RunOptions {
            source_dir: source,
            mode: ResizeMode::Sequential,
            save: false,
        };
        let backend = MockBackend::standard(400, 300);
        let report = run_with(&mut reader, &backend, &config, &opts).unwrap();

        assert_eq!(report.cropped, 1);
        assert_eq!(report.resized, 0);
        assert!(report.manifest.is_none());
        assert!(!config.annotations_file.exists());
        assert!(!tmp.path().join("resized").exists());
        // The resize stage never ran at all.
        assert!(backend.get_operations().is_empty());
    }
}
