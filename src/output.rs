//! Operator-facing console output.
//!
//! Each message has a `format_*` function (pure, returns strings, testable)
//! and a `print_*` wrapper that writes to stdout. Per-item failures never
//! appear here — they are aggregated into the summary counts; individual
//! diagnostics go through `log` instead.

use std::path::Path;

pub fn format_extract_summary(cropped: usize, uncropped: usize) -> Vec<String> {
    vec![
        format!("Found cropped images: {cropped}"),
        format!("Found uncropped images: {uncropped}"),
    ]
}

pub fn format_resize_summary(resized: usize, not_found: usize) -> Vec<String> {
    vec![
        format!("Images not found: {not_found}"),
        format!("Images resized and saved: {resized}"),
    ]
}

pub fn format_no_candidates(source_dir: &Path) -> String {
    format!(
        "No supported images or sidecar files found in {}",
        source_dir.display()
    )
}

pub fn format_manifest_saved(path: &Path) -> String {
    format!("Saved annotations to {}", path.display())
}

pub fn print_extract_banner() {
    println!("--- Scanning for EXIF / XMP crop information ---");
}

pub fn print_resize_banner() {
    println!("--- Resizing and saving cropped images ---");
}

pub fn print_extract_summary(cropped: usize, uncropped: usize) {
    for line in format_extract_summary(cropped, uncropped) {
        println!("{line}");
    }
}

pub fn print_resize_summary(resized: usize, not_found: usize) {
    for line in format_resize_summary(resized, not_found) {
        println!("{line}");
    }
}

pub fn print_no_candidates(source_dir: &Path) {
    println!("{}", format_no_candidates(source_dir));
}

pub fn print_manifest_saved(path: &Path) {
    println!("{}", format_manifest_saved(path));
}

pub fn print_not_saved() {
    println!("Did not save the annotations");
}

pub fn print_nothing_to_resize() {
    println!("No cropped images found; nothing to resize");
}
