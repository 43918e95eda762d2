//! Metadata reading through a long-lived exiftool session.
//!
//! The [`MetadataReader`] trait is the seam between the pipeline and the
//! external metadata engine. Production code uses [`ExifToolSession`], which
//! keeps one `exiftool -stay_open True` child process for the whole
//! extraction pass: exiftool's perl startup dominates per-invocation cost, so
//! a directory sweep that spawned it per file would spend most of its time
//! booting the tool.
//!
//! The session is not safe for concurrent use — all reads are serialized
//! through the single child's pipes, which matches the strictly sequential
//! extraction stage. Shutdown is handled in `Drop`, so the child is released
//! on every exit path, including extraction errors.
//!
//! ## Wire protocol
//!
//! Each request writes argfile lines to the child's stdin:
//!
//! ```text
//! -j
//! -G
//! -n
//! <path>
//! -execute
//! ```
//!
//! and reads stdout until the `{ready}` marker. The payload in between is a
//! one-element JSON array of tag-name → value mappings, with group-prefixed
//! keys (`XMP:CropLeft`, `File:FileName`, ...) and numeric values left
//! unformatted thanks to `-n`.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use thiserror::Error;

/// One file's metadata as returned by the engine: tag name → value.
pub type RawMetadata = serde_json::Map<String, serde_json::Value>;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("failed to start exiftool: {0}")]
    Spawn(std::io::Error),
    #[error("IO error talking to exiftool: {0}")]
    Io(#[from] std::io::Error),
    #[error("exiftool returned invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("exiftool returned no metadata for {0}")]
    Empty(PathBuf),
    #[error("exiftool session closed unexpectedly")]
    SessionClosed,
}

/// Source of raw metadata mappings, one per file path.
pub trait MetadataReader {
    fn read(&mut self, path: &Path) -> Result<RawMetadata, MetadataError>;
}

/// A batch metadata-reading session backed by `exiftool -stay_open`.
pub struct ExifToolSession {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl ExifToolSession {
    /// Spawn the exiftool child and keep it ready for repeated reads.
    pub fn open() -> Result<Self, MetadataError> {
        let mut child = Command::new("exiftool")
            .args(["-stay_open", "True", "-@", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(MetadataError::Spawn)?;

        let stdin = child.stdin.take().ok_or(MetadataError::SessionClosed)?;
        let stdout = child
            .stdout
            .take()
            .map(BufReader::new)
            .ok_or(MetadataError::SessionClosed)?;

        Ok(Self {
            child,
            stdin,
            stdout,
        })
    }
}

impl MetadataReader for ExifToolSession {
    fn read(&mut self, path: &Path) -> Result<RawMetadata, MetadataError> {
        let mut request = String::from("-j\n-G\n-n\n");
        request.push_str(&path.to_string_lossy());
        request.push_str("\n-execute\n");
        self.stdin.write_all(request.as_bytes())?;
        self.stdin.flush()?;

        let mut payload = String::new();
        loop {
            let mut line = String::new();
            if self.stdout.read_line(&mut line)? == 0 {
                return Err(MetadataError::SessionClosed);
            }
            if line.trim_end() == "{ready}" {
                break;
            }
            payload.push_str(&line);
        }

        parse_payload(&payload, path)
    }
}

impl Drop for ExifToolSession {
    fn drop(&mut self) {
        // Best effort: ask the child to exit, then reap it.
        let _ = self.stdin.write_all(b"-stay_open\nFalse\n");
        let _ = self.stdin.flush();
        let _ = self.child.wait();
    }
}

/// Parse one response payload: a one-element JSON array of tag mappings.
///
/// An empty payload means exiftool could not read the file at all (it reports
/// the reason on stderr and emits nothing on stdout).
fn parse_payload(payload: &str, path: &Path) -> Result<RawMetadata, MetadataError> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(MetadataError::Empty(path.to_path_buf()));
    }
    let mut entries: Vec<RawMetadata> = serde_json::from_str(payload)?;
    entries.pop().ok_or_else(|| MetadataError::Empty(path.to_path_buf()))
}
