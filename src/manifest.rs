//! Durable manifest of files discovered on the device.
//!
//! The manifest is a JSON-lines file: one `FileDescriptor` per line,
//! appended as the enumerator walks the device and rewritten wholesale
//! only by the reconciler. Append-only writes plus a flush per line keep
//! it consistent no matter when the device (or the process) disappears.

use crate::utils::errors::Result;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// A single file discovered on the device.
///
/// `path` is relative to the mount point (and therefore also relative to
/// the destination root). Identity is `path`; duplicate entries are
/// tolerated because reconciliation is idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub path: String,
    pub size: u64,
}

/// Handle to the on-disk manifest file.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
}

impl Manifest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the manifest for appending. Creates the file if missing.
    pub fn appender(&self) -> Result<ManifestAppender> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        Ok(ManifestAppender {
            writer: BufWriter::new(file),
        })
    }

    /// Read every parseable entry, in file order.
    ///
    /// A line that fails to parse is skipped with a diagnostic; a single
    /// corrupt line must never sink the whole manifest. A missing file
    /// reads as an empty manifest.
    pub fn load(&self) -> Result<Vec<FileDescriptor>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<FileDescriptor>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!(
                        "Skipping malformed manifest line {}: {}",
                        lineno + 1,
                        e
                    );
                }
            }
        }
        Ok(entries)
    }

    /// Atomically replace the manifest with the given entries.
    ///
    /// Written to a sibling temp file and renamed into place, so a crash
    /// mid-rewrite leaves the previous manifest intact. Only the
    /// reconciler calls this.
    pub fn replace(&self, entries: &[FileDescriptor]) -> Result<()> {
        let tmp_path = self.path.with_extension("jsonl.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            for entry in entries {
                serde_json::to_writer(&mut writer, entry)?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

/// Append handle that flushes after every entry.
///
/// One durable line per discovered file is the enumerator's unit of
/// progress; throughput is deliberately traded for never losing a file
/// that was already logged as processed.
pub struct ManifestAppender {
    writer: BufWriter<File>,
}

impl ManifestAppender {
    pub fn append(&mut self, entry: &FileDescriptor) -> Result<()> {
        serde_json::to_writer(&mut self.writer, entry)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
