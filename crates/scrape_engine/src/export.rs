use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use scrape_core::ScrapeView;
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), ExportError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| ExportError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(ExportError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| ExportError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, ExportError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        tmp.persist(&target).map_err(|e| ExportError::Io(e.error))?;
        Ok(target)
    }
}

#[derive(Serialize)]
struct Snapshot<'a> {
    fetched_utc: &'a str,
    #[serde(flatten)]
    view: &'a ScrapeView,
}

/// Writes the view (status plus accumulated data) as pretty JSON.
pub fn write_snapshot(
    dir: &Path,
    filename: &str,
    view: &ScrapeView,
    fetched_utc: &str,
) -> Result<PathBuf, ExportError> {
    let snapshot = Snapshot { fetched_utc, view };
    let content = serde_json::to_string_pretty(&snapshot)?;
    AtomicFileWriter::new(dir.to_path_buf()).write(filename, &content)
}
