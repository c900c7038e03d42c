//! Optional JSONL mirror of the CSV sink, one serialized row per line.
//!
//! The mirror carries no dedup state of its own: callers append the
//! same batch the CSV sink accepted, so the two files stay in step.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use localserv_core::IngestionRow;

use crate::error::StoreError;

pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one line per row. An empty batch touches nothing.
    pub fn append(&self, rows: &[IngestionRow]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| StoreError::io(parent, err))?;
            }
        }

        let mut out = String::new();
        for row in rows {
            out.push_str(&serde_json::to_string(row)?);
            out.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| StoreError::io(&self.path, err))?;
        file.write_all(out.as_bytes())
            .map_err(|err| StoreError::io(&self.path, err))?;

        tracing::info!(path = %self.path.display(), appended = rows.len(), "jsonl rows written");
        Ok(())
    }
}
