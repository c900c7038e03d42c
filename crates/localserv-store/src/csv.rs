//! Append-only CSV sink for ingestion rows.
//!
//! The file is the dedup source of truth across runs: before appending,
//! the sink re-reads the keys already on disk so a re-run of the same
//! city adds only rows it has not written before. The header is written
//! once, when the file is created.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use localserv_core::{IngestionRow, RowKey};

use crate::error::StoreError;

const HEADER: &str = "scraped_at,url,business_name,service_name,price";

pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keys of the rows already persisted. A missing file is an empty
    /// set, not an error.
    pub fn existing_keys(&self) -> Result<HashSet<RowKey>, StoreError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(HashSet::new());
            }
            Err(err) => return Err(StoreError::io(&self.path, err)),
        };

        let mut keys = HashSet::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|err| StoreError::io(&self.path, err))?;
            if index == 0 || line.trim().is_empty() {
                continue;
            }
            let fields = split_csv_line(&line);
            if fields.len() != 5 {
                tracing::warn!(path = %self.path.display(), line = index + 1, "skipping malformed row");
                continue;
            }
            keys.insert((
                fields[1].clone(),
                fields[2].clone(),
                fields[3].clone(),
                fields[4].clone(),
            ));
        }
        Ok(keys)
    }

    /// Appends the rows whose key is not yet on disk and returns how
    /// many were written. An empty batch touches nothing.
    pub fn append_new(&self, rows: &[IngestionRow]) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut seen = self.existing_keys()?;
        let fresh: Vec<&IngestionRow> = rows
            .iter()
            .filter(|row| seen.insert(row.key()))
            .collect();
        if fresh.is_empty() {
            return Ok(0);
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| StoreError::io(parent, err))?;
            }
        }

        let is_new = !self.path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| StoreError::io(&self.path, err))?;

        let mut out = String::new();
        if is_new {
            out.push_str(HEADER);
            out.push('\n');
        }
        for row in &fresh {
            out.push_str(&format_csv_row(row));
            out.push('\n');
        }
        file.write_all(out.as_bytes())
            .map_err(|err| StoreError::io(&self.path, err))?;

        tracing::info!(path = %self.path.display(), appended = fresh.len(), "csv rows written");
        Ok(fresh.len())
    }

    /// Reads all persisted rows back, skipping malformed lines.
    pub fn read_rows(&self) -> Result<Vec<IngestionRow>, StoreError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StoreError::io(&self.path, err)),
        };

        let mut rows = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|err| StoreError::io(&self.path, err))?;
            if index == 0 || line.trim().is_empty() {
                continue;
            }
            let fields = split_csv_line(&line);
            if fields.len() != 5 {
                continue;
            }
            let Ok(scraped_at) = fields[0].parse() else {
                continue;
            };
            rows.push(IngestionRow {
                scraped_at,
                url: fields[1].clone(),
                business_name: fields[2].clone(),
                service_name: fields[3].clone(),
                price: fields[4].clone(),
            });
        }
        Ok(rows)
    }
}

fn format_csv_row(row: &IngestionRow) -> String {
    [
        row.scraped_at.to_rfc3339(),
        row.url.clone(),
        row.business_name.clone(),
        row.service_name.clone(),
        row.price.clone(),
    ]
    .iter()
    .map(|field| escape_csv_field(field))
    .collect::<Vec<_>>()
    .join(",")
}

/// RFC 4180 quoting: fields containing a comma, quote, or newline are
/// wrapped in quotes with inner quotes doubled.
fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Splits one CSV line into unescaped fields. Embedded newlines never
/// occur in our rows, so line-at-a-time parsing holds.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
#[path = "csv_test.rs"]
mod tests;
