//! Snapshot loading for the fuel dashboard.
//!
//! Reads a whole fuel-log export from disk, either a Sheets API `values`
//! document or a CSV download of the sheet, and returns it as one
//! [`Snapshot`]. Rows are never delivered partially.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::Utc;
use fuel_core::error::{FuelError, Result};
use fuel_core::models::{RawRow, Snapshot};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

// ── SnapshotSource ────────────────────────────────────────────────────────────

/// Anything that can deliver a complete snapshot of the fuel log.
pub trait SnapshotSource {
    fn fetch(&self) -> Result<Snapshot>;
}

// ── FileSource ────────────────────────────────────────────────────────────────

/// Snapshot source backed by an export file, or by the newest export in a
/// directory.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotSource for FileSource {
    fn fetch(&self) -> Result<Snapshot> {
        if !self.path.exists() {
            return Err(FuelError::SnapshotPathNotFound(self.path.clone()));
        }
        let file = if self.path.is_dir() {
            find_latest_export(&self.path)
                .ok_or_else(|| FuelError::NoData(self.path.clone()))?
        } else {
            self.path.clone()
        };
        load_snapshot(&file)
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a snapshot file, choosing the parser by extension.
pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let table = match export_format(path) {
        Some(ExportFormat::Json) => read_values_json(path)?,
        Some(ExportFormat::Csv) => read_csv(path)?,
        None => return Err(FuelError::UnsupportedFormat(path.to_path_buf())),
    };

    let mut table = table.into_iter();
    let headers = table.next().unwrap_or_default();
    let rows: Vec<RawRow> = table.collect();
    if rows.is_empty() {
        return Err(FuelError::NoData(path.to_path_buf()));
    }

    debug!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(Snapshot::new(headers, rows, Utc::now()))
}

/// The most recently modified `.json` / `.csv` export under `dir`.
pub fn find_latest_export(dir: &Path) -> Option<PathBuf> {
    walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && export_format(entry.path()).is_some())
        .map(|entry| {
            let modified = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, entry.into_path())
        })
        // Ties on mtime go to the lexically greatest path.
        .max()
        .map(|(_, path)| path)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportFormat {
    Json,
    Csv,
}

fn export_format(path: &Path) -> Option<ExportFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "json" => Some(ExportFormat::Json),
        "csv" => Some(ExportFormat::Csv),
        _ => None,
    }
}

/// Shape of a Sheets API `values.get` response.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| FuelError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a `{"values": [[...], ...]}` document; the first row is the header.
fn read_values_json(path: &Path) -> Result<Vec<RawRow>> {
    let content = read_file(path)?;
    let range: ValueRange = serde_json::from_str(&content)?;
    Ok(range
        .values
        .into_iter()
        .map(|row| row.into_iter().map(cell_to_string).collect())
        .collect())
}

/// Render a JSON cell the way the sheet would display it.
fn cell_to_string(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Read a CSV export; the first record is the header.
///
/// Any unreadable record fails the whole load so a snapshot is never partial.
fn read_csv(path: &Path) -> Result<Vec<RawRow>> {
    let content = std::fs::read(path).map_err(|source| FuelError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_slice());

    reader
        .records()
        .enumerate()
        .map(|(line, record)| {
            record
                .map(|r| r.iter().map(str::to_string).collect())
                .map_err(|e| {
                    warn!("Unreadable CSV record {} in {}: {}", line + 1, path.display(), e);
                    FuelError::CsvParse(format!("{}: {}", path.display(), e))
                })
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
