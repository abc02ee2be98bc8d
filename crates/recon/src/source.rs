//! Where raw collections come from, and a TTL cache over computed snapshots.
//!
//! The engine never touches the filesystem; everything with side effects
//! lives here.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::config::{SourceFiles, StockConfig};
use crate::engine::{load_csv_records, load_json_records, run};
use crate::error::StockError;
use crate::model::{RawCollections, RawRecord, StockSnapshot};

/// Supplies the three raw collections.
pub trait RecordSource {
    fn fetch(&self) -> Result<RawCollections, StockError>;
}

/// Transaction file an appended row goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inbound => write!(f, "inbound"),
            Self::Outbound => write!(f, "outbound"),
        }
    }
}

// ---------------------------------------------------------------------------
// Directory of CSV / JSON files
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DirSource {
    base: PathBuf,
    files: SourceFiles,
}

enum Format {
    Csv,
    Json,
}

impl DirSource {
    pub fn new(base: impl Into<PathBuf>, files: SourceFiles) -> Self {
        Self {
            base: base.into(),
            files,
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn path_for(&self, file: &str) -> PathBuf {
        self.base.join(file)
    }

    fn format_of(path: &Path) -> Result<Format, StockError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => Ok(Format::Csv),
            Some("json") => Ok(Format::Json),
            _ => Err(StockError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Read one collection. A missing file is an empty collection.
    fn read_collection(&self, label: &str, file: &str) -> Result<Vec<RawRecord>, StockError> {
        let path = self.path_for(file);
        let format = Self::format_of(&path)?;
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if label == "catalog" {
                    log::warn!("catalog file {} not found, using an empty catalog", path.display());
                } else {
                    log::debug!("{label} file {} not found, no {label} movements", path.display());
                }
                return Ok(Vec::new());
            }
            Err(e) => return Err(StockError::io(&path, e)),
        };

        let name = path.display().to_string();
        let rows = match format {
            Format::Csv => load_csv_records(&name, &data)?,
            Format::Json => load_json_records(&name, &data)?,
        };
        log::debug!("{label}: {} rows from {}", rows.len(), path.display());
        Ok(rows)
    }

    fn transaction_path(&self, direction: Direction) -> Result<PathBuf, StockError> {
        let file = match direction {
            Direction::Inbound => &self.files.inbound,
            Direction::Outbound => &self.files.outbound,
        };
        let path = self.path_for(file);
        if !matches!(Self::format_of(&path)?, Format::Csv) {
            return Err(StockError::UnsupportedFormat(path.display().to_string()));
        }
        Ok(path)
    }

    fn header_of(path: &Path, existing: &str) -> Result<Vec<String>, StockError> {
        let headers: Vec<String> = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(existing.as_bytes())
            .headers()
            .map_err(|e| StockError::parse(path.display().to_string(), e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(StockError::MissingHeader(path.display().to_string()));
        }
        Ok(headers)
    }

    /// Trimmed header row of the inbound or outbound file.
    pub fn header_row(&self, direction: Direction) -> Result<Vec<String>, StockError> {
        let path = self.transaction_path(direction)?;
        let existing = fs::read_to_string(&path).map_err(|e| StockError::io(&path, e))?;
        Self::header_of(&path, &existing)
    }

    /// Append one transaction row in the target file's header order.
    ///
    /// Header columns the record lacks are written blank. Record fields with
    /// no matching column are skipped. The file must exist and be CSV.
    pub fn append(&self, direction: Direction, record: &RawRecord) -> Result<PathBuf, StockError> {
        let path = self.transaction_path(direction)?;
        let existing = fs::read_to_string(&path).map_err(|e| StockError::io(&path, e))?;
        let headers = Self::header_of(&path, &existing)?;

        for (field, _) in record.iter() {
            if !headers.iter().any(|h| h.eq_ignore_ascii_case(field)) {
                log::warn!("{}: no column named {field:?}, value not written", path.display());
            }
        }

        let cells: Vec<String> = headers
            .iter()
            .map(|h| record.get(h).map(|v| v.as_trimmed()).unwrap_or_default())
            .collect();

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer
            .write_record(&cells)
            .map_err(|e| StockError::io(&path, e))?;
        let mut line = writer.into_inner().map_err(|e| StockError::io(&path, e))?;
        if !existing.is_empty() && !existing.ends_with('\n') {
            line.insert(0, b'\n');
        }

        let mut out = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(|e| StockError::io(&path, e))?;
        out.write_all(&line).map_err(|e| StockError::io(&path, e))?;

        log::info!("appended {direction} row to {}", path.display());
        Ok(path)
    }
}

impl RecordSource for DirSource {
    fn fetch(&self) -> Result<RawCollections, StockError> {
        Ok(RawCollections {
            catalog: self.read_collection("catalog", &self.files.catalog)?,
            inbound: self.read_collection("inbound", &self.files.inbound)?,
            outbound: self.read_collection("outbound", &self.files.outbound)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Snapshot cache
// ---------------------------------------------------------------------------

/// Holds the last snapshot until it is older than the TTL or invalidated.
pub struct SnapshotCache<S> {
    source: S,
    config: StockConfig,
    ttl: Duration,
    slot: Mutex<Option<(Instant, Arc<StockSnapshot>)>>,
}

impl<S: RecordSource> SnapshotCache<S> {
    pub fn new(source: S, config: StockConfig) -> Self {
        let ttl = Duration::from_secs(config.cache.ttl_secs);
        Self {
            source,
            config,
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn get(&self) -> Result<Arc<StockSnapshot>, StockError> {
        self.get_at(Instant::now())
    }

    /// Like `get`, with an explicit clock reading.
    pub fn get_at(&self, now: Instant) -> Result<Arc<StockSnapshot>, StockError> {
        let mut slot = self.slot.lock();
        if let Some((computed_at, snapshot)) = slot.as_ref() {
            if now.saturating_duration_since(*computed_at) < self.ttl {
                return Ok(Arc::clone(snapshot));
            }
        }

        let raw = self.source.fetch()?;
        let snapshot = Arc::new(run(&self.config, &raw));
        *slot = Some((now, Arc::clone(&snapshot)));
        Ok(snapshot)
    }

    /// Force the next `get` to refetch.
    pub fn invalidate(&self) {
        *self.slot.lock() = None;
    }
}
