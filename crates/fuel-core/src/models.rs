use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Row schema ────────────────────────────────────────────────────────────────

/// Column holding the dispense timestamp.
pub const COL_TIMESTAMP: usize = 0;
/// Column holding the machine identifier.
pub const COL_MACHINE: usize = 1;
/// Column holding the litres dispensed.
pub const COL_LITRES: usize = 2;
/// Column holding the cumulative hour-meter reading.
pub const COL_HOUR_METER: usize = 3;

/// One spreadsheet row as delivered by a snapshot source.
///
/// Trailing cells may be missing; columns past [`COL_HOUR_METER`] are ignored.
pub type RawRow = Vec<String>;

// ── Snapshot ──────────────────────────────────────────────────────────────────

/// An immutable batch of rows fetched from the fuel log at one point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Header cells of the sheet; opaque to the analytics core.
    pub headers: Vec<String>,
    /// Data rows in sheet order.
    pub rows: Vec<RawRow>,
    /// When the rows were fetched.
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(headers: Vec<String>, rows: Vec<RawRow>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            headers,
            rows,
            fetched_at,
        }
    }

    /// Number of data rows (header excluded).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ── LogEntry ──────────────────────────────────────────────────────────────────

/// The normalised form of one fuel-log row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// UTC instant the fuel was dispensed.
    pub timestamp: DateTime<Utc>,
    /// Machine identifier, taken verbatim from the sheet.
    pub machine: String,
    /// Litres dispensed at this event.
    pub litres: f64,
    /// Cumulative engine-hours reading at dispense time.
    pub hour_meter: f64,
}

// ── Interval ──────────────────────────────────────────────────────────────────

/// The span between two consecutive log entries of the same machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub machine: String,
    pub start_ts: DateTime<Utc>,
    pub end_ts: DateTime<Utc>,
    /// Litres of the closing entry.
    pub litres_dispensed: f64,
    /// Closing hour-meter reading minus the opening one.
    pub hours_elapsed: f64,
}

impl Interval {
    /// Build the candidate interval from `start` to `end`.
    pub fn between(start: &LogEntry, end: &LogEntry) -> Self {
        Self {
            machine: end.machine.clone(),
            start_ts: start.timestamp,
            end_ts: end.timestamp,
            litres_dispensed: end.litres,
            hours_elapsed: end.hour_meter - start.hour_meter,
        }
    }

    /// `true` when `0 < hours_elapsed < cap`.
    pub fn is_plausible(&self, cap: f64) -> bool {
        self.hours_elapsed > 0.0 && self.hours_elapsed < cap
    }
}
