use std::sync::OnceLock;

use chrono_tz::Tz;
use regex::Regex;
use tracing::debug;

use crate::models::{LogEntry, COL_HOUR_METER, COL_LITRES, COL_MACHINE, COL_TIMESTAMP};
use crate::time_utils::TimestampParser;

// ── Numeric cells ─────────────────────────────────────────────────────────────

fn leading_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?").expect("regex is valid")
    })
}

/// Parse the numeric prefix of a spreadsheet cell.
///
/// Leading whitespace is skipped and trailing text ignored, so `"45.5 L"`
/// reads as `45.5`. Cells with no numeric prefix, negative values and
/// non-finite results all read as `0.0`.
pub fn parse_quantity(cell: &str) -> f64 {
    let trimmed = cell.trim_start();
    let Some(m) = leading_number_re().find(trimmed) else {
        return 0.0;
    };
    match m.as_str().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => v,
        _ => 0.0,
    }
}

// ── RowNormaliser ─────────────────────────────────────────────────────────────

/// Turns positional sheet rows into typed [`LogEntry`] values.
///
/// A row is skipped when its timestamp cannot be parsed or its machine cell
/// is blank. Litres and hour-meter cells never cause a skip.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowNormaliser {
    parser: TimestampParser,
}

impl RowNormaliser {
    /// Create a normaliser that reads naive timestamps in `tz`.
    pub fn new(tz: Tz) -> Self {
        Self {
            parser: TimestampParser::new(tz),
        }
    }

    /// Normalise one row, or `None` when it must be skipped.
    pub fn normalise<S: AsRef<str>>(&self, row: &[S]) -> Option<LogEntry> {
        let cell = |idx: usize| row.get(idx).map(AsRef::as_ref).unwrap_or("");

        let Some(timestamp) = self.parser.parse(cell(COL_TIMESTAMP)) else {
            debug!(timestamp = cell(COL_TIMESTAMP), "skipping row: unparseable timestamp");
            return None;
        };

        let machine = cell(COL_MACHINE);
        if machine.trim().is_empty() {
            debug!(%timestamp, "skipping row: missing machine id");
            return None;
        }

        Some(LogEntry {
            timestamp,
            machine: machine.to_string(),
            litres: parse_quantity(cell(COL_LITRES)),
            hour_meter: parse_quantity(cell(COL_HOUR_METER)),
        })
    }

    /// Normalise a batch of rows, preserving arrival order.
    ///
    /// Returns the accepted entries and the number of skipped rows.
    pub fn normalise_all<S: AsRef<str>>(&self, rows: &[Vec<S>]) -> (Vec<LogEntry>, usize) {
        let entries: Vec<LogEntry> = rows.iter().filter_map(|row| self.normalise(row)).collect();
        let skipped = rows.len() - entries.len();
        (entries, skipped)
    }
}
