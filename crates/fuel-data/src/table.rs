//! Filtered tabular view over the raw log rows.
//!
//! Rows are shown newest first, optionally restricted to one machine and
//! truncated to the most recent ten.

use fuel_core::models::{RawRow, COL_MACHINE, COL_TIMESTAMP};
use fuel_core::time_utils::TimestampParser;
use serde::Serialize;

/// Rows shown in [`TableMode::Recent`].
pub const RECENT_ROW_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TableMode {
    #[default]
    Recent,
    All,
}

/// The rows and caption produced by [`TableView::apply`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredTable {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// Machine filter plus recent/all mode.
#[derive(Debug, Clone, Default)]
pub struct TableView {
    pub machine: Option<String>,
    pub mode: TableMode,
}

impl TableView {
    pub fn new(machine: Option<String>, mode: TableMode) -> Self {
        Self { machine, mode }
    }

    /// Filter `rows` (already newest first) by machine, then apply the mode.
    pub fn apply(&self, headers: &[String], rows: &[RawRow]) -> FilteredTable {
        let machine = self.machine.as_deref().filter(|m| !m.is_empty());
        let filtered: Vec<&RawRow> = rows
            .iter()
            .filter(|row| machine.map_or(true, |m| cell(row, COL_MACHINE) == m))
            .collect();

        let suffix = machine.map(|m| format!(" - {}", m)).unwrap_or_default();
        let (title, shown): (String, Vec<RawRow>) = match self.mode {
            TableMode::Recent => (
                format!("Recent Fuel Logs (Last {}{})", RECENT_ROW_LIMIT, suffix),
                filtered.into_iter().take(RECENT_ROW_LIMIT).cloned().collect(),
            ),
            TableMode::All => (
                format!("All Fuel Logs ({}{})", filtered.len(), suffix),
                filtered.into_iter().cloned().collect(),
            ),
        };

        FilteredTable {
            title,
            headers: headers.to_vec(),
            rows: shown,
        }
    }
}

/// Sort rows newest first by their timestamp cell.
///
/// Rows whose timestamp does not parse sink to the bottom in arrival order.
pub fn sort_newest_first(rows: &[RawRow], parser: &TimestampParser) -> Vec<RawRow> {
    let mut keyed: Vec<(Option<chrono::DateTime<chrono::Utc>>, &RawRow)> = rows
        .iter()
        .map(|row| (parser.parse(cell(row, COL_TIMESTAMP)), row))
        .collect();
    // `None` orders before `Some`, so reversing the comparison puts it last.
    keyed.sort_by(|a, b| b.0.cmp(&a.0));
    keyed.into_iter().map(|(_, row)| row.clone()).collect()
}

/// Distinct machine ids in first-seen order, for the filter selector.
pub fn distinct_machines(rows: &[RawRow]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    rows.iter()
        .map(|row| cell(row, COL_MACHINE))
        .filter(|m| !m.is_empty() && seen.insert(m.to_string()))
        .map(str::to_string)
        .collect()
}

fn cell(row: &RawRow, idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}
