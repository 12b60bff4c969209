//! Per-machine grouping and hour-meter differencing.
//!
//! [`MachineSeries`] partitions log entries by machine in timestamp order;
//! [`DifferenceEngine`] turns each series into the intervals between
//! consecutive readings and drops those with implausible hour deltas.

use std::collections::BTreeMap;

use fuel_core::calculations::HOURS_INTERVAL_CAP;
use fuel_core::models::{Interval, LogEntry};
use tracing::debug;

// ── MachineSeries ─────────────────────────────────────────────────────────────

/// Log entries partitioned by machine, each list sorted by ascending timestamp.
///
/// Entries with equal timestamps keep their arrival order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MachineSeries {
    series: BTreeMap<String, Vec<LogEntry>>,
}

impl MachineSeries {
    /// Group `entries` by machine and sort each group oldest first.
    pub fn from_entries(entries: impl IntoIterator<Item = LogEntry>) -> Self {
        let mut series: BTreeMap<String, Vec<LogEntry>> = BTreeMap::new();
        for entry in entries {
            series.entry(entry.machine.clone()).or_default().push(entry);
        }
        for logs in series.values_mut() {
            // `sort_by_key` is stable, which preserves arrival order on ties.
            logs.sort_by_key(|e| e.timestamp);
        }
        Self { series }
    }

    /// Machine ids in ascending order.
    pub fn machines(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn get(&self, machine: &str) -> Option<&[LogEntry]> {
        self.series.get(machine).map(Vec::as_slice)
    }

    /// `(machine, entries)` pairs in machine order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[LogEntry])> {
        self.series
            .iter()
            .map(|(machine, logs)| (machine.as_str(), logs.as_slice()))
    }

    /// Every entry, machine by machine, oldest first within each machine.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.series.values().flatten()
    }

    /// Number of machines.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Total number of entries across all machines.
    pub fn entry_count(&self) -> usize {
        self.series.values().map(Vec::len).sum()
    }
}

// ── DifferenceEngine ──────────────────────────────────────────────────────────

/// Accepted intervals plus a count of the candidates that were discarded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntervalSet {
    pub accepted: Vec<Interval>,
    pub rejected: usize,
}

/// Converts cumulative hour-meter readings into usage intervals.
///
/// A candidate interval is accepted iff `0 < hours_elapsed < cap`. Inversions
/// point at meter resets or typos; very large gaps at backlog entries whose
/// usage cannot be attributed.
#[derive(Debug, Clone, Copy)]
pub struct DifferenceEngine {
    cap: f64,
}

impl Default for DifferenceEngine {
    fn default() -> Self {
        Self::new(HOURS_INTERVAL_CAP)
    }
}

impl DifferenceEngine {
    pub fn new(cap: f64) -> Self {
        Self { cap }
    }

    /// All `n - 1` candidate intervals of one machine's ordered entries.
    pub fn candidates<'a>(&self, logs: &'a [LogEntry]) -> impl Iterator<Item = Interval> + 'a {
        logs.windows(2).map(|pair| Interval::between(&pair[0], &pair[1]))
    }

    /// Accepted intervals of every machine, in machine then time order.
    pub fn intervals(&self, series: &MachineSeries) -> IntervalSet {
        let mut set = IntervalSet::default();
        for (_, logs) in series.iter() {
            for interval in self.candidates(logs) {
                if interval.is_plausible(self.cap) {
                    set.accepted.push(interval);
                } else {
                    debug!(
                        machine = %interval.machine,
                        hours = interval.hours_elapsed,
                        end = %interval.end_ts,
                        "discarding interval outside sanity bounds"
                    );
                    set.rejected += 1;
                }
            }
        }
        set
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(day: u32, machine: &str, litres: f64, hour_meter: f64) -> LogEntry {
        LogEntry {
            timestamp: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            machine: machine.to_string(),
            litres,
            hour_meter,
        }
    }

    // ── MachineSeries ─────────────────────────────────────────────────────────

    #[test]
    fn test_series_groups_and_sorts() {
        let series = MachineSeries::from_entries(vec![
            entry(20, "A", 1.0, 30.0),
            entry(5, "B", 1.0, 10.0),
            entry(10, "A", 1.0, 20.0),
        ]);

        assert_eq!(series.machines().collect::<Vec<_>>(), vec!["A", "B"]);
        let a = series.get("A").unwrap();
        assert_eq!(a.len(), 2);
        assert!(a[0].timestamp < a[1].timestamp);
        assert_eq!(series.entry_count(), 3);
    }

    #[test]
    fn test_series_ties_keep_arrival_order() {
        let series = MachineSeries::from_entries(vec![
            entry(1, "A", 1.0, 100.0),
            entry(1, "A", 2.0, 50.0),
        ]);
        let a = series.get("A").unwrap();
        assert_eq!(a[0].litres, 1.0);
        assert_eq!(a[1].litres, 2.0);
    }

    #[test]
    fn test_series_regrouping_is_idempotent() {
        let series = MachineSeries::from_entries(vec![
            entry(3, "B", 1.0, 10.0),
            entry(2, "A", 2.0, 20.0),
            entry(1, "A", 3.0, 5.0),
        ]);
        let regrouped = MachineSeries::from_entries(series.entries().cloned());
        assert_eq!(series, regrouped);
    }

    #[test]
    fn test_series_empty() {
        let series = MachineSeries::from_entries(Vec::new());
        assert!(series.is_empty());
        assert_eq!(series.entry_count(), 0);
    }

    // ── DifferenceEngine ──────────────────────────────────────────────────────

    #[test]
    fn test_candidates_pairs_consecutive_entries() {
        let logs = vec![
            entry(1, "A", 100.0, 1000.0),
            entry(2, "A", 50.0, 1050.0),
            entry(3, "A", 80.0, 1090.0),
        ];
        let candidates: Vec<Interval> = DifferenceEngine::default().candidates(&logs).collect();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].litres_dispensed, 50.0);
        assert_eq!(candidates[0].hours_elapsed, 50.0);
        assert_eq!(candidates[1].litres_dispensed, 80.0);
        assert_eq!(candidates[1].hours_elapsed, 40.0);
    }

    #[test]
    fn test_single_entry_has_no_candidates() {
        let logs = vec![entry(1, "A", 100.0, 1000.0)];
        assert_eq!(DifferenceEngine::default().candidates(&logs).count(), 0);
    }

    #[test]
    fn test_intervals_rejects_backwards_zero_and_large_gaps() {
        let series = MachineSeries::from_entries(vec![
            entry(1, "A", 10.0, 1000.0),
            entry(2, "A", 5.0, 999.0),
            entry(3, "A", 5.0, 999.0),
            entry(4, "A", 5.0, 2500.0),
            entry(5, "A", 7.0, 2510.0),
        ]);
        let set = DifferenceEngine::default().intervals(&series);
        assert_eq!(set.rejected, 3);
        assert_eq!(set.accepted.len(), 1);
        assert_eq!(set.accepted[0].hours_elapsed, 10.0);
        assert_eq!(set.accepted[0].litres_dispensed, 7.0);
    }

    #[test]
    fn test_intervals_custom_cap() {
        let series = MachineSeries::from_entries(vec![
            entry(1, "A", 10.0, 0.0),
            entry(2, "A", 10.0, 30.0),
        ]);
        assert_eq!(DifferenceEngine::new(24.0).intervals(&series).accepted.len(), 0);
        assert_eq!(DifferenceEngine::new(48.0).intervals(&series).accepted.len(), 1);
    }

    #[test]
    fn test_intervals_never_cross_machines() {
        let series = MachineSeries::from_entries(vec![
            entry(1, "A", 10.0, 100.0),
            entry(2, "B", 10.0, 150.0),
        ]);
        let set = DifferenceEngine::default().intervals(&series);
        assert!(set.accepted.is_empty());
        assert_eq!(set.rejected, 0);
    }
}
