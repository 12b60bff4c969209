//! Fuel aggregation over machines, calendar months and years.
//!
//! Consumption and cost tables sum the raw `litres` of every entry; only the
//! efficiency tables work from differenced hour-meter intervals.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use fuel_core::calculations::{rank_by_efficiency, EfficiencyAccumulator, RankedMachine};
use fuel_core::formatting::format_month_label;
use fuel_core::models::{Interval, LogEntry};
use fuel_core::pricing::cost;
use fuel_core::time_utils::{is_same_month, month_key, year_of};
use serde::{Deserialize, Serialize};

use crate::analyzer::MachineSeries;

// ── Output types ──────────────────────────────────────────────────────────────

/// Projected spend for one machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineCost {
    pub total: f64,
    pub current_month: f64,
}

/// Fleet-wide and per-machine cost projections at one fuel price.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    pub total_cost: f64,
    pub current_month_cost: f64,
    pub per_machine: BTreeMap<String, MachineCost>,
}

impl CostSummary {
    /// Machine → all-time cost.
    pub fn per_machine_totals(&self) -> BTreeMap<String, f64> {
        self.per_machine
            .iter()
            .map(|(m, c)| (m.clone(), c.total))
            .collect()
    }

    /// Machine → cost within the current month.
    pub fn per_machine_current_month(&self) -> BTreeMap<String, f64> {
        self.per_machine
            .iter()
            .map(|(m, c)| (m.clone(), c.current_month))
            .collect()
    }
}

/// One month of the recent-consumption trend list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrend {
    /// `"YYYY-MM"`.
    pub month: String,
    /// `"MMM YYYY"`, e.g. `"Mar 2024"`.
    pub label: String,
    pub litres: f64,
}

/// Headline figures for the dashboard stat cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub litres_this_month: f64,
    pub all_time_litres: f64,
    pub total_hours: f64,
    pub log_count: usize,
    pub machine_count: usize,
}

// ── FuelAggregator ────────────────────────────────────────────────────────────

/// Stateless collection of the fuel-log folds.
pub struct FuelAggregator;

impl FuelAggregator {
    /// Sum of hours over all accepted intervals.
    pub fn total_hours(intervals: &[Interval]) -> f64 {
        intervals.iter().map(|i| i.hours_elapsed).sum()
    }

    /// Machine → litres per hour over its accepted intervals.
    ///
    /// Machines with no accepted hours are absent.
    pub fn efficiency_by_machine(intervals: &[Interval]) -> BTreeMap<String, f64> {
        let mut acc: BTreeMap<&str, EfficiencyAccumulator> = BTreeMap::new();
        for interval in intervals {
            acc.entry(interval.machine.as_str())
                .or_default()
                .add_interval(interval);
        }
        acc.into_iter()
            .filter_map(|(machine, a)| a.litres_per_hour().map(|e| (machine.to_string(), e)))
            .collect()
    }

    /// Machines ordered from lowest to highest litres per hour.
    pub fn efficiency_ranking(efficiency: &BTreeMap<String, f64>) -> Vec<RankedMachine> {
        rank_by_efficiency(efficiency)
    }

    /// `"YYYY-MM"` → litres dispensed that month.
    pub fn monthly_litres(series: &MachineSeries, tz: Tz) -> BTreeMap<String, f64> {
        Self::sum_by(series, |e| month_key(e.timestamp, tz), |e| e.litres)
    }

    /// `"YYYY-MM"` → machine → litres dispensed.
    pub fn monthly_litres_by_machine(
        series: &MachineSeries,
        tz: Tz,
    ) -> BTreeMap<String, BTreeMap<String, f64>> {
        Self::sum_by_machine(series, |e| month_key(e.timestamp, tz))
    }

    /// Year → machine → litres dispensed.
    pub fn yearly_litres_by_machine(
        series: &MachineSeries,
        tz: Tz,
    ) -> BTreeMap<i32, BTreeMap<String, f64>> {
        Self::sum_by_machine(series, |e| year_of(e.timestamp, tz))
    }

    /// Machine → all-time litres dispensed.
    pub fn litres_by_machine(series: &MachineSeries) -> BTreeMap<String, f64> {
        Self::sum_by(series, |e| e.machine.clone(), |e| e.litres)
    }

    /// `"YYYY-MM"` → projected spend at `price_per_litre`.
    pub fn monthly_cost(
        series: &MachineSeries,
        price_per_litre: f64,
        tz: Tz,
    ) -> BTreeMap<String, f64> {
        Self::sum_by(
            series,
            |e| month_key(e.timestamp, tz),
            |e| cost(e.litres, price_per_litre),
        )
    }

    /// Total, current-month and per-machine projected spend.
    pub fn cost_summary(
        series: &MachineSeries,
        price_per_litre: f64,
        now: DateTime<Utc>,
        tz: Tz,
    ) -> CostSummary {
        let mut summary = CostSummary::default();
        for entry in series.entries() {
            let spend = cost(entry.litres, price_per_litre);
            let machine = summary.per_machine.entry(entry.machine.clone()).or_default();
            machine.total += spend;
            summary.total_cost += spend;
            if is_same_month(entry.timestamp, now, tz) {
                machine.current_month += spend;
                summary.current_month_cost += spend;
            }
        }
        summary
    }

    /// The last `limit` months of `monthly` with display labels.
    pub fn monthly_trends(monthly: &BTreeMap<String, f64>, limit: usize) -> Vec<MonthlyTrend> {
        let skip = monthly.len().saturating_sub(limit);
        monthly
            .iter()
            .skip(skip)
            .map(|(month, &litres)| MonthlyTrend {
                month: month.clone(),
                label: format_month_label(month),
                litres,
            })
            .collect()
    }

    /// Stat-card figures: this month, all time, engine hours, log and machine counts.
    pub fn dashboard_stats(
        series: &MachineSeries,
        intervals: &[Interval],
        now: DateTime<Utc>,
        tz: Tz,
    ) -> DashboardStats {
        let mut stats = DashboardStats {
            total_hours: Self::total_hours(intervals),
            log_count: series.entry_count(),
            machine_count: series.len(),
            ..Default::default()
        };
        for entry in series.entries() {
            stats.all_time_litres += entry.litres;
            if is_same_month(entry.timestamp, now, tz) {
                stats.litres_this_month += entry.litres;
            }
        }
        stats
    }

    // ── Private ───────────────────────────────────────────────────────────────

    /// Generic single-level fold; `BTreeMap` keeps keys ascending.
    fn sum_by<K: Ord>(
        series: &MachineSeries,
        key_fn: impl Fn(&LogEntry) -> K,
        value_fn: impl Fn(&LogEntry) -> f64,
    ) -> BTreeMap<K, f64> {
        let mut map: BTreeMap<K, f64> = BTreeMap::new();
        for entry in series.entries() {
            *map.entry(key_fn(entry)).or_insert(0.0) += value_fn(entry);
        }
        map
    }

    /// Period → machine → litres.
    fn sum_by_machine<K: Ord>(
        series: &MachineSeries,
        key_fn: impl Fn(&LogEntry) -> K,
    ) -> BTreeMap<K, BTreeMap<String, f64>> {
        let mut map: BTreeMap<K, BTreeMap<String, f64>> = BTreeMap::new();
        for entry in series.entries() {
            *map.entry(key_fn(entry))
                .or_default()
                .entry(entry.machine.clone())
                .or_insert(0.0) += entry.litres;
        }
        map
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::DifferenceEngine;
    use chrono::TimeZone;

    fn entry(y: i32, m: u32, d: u32, machine: &str, litres: f64, hour_meter: f64) -> LogEntry {
        LogEntry {
            timestamp: Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap(),
            machine: machine.to_string(),
            litres,
            hour_meter,
        }
    }

    fn fleet() -> MachineSeries {
        MachineSeries::from_entries(vec![
            entry(2024, 1, 1, "A", 100.0, 1000.0),
            entry(2024, 2, 1, "A", 50.0, 1050.0),
            entry(2024, 3, 1, "A", 80.0, 1090.0),
            entry(2024, 1, 15, "B", 20.0, 500.0),
            entry(2024, 2, 15, "B", 30.0, 510.0),
        ])
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap()
    }

    // ── interval-based folds ──────────────────────────────────────────────────

    #[test]
    fn test_total_hours() {
        let set = DifferenceEngine::default().intervals(&fleet());
        assert_eq!(FuelAggregator::total_hours(&set.accepted), 100.0);
    }

    #[test]
    fn test_efficiency_by_machine() {
        let set = DifferenceEngine::default().intervals(&fleet());
        let eff = FuelAggregator::efficiency_by_machine(&set.accepted);
        assert!((eff["A"] - 130.0 / 90.0).abs() < 1e-12);
        assert!((eff["B"] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_efficiency_empty() {
        assert!(FuelAggregator::efficiency_by_machine(&[]).is_empty());
        assert_eq!(FuelAggregator::total_hours(&[]), 0.0);
    }

    #[test]
    fn test_efficiency_ranking_most_efficient_first() {
        let set = DifferenceEngine::default().intervals(&fleet());
        let eff = FuelAggregator::efficiency_by_machine(&set.accepted);
        let ranking = FuelAggregator::efficiency_ranking(&eff);
        let order: Vec<&str> = ranking.iter().map(|r| r.machine.as_str()).collect();
        assert_eq!(order, vec!["A", "B"]);
    }

    // ── litre folds ───────────────────────────────────────────────────────────

    #[test]
    fn test_monthly_litres_uses_raw_litres() {
        let monthly = FuelAggregator::monthly_litres(&fleet(), Tz::UTC);
        let expected: Vec<(&str, f64)> =
            vec![("2024-01", 120.0), ("2024-02", 80.0), ("2024-03", 80.0)];
        let actual: Vec<(&str, f64)> = monthly.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_monthly_litres_by_machine() {
        let table = FuelAggregator::monthly_litres_by_machine(&fleet(), Tz::UTC);
        assert_eq!(table["2024-01"]["A"], 100.0);
        assert_eq!(table["2024-01"]["B"], 20.0);
        assert_eq!(table["2024-03"].get("B"), None);
    }

    #[test]
    fn test_yearly_litres_by_machine_sorted() {
        let series = MachineSeries::from_entries(vec![
            entry(2024, 2, 1, "A", 40.0, 0.0),
            entry(2022, 12, 1, "A", 10.0, 0.0),
            entry(2023, 11, 1, "A", 30.0, 0.0),
            entry(2023, 6, 1, "A", 20.0, 0.0),
        ]);
        let yearly = FuelAggregator::yearly_litres_by_machine(&series, Tz::UTC);
        let years: Vec<i32> = yearly.keys().copied().collect();
        assert_eq!(years, vec![2022, 2023, 2024]);
        assert_eq!(yearly[&2022]["A"], 10.0);
        assert_eq!(yearly[&2023]["A"], 50.0);
        assert_eq!(yearly[&2024]["A"], 40.0);
    }

    #[test]
    fn test_litres_by_machine() {
        let usage = FuelAggregator::litres_by_machine(&fleet());
        assert_eq!(usage["A"], 230.0);
        assert_eq!(usage["B"], 50.0);
    }

    // ── cost folds ────────────────────────────────────────────────────────────

    #[test]
    fn test_monthly_cost() {
        let costs = FuelAggregator::monthly_cost(&fleet(), 0.5, Tz::UTC);
        assert_eq!(costs["2024-01"], 60.0);
        assert_eq!(costs["2024-02"], 40.0);
        assert_eq!(costs["2024-03"], 40.0);
    }

    #[test]
    fn test_cost_summary_current_month() {
        let summary = FuelAggregator::cost_summary(&fleet(), 0.5, now(), Tz::UTC);
        assert_eq!(summary.total_cost, 140.0);
        assert_eq!(summary.current_month_cost, 40.0);
        assert_eq!(summary.per_machine["A"].total, 115.0);
        assert_eq!(summary.per_machine["A"].current_month, 40.0);
        assert_eq!(summary.per_machine["B"].current_month, 0.0);
        assert_eq!(summary.per_machine_totals()["B"], 25.0);
        assert_eq!(summary.per_machine_current_month()["A"], 40.0);
    }

    #[test]
    fn test_cost_summary_zero_price() {
        let summary = FuelAggregator::cost_summary(&fleet(), 0.0, now(), Tz::UTC);
        assert_eq!(summary.total_cost, 0.0);
        assert!(summary.per_machine.values().all(|c| c.total == 0.0));
    }

    // ── monthly_trends ────────────────────────────────────────────────────────

    #[test]
    fn test_monthly_trends_keeps_last_months() {
        let monthly: BTreeMap<String, f64> = (1..=8)
            .map(|m| (format!("2024-{:02}", m), m as f64 * 10.0))
            .collect();
        let trends = FuelAggregator::monthly_trends(&monthly, 6);
        assert_eq!(trends.len(), 6);
        assert_eq!(trends[0].month, "2024-03");
        assert_eq!(trends[0].label, "Mar 2024");
        assert_eq!(trends[5].month, "2024-08");
        assert_eq!(trends[5].litres, 80.0);
    }

    #[test]
    fn test_monthly_trends_fewer_months_than_limit() {
        let monthly = FuelAggregator::monthly_litres(&fleet(), Tz::UTC);
        let trends = FuelAggregator::monthly_trends(&monthly, 6);
        assert_eq!(trends.len(), 3);
        assert_eq!(trends[0].label, "Jan 2024");
    }

    // ── dashboard_stats ───────────────────────────────────────────────────────

    #[test]
    fn test_dashboard_stats() {
        let series = fleet();
        let set = DifferenceEngine::default().intervals(&series);
        let stats = FuelAggregator::dashboard_stats(&series, &set.accepted, now(), Tz::UTC);
        assert_eq!(stats.litres_this_month, 80.0);
        assert_eq!(stats.all_time_litres, 280.0);
        assert_eq!(stats.total_hours, 100.0);
        assert_eq!(stats.log_count, 5);
        assert_eq!(stats.machine_count, 2);
    }
}
