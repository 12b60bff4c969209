//! Main analysis pipeline for the fuel dashboard.
//!
//! Runs normalisation, per-machine grouping, hour-meter differencing and every
//! aggregation over one snapshot of rows, returning a [`FuelAnalysis`] ready
//! for the report layer. The pipeline holds no state between calls.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use fuel_core::calculations::{round_to, RankedMachine, HOURS_INTERVAL_CAP};
use fuel_core::data_processors::RowNormaliser;
use fuel_core::models::{LogEntry, Snapshot};
use fuel_core::pricing::DEFAULT_PRICE_PER_LITRE;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregator::{CostSummary, DashboardStats, FuelAggregator, MonthlyTrend};
use crate::analyzer::{DifferenceEngine, MachineSeries};

/// Number of months shown in the recent-trend list.
pub const DEFAULT_TREND_MONTHS: usize = 6;

// ── Options ───────────────────────────────────────────────────────────────────

/// Per-invocation parameters of the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisOptions {
    /// Multiplier for every monetary table.
    pub price_per_litre: f64,
    /// Instant that defines the "current month".
    pub now: DateTime<Utc>,
    /// Intervals with `hours_elapsed >= cap` are discarded.
    pub hours_interval_cap: f64,
    /// Zone used to read naive timestamps and to bucket months and years.
    pub timezone: Tz,
    /// How many trailing months `monthly_trends` keeps.
    pub trend_months: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            price_per_litre: DEFAULT_PRICE_PER_LITRE,
            now: Utc::now(),
            hours_interval_cap: HOURS_INTERVAL_CAP,
            timezone: Tz::UTC,
            trend_months: DEFAULT_TREND_MONTHS,
        }
    }
}

// ── Result types ──────────────────────────────────────────────────────────────

/// Bookkeeping produced alongside the derived tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// ISO-8601 instant the analysis treated as "now".
    pub generated_at: String,
    pub timezone: String,
    pub price_per_litre: f64,
    pub rows_received: usize,
    pub entries_accepted: usize,
    pub rows_skipped: usize,
    pub intervals_accepted: usize,
    pub intervals_rejected: usize,
}

/// Every derived table for one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelAnalysis {
    pub efficiency_by_machine: BTreeMap<String, f64>,
    pub efficiency_ranking: Vec<RankedMachine>,
    pub total_hours: f64,
    pub monthly_litres: BTreeMap<String, f64>,
    pub monthly_litres_by_machine: BTreeMap<String, BTreeMap<String, f64>>,
    pub yearly_litres_by_machine: BTreeMap<i32, BTreeMap<String, f64>>,
    pub litres_by_machine: BTreeMap<String, f64>,
    pub monthly_cost: BTreeMap<String, f64>,
    pub costs: CostSummary,
    pub monthly_trends: Vec<MonthlyTrend>,
    pub stats: DashboardStats,
    pub metadata: AnalysisMetadata,
}

impl FuelAnalysis {
    /// Copy with display rounding applied: efficiencies and money to two
    /// decimals, trend litres to whole litres. Other tables are unchanged.
    pub fn rounded_for_display(&self) -> FuelAnalysis {
        let mut out = self.clone();

        for value in out.efficiency_by_machine.values_mut() {
            *value = round_to(*value, 2);
        }
        for ranked in &mut out.efficiency_ranking {
            ranked.efficiency = round_to(ranked.efficiency, 2);
        }
        for value in out.monthly_cost.values_mut() {
            *value = round_to(*value, 2);
        }
        out.costs.total_cost = round_to(out.costs.total_cost, 2);
        out.costs.current_month_cost = round_to(out.costs.current_month_cost, 2);
        for cost in out.costs.per_machine.values_mut() {
            cost.total = round_to(cost.total, 2);
            cost.current_month = round_to(cost.current_month, 2);
        }
        for trend in &mut out.monthly_trends {
            trend.litres = round_to(trend.litres, 0);
        }
        out
    }
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Analyse the rows of `snapshot`; its headers are not consulted.
pub fn analyze_snapshot(snapshot: &Snapshot, options: &AnalysisOptions) -> FuelAnalysis {
    analyze_rows(&snapshot.rows, options)
}

/// Normalise `rows` and run the full pipeline over the surviving entries.
pub fn analyze_rows<S: AsRef<str>>(rows: &[Vec<S>], options: &AnalysisOptions) -> FuelAnalysis {
    let (entries, skipped) = RowNormaliser::new(options.timezone).normalise_all(rows);
    debug!(
        rows = rows.len(),
        accepted = entries.len(),
        skipped,
        "normalised snapshot rows"
    );
    let mut analysis = analyze_entries(entries, options);
    analysis.metadata.rows_received = rows.len();
    analysis.metadata.rows_skipped = skipped;
    analysis
}

/// Run grouping, differencing and aggregation over typed entries.
pub fn analyze_entries(entries: Vec<LogEntry>, options: &AnalysisOptions) -> FuelAnalysis {
    let tz = options.timezone;
    let entry_count = entries.len();

    // ── Step 1: group by machine ──────────────────────────────────────────────
    let series = MachineSeries::from_entries(entries);

    // ── Step 2: difference hour meters ────────────────────────────────────────
    let intervals = DifferenceEngine::new(options.hours_interval_cap).intervals(&series);

    // ── Step 3: aggregate ─────────────────────────────────────────────────────
    let efficiency_by_machine = FuelAggregator::efficiency_by_machine(&intervals.accepted);
    let efficiency_ranking = FuelAggregator::efficiency_ranking(&efficiency_by_machine);
    let monthly_litres = FuelAggregator::monthly_litres(&series, tz);
    let monthly_trends = FuelAggregator::monthly_trends(&monthly_litres, options.trend_months);
    let stats = FuelAggregator::dashboard_stats(&series, &intervals.accepted, options.now, tz);

    let metadata = AnalysisMetadata {
        generated_at: options.now.to_rfc3339(),
        timezone: tz.name().to_string(),
        price_per_litre: options.price_per_litre,
        rows_received: entry_count,
        entries_accepted: entry_count,
        rows_skipped: 0,
        intervals_accepted: intervals.accepted.len(),
        intervals_rejected: intervals.rejected,
    };

    FuelAnalysis {
        total_hours: stats.total_hours,
        efficiency_by_machine,
        efficiency_ranking,
        monthly_litres_by_machine: FuelAggregator::monthly_litres_by_machine(&series, tz),
        yearly_litres_by_machine: FuelAggregator::yearly_litres_by_machine(&series, tz),
        litres_by_machine: FuelAggregator::litres_by_machine(&series),
        monthly_cost: FuelAggregator::monthly_cost(&series, options.price_per_litre, tz),
        costs: FuelAggregator::cost_summary(&series, options.price_per_litre, options.now, tz),
        monthly_litres,
        monthly_trends,
        stats,
        metadata,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
