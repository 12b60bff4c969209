use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::Interval;

/// Hour-meter gaps at or above this many hours cannot be attributed.
pub const HOURS_INTERVAL_CAP: f64 = 1000.0;

// ── EfficiencyAccumulator ─────────────────────────────────────────────────────

/// Running litres and hours over the accepted intervals of one machine.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EfficiencyAccumulator {
    pub litres: f64,
    pub hours: f64,
    pub intervals: u32,
}

impl EfficiencyAccumulator {
    pub fn add_interval(&mut self, interval: &Interval) {
        self.litres += interval.litres_dispensed;
        self.hours += interval.hours_elapsed;
        self.intervals += 1;
    }

    /// Litres per engine hour, or `None` when no hours were accepted.
    pub fn litres_per_hour(&self) -> Option<f64> {
        (self.hours > 0.0).then(|| self.litres / self.hours)
    }
}

// ── Ranking ───────────────────────────────────────────────────────────────────

/// One row of the efficiency ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMachine {
    pub machine: String,
    /// Litres per engine hour; lower is better.
    pub efficiency: f64,
}

/// Order machines by ascending litres per hour, most efficient first.
///
/// Equal values keep machine-id order so the ranking is deterministic.
pub fn rank_by_efficiency(efficiency: &BTreeMap<String, f64>) -> Vec<RankedMachine> {
    let mut ranking: Vec<RankedMachine> = efficiency
        .iter()
        .map(|(machine, &efficiency)| RankedMachine {
            machine: machine.clone(),
            efficiency,
        })
        .collect();
    ranking.sort_by(|a, b| {
        a.efficiency
            .partial_cmp(&b.efficiency)
            .unwrap_or(Ordering::Equal)
    });
    ranking
}

/// Round `value` half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round() / factor
}
