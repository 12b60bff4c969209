//! Plain-text rendering of the dashboard views.

use chrono_tz::Tz;
use fuel_core::formatting::{
    format_currency, format_efficiency, format_litres, format_month_label, format_number,
    percentage,
};
use fuel_core::models::Snapshot;
use fuel_core::time_utils::TimestampParser;
use fuel_data::analysis::FuelAnalysis;
use fuel_data::table::{distinct_machines, sort_newest_first, TableMode, TableView};

/// Settings that shape the table view.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub machine: Option<String>,
    pub mode: TableMode,
    pub timezone: Tz,
}

/// Render `view` as text. Unknown views render the summary.
pub fn render(view: &str, analysis: &FuelAnalysis, snapshot: &Snapshot, ctx: &ReportContext) -> String {
    match view {
        "efficiency" => render_efficiency(analysis),
        "monthly" => render_monthly(analysis),
        "costs" => render_costs(analysis),
        "yearly" => render_yearly(analysis),
        "trends" => render_trends(analysis),
        "table" => render_table(snapshot, ctx),
        "all" => [
            render_summary(analysis),
            render_efficiency(analysis),
            render_monthly(analysis),
            render_costs(analysis),
            render_yearly(analysis),
            render_trends(analysis),
            render_table(snapshot, ctx),
        ]
        .join("\n"),
        _ => render_summary(analysis),
    }
}

// ── Views ─────────────────────────────────────────────────────────────────────

pub fn render_summary(analysis: &FuelAnalysis) -> String {
    let stats = &analysis.stats;
    let mut lines = vec![
        heading("Fuel Summary"),
        row("Litres this month", &format_litres(stats.litres_this_month)),
        row("All-time litres", &format_litres(stats.all_time_litres)),
        row("Total engine hours", &format_number(stats.total_hours, 1)),
        row("Fuel logs", &stats.log_count.to_string()),
        row("Machines", &stats.machine_count.to_string()),
        row("Cost this month", &format_currency(analysis.costs.current_month_cost)),
        row("All-time cost", &format_currency(analysis.costs.total_cost)),
    ];

    if !analysis.litres_by_machine.is_empty() {
        lines.push(String::new());
        lines.push("Usage by machine".to_string());
        for (machine, litres) in &analysis.litres_by_machine {
            let share = percentage(*litres, stats.all_time_litres, 1);
            lines.push(row(machine, &format!("{} ({}%)", format_litres(*litres), share)));
        }
    }
    lines.join("\n") + "\n"
}

pub fn render_efficiency(analysis: &FuelAnalysis) -> String {
    let mut lines = vec![heading("Efficiency Ranking (L/hr, best first)")];
    if analysis.efficiency_ranking.is_empty() {
        lines.push("No usable hour-meter intervals".to_string());
    }
    for (rank, entry) in analysis.efficiency_ranking.iter().enumerate() {
        lines.push(format!(
            "{:>3}. {:<24} {:>14}",
            rank + 1,
            entry.machine,
            format_efficiency(entry.efficiency)
        ));
    }
    lines.push(row("Total engine hours", &format_number(analysis.total_hours, 1)));
    lines.join("\n") + "\n"
}

pub fn render_monthly(analysis: &FuelAnalysis) -> String {
    let mut lines = vec![heading("Monthly Consumption")];
    for (month, litres) in &analysis.monthly_litres {
        let cost = analysis.monthly_cost.get(month).copied().unwrap_or(0.0);
        lines.push(format!(
            "{:<10} {:>12} {:>14}",
            format_month_label(month),
            format_litres(*litres),
            format_currency(cost)
        ));
        if let Some(machines) = analysis.monthly_litres_by_machine.get(month) {
            for (machine, litres) in machines {
                lines.push(format!("    {:<20} {:>12}", machine, format_litres(*litres)));
            }
        }
    }
    lines.join("\n") + "\n"
}

pub fn render_costs(analysis: &FuelAnalysis) -> String {
    let costs = &analysis.costs;
    let mut lines = vec![
        heading(&format!(
            "Fuel Costs (at {}/L)",
            format_currency(analysis.metadata.price_per_litre)
        )),
        format!("{:<24} {:>14} {:>14}", "Machine", "This month", "All time"),
    ];
    for (machine, cost) in &costs.per_machine {
        lines.push(format!(
            "{:<24} {:>14} {:>14}",
            machine,
            format_currency(cost.current_month),
            format_currency(cost.total)
        ));
    }
    lines.push(format!(
        "{:<24} {:>14} {:>14}",
        "Total",
        format_currency(costs.current_month_cost),
        format_currency(costs.total_cost)
    ));
    lines.join("\n") + "\n"
}

pub fn render_yearly(analysis: &FuelAnalysis) -> String {
    let mut lines = vec![heading("Yearly Consumption by Machine")];
    for (year, machines) in &analysis.yearly_litres_by_machine {
        lines.push(year.to_string());
        for (machine, litres) in machines {
            lines.push(format!("    {:<20} {:>12}", machine, format_litres(*litres)));
        }
    }
    lines.join("\n") + "\n"
}

pub fn render_trends(analysis: &FuelAnalysis) -> String {
    let mut lines = vec![heading("Recent Monthly Trend")];
    for trend in &analysis.monthly_trends {
        lines.push(row(&trend.label, &format_litres(trend.litres)));
    }
    lines.join("\n") + "\n"
}

pub fn render_table(snapshot: &Snapshot, ctx: &ReportContext) -> String {
    let sorted = sort_newest_first(&snapshot.rows, &TimestampParser::new(ctx.timezone));
    let table = TableView::new(ctx.machine.clone(), ctx.mode).apply(&snapshot.headers, &sorted);

    let mut lines = vec![heading(&table.title)];
    let machines = distinct_machines(&snapshot.rows);
    if !machines.is_empty() {
        lines.push(format!("Machines: {}", machines.join(", ")));
    }
    lines.push(table.headers.join(" | "));
    for cells in &table.rows {
        lines.push(cells.join(" | "));
    }
    lines.join("\n") + "\n"
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn heading(title: &str) -> String {
    format!("{}\n{}", title, "─".repeat(title.chars().count()))
}

fn row(label: &str, value: &str) -> String {
    format!("{:<24} {:>14}", label, value)
}
