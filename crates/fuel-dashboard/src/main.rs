mod bootstrap;
mod report;

use anyhow::{anyhow, Result};
use chrono::Utc;
use fuel_core::models::Snapshot;
use fuel_core::settings::Settings;
use fuel_core::time_utils::resolve_timezone;
use fuel_data::analysis::{analyze_snapshot, AnalysisOptions, FuelAnalysis};
use fuel_data::reader::FileSource;
use fuel_data::table::TableMode;
use fuel_runtime::orchestrator::RefreshOrchestrator;
use fuel_runtime::provider::SnapshotProvider;

use report::ReportContext;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Fuel dashboard v{} starting", env!("CARGO_PKG_VERSION"));

    let snapshot_path = settings
        .snapshot
        .clone()
        .or_else(bootstrap::discover_snapshot_path)
        .ok_or_else(|| anyhow!("No fuel log export found; pass --snapshot <file or directory>"))?;

    let timezone = resolve_timezone(&settings.timezone);
    let price = settings.fuel_price();
    tracing::info!(
        "Snapshot: {}, View: {}, Timezone: {}, Price: {}/L",
        snapshot_path.display(),
        settings.view,
        timezone.name(),
        price
    );

    let options = AnalysisOptions {
        price_per_litre: price.per_litre(),
        now: Utc::now(),
        timezone,
        ..AnalysisOptions::default()
    };
    let ctx = ReportContext {
        machine: settings.machine.clone(),
        mode: if settings.all_rows {
            TableMode::All
        } else {
            TableMode::Recent
        },
        timezone,
    };
    let mut provider = SnapshotProvider::new(FileSource::new(&snapshot_path), settings.cache_ttl);

    if settings.watch {
        tracing::info!("Refreshing every {}s; Ctrl+C to stop", settings.refresh_rate);

        let orchestrator =
            RefreshOrchestrator::new(u64::from(settings.refresh_rate), provider, options);
        let (mut rx, handle) = orchestrator.start();

        loop {
            tokio::select! {
                update = rx.recv() => match update {
                    Some(update) => {
                        if let Some(err) = &update.last_error {
                            tracing::warn!("Showing cached data: {}", err);
                        }
                        print_report(&settings, &update.analysis, &update.snapshot, &ctx)?;
                    }
                    None => break,
                },
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received; stopping refresh task");
                    break;
                }
            }
        }
        handle.abort();
    } else {
        let snapshot = match provider.get(options.now) {
            Some(snapshot) => snapshot.clone(),
            None => {
                return Err(anyhow!(
                    "Could not load fuel logs: {}",
                    provider.last_error().unwrap_or("unknown error")
                ))
            }
        };
        let analysis = analyze_snapshot(&snapshot, &options);
        tracing::debug!(
            rows = analysis.metadata.rows_received,
            skipped = analysis.metadata.rows_skipped,
            rejected_intervals = analysis.metadata.intervals_rejected,
            "analysis complete"
        );
        print_report(&settings, &analysis, &snapshot, &ctx)?;
    }

    Ok(())
}

fn print_report(
    settings: &Settings,
    analysis: &FuelAnalysis,
    snapshot: &Snapshot,
    ctx: &ReportContext,
) -> Result<()> {
    if settings.json {
        println!("{}", serde_json::to_string_pretty(&analysis.rounded_for_display())?);
    } else {
        println!("{}", report::render(&settings.view, analysis, snapshot, ctx));
    }
    Ok(())
}
