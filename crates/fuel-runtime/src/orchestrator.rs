//! Async refresh orchestrator.
//!
//! Runs a [`SnapshotProvider`] in a tokio task and re-analyses the fuel log
//! every refresh interval, sending each [`DashboardUpdate`] through an `mpsc`
//! channel so the watch loop can print it without shared mutable state.

use std::time::Duration;

use chrono::{DateTime, Utc};
use fuel_core::models::Snapshot;
use fuel_data::analysis::{analyze_snapshot, AnalysisOptions, FuelAnalysis};
use fuel_data::reader::SnapshotSource;
use tokio::sync::mpsc;
use tokio::time;

use crate::provider::SnapshotProvider;

// ── Public types ──────────────────────────────────────────────────────────────

/// One refresh of the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardUpdate {
    pub analysis: FuelAnalysis,
    /// The rows the analysis was computed from.
    pub snapshot: Snapshot,
    /// Error from the latest fetch when `snapshot` is a stale fallback.
    pub last_error: Option<String>,
    pub refreshed_at: DateTime<Utc>,
}

// ── RefreshOrchestrator ───────────────────────────────────────────────────────

/// Background refresh coordinator.
pub struct RefreshOrchestrator<S> {
    refresh_interval: Duration,
    /// Lent to a blocking task for each fetch; `None` only while it is out.
    provider: Option<SnapshotProvider<S>>,
    options: AnalysisOptions,
}

impl<S> RefreshOrchestrator<S>
where
    S: SnapshotSource + Send + 'static,
{
    /// `options.now` is replaced by the wall clock on every refresh.
    pub fn new(refresh_secs: u64, provider: SnapshotProvider<S>, options: AnalysisOptions) -> Self {
        Self {
            refresh_interval: Duration::from_secs(refresh_secs.max(1)),
            provider: Some(provider),
            options,
        }
    }

    /// Spawn the refresh loop.
    pub fn start(self) -> (mpsc::Receiver<DashboardUpdate>, RefreshHandle) {
        let (tx, rx) = mpsc::channel(16);

        let handle = tokio::spawn(async move {
            self.refresh_loop(tx).await;
        });

        (rx, RefreshHandle { handle })
    }

    // ── Private implementation ────────────────────────────────────────────

    /// Refreshes immediately, then on every tick until the receiver closes.
    async fn refresh_loop(mut self, tx: mpsc::Sender<DashboardUpdate>) {
        self.refresh_and_send(&tx).await;

        let mut interval = time::interval(self.refresh_interval);
        interval.tick().await;

        loop {
            interval.tick().await;

            if tx.is_closed() {
                tracing::debug!("refresh channel closed; exiting loop");
                break;
            }

            self.refresh_and_send(&tx).await;
        }
    }

    async fn refresh_and_send(&mut self, tx: &mpsc::Sender<DashboardUpdate>) {
        let now = Utc::now();
        let Some((snapshot, last_error)) = self.fetch(now).await else {
            return;
        };

        let options = AnalysisOptions { now, ..self.options };
        let analysis = analyze_snapshot(&snapshot, &options);

        let update = DashboardUpdate {
            analysis,
            snapshot,
            last_error,
            refreshed_at: now,
        };

        if let Err(e) = tx.send(update).await {
            tracing::warn!(error = %e, "failed to send dashboard update; receiver dropped");
        }
    }

    /// Run the provider on the blocking pool; its retry back-off sleeps.
    async fn fetch(&mut self, now: DateTime<Utc>) -> Option<(Snapshot, Option<String>)> {
        let mut provider = self.provider.take()?;
        let joined = tokio::task::spawn_blocking(move || {
            let snapshot = provider.get(now).cloned();
            let last_error = provider.last_error().map(str::to_string);
            (provider, snapshot, last_error)
        })
        .await;

        let (provider, snapshot, last_error) = match joined {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "snapshot fetch task failed; stopping refreshes");
                return None;
            }
        };
        self.provider = Some(provider);

        match snapshot {
            Some(snapshot) => Some((snapshot, last_error)),
            None => {
                tracing::warn!(
                    error = last_error.as_deref().unwrap_or("unknown"),
                    "no snapshot available; skipping refresh"
                );
                None
            }
        }
    }
}

// ── RefreshHandle ─────────────────────────────────────────────────────────────

/// Handle to the background refresh task.
pub struct RefreshHandle {
    handle: tokio::task::JoinHandle<()>,
}

impl RefreshHandle {
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
