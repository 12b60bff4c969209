//! Cached, rate-limited access to the fuel-log snapshot.
//!
//! [`SnapshotProvider`] wraps a [`SnapshotSource`] with a freshness window,
//! a request limiter and a small retry loop. Callers ask for the snapshot
//! with [`SnapshotProvider::get`]; the provider decides whether the cached
//! rows are still good, refetches when they are not, and falls back to the
//! stale rows when the source is unavailable.

use std::thread;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use fuel_core::error::FuelError;
use fuel_core::models::Snapshot;
use fuel_data::reader::SnapshotSource;

use crate::rate_limit::RateLimiter;

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Default freshness window in seconds (ten minutes).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 600;

/// Maximum number of fetch attempts per refresh.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Back-off step between attempts: 0 ms, 100 ms, 200 ms.
const RETRY_STEP_MS: u64 = 100;

// ── SnapshotProvider ──────────────────────────────────────────────────────────

/// TTL-cached wrapper around a snapshot source.
///
/// # Example
/// ```no_run
/// use chrono::Utc;
/// use fuel_data::reader::FileSource;
/// use fuel_runtime::provider::SnapshotProvider;
///
/// let mut provider = SnapshotProvider::new(FileSource::new("fuel.csv"), 600);
/// if let Some(snapshot) = provider.get(Utc::now()) {
///     println!("{} rows", snapshot.len());
/// }
/// ```
pub struct SnapshotProvider<S> {
    source: S,
    ttl: Duration,
    limiter: RateLimiter,
    cache: Option<Snapshot>,
    last_error: Option<String>,
}

impl<S: SnapshotSource> SnapshotProvider<S> {
    pub fn new(source: S, cache_ttl_secs: u64) -> Self {
        Self {
            source,
            ttl: Duration::seconds(cache_ttl_secs as i64),
            limiter: RateLimiter::default(),
            cache: None,
            last_error: None,
        }
    }

    /// Replace the default 50-per-minute limiter.
    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// The snapshot as of `now`, refetching when the cache has expired.
    ///
    /// On failure the previous snapshot, if any, is returned and the error is
    /// kept for [`last_error`](Self::last_error).
    pub fn get(&mut self, now: DateTime<Utc>) -> Option<&Snapshot> {
        if self.is_fresh(now) {
            tracing::debug!("returning cached snapshot");
            return self.cache.as_ref();
        }

        match self.fetch_with_retry(now) {
            Ok(mut snapshot) => {
                snapshot.fetched_at = now;
                tracing::debug!(rows = snapshot.len(), "snapshot cache updated");
                self.cache = Some(snapshot);
                self.last_error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "snapshot fetch failed; falling back to cached rows");
                self.last_error = Some(e.to_string());
            }
        }
        self.cache.as_ref()
    }

    /// Drop the cached snapshot so the next [`get`](Self::get) refetches.
    pub fn invalidate(&mut self) {
        self.cache = None;
        tracing::debug!("snapshot cache invalidated");
    }

    /// Age of the cached snapshot at `now`, or `None` before the first fetch.
    pub fn cache_age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.cache.as_ref().map(|s| now - s.fetched_at)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn cached(&self) -> Option<&Snapshot> {
        self.cache.as_ref()
    }

    // ── Private helpers ───────────────────────────────────────────────────

    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.cache_age(now)
            .is_some_and(|age| age >= Duration::zero() && age < self.ttl)
    }

    fn fetch_with_retry(&mut self, now: DateTime<Utc>) -> Result<Snapshot, FuelError> {
        let mut last_err = None;

        for attempt in 0..MAX_RETRY_ATTEMPTS {
            if attempt > 0 {
                let sleep_ms = u64::from(attempt) * RETRY_STEP_MS;
                tracing::debug!(attempt, sleep_ms, "retrying fetch after back-off");
                thread::sleep(StdDuration::from_millis(sleep_ms));
            }

            // A spent budget will not recover within the back-off schedule.
            self.limiter.check(now)?;

            match self.source.fetch() {
                Ok(snapshot) => return Ok(snapshot),
                Err(e @ (FuelError::UnsupportedFormat(_) | FuelError::NoData(_))) => {
                    return Err(e)
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "fetch attempt failed");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| FuelError::Config("no fetch attempted".to_string())))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
