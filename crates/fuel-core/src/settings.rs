use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::pricing::{FuelPrice, DEFAULT_PRICE_PER_LITRE};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Fuel usage dashboard for a machine fleet
#[derive(Parser, Debug, Clone)]
#[command(
    name = "fuel-dashboard",
    about = "Fuel usage dashboard for a machine fleet",
    version
)]
pub struct Settings {
    /// Fuel log export (Sheets `values` JSON or CSV), or a directory of exports
    #[arg(long, env = "FUEL_DASHBOARD_SNAPSHOT")]
    pub snapshot: Option<PathBuf>,

    /// Fuel price per litre used for cost projections
    #[arg(long, default_value_t = DEFAULT_PRICE_PER_LITRE, value_parser = parse_price)]
    pub price: f64,

    /// Timezone for month bucketing (auto-detected if not specified)
    #[arg(long, default_value = "auto")]
    pub timezone: String,

    /// Report view
    #[arg(long, default_value = "summary", value_parser = ["summary", "efficiency", "monthly", "costs", "yearly", "trends", "table", "all"])]
    pub view: String,

    /// Only show log rows for this machine in the table view
    #[arg(long)]
    pub machine: Option<String>,

    /// Show every log row in the table view instead of the 10 most recent
    #[arg(long)]
    pub all_rows: bool,

    /// Print the full analysis as JSON
    #[arg(long)]
    pub json: bool,

    /// Keep running and refresh the report periodically
    #[arg(long)]
    pub watch: bool,

    /// Refresh interval in seconds for --watch (1-3600)
    #[arg(long, default_value = "60", value_parser = clap::value_parser!(u32).range(1..=3600))]
    pub refresh_rate: u32,

    /// Seconds a fetched snapshot stays fresh
    #[arg(long, default_value = "600")]
    pub cache_ttl: u64,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

/// Negative or non-numeric prices are rejected; `0` falls back to the default.
fn parse_price(s: &str) -> Result<f64, String> {
    s.parse::<FuelPrice>()
        .map(|p| p.nonzero_or_default().per_litre())
        .map_err(|e| e.to_string())
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.fuel-dashboard/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<FuelPrice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
}

impl LastUsedParams {
    /// Uses `~/.fuel-dashboard/last_used.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".fuel-dashboard").join("last_used.json")
    }

    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to `path`, creating parent directories.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    pub fn clear_at(path: &std::path::Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, resolve `"auto"` values, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Accepts args and an explicit config path so tests can redirect to a
    /// temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::resolve_auto_values(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins over persisted values.
        if !is_arg_explicitly_set(&matches, "snapshot") && settings.snapshot.is_none() {
            settings.snapshot = last.snapshot;
        }
        if !is_arg_explicitly_set(&matches, "price") {
            if let Some(p) = last.price {
                settings.price = p.per_litre();
            }
        }
        if !is_arg_explicitly_set(&matches, "timezone") {
            if let Some(v) = last.timezone {
                settings.timezone = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "view") {
            if let Some(v) = last.view {
                settings.view = v;
            }
        }

        settings = Self::resolve_auto_values(settings);

        let params = LastUsedParams::from(&settings);
        let _ = params.save_to(config_path);

        settings
    }

    /// The configured price as a validated [`FuelPrice`]; zero or invalid
    /// prices give the default.
    pub fn fuel_price(&self) -> FuelPrice {
        FuelPrice::new(self.price)
            .map(FuelPrice::nonzero_or_default)
            .unwrap_or_default()
    }

    /// Resolve `"auto"` sentinel values and apply the `--debug` flag.
    fn resolve_auto_values(mut settings: Settings) -> Settings {
        if settings.timezone == "auto" {
            settings.timezone = crate::time_utils::get_system_timezone();
        }
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            snapshot: s.snapshot.clone(),
            price: FuelPrice::new(s.price).ok(),
            timezone: Some(s.timezone.clone()),
            view: Some(s.view.clone()),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
