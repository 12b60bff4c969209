use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Name of the per-user state directory under `$HOME`.
const APP_DIR: &str = ".fuel-dashboard";

// ── Directory bootstrap ────────────────────────────────────────────────────────

fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Ensure `~/.fuel-dashboard/` and its `logs/` and `exports/` subdirectories
/// exist.
pub fn ensure_directories() -> anyhow::Result<()> {
    let dir = app_dir();
    std::fs::create_dir_all(dir.join("logs"))?;
    std::fs::create_dir_all(dir.join("exports"))?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a CLI level name onto an [`EnvFilter`] directive.
fn level_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" | "WARN" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_lowercase(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Output goes to stderr, or only to `log_file` (appended, no ANSI) when one
/// is given. `RUST_LOG` is ignored; the level comes from the CLI.
pub fn setup_logging(log_level: &str, log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(level_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    // Exactly one of the two layers is active.
    let (stderr_layer, file_layer) = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file));
            (None, Some(layer))
        }
        None => {
            let layer = fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr);
            (Some(layer), None)
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}

// ── Snapshot discovery ─────────────────────────────────────────────────────────

/// Default location of fuel-log exports when `--snapshot` is not given.
///
/// Returns `~/.fuel-dashboard/exports` if it exists.
pub fn discover_snapshot_path() -> Option<PathBuf> {
    discover_snapshot_path_in(&app_dir())
}

fn discover_snapshot_path_in(base: &Path) -> Option<PathBuf> {
    Some(base.join("exports")).filter(|p| p.is_dir())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_directories() {
        let tmp = TempDir::new().expect("tempdir");

        // Override HOME so that dirs::home_dir() resolves to our temp dir.
        let original_home = std::env::var_os("HOME");
        std::env::set_var("HOME", tmp.path());

        let result = ensure_directories();

        match original_home {
            Some(v) => std::env::set_var("HOME", v),
            None => std::env::remove_var("HOME"),
        }

        result.expect("ensure_directories should succeed");

        let dir = tmp.path().join(APP_DIR);
        assert!(dir.join("logs").is_dir(), "logs subdir must exist");
        assert!(dir.join("exports").is_dir(), "exports subdir must exist");
    }

    // ── level_directive ───────────────────────────────────────────────────────

    #[test]
    fn test_level_directive() {
        assert_eq!(level_directive("DEBUG"), "debug");
        assert_eq!(level_directive("info"), "info");
        assert_eq!(level_directive("WARNING"), "warn");
        assert_eq!(level_directive("CRITICAL"), "error");
        assert_eq!(level_directive("Trace"), "trace");
    }

    // ── discover_snapshot_path ────────────────────────────────────────────────

    #[test]
    fn test_discover_snapshot_path_none_when_absent() {
        let tmp = TempDir::new().expect("tempdir");
        assert!(discover_snapshot_path_in(tmp.path()).is_none());
    }

    #[test]
    fn test_discover_snapshot_path_finds_exports() {
        let tmp = TempDir::new().expect("tempdir");
        let exports = tmp.path().join("exports");
        std::fs::create_dir_all(&exports).expect("create exports dir");
        assert_eq!(discover_snapshot_path_in(tmp.path()), Some(exports));
    }
}
