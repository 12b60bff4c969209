use std::path::PathBuf;
use thiserror::Error;

/// All errors produced at the boundaries of the fuel dashboard.
///
/// The analytics core itself is infallible; these variants only arise while
/// loading snapshots, enforcing request limits or validating configuration.
#[derive(Error, Debug)]
pub enum FuelError {
    /// A snapshot file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON snapshot document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A CSV snapshot export could not be parsed.
    #[error("Failed to parse CSV: {0}")]
    CsvParse(String),

    /// The snapshot holds no data rows below its header.
    #[error("No data found in {0}")]
    NoData(PathBuf),

    /// The snapshot file extension is not one of the recognised formats.
    #[error("Unsupported snapshot format: {0}")]
    UnsupportedFormat(PathBuf),

    /// The configured snapshot path does not exist.
    #[error("Snapshot path not found: {0}")]
    SnapshotPathNotFound(PathBuf),

    /// Too many fetches were attempted inside the rate-limit window.
    #[error("Rate limit exceeded: at most {max_requests} requests per {window_secs}s")]
    RateLimited { max_requests: u32, window_secs: u64 },

    /// A fuel price was negative, non-finite or not a number.
    #[error("Invalid fuel price: {0}")]
    InvalidPrice(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the fuel dashboard crates.
pub type Result<T> = std::result::Result<T, FuelError>;
