pub mod bench;
pub mod config;
pub mod plot;
pub mod report;
pub mod util;

/// Directory reports are written to and read from when no config overrides it.
pub const DEFAULT_DATA_DIR: &str = "benchmark";
