//! CLI options and configuration types.

use std::path::PathBuf;

use anyhow::ensure;
use clap::{Parser, ValueEnum};

/// Logging level for the application.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Server configuration, parsed from the command line.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "geoip_heatmap",
    about = "Aggregates GeoIP allocation CSVs into SQLite and serves them as heatmap data"
)]
pub struct Config {
    /// Network address on which to listen
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub listen: String,

    /// Path to the SQLite database (":memory:" for a transient one)
    #[arg(long, default_value = ":memory:")]
    pub database: String,

    /// Root directory for static assets
    #[arg(long, default_value = "public_html")]
    pub root_dir: PathBuf,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, value_enum, default_value = "plain")]
    pub log_format: LogFormat,
}

impl Config {
    /// Checks that the static asset root exists and is a directory.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        ensure!(
            self.root_dir.is_dir(),
            "{} is not a directory",
            self.root_dir.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_contract() {
        let config = Config::parse_from(["geoip_heatmap"]);
        assert_eq!(config.listen, "127.0.0.1:8080");
        assert_eq!(config.database, ":memory:");
        assert_eq!(config.root_dir, PathBuf::from("public_html"));
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::parse_from([
            "geoip_heatmap",
            "--listen",
            "0.0.0.0:9000",
            "--database",
            "geoip.db",
            "--root-dir",
            "/srv/www",
        ]);
        assert_eq!(config.listen, "0.0.0.0:9000");
        assert_eq!(config.database, "geoip.db");
        assert_eq!(config.root_dir, PathBuf::from("/srv/www"));
    }

    #[test]
    fn validate_rejects_missing_root_dir() {
        let config = Config::parse_from([
            "geoip_heatmap",
            "--root-dir",
            "/definitely/not/a/real/directory",
        ]);
        assert!(config.validate().is_err());
    }
}
