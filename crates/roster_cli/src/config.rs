//! Command-line and environment configuration.

use clap::Parser;
use roster_core::{default_log_level, LogTarget};
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Database path that selects a private in-memory store.
pub const IN_MEMORY_DATABASE: &str = ":memory:";

/// Roster user-management REST service.
#[derive(Debug, Clone, Parser)]
#[command(name = "roster", version, about)]
pub struct Config {
    /// Socket address the HTTP server listens on.
    #[arg(long, env = "ROSTER_BIND", default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// SQLite database file, or `:memory:` for a throwaway store.
    #[arg(long, env = "ROSTER_DATABASE", default_value = "roster.sqlite3")]
    pub database: String,

    /// One of trace|debug|info|warn|error.
    #[arg(long, env = "ROSTER_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rotated log files; logs go to stderr when unset.
    #[arg(long, env = "ROSTER_LOG_DIR")]
    pub log_dir: Option<String>,

    /// Insert demo users when the store is empty.
    #[arg(long, env = "ROSTER_SEED_SAMPLE_DATA")]
    pub seed_sample_data: bool,

    /// HTTP worker threads; defaults to the number of CPUs.
    #[arg(long, env = "ROSTER_WORKERS")]
    pub workers: Option<NonZeroUsize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    InMemory,
    File(PathBuf),
}

impl Config {
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }

    /// # Errors
    /// - Returns an error when `--log-dir` is empty or relative.
    pub fn log_target(&self) -> Result<LogTarget, String> {
        match self.log_dir.as_deref() {
            None => Ok(LogTarget::Stderr),
            Some(dir) => LogTarget::directory(dir),
        }
    }

    pub fn database_location(&self) -> DatabaseLocation {
        if self.database == IN_MEMORY_DATABASE {
            DatabaseLocation::InMemory
        } else {
            DatabaseLocation::File(PathBuf::from(&self.database))
        }
    }
}
