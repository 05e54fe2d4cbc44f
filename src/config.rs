//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use crate::sqlite::{SqliteConfig, DEFAULT_FETCH_SIZE};
use crate::table::DEFAULT_TABLE;

/// Logging level for the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors
    Plain,
    /// One JSON object per line
    Json,
}

/// Stream, batch and paginate rows of a SQLite users table.
#[derive(Debug, Parser)]
#[command(name = "row_stream", version, about)]
pub struct Config {
    /// SQLite database file
    #[arg(long, env = "ROW_STREAM_DB")]
    pub db: PathBuf,

    /// Table holding user_id, name, email and age
    #[arg(long, env = "ROW_STREAM_TABLE", default_value = DEFAULT_TABLE)]
    pub table: String,

    /// Rows buffered per round trip while streaming
    #[arg(long, default_value_t = DEFAULT_FETCH_SIZE)]
    pub fetch_size: usize,

    /// Milliseconds to wait on a locked database
    #[arg(long, env = "ROW_STREAM_BUSY_TIMEOUT_MS", default_value_t = 5000)]
    pub busy_timeout_ms: u64,

    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    #[arg(long, value_enum, default_value = "plain")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

impl Config {
    pub fn sqlite_config(&self) -> SqliteConfig {
        SqliteConfig::new(&self.db)
            .with_fetch_size(self.fetch_size)
            .with_busy_timeout(Duration::from_millis(self.busy_timeout_ms))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print every record, one per line
    Stream {
        /// Stop after this many records
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print records older than 25, read in batches
    Batches {
        #[arg(long)]
        batch_size: usize,
        /// Skip records whose age is not a number instead of failing
        #[arg(long)]
        skip_malformed: bool,
        /// Emit JSON lines instead of mapping literals
        #[arg(long)]
        json: bool,
    },
    /// Print the table page by page
    Paginate {
        #[arg(long)]
        page_size: usize,
        /// Stop after this many pages
        #[arg(long)]
        max_pages: Option<usize>,
    },
    /// Print the average age
    Average,
}
