//! Command-line argument definitions.

use clap::Parser;
use std::path::{Path, PathBuf};

use super::OutputFormat;
use crate::query::DEFAULT_BATCH_SIZE;

/// A table registration given as `NAME=PATH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableArg {
    pub name: String,
    pub path: PathBuf,
}

impl TableArg {
    /// Register a file under its stem (`trace.csv` becomes `trace`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_stem()?.to_str()?.to_string();
        Some(Self {
            name,
            path: path.to_path_buf(),
        })
    }
}

/// Parse a `NAME=PATH` table argument.
pub fn parse_table_arg(s: &str) -> Result<TableArg, String> {
    let (name, path) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid table '{s}': expected NAME=PATH"))?;

    let name = name.trim();
    let path = path.trim();
    if name.is_empty() {
        return Err(format!("Invalid table '{s}': empty name"));
    }
    if path.is_empty() {
        return Err(format!("Invalid table '{s}': empty path"));
    }

    Ok(TableArg {
        name: name.to_string(),
        path: PathBuf::from(path),
    })
}

/// Resolve raw addresses to symbol names using SQL.
#[derive(Parser, Debug)]
#[command(name = "symsql")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Data files to query (CSV, Parquet, NDJSON), registered by file stem
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Execute a single SQL query and exit
    #[arg(short = 'e', long = "execute", value_name = "SQL", conflicts_with = "query_file")]
    pub query: Option<String>,

    /// Read SQL query from file
    #[arg(short = 'f', long = "file", value_name = "QUERY_FILE")]
    pub query_file: Option<PathBuf>,

    /// Register a data file under an explicit table name
    #[arg(long = "table", value_name = "NAME=PATH", value_parser = parse_table_arg)]
    pub tables: Vec<TableArg>,

    /// Output format for stdout
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Batch size for processing (rows per batch)
    #[arg(long = "batch-size", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Number of partitions to plan for (defaults to the CPU count)
    #[arg(long = "target-partitions", value_name = "N")]
    pub target_partitions: Option<usize>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Check if we should enter interactive REPL mode.
    pub fn is_interactive(&self) -> bool {
        self.query.is_none() && self.query_file.is_none()
    }

    /// All tables to register: positional files first, then `--table`.
    ///
    /// Files without a usable stem are skipped.
    pub fn table_registrations(&self) -> Vec<TableArg> {
        self.files
            .iter()
            .filter_map(|path| TableArg::from_path(path))
            .chain(self.tables.iter().cloned())
            .collect()
    }

    /// Default log filter for the `-v` count.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
