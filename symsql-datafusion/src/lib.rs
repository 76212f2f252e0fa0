//! symsql-datafusion: SQL address symbolization.
//!
//! This crate provides DataFusion integration for symsql:
//! - `symbolize_address()` UDF resolving UInt64 addresses to function names
//! - Address text helpers (`parse_address()`, `address_to_hex()`)
//! - `symbol_index_info()` table function
//! - Query engine over CSV, Parquet and NDJSON inputs
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use symsql_datafusion::query::QueryEngine;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = QueryEngine::new()?;
//!     engine.register_file("samples", "perf-samples.csv").await?;
//!
//!     let results = engine
//!         .query(
//!             "SELECT symbolize_address(CAST(pc AS BIGINT UNSIGNED)) AS func, COUNT(*) \
//!              FROM samples GROUP BY func",
//!         )
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                      symsql-datafusion                              |
//! +---------------------------------------------------------------------+
//! |  query/        - QueryEngine, UDFs, table functions                 |
//! |  cli/          - Command-line interface and REPL                    |
//! |  error         - DataFusion-specific error types                    |
//! +---------------------------------------------------------------------+
//!                              |
//!                              v
//! +---------------------------------------------------------------------+
//! |                        symsql-core                                  |
//! +---------------------------------------------------------------------+
//! |  Symbol index, load bias via procfs, ELF symbol loading             |
//! +---------------------------------------------------------------------+
//! ```

pub mod cli;
pub mod error;
pub mod query;

// Re-export core for convenience
pub use symsql_core;

// Re-export commonly used types
pub use error::{Error, QueryError, Result, SymbolizeError};
pub use query::{EngineConfig, QueryEngine};
