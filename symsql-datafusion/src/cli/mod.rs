//! Command-line interface module.
//!
//! This module handles:
//! - Argument parsing via clap
//! - Interactive REPL via rustyline
//! - Output formatting (table, CSV, JSON)

mod args;
mod output;
mod repl;

pub use args::{parse_table_arg, Args, TableArg};
pub use output::{OutputFormat, OutputFormatter};
pub use repl::{Repl, ReplCommand, ReplInput};
