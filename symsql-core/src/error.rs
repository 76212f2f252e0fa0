//! Error types for symsql-core.
//!
//! - [`enum@Error`] - Main error enum that wraps all error types
//! - [`SymbolError`] - Errors from building a symbol index
//!
//! All errors implement `std::error::Error` and can be converted to `anyhow::Error`.

use thiserror::Error;

/// Main error type for symsql-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Error building a symbol index
    #[error("Symbol index error: {0}")]
    Symbol(#[from] SymbolError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error reading the process memory map
    #[cfg(target_os = "linux")]
    #[error("procfs error: {0}")]
    Proc(#[from] procfs::ProcError),
}

/// Errors related to loading symbol tables.
#[derive(Error, Debug)]
pub enum SymbolError {
    /// Process introspection is not available on this platform
    #[error("Symbol index is not supported on {os}")]
    UnsupportedPlatform { os: &'static str },

    /// The executable could not be parsed as an object file
    #[error("Invalid object file {path}: {reason}")]
    InvalidObject { path: String, reason: String },

    /// The executable has no mapping at file offset 0 in the process
    #[error("No load address found for {path}")]
    NoLoadBias { path: String },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
