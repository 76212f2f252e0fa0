//! Error types for symsql-datafusion.
//!
//! This module provides error types specific to the DataFusion integration,
//! while re-exporting core error types from symsql-core.

use datafusion::error::DataFusionError;
use thiserror::Error;

// Re-export core error types
pub use symsql_core::error::SymbolError;
pub use symsql_core::Error as CoreError;

/// Main error type for symsql-datafusion operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Error from symsql-core (symbol index loading)
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Error during SQL query execution
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to SQL query execution.
#[derive(Error, Debug)]
pub enum QueryError {
    /// Input file type cannot be registered as a table
    #[error("Unsupported input file: {path} (expected .csv, .parquet or .json)")]
    UnsupportedFile { path: String },

    /// `symbolize_address` rejected its arguments or input column
    #[error(transparent)]
    Symbolize(SymbolizeError),

    /// DataFusion error
    #[error("Query execution error: {0}")]
    Execution(String),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(String),
}

impl From<DataFusionError> for QueryError {
    fn from(err: DataFusionError) -> Self {
        match SymbolizeError::find_in(&err) {
            Some(symbolize) => QueryError::Symbolize(symbolize.clone()),
            None => QueryError::Execution(err.to_string()),
        }
    }
}

impl From<arrow::error::ArrowError> for QueryError {
    fn from(err: arrow::error::ArrowError) -> Self {
        QueryError::Arrow(err.to_string())
    }
}

impl From<DataFusionError> for Error {
    fn from(err: DataFusionError) -> Self {
        Error::Query(QueryError::from(err))
    }
}

impl From<arrow::error::ArrowError> for Error {
    fn from(err: arrow::error::ArrowError) -> Self {
        Error::Query(QueryError::from(err))
    }
}

/// Errors raised by `symbolize_address`.
///
/// Signature errors are raised while planning; `ColumnTypeMismatch` is
/// raised while executing. An address without a covering symbol is never
/// an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SymbolizeError {
    /// Wrong number of arguments
    #[error("Function {function} needs exactly one argument; passed {actual}.")]
    ArgumentCountMismatch {
        function: &'static str,
        actual: usize,
    },

    /// Argument is not UInt64
    #[error("The only argument for function {function} must be UInt64. Found {type_name} instead.")]
    UnsupportedArgumentType {
        function: &'static str,
        type_name: String,
    },

    /// Runtime column does not have the UInt64 representation
    #[error("Illegal column {column_type} of argument of function {function}")]
    ColumnTypeMismatch {
        function: &'static str,
        column_type: String,
    },
}

impl SymbolizeError {
    /// Find a `SymbolizeError` anywhere in a DataFusion error chain.
    pub fn find_in(err: &DataFusionError) -> Option<&SymbolizeError> {
        let root: &(dyn std::error::Error + 'static) = err;
        let mut current = Some(root);
        while let Some(e) = current {
            if let Some(found) = e.downcast_ref::<SymbolizeError>() {
                return Some(found);
            }
            current = e.source();
        }
        None
    }
}

impl From<SymbolizeError> for DataFusionError {
    fn from(err: SymbolizeError) -> Self {
        DataFusionError::External(Box::new(err))
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
