//! Convenient re-exports for common usage.
//!
//! # Example
//!
//! ```rust,no_run
//! use symsql_core::prelude::*;
//!
//! let index = SymbolIndex::from_symbols(vec![Symbol::new("main", 0x1000, 0x100)]);
//! assert_eq!(index.lookup(0x1010).map(Symbol::name), Some("main"));
//! ```

// Symbol types
pub use crate::symbol::{
    process_index, IndexStats, ProcessSymbols, Symbol, SymbolIndex, SymbolResolver,
};

// Error types
pub use crate::error::{Error, Result};
