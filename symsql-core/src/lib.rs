//! # symsql-core
//!
//! Engine-agnostic address-to-symbol resolution.
//!
//! This crate resolves raw code addresses (from stack traces, profilers,
//! crash reports) to the names of the functions that contain them, without
//! any SQL engine dependencies. It is the foundation for the DataFusion
//! integration in `symsql-datafusion`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use symsql_core::prelude::*;
//!
//! fn resolve_self() {
//!     // Built on first call, shared for the rest of the process
//!     let index = process_index();
//!
//!     let address = resolve_self as usize as u64;
//!     if let Some(symbol) = index.lookup(address) {
//!         println!("{:#x} -> {}", address, symbol.name());
//!     }
//! }
//! # resolve_self();
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                        symsql-core                                  |
//! +---------------------------------------------------------------------+
//! |  symbol/     - Symbol, SymbolResolver, SymbolIndex, process index   |
//! |  maps        - load bias from the process memory map (Linux)        |
//! |  error       - Error types                                          |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Limitations
//!
//! - Linux only; other platforms get an empty process index
//! - Only the main executable is indexed, not shared libraries
//! - Names are returned as stored in the symbol table (mangled)

pub mod error;
#[cfg(target_os = "linux")]
pub mod maps;
pub mod prelude;
pub mod symbol;

// Re-export commonly used types at crate root for convenience
pub use error::{Error, Result, SymbolError};
#[cfg(target_os = "linux")]
pub use maps::{load_bias, process_maps, FileId};
pub use symbol::{
    process_index, process_index_if_loaded, IndexStats, ProcessSymbols, Symbol, SymbolIndex,
    SymbolResolver,
};
