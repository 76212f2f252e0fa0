//! User-Defined Table Functions (UDTFs) for symsql.
//!
//! ## Available Functions
//!
//! - `symbol_index_info()` - Returns symbol index statistics as a single-row table
//!
//! ## Example Usage
//!
//! ```sql
//! -- Is the index built, and how many symbols does it hold?
//! SELECT loaded, symbols, source FROM symbol_index_info();
//!
//! -- Resolution rate so far
//! SELECT ROUND(hit_ratio * 100, 1) || '%' AS resolved FROM symbol_index_info();
//! ```

mod symbol_index_info;

pub use symbol_index_info::{SymbolIndexInfoFunction, SymbolIndexInfoTable};
