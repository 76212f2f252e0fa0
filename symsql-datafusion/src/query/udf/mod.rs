//! User-Defined Functions (UDFs) for address symbolization.
//!
//! ## Symbol Functions
//!
//! - `symbolize_address(addr)` - Name of the function covering a UInt64
//!   address in the running executable, `''` if none (alias `address_to_symbol`)
//!
//! ## Address Functions
//!
//! - `parse_address('0x7f3a00001000')` - Parse hex or decimal text to UInt64
//! - `address_to_hex(addr)` - Format a UInt64 as zero-padded `0x` hex
//!
//! ## Example Queries
//!
//! ```sql
//! -- Resolve sampled program counters
//! SELECT symbolize_address(pc) AS func, COUNT(*) AS samples
//! FROM profile GROUP BY func ORDER BY samples DESC;
//!
//! -- Addresses stored as text
//! SELECT address_to_hex(parse_address(frame)), symbolize_address(parse_address(frame))
//! FROM stacks;
//!
//! -- Signed integer columns need an explicit cast
//! SELECT symbolize_address(CAST(addr AS BIGINT UNSIGNED)) FROM trace;
//! ```

mod address;
mod symbolize;

pub use address::{create_address_to_hex_udf, create_parse_address_udf, format_address};
pub use symbolize::{
    create_symbolize_address_udf, create_symbolize_address_udf_with, symbolize_array,
    SymbolizeAddressUdf, SYMBOLIZE_ADDRESS,
};

use std::sync::Arc;

use crate::error::Error;
use datafusion::prelude::SessionContext;
use symsql_core::SymbolResolver;

/// Register symbol resolution UDFs backed by `resolver`.
pub fn register_symbol_udfs(
    ctx: &SessionContext,
    resolver: Arc<dyn SymbolResolver>,
) -> Result<(), Error> {
    ctx.register_udf(create_symbolize_address_udf_with(resolver));
    Ok(())
}

/// Register address text conversion UDFs with the DataFusion context.
pub fn register_address_udfs(ctx: &SessionContext) -> Result<(), Error> {
    ctx.register_udf(create_parse_address_udf());
    ctx.register_udf(create_address_to_hex_udf());
    Ok(())
}

/// Register ALL UDFs with the DataFusion context.
///
/// `symbolize_address()` resolves against the process-wide symbol index.
/// Use `register_symbol_udfs()` directly to supply another resolver.
pub fn register_all_udfs(ctx: &SessionContext) -> Result<(), Error> {
    ctx.register_udf(create_symbolize_address_udf());
    register_address_udfs(ctx)?;
    Ok(())
}
