//! Address symbolization UDF.
//!
//! `symbolize_address(address)` maps a `UInt64` code address to the name of
//! the symbol covering it, or to an empty string when nothing covers it.
//!
//! ## Example Queries
//!
//! ```sql
//! -- Resolve sampled program counters
//! SELECT symbolize_address(pc) AS func, COUNT(*) AS samples
//! FROM samples GROUP BY func ORDER BY samples DESC;
//!
//! -- Addresses read from CSV are Int64; cast them first
//! SELECT symbolize_address(CAST(addr AS BIGINT UNSIGNED)) FROM frames;
//! ```

use std::any::Any;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, StringBuilder, UInt64Array};
use arrow::datatypes::DataType;
use datafusion::common::{Result as DFResult, ScalarValue};
use datafusion::logical_expr::{
    ColumnarValue, ScalarFunctionArgs, ScalarUDF, ScalarUDFImpl, Signature, Volatility,
};
use symsql_core::{ProcessSymbols, SymbolResolver};

use crate::error::SymbolizeError;

/// Function name as registered with the engine.
pub const SYMBOLIZE_ADDRESS: &str = "symbolize_address";

/// Byte capacity reserved per row for the output string data.
const NAME_CAPACITY_HINT: usize = 32;

/// Create the `symbolize_address()` UDF backed by the process symbol index.
///
/// The index is built on the first invocation, not at registration.
///
/// # Example
/// ```sql
/// SELECT symbolize_address(arrow_cast(4198400, 'UInt64'));
/// ```
pub fn create_symbolize_address_udf() -> ScalarUDF {
    create_symbolize_address_udf_with(Arc::new(ProcessSymbols))
}

/// Create the `symbolize_address()` UDF backed by a custom resolver.
pub fn create_symbolize_address_udf_with(resolver: Arc<dyn SymbolResolver>) -> ScalarUDF {
    ScalarUDF::new_from_impl(SymbolizeAddressUdf::new(resolver))
}

#[derive(Debug)]
pub struct SymbolizeAddressUdf {
    signature: Signature,
    aliases: Vec<String>,
    resolver: Arc<dyn SymbolResolver>,
}

impl SymbolizeAddressUdf {
    pub fn new(resolver: Arc<dyn SymbolResolver>) -> Self {
        Self {
            // coerce_types keeps the argument types, so the planner never casts
            signature: Signature::user_defined(Volatility::Immutable),
            aliases: vec!["address_to_symbol".to_string()],
            resolver,
        }
    }

    fn check_arguments(arg_types: &[DataType]) -> Result<(), SymbolizeError> {
        if arg_types.len() != 1 {
            return Err(SymbolizeError::ArgumentCountMismatch {
                function: SYMBOLIZE_ADDRESS,
                actual: arg_types.len(),
            });
        }

        if arg_types[0] != DataType::UInt64 {
            return Err(SymbolizeError::UnsupportedArgumentType {
                function: SYMBOLIZE_ADDRESS,
                type_name: arg_types[0].to_string(),
            });
        }

        Ok(())
    }
}

// Equal only when both share the same resolver instance.
impl PartialEq for SymbolizeAddressUdf {
    fn eq(&self, other: &Self) -> bool {
        self.signature == other.signature
            && std::ptr::addr_eq(Arc::as_ptr(&self.resolver), Arc::as_ptr(&other.resolver))
    }
}

impl Eq for SymbolizeAddressUdf {}

impl Hash for SymbolizeAddressUdf {
    fn hash<H: Hasher>(&self, state: &mut H) {
        SYMBOLIZE_ADDRESS.hash(state);
        self.signature.hash(state);
    }
}

impl ScalarUDFImpl for SymbolizeAddressUdf {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        SYMBOLIZE_ADDRESS
    }

    fn aliases(&self) -> &[String] {
        &self.aliases
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    // Errors raised here are flattened into a plan error string, so the
    // argument checks run in return_type instead.
    fn coerce_types(&self, arg_types: &[DataType]) -> DFResult<Vec<DataType>> {
        Ok(arg_types.to_vec())
    }

    fn return_type(&self, arg_types: &[DataType]) -> DFResult<DataType> {
        Self::check_arguments(arg_types)?;
        Ok(DataType::Utf8)
    }

    fn invoke_with_args(&self, args: ScalarFunctionArgs) -> DFResult<ColumnarValue> {
        let [address]: [ColumnarValue; 1] =
            args.args
                .try_into()
                .map_err(|args: Vec<ColumnarValue>| SymbolizeError::ArgumentCountMismatch {
                    function: SYMBOLIZE_ADDRESS,
                    actual: args.len(),
                })?;

        match address {
            ColumnarValue::Array(array) => {
                let result = symbolize_array(array.as_ref(), self.resolver.as_ref())?;
                Ok(ColumnarValue::Array(result))
            }
            // Constant argument: resolve once, the engine broadcasts
            ColumnarValue::Scalar(ScalarValue::UInt64(address)) => {
                let name = address.map(|a| resolve_name(self.resolver.as_ref(), a).to_string());
                Ok(ColumnarValue::Scalar(ScalarValue::Utf8(name)))
            }
            ColumnarValue::Scalar(other) => Err(SymbolizeError::ColumnTypeMismatch {
                function: SYMBOLIZE_ADDRESS,
                column_type: other.data_type().to_string(),
            }
            .into()),
        }
    }
}

/// Resolve every address in a `UInt64` array.
///
/// Output row `i` holds the name of the symbol covering input row `i`, the
/// empty string when no symbol covers it, or null when the input is null.
/// The result is fully built before returning; on error nothing is built.
pub fn symbolize_array(
    array: &dyn Array,
    resolver: &dyn SymbolResolver,
) -> Result<ArrayRef, SymbolizeError> {
    let addresses = array
        .as_any()
        .downcast_ref::<UInt64Array>()
        .ok_or_else(|| SymbolizeError::ColumnTypeMismatch {
            function: SYMBOLIZE_ADDRESS,
            column_type: array.data_type().to_string(),
        })?;

    let mut builder =
        StringBuilder::with_capacity(addresses.len(), addresses.len() * NAME_CAPACITY_HINT);

    for address in addresses.iter() {
        match address {
            Some(address) => builder.append_value(resolve_name(resolver, address)),
            None => builder.append_null(),
        }
    }

    Ok(Arc::new(builder.finish()))
}

/// Name of the symbol covering `address`, or `""` when unresolved.
fn resolve_name(resolver: &dyn SymbolResolver, address: u64) -> &str {
    resolver.lookup(address).map_or("", |symbol| symbol.name())
}
