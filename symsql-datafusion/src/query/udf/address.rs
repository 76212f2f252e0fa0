//! Address text conversion UDFs.
//!
//! Profilers and crash reports usually print addresses as hex text, while
//! `symbolize_address()` takes `UInt64`. These functions convert between the
//! two representations.

use std::sync::Arc;

use arrow::array::{Array, StringArray, UInt64Array};
use arrow::datatypes::DataType;
use datafusion::common::{exec_err, Result as DFResult};
use datafusion::logical_expr::{
    ColumnarValue, ScalarFunctionArgs, ScalarUDF, ScalarUDFImpl, Signature, Volatility,
};

/// Create the `parse_address()` UDF that parses address text to UInt64.
///
/// Accepts `0x`-prefixed hex (any case) or plain decimal. Invalid text
/// yields null.
///
/// # Example
/// ```sql
/// SELECT symbolize_address(parse_address(frame)) FROM stacks;
/// ```
pub fn create_parse_address_udf() -> ScalarUDF {
    ScalarUDF::new_from_impl(ParseAddressUdf::new())
}

/// Create the `address_to_hex()` UDF that formats a UInt64 as `0x` hex.
///
/// # Example
/// ```sql
/// SELECT address_to_hex(pc), symbolize_address(pc) FROM samples;
/// -- Returns: "0x000055d0c2a2e7f0", "_ZN4core3ptr..."
/// ```
pub fn create_address_to_hex_udf() -> ScalarUDF {
    ScalarUDF::new_from_impl(AddressToHexUdf::new())
}

// ============================================================================
// parse_address() UDF Implementation
// ============================================================================

#[derive(Debug, PartialEq, Eq, Hash)]
struct ParseAddressUdf {
    signature: Signature,
}

impl ParseAddressUdf {
    fn new() -> Self {
        Self {
            signature: Signature::exact(vec![DataType::Utf8], Volatility::Immutable),
        }
    }
}

impl ScalarUDFImpl for ParseAddressUdf {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn name(&self) -> &str {
        "parse_address"
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn return_type(&self, _arg_types: &[DataType]) -> DFResult<DataType> {
        Ok(DataType::UInt64)
    }

    fn invoke_with_args(&self, args: ScalarFunctionArgs) -> DFResult<ColumnarValue> {
        let args = ColumnarValue::values_to_arrays(&args.args)?;
        let Some(text) = args[0].as_any().downcast_ref::<StringArray>() else {
            return exec_err!("parse_address: expected string array, got {}", args[0].data_type());
        };

        let result: UInt64Array = text.iter().map(|opt| opt.and_then(parse_address)).collect();

        Ok(ColumnarValue::Array(Arc::new(result)))
    }
}

/// Parse hex (`0x` prefix, case-insensitive) or decimal address text.
fn parse_address(text: &str) -> Option<u64> {
    let text = text.trim();

    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) if !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()) => {
            u64::from_str_radix(hex, 16).ok()
        }
        Some(_) => None,
        None => text.parse::<u64>().ok(),
    }
}

// ============================================================================
// address_to_hex() UDF Implementation
// ============================================================================

#[derive(Debug, PartialEq, Eq, Hash)]
struct AddressToHexUdf {
    signature: Signature,
}

impl AddressToHexUdf {
    fn new() -> Self {
        Self {
            signature: Signature::exact(vec![DataType::UInt64], Volatility::Immutable),
        }
    }
}

impl ScalarUDFImpl for AddressToHexUdf {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn name(&self) -> &str {
        "address_to_hex"
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn return_type(&self, _arg_types: &[DataType]) -> DFResult<DataType> {
        Ok(DataType::Utf8)
    }

    fn invoke_with_args(&self, args: ScalarFunctionArgs) -> DFResult<ColumnarValue> {
        let args = ColumnarValue::values_to_arrays(&args.args)?;
        let Some(addresses) = args[0].as_any().downcast_ref::<UInt64Array>() else {
            return exec_err!("address_to_hex: expected UInt64 array, got {}", args[0].data_type());
        };

        let result: StringArray = addresses
            .iter()
            .map(|opt| opt.map(format_address))
            .collect();

        Ok(ColumnarValue::Array(Arc::new(result)))
    }
}

/// Format an address as zero-padded lowercase hex.
pub fn format_address(address: u64) -> String {
    format!("{address:#018x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address_hex() {
        assert_eq!(parse_address("0x7f3a00001000"), Some(0x7f3a_0000_1000));
        assert_eq!(parse_address("0XDEADBEEF"), Some(0xdead_beef));
        assert_eq!(parse_address("0xffffffffffffffff"), Some(u64::MAX));
        assert_eq!(parse_address("  0x10  "), Some(0x10));
    }

    #[test]
    fn test_parse_address_decimal() {
        assert_eq!(parse_address("4096"), Some(4096));
        assert_eq!(parse_address("0"), Some(0));
    }

    #[test]
    fn test_parse_address_invalid() {
        assert_eq!(parse_address(""), None);
        assert_eq!(parse_address("0x"), None);
        assert_eq!(parse_address("0xgg"), None);
        assert_eq!(parse_address("0x+10"), None);
        assert_eq!(parse_address("-1"), None);
        // Too wide for 64 bits
        assert_eq!(parse_address("0x10000000000000000"), None);
    }

    #[test]
    fn test_format_address() {
        assert_eq!(format_address(0), "0x0000000000000000");
        assert_eq!(format_address(0x55d0_c2a2_e7f0), "0x000055d0c2a2e7f0");
        assert_eq!(format_address(u64::MAX), "0xffffffffffffffff");
    }
}
