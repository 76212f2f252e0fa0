//! Output formatting for query results.
//!
//! UInt64 columns that hold addresses (by name: `address`, `addr`, `pc`,
//! `ip`, or a `_address` / `_addr` suffix) are printed as zero-padded hex.
//! Everything else uses Arrow's display formatting.

use std::io::Write;
use std::sync::Arc;

use arrow::array::{Array, RecordBatch, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use clap::ValueEnum;

use crate::query::udf::format_address;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed table (default)
    Table,
    /// Comma-separated values
    Csv,
    /// JSON Lines (one JSON object per row)
    Json,
}

/// Formats query results for output.
pub struct OutputFormatter {
    format: OutputFormat,
}

/// Whether a column holds addresses that should print as hex.
fn is_address_column(field: &Field) -> bool {
    if field.data_type() != &DataType::UInt64 {
        return false;
    }

    let name = field.name().to_ascii_lowercase();
    matches!(name.as_str(), "address" | "addr" | "pc" | "ip")
        || name.ends_with("_address")
        || name.ends_with("_addr")
}

impl OutputFormatter {
    /// Create a new formatter with the specified format.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Format a RecordBatch and write to the given writer.
    pub fn write<W: Write>(&self, batch: &RecordBatch, writer: &mut W) -> std::io::Result<()> {
        match self.format {
            OutputFormat::Table => self.write_table(batch, writer),
            OutputFormat::Csv => self.write_csv(batch, writer),
            OutputFormat::Json => self.write_json(batch, writer),
        }
    }

    /// Write all batches of a result as one table, CSV or JSON stream.
    pub fn write_batches<W: Write>(
        &self,
        batches: &[RecordBatch],
        writer: &mut W,
    ) -> std::io::Result<()> {
        let Some(first) = batches.first() else {
            return Ok(());
        };

        let batch = arrow::compute::concat_batches(&first.schema(), batches)
            .map_err(std::io::Error::other)?;
        self.write(&batch, writer)
    }

    fn detect_address_columns(schema: &Schema) -> Vec<bool> {
        schema
            .fields()
            .iter()
            .map(|field| is_address_column(field))
            .collect()
    }

    /// Format a single cell value, applying address formatting if applicable.
    fn format_value(col: &Arc<dyn Array>, row_idx: usize, is_address: bool) -> String {
        if col.is_null(row_idx) {
            return String::new();
        }

        if is_address {
            if let Some(arr) = col.as_any().downcast_ref::<UInt64Array>() {
                return format_address(arr.value(row_idx));
            }
        }

        arrow::util::display::array_value_to_string(col, row_idx)
            .unwrap_or_else(|_| "?".to_string())
    }

    fn write_table<W: Write>(&self, batch: &RecordBatch, writer: &mut W) -> std::io::Result<()> {
        use comfy_table::{Cell, Table};

        let address_columns = Self::detect_address_columns(batch.schema().as_ref());

        let mut table = Table::new();

        let headers: Vec<Cell> = batch
            .schema()
            .fields()
            .iter()
            .map(|f| Cell::new(f.name()))
            .collect();
        table.set_header(headers);

        for row_idx in 0..batch.num_rows() {
            let mut row = Vec::with_capacity(batch.num_columns());
            for (col_idx, col) in batch.columns().iter().enumerate() {
                let value = Self::format_value(col, row_idx, address_columns[col_idx]);
                row.push(Cell::new(value));
            }
            table.add_row(row);
        }

        writeln!(writer, "{table}")
    }

    fn write_csv<W: Write>(&self, batch: &RecordBatch, writer: &mut W) -> std::io::Result<()> {
        let address_columns = Self::detect_address_columns(batch.schema().as_ref());

        let schema = batch.schema();
        let headers: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        writeln!(writer, "{}", headers.join(","))?;

        for row_idx in 0..batch.num_rows() {
            let mut values = Vec::with_capacity(batch.num_columns());
            for (col_idx, col) in batch.columns().iter().enumerate() {
                let value = Self::format_value(col, row_idx, address_columns[col_idx]);
                // Mangled C++ names carry commas
                if value.contains(',') || value.contains('"') || value.contains('\n') {
                    values.push(format!("\"{}\"", value.replace('"', "\"\"")));
                } else {
                    values.push(value);
                }
            }
            writeln!(writer, "{}", values.join(","))?;
        }

        Ok(())
    }

    fn write_json<W: Write>(&self, batch: &RecordBatch, writer: &mut W) -> std::io::Result<()> {
        let schema = batch.schema();
        let address_columns = Self::detect_address_columns(schema.as_ref());

        for row_idx in 0..batch.num_rows() {
            let mut obj = serde_json::Map::new();
            for (col_idx, field) in schema.fields().iter().enumerate() {
                let col = batch.column(col_idx);

                let json_value = if col.is_null(row_idx) {
                    serde_json::Value::Null
                } else if address_columns[col_idx] {
                    let value = Self::format_value(col, row_idx, true);
                    serde_json::Value::String(value)
                } else {
                    Self::json_value(col, row_idx)
                };

                obj.insert(field.name().clone(), json_value);
            }

            writeln!(writer, "{}", serde_json::Value::Object(obj))?;
        }

        Ok(())
    }

    /// Convert a non-null cell to JSON, keeping numbers and booleans typed.
    fn json_value(col: &Arc<dyn Array>, row_idx: usize) -> serde_json::Value {
        let value = arrow::util::display::array_value_to_string(col, row_idx)
            .unwrap_or_else(|_| "?".to_string());

        // Symbol names are strings even when they look numeric
        if matches!(col.data_type(), DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View) {
            return serde_json::Value::String(value);
        }

        if let Ok(n) = value.parse::<u64>() {
            serde_json::Value::Number(n.into())
        } else if let Ok(n) = value.parse::<i64>() {
            serde_json::Value::Number(n.into())
        } else if let Ok(n) = value.parse::<f64>() {
            serde_json::json!(n)
        } else if value == "true" {
            serde_json::Value::Bool(true)
        } else if value == "false" {
            serde_json::Value::Bool(false)
        } else {
            serde_json::Value::String(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::StringArray;

    fn create_test_batch() -> RecordBatch {
        let schema = Schema::new(vec![
            Field::new("pc", DataType::UInt64, true),
            Field::new("symbol", DataType::Utf8, true),
            Field::new("samples", DataType::UInt64, true), // Not an address column
        ]);

        let pc = UInt64Array::from(vec![Some(0x55d0_c2a2_e7f0), Some(0), None]);
        let symbol = StringArray::from(vec![Some("_ZN3foo3bar17h0123E"), Some(""), None]);
        let samples = UInt64Array::from(vec![Some(42), Some(7), Some(1)]);

        RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(pc), Arc::new(symbol), Arc::new(samples)],
        )
        .unwrap()
    }

    #[test]
    fn test_address_column_detection() {
        assert!(is_address_column(&Field::new("pc", DataType::UInt64, true)));
        assert!(is_address_column(&Field::new("ADDR", DataType::UInt64, true)));
        assert!(is_address_column(&Field::new("return_address", DataType::UInt64, true)));
        assert!(!is_address_column(&Field::new("samples", DataType::UInt64, true)));
        assert!(!is_address_column(&Field::new("pc", DataType::Int64, true)));
    }

    #[test]
    fn test_table_output_formats_addresses() {
        let batch = create_test_batch();
        let formatter = OutputFormatter::new(OutputFormat::Table);

        let mut output = Vec::new();
        formatter.write(&batch, &mut output).unwrap();

        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains("0x000055d0c2a2e7f0"));
        assert!(output_str.contains("_ZN3foo3bar17h0123E"));
        assert!(output_str.contains("42"), "Count should be preserved");
    }

    #[test]
    fn test_csv_output() {
        let batch = create_test_batch();
        let formatter = OutputFormatter::new(OutputFormat::Csv);

        let mut output = Vec::new();
        formatter.write(&batch, &mut output).unwrap();

        let output_str = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = output_str.lines().collect();
        assert_eq!(lines[0], "pc,symbol,samples");
        assert_eq!(lines[1], "0x000055d0c2a2e7f0,_ZN3foo3bar17h0123E,42");
        assert_eq!(lines[2], "0x0000000000000000,,7");
        assert_eq!(lines[3], ",,1");
    }

    #[test]
    fn test_write_batches_single_header() {
        let batches = vec![create_test_batch(), create_test_batch()];
        let formatter = OutputFormatter::new(OutputFormat::Csv);

        let mut output = Vec::new();
        formatter.write_batches(&batches, &mut output).unwrap();

        let output_str = String::from_utf8(output).unwrap();
        assert_eq!(output_str.lines().count(), 7);
        assert_eq!(output_str.matches("pc,symbol,samples").count(), 1);
    }

    #[test]
    fn test_write_batches_empty() {
        let mut output = Vec::new();
        OutputFormatter::new(OutputFormat::Table)
            .write_batches(&[], &mut output)
            .unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_csv_escapes_commas() {
        let schema = Schema::new(vec![Field::new("symbol", DataType::Utf8, false)]);
        let symbol = StringArray::from(vec!["std::map<int, int>::find"]);
        let batch = RecordBatch::try_new(Arc::new(schema), vec![Arc::new(symbol)]).unwrap();

        let mut output = Vec::new();
        OutputFormatter::new(OutputFormat::Csv)
            .write(&batch, &mut output)
            .unwrap();

        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains("\"std::map<int, int>::find\""));
    }

    #[test]
    fn test_json_output() {
        let batch = create_test_batch();
        let formatter = OutputFormatter::new(OutputFormat::Json);

        let mut output = Vec::new();
        formatter.write(&batch, &mut output).unwrap();

        let output_str = String::from_utf8(output).unwrap();
        let rows: Vec<serde_json::Value> = output_str
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["pc"], "0x000055d0c2a2e7f0");
        assert_eq!(rows[0]["symbol"], "_ZN3foo3bar17h0123E");
        assert_eq!(rows[0]["samples"], 42);
        assert_eq!(rows[1]["symbol"], "");
        assert!(rows[2]["pc"].is_null());
        assert!(rows[2]["symbol"].is_null());
    }
}
