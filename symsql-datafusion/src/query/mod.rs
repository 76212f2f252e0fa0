//! SQL query engine module.
//!
//! This module wires symbol resolution into DataFusion:
//!
//! - `symbolize_address()` and the address helpers are registered as scalar
//!   UDFs (see [`udf`]).
//! - `symbol_index_info()` is registered as a table function (see [`udtf`]).
//! - Input tables come from CSV, Parquet or NDJSON files, or from in-memory
//!   record batches.
//!
//! By default names resolve against the process-wide symbol index, which is
//! built the first time an address is looked up.

pub mod udf;
pub mod udtf;

use std::path::Path;
use std::sync::Arc;

use arrow::array::RecordBatch;
use datafusion::config::ConfigOptions;
use datafusion::prelude::*;
use tracing::debug;

use crate::error::{Error, QueryError};
use symsql_core::{IndexStats, ProcessSymbols, SymbolResolver};

/// Default number of rows per RecordBatch.
pub const DEFAULT_BATCH_SIZE: usize = 8192;

/// Session settings for a [`QueryEngine`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Rows per RecordBatch produced by scans.
    pub batch_size: usize,
    /// Partitions to plan for; `None` keeps DataFusion's default (CPU count).
    pub target_partitions: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            target_partitions: None,
        }
    }
}

fn create_session_context(config: &EngineConfig) -> SessionContext {
    let mut options = ConfigOptions::default();

    options.execution.batch_size = config.batch_size.max(1);
    if let Some(partitions) = config.target_partitions {
        options.execution.target_partitions = partitions.max(1);
    }

    SessionContext::new_with_config(options.into())
}

/// Query engine with symbol resolution functions registered.
pub struct QueryEngine {
    ctx: SessionContext,
    resolver: Arc<dyn SymbolResolver>,
}

impl QueryEngine {
    /// Create a query engine with default settings.
    pub fn new() -> Result<Self, Error> {
        Self::with_config(EngineConfig::default())
    }

    /// Create a query engine resolving against the process-wide symbol index.
    pub fn with_config(config: EngineConfig) -> Result<Self, Error> {
        Self::with_resolver(config, Arc::new(ProcessSymbols))
    }

    /// Create a query engine resolving addresses through `resolver`.
    ///
    /// Useful for tests and for symbol tables loaded from elsewhere.
    pub fn with_resolver(
        config: EngineConfig,
        resolver: Arc<dyn SymbolResolver>,
    ) -> Result<Self, Error> {
        debug!(
            "Creating query engine: batch_size={}, target_partitions={:?}",
            config.batch_size, config.target_partitions
        );
        let ctx = create_session_context(&config);

        udf::register_symbol_udfs(&ctx, resolver.clone())?;
        udf::register_address_udfs(&ctx)?;

        // Register symbol_index_info() table function
        let resolver_for_udtf = resolver.clone();
        let stats_fn = udtf::SymbolIndexInfoFunction::new(move || resolver_for_udtf.stats());
        ctx.register_udtf("symbol_index_info", Arc::new(stats_fn));

        Ok(Self { ctx, resolver })
    }

    /// Register a data file as a table, picking the reader from its extension.
    ///
    /// Supported: `.csv`, `.parquet`, `.json` / `.jsonl` / `.ndjson`
    /// (newline-delimited JSON).
    pub async fn register_file<P: AsRef<Path>>(&self, name: &str, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        let path_str = path.to_string_lossy();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        // Listing tables filter files by extension, so pass the file's own
        let suffix = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();

        debug!("Registering table '{name}' from {path_str}");

        match extension.as_str() {
            "csv" => {
                let options = CsvReadOptions::new().file_extension(&suffix);
                self.ctx.register_csv(name, path_str.as_ref(), options).await?;
            }
            "parquet" => {
                let options = ParquetReadOptions {
                    file_extension: &suffix,
                    ..Default::default()
                };
                self.ctx
                    .register_parquet(name, path_str.as_ref(), options)
                    .await?;
            }
            "json" | "jsonl" | "ndjson" => {
                let options = NdJsonReadOptions::default().file_extension(&suffix);
                self.ctx.register_json(name, path_str.as_ref(), options).await?;
            }
            _ => {
                return Err(Error::Query(QueryError::UnsupportedFile {
                    path: path_str.into_owned(),
                }));
            }
        }

        Ok(())
    }

    /// Register an in-memory batch as a table.
    pub fn register_batch(&self, name: &str, batch: RecordBatch) -> Result<(), Error> {
        self.ctx.register_batch(name, batch)?;
        Ok(())
    }

    /// Execute a SQL query and return results.
    pub async fn query(&self, sql: &str) -> Result<Vec<RecordBatch>, Error> {
        let df = self
            .ctx
            .sql(sql)
            .await
            .map_err(|e| Error::Query(QueryError::from(e)))?;

        let batches = df
            .collect()
            .await
            .map_err(|e| Error::Query(QueryError::from(e)))?;

        Ok(batches)
    }

    /// Names of the registered tables, sorted.
    pub fn table_names(&self) -> Vec<String> {
        let state = self.ctx.state();
        let defaults = &state.config().options().catalog;

        let mut names = self
            .ctx
            .catalog(&defaults.default_catalog)
            .and_then(|catalog| catalog.schema(&defaults.default_schema))
            .map(|schema| schema.table_names())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Get the session context for advanced usage.
    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Current symbol index statistics.
    ///
    /// Returns `None` until the index has been built, or if the resolver
    /// does not track statistics.
    pub fn index_stats(&self) -> Option<IndexStats> {
        self.resolver.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, StringArray, UInt64Array};
    use arrow::datatypes::{DataType, Field, Schema};
    use symsql_core::{Symbol, SymbolIndex};

    fn test_engine() -> QueryEngine {
        let index = SymbolIndex::from_symbols(vec![
            Symbol::new("main", 0x1000, 0x100),
            Symbol::new("helper", 0x2000, 0x40),
        ]);
        QueryEngine::with_resolver(EngineConfig::default(), Arc::new(index)).unwrap()
    }

    fn addresses_batch(values: Vec<u64>) -> RecordBatch {
        let schema = Schema::new(vec![Field::new("addr", DataType::UInt64, false)]);
        RecordBatch::try_new(Arc::new(schema), vec![Arc::new(UInt64Array::from(values))]).unwrap()
    }

    #[test]
    fn test_session_config() {
        let config = EngineConfig {
            batch_size: 1024,
            target_partitions: Some(3),
        };
        let ctx = create_session_context(&config);
        let state = ctx.state();
        let options = state.config().options();
        assert_eq!(options.execution.batch_size, 1024);
        assert_eq!(options.execution.target_partitions, 3);
    }

    #[tokio::test]
    async fn test_query_symbolizes_batch() {
        let engine = test_engine();
        engine
            .register_batch("trace", addresses_batch(vec![0x1000, 0x2010, 0x3000]))
            .unwrap();

        let batches = engine
            .query("SELECT symbolize_address(addr) AS name FROM trace")
            .await
            .unwrap();

        let names: Vec<String> = batches
            .iter()
            .flat_map(|b| {
                let col = b.column(0).as_any().downcast_ref::<StringArray>().unwrap();
                col.iter().map(|v| v.unwrap_or_default().to_string()).collect::<Vec<_>>()
            })
            .collect();
        assert_eq!(names, vec!["main", "helper", ""]);
    }

    #[tokio::test]
    async fn test_index_info_reports_custom_resolver() {
        let engine = test_engine();
        engine
            .register_batch("trace", addresses_batch(vec![0x1000, 0x5000]))
            .unwrap();
        engine
            .query("SELECT symbolize_address(addr) FROM trace")
            .await
            .unwrap();

        let stats = engine.index_stats().unwrap();
        assert_eq!(stats.symbols, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);

        let batches = engine
            .query("SELECT symbols, hits, misses, loaded FROM symbol_index_info()")
            .await
            .unwrap();
        assert_eq!(batches.iter().map(|b| b.num_rows()).sum::<usize>(), 1);
    }

    #[tokio::test]
    async fn test_register_file_unsupported() {
        let engine = test_engine();
        let result = engine.register_file("t", "/tmp/trace.txt").await;
        assert!(matches!(
            result,
            Err(Error::Query(QueryError::UnsupportedFile { .. }))
        ));
    }

    #[test]
    fn test_table_names() {
        let engine = test_engine();
        engine.register_batch("b", addresses_batch(vec![1])).unwrap();
        engine.register_batch("a", addresses_batch(vec![2])).unwrap();
        assert_eq!(engine.table_names(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_query_error() {
        let engine = test_engine();
        let result = engine.query("SELECT * FROM missing_table").await;
        assert!(matches!(result, Err(Error::Query(QueryError::Execution(_)))));
    }
}
