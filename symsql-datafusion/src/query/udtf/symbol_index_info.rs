//! symbol_index_info() table function for inspecting the symbol index.

use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

use arrow::array::{BooleanBuilder, Float64Builder, RecordBatch, StringBuilder, UInt64Builder};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use async_trait::async_trait;
use datafusion::catalog::Session;
use datafusion::common::Result;
use datafusion::datasource::{TableProvider, TableType};
use datafusion::physical_plan::ExecutionPlan;
use datafusion::prelude::Expr;
use datafusion_catalog::TableFunctionImpl;
use datafusion_datasource::memory::MemorySourceConfig;

use symsql_core::IndexStats;

/// Schema for symbol_index_info() output.
fn symbol_index_info_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("source", DataType::Utf8, true),
        Field::new("symbols", DataType::UInt64, false),
        Field::new("load_bias", DataType::UInt64, false),
        Field::new("lookups", DataType::UInt64, false),
        Field::new("hits", DataType::UInt64, false),
        Field::new("misses", DataType::UInt64, false),
        Field::new("hit_ratio", DataType::Float64, false),
        Field::new("loaded", DataType::Boolean, false),
    ]))
}

/// Build a RecordBatch from IndexStats. `None` means the index is not built yet.
fn stats_to_batch(stats: Option<&IndexStats>) -> Result<RecordBatch> {
    let loaded_flag = stats.is_some();
    let default_stats = IndexStats::default();
    let stats = stats.unwrap_or(&default_stats);

    let mut source = StringBuilder::with_capacity(1, 64);
    let mut symbols = UInt64Builder::with_capacity(1);
    let mut load_bias = UInt64Builder::with_capacity(1);
    let mut lookups = UInt64Builder::with_capacity(1);
    let mut hits = UInt64Builder::with_capacity(1);
    let mut misses = UInt64Builder::with_capacity(1);
    let mut hit_ratio = Float64Builder::with_capacity(1);
    let mut loaded = BooleanBuilder::with_capacity(1);

    source.append_option(stats.source.as_deref());
    symbols.append_value(stats.symbols as u64);
    load_bias.append_value(stats.load_bias);
    lookups.append_value(stats.lookups());
    hits.append_value(stats.hits);
    misses.append_value(stats.misses);
    hit_ratio.append_value(stats.hit_ratio());
    loaded.append_value(loaded_flag);

    RecordBatch::try_new(
        symbol_index_info_schema(),
        vec![
            Arc::new(source.finish()),
            Arc::new(symbols.finish()),
            Arc::new(load_bias.finish()),
            Arc::new(lookups.finish()),
            Arc::new(hits.finish()),
            Arc::new(misses.finish()),
            Arc::new(hit_ratio.finish()),
            Arc::new(loaded.finish()),
        ],
    )
    .map_err(|e| datafusion::error::DataFusionError::ArrowError(Box::new(e), None))
}

/// Table provider that returns a snapshot of symbol index statistics.
#[derive(Debug)]
pub struct SymbolIndexInfoTable {
    stats: Option<IndexStats>,
}

impl SymbolIndexInfoTable {
    pub fn new(stats: Option<IndexStats>) -> Self {
        Self { stats }
    }
}

#[async_trait]
impl TableProvider for SymbolIndexInfoTable {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn schema(&self) -> SchemaRef {
        symbol_index_info_schema()
    }

    fn table_type(&self) -> TableType {
        TableType::Base
    }

    async fn scan(
        &self,
        _state: &dyn Session,
        projection: Option<&Vec<usize>>,
        _filters: &[Expr],
        _limit: Option<usize>,
    ) -> Result<Arc<dyn ExecutionPlan>> {
        let batch = stats_to_batch(self.stats.as_ref())?;
        let schema = self.schema();

        Ok(MemorySourceConfig::try_new_exec(
            &[vec![batch]],
            schema,
            projection.cloned(),
        )? as Arc<dyn ExecutionPlan>)
    }
}

/// Table function implementation for symbol_index_info().
pub struct SymbolIndexInfoFunction {
    /// Reads current stats at call time; must not force an index build.
    stats_fn: Arc<dyn Fn() -> Option<IndexStats> + Send + Sync>,
}

impl Debug for SymbolIndexInfoFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolIndexInfoFunction").finish()
    }
}

impl SymbolIndexInfoFunction {
    pub fn new<F>(stats_fn: F) -> Self
    where
        F: Fn() -> Option<IndexStats> + Send + Sync + 'static,
    {
        Self {
            stats_fn: Arc::new(stats_fn),
        }
    }
}

impl TableFunctionImpl for SymbolIndexInfoFunction {
    fn call(&self, _args: &[Expr]) -> Result<Arc<dyn TableProvider>> {
        Ok(Arc::new(SymbolIndexInfoTable::new((self.stats_fn)())))
    }
}
