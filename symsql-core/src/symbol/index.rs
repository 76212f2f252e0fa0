//! Sorted address-range symbol table.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use super::{IndexStats, Symbol, SymbolResolver};

/// Immutable table of symbols sorted by start address.
///
/// Lookups are a binary search over start addresses followed by a range
/// check against the closest preceding symbol. Hit and miss counters are
/// relaxed atomics so the index can be shared across threads without locks.
#[derive(Debug)]
pub struct SymbolIndex {
    symbols: Vec<Symbol>,
    source: Option<PathBuf>,
    load_bias: u64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SymbolIndex {
    /// Build an index from arbitrary entries.
    ///
    /// Zero-sized and unnamed entries are dropped. When several entries start
    /// at the same address, the first one in input order is kept.
    pub fn from_symbols(mut symbols: Vec<Symbol>) -> Self {
        symbols.retain(|s| s.size() > 0 && !s.name().is_empty());
        symbols.sort_by_key(Symbol::address);
        symbols.dedup_by(|later, earlier| later.address() == earlier.address());

        Self {
            symbols,
            source: None,
            load_bias: 0,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// An index that resolves nothing.
    pub fn empty() -> Self {
        Self::from_symbols(Vec::new())
    }

    /// Record where the symbols came from and the bias already applied.
    pub fn with_source(mut self, source: impl Into<PathBuf>, load_bias: u64) -> Self {
        self.source = Some(source.into());
        self.load_bias = load_bias;
        self
    }

    /// Find the symbol covering `address`.
    pub fn lookup(&self, address: u64) -> Option<&Symbol> {
        let idx = self.symbols.partition_point(|s| s.address() <= address);
        let found = idx
            .checked_sub(1)
            .map(|i| &self.symbols[i])
            .filter(|s| s.contains(address));

        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);

        found
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn load_bias(&self) -> u64 {
        self.load_bias
    }

    /// Iterate over indexed symbols in address order.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    /// Snapshot of the current statistics.
    pub fn get_stats(&self) -> IndexStats {
        IndexStats {
            source: self.source.as_ref().map(|p| p.display().to_string()),
            symbols: self.symbols.len(),
            load_bias: self.load_bias,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl SymbolResolver for SymbolIndex {
    fn lookup(&self, address: u64) -> Option<&Symbol> {
        SymbolIndex::lookup(self, address)
    }

    fn stats(&self) -> Option<IndexStats> {
        Some(self.get_stats())
    }
}
