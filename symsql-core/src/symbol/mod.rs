//! Address-to-symbol resolution.
//!
//! A [`SymbolResolver`] answers one question: which symbol, if any, covers a
//! given address. The main implementation is [`SymbolIndex`], a sorted table
//! of address ranges built either from explicit entries or from the running
//! executable's symbol table.
//!
//! The process-wide index is built on first use and shared by every caller
//! for the rest of the process lifetime (see [`process_index`]).

mod index;
mod process;

pub use index::SymbolIndex;
pub use process::{process_index, process_index_if_loaded, ProcessSymbols};

use std::fmt::Debug;

/// A named address range, typically a function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    name: String,
    address: u64,
    size: u64,
}

impl Symbol {
    pub fn new(name: impl Into<String>, address: u64, size: u64) -> Self {
        Self {
            name: name.into(),
            address,
            size,
        }
    }

    /// Symbol name as stored in the symbol table (not demangled).
    ///
    /// Names loaded from an object file are decoded lossily: bytes that are
    /// not valid UTF-8 become `U+FFFD`, so two distinct raw names can come
    /// back equal.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// First address covered by the symbol.
    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// One past the last covered address, saturating at `u64::MAX`.
    pub fn end(&self) -> u64 {
        self.address.saturating_add(self.size)
    }

    /// Check if an address falls within this symbol's range.
    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.address && addr < self.end()
    }
}

/// Resolves addresses to the symbol covering them.
///
/// Implementations must be thread-safe: the query engine calls `lookup`
/// concurrently from multiple partitions.
pub trait SymbolResolver: Send + Sync + Debug {
    /// Find the symbol whose range covers `address`.
    fn lookup(&self, address: u64) -> Option<&Symbol>;

    /// Index statistics, if the resolver tracks them.
    fn stats(&self) -> Option<IndexStats> {
        None
    }
}

/// Symbol index statistics for monitoring.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndexStats {
    /// File the symbols were read from, if any.
    pub source: Option<String>,
    /// Number of indexed symbols.
    pub symbols: usize,
    /// Runtime load bias applied to symbol addresses.
    pub load_bias: u64,
    /// Number of lookups that found a symbol.
    pub hits: u64,
    /// Number of lookups that found nothing.
    pub misses: u64,
}

impl IndexStats {
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Calculate the hit ratio (hits / total lookups).
    pub fn hit_ratio(&self) -> f64 {
        let total = self.lookups();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Format statistics as a human-readable string.
    pub fn format_summary(&self) -> String {
        let hit_pct = self.hit_ratio() * 100.0;

        format!(
            "Symbol Index:\n\
             \x20 Source:      {}\n\
             \x20 Symbols:     {:>10}\n\
             \x20 Load bias:   {:#x}\n\
             \x20 Lookups:     {:>10}\n\
             \x20 Hits:        {:>10} ({:.1}%)\n\
             \x20 Misses:      {:>10}",
            self.source.as_deref().unwrap_or("<none>"),
            self.symbols,
            self.load_bias,
            self.lookups(),
            self.hits,
            hit_pct,
            self.misses,
        )
    }
}
