//! The process-wide symbol index.
//!
//! Built on first use from the running executable's ELF symbol table and
//! kept for the rest of the process lifetime. Only the main executable is
//! indexed; addresses inside shared libraries do not resolve.

use std::sync::OnceLock;

use tracing::{debug, info, warn};

use super::{IndexStats, Symbol, SymbolIndex, SymbolResolver};
use crate::error::Result;

static PROCESS_INDEX: OnceLock<SymbolIndex> = OnceLock::new();

/// Get the process-wide symbol index, building it on first call.
///
/// Concurrent first calls block until a single build finishes. A failed
/// build is logged and leaves an empty index behind, so lookups simply miss.
pub fn process_index() -> &'static SymbolIndex {
    PROCESS_INDEX.get_or_init(|| match SymbolIndex::load_process() {
        Ok(index) => {
            info!(
                "Symbol index ready: {} symbols, load bias {:#x}",
                index.len(),
                index.load_bias()
            );
            index
        }
        Err(e) => {
            warn!("Failed to build symbol index, addresses will not resolve: {e}");
            SymbolIndex::empty()
        }
    })
}

/// Get the process-wide index only if it has already been built.
pub fn process_index_if_loaded() -> Option<&'static SymbolIndex> {
    PROCESS_INDEX.get()
}

/// Resolver backed by the process-wide index.
///
/// Holding one does not build the index; the first `lookup` does.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ProcessSymbols;

impl SymbolResolver for ProcessSymbols {
    fn lookup(&self, address: u64) -> Option<&Symbol> {
        process_index().lookup(address)
    }

    fn stats(&self) -> Option<IndexStats> {
        process_index_if_loaded().map(SymbolIndex::get_stats)
    }
}

impl SymbolIndex {
    /// Build an index from the running executable.
    ///
    /// Reads `/proc/self/exe`, collects defined function symbols (from
    /// `.symtab`, or `.dynsym` for stripped binaries) and shifts them by the
    /// load bias found in the process memory map.
    #[cfg(target_os = "linux")]
    pub fn load_process() -> Result<Self> {
        use object::{Object, ObjectSegment};

        use crate::error::SymbolError;
        use crate::maps::{load_bias, process_maps, FileId};

        let exe_path = std::env::current_exe()?;
        let path_str = exe_path.display().to_string();
        debug!("Loading symbols from {path_str}");

        let data = std::fs::read("/proc/self/exe")?;
        let file = object::File::parse(&*data).map_err(|e| SymbolError::InvalidObject {
            path: path_str.clone(),
            reason: e.to_string(),
        })?;

        let segment_vaddr = file
            .segments()
            .find(|s| s.file_range().0 == 0)
            .map(|s| s.address())
            .unwrap_or(0);

        let exe_id = FileId::of(std::path::Path::new("/proc/self/exe"))
            .inspect_err(|e| debug!("Could not stat /proc/self/exe, matching by path: {e}"))
            .ok();
        let maps = process_maps()?;
        let bias = load_bias(&maps, exe_id, &exe_path, segment_vaddr).ok_or_else(|| {
            SymbolError::NoLoadBias {
                path: path_str.clone(),
            }
        })?;
        debug!("Load bias for {path_str}: {bias:#x}");

        let mut symbols = function_symbols(file.symbols(), bias);
        if symbols.is_empty() {
            debug!("No .symtab entries in {path_str}, falling back to .dynsym");
            symbols = function_symbols(file.dynamic_symbols(), bias);
        }

        Ok(Self::from_symbols(symbols).with_source(exe_path, bias))
    }

    /// Build an index from the running executable.
    #[cfg(not(target_os = "linux"))]
    pub fn load_process() -> Result<Self> {
        Err(crate::error::SymbolError::UnsupportedPlatform {
            os: std::env::consts::OS,
        }
        .into())
    }
}

/// Defined, sized text symbols shifted by `bias`.
#[cfg(target_os = "linux")]
fn function_symbols<'data, S>(symbols: impl Iterator<Item = S>, bias: u64) -> Vec<Symbol>
where
    S: object::ObjectSymbol<'data>,
{
    symbols
        .filter(|s| s.kind() == object::SymbolKind::Text && s.is_definition() && s.size() > 0)
        .filter_map(|s| {
            let name = String::from_utf8_lossy(s.name_bytes().ok()?).into_owned();
            Some(Symbol::new(name, s.address().wrapping_add(bias), s.size()))
        })
        .collect()
}
