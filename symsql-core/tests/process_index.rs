//! Process symbol index integration tests.
//!
//! These run against the test binary itself: the index is built from its
//! own symbol table and must resolve functions defined here.

use symsql_core::{process_index, ProcessSymbols, Symbol, SymbolResolver};

#[no_mangle]
#[inline(never)]
pub extern "C" fn symsql_core_marker_fn(x: u64) -> u64 {
    x.wrapping_mul(31).rotate_left(7)
}

fn marker_address() -> u64 {
    symsql_core_marker_fn as usize as u64
}

#[cfg(target_os = "linux")]
#[test]
fn test_resolves_known_function() {
    // Keep the marker function alive and observable
    assert_eq!(symsql_core_marker_fn(0), 0);

    let symbol = process_index()
        .lookup(marker_address())
        .expect("marker function should resolve");
    assert_eq!(symbol.name(), "symsql_core_marker_fn");
    assert!(symbol.contains(marker_address()));
}

#[cfg(target_os = "linux")]
#[test]
fn test_resolves_inside_function_body() {
    let symbol = process_index().lookup(marker_address()).unwrap();
    let inside = symbol.address() + symbol.size() - 1;
    assert_eq!(
        process_index().lookup(inside).map(Symbol::name),
        Some("symsql_core_marker_fn")
    );
}

#[test]
fn test_unresolvable_addresses() {
    assert!(process_index().lookup(0).is_none());
    assert!(process_index().lookup(u64::MAX).is_none());
}

#[test]
fn test_lookup_is_idempotent() {
    let first = ProcessSymbols.lookup(marker_address()).cloned();
    let second = ProcessSymbols.lookup(marker_address()).cloned();
    assert_eq!(first, second);
}

#[test]
fn test_concurrent_first_use() {
    let handles: Vec<_> = (0..8)
        .map(|_| std::thread::spawn(|| process_index() as *const _ as usize))
        .collect();

    let pointers: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(pointers.windows(2).all(|w| w[0] == w[1]));
}
