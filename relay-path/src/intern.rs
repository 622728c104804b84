//! A process-wide, append-only string interner.
//!
//! This is the one piece of the toolkit that is thread-safe: `EventBus` and
//! `ActionPipeline` keys may be interned [`Symbol`]s shared across call
//! sites that do not otherwise coordinate.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

/// An interned string handle. Cheap to copy, compare, and hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(NonZeroU32);

struct Table {
    ids: HashMap<Arc<str>, Symbol>,
    strings: Vec<Arc<str>>,
}

impl Table {
    fn new() -> Self {
        Self {
            ids: HashMap::new(),
            strings: Vec::new(),
        }
    }
}

static TABLE: Lazy<Mutex<Table>> = Lazy::new(|| Mutex::new(Table::new()));

/// Intern `s`, returning its stable process-wide [`Symbol`].
///
/// Interning the same string (by value) always returns the same symbol;
/// ids are never reissued and the underlying string slot is append-only.
pub fn intern(s: &str) -> Symbol {
    let mut table = TABLE.lock().expect("intern table poisoned");
    if let Some(sym) = table.ids.get(s) {
        return *sym;
    }
    let arc: Arc<str> = Arc::from(s);
    table.strings.push(arc.clone());
    let idx = table.strings.len() as u32;
    let sym = Symbol(NonZeroU32::new(idx).expect("interned index is never zero"));
    table.ids.insert(arc, sym);
    sym
}

/// Resolve a [`Symbol`] back to its string.
///
/// Panics if `sym` was not produced by [`intern`] in this process: symbols
/// are not meaningful across processes and must never be persisted.
pub fn resolve(sym: Symbol) -> Arc<str> {
    let table = TABLE.lock().expect("intern table poisoned");
    table.strings[sym.0.get() as usize - 1].clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_the_same_string_is_idempotent() {
        let a = intern("hello");
        let b = intern("hello");
        assert_eq!(a, b);
        assert_eq!(&*resolve(a), "hello");
    }

    #[test]
    fn distinct_strings_get_distinct_symbols() {
        let a = intern("distinct-a");
        let b = intern("distinct-b");
        assert_ne!(a, b);
    }

    #[test]
    fn concurrent_interning_never_reissues_ids() {
        use std::thread;
        let handles: Vec<_> = (0..8)
            .map(|i| thread::spawn(move || intern(&format!("concurrent-{}", i % 4))))
            .collect();
        let mut syms: Vec<Symbol> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        syms.sort();
        syms.dedup();
        assert_eq!(syms.len(), 4);
    }
}
