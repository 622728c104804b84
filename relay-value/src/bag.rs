use std::any::TypeId;
use std::collections::HashMap;
use std::collections::hash_map::Entry as MapEntry;
use std::hash::Hash;

use crate::error::ValueError;
use crate::sink::DiagnosticSink;

struct Registration {
    ptr: *mut (),
    type_id: TypeId,
    type_name: &'static str,
    #[allow(dead_code)] // kept for future introspection/printing
    description: String,
}

/// A key→value registry that checks the stored type before returning a
/// pointer, without ever owning the pointed-to memory.
///
/// `TypedValueBag` never dereferences what it stores: `register`/`get` deal
/// purely in raw pointers, exactly like a [`crate::Value::Pointer`] leaf in
/// `relay-state`'s tree. Lifetime management is the caller's responsibility.
pub struct TypedValueBag<K> {
    entries: HashMap<K, Registration>,
    sink: DiagnosticSink,
}

impl<K> Default for TypedValueBag<K> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            sink: DiagnosticSink::default(),
        }
    }
}

impl<K> TypedValueBag<K>
where
    K: Eq + Hash,
{
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a diagnostic sink, replacing the default stderr printer.
    pub fn set_diagnostic_sink(&mut self, sink: impl Fn(&str) + 'static) {
        self.sink = DiagnosticSink::new(sink);
    }

    /// Register `ptr` under `key` with the runtime type token for `T`.
    ///
    /// Fails if `key` already has an entry, or if `ptr` is null.
    pub fn register<T: 'static>(&mut self, key: K, ptr: *mut T, description: impl Into<String>) -> Result<(), ValueError> {
        if ptr.is_null() {
            self.sink.report("relay-value: refusing to register a null pointer");
            return Err(ValueError::NullPointer);
        }
        match self.entries.entry(key) {
            MapEntry::Occupied(_) => {
                self.sink.report("relay-value: key already registered");
                Err(ValueError::DuplicateKey)
            }
            MapEntry::Vacant(slot) => {
                slot.insert(Registration {
                    ptr: ptr as *mut (),
                    type_id: TypeId::of::<T>(),
                    type_name: std::any::type_name::<T>(),
                    description: description.into(),
                });
                Ok(())
            }
        }
    }

    /// Look up `key`, succeeding only if it exists and was registered as `T`.
    pub fn get<T: 'static>(&self, key: &K) -> Result<*mut T, ValueError> {
        let entry = self.entries.get(key).ok_or_else(|| {
            self.sink.report("relay-value: key not registered");
            ValueError::KeyAbsent
        })?;
        if entry.type_id != TypeId::of::<T>() {
            let requested = std::any::type_name::<T>();
            self.sink
                .report(&format!("relay-value: registered as `{}`, requested as `{requested}`", entry.type_name));
            return Err(ValueError::TypeMismatch {
                registered: entry.type_name,
                requested,
            });
        }
        Ok(entry.ptr as *mut T)
    }

    /// Whether `key` currently has an entry, regardless of type.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove the entry for `key`, if any. The bag never frees what `ptr`
    /// pointed to: this only forgets the registration.
    pub fn unregister(&mut self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The number of currently registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bag has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
