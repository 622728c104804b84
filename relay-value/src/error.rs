/// Errors produced by [`crate::TypedValueBag`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    /// `register` was called with a key that already has an entry.
    #[error("key already registered")]
    DuplicateKey,
    /// `register` was called with a null pointer.
    #[error("cannot register a null pointer")]
    NullPointer,
    /// No entry exists for the requested key.
    #[error("key not registered")]
    KeyAbsent,
    /// An entry exists, but was registered under a different type.
    #[error("registered as `{registered}`, requested as `{requested}`")]
    TypeMismatch {
        /// The type name the entry was registered with.
        registered: &'static str,
        /// The type name requested by the failing `get`.
        requested: &'static str,
    },
}
