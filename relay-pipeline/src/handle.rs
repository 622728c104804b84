use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};

/// An opaque handler-registration handle: a monotonic counter paired with a
/// salt generated once per [`crate::ActionPipeline`] instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    salt: u64,
    id: u64,
}

impl Handle {
    pub(crate) fn new(salt: u64, id: u64) -> Self {
        Self { salt, id }
    }
}

/// See `relay_bus`'s identical helper: draws unpredictability from a freshly
/// seeded [`RandomState`] rather than pulling in a `rand` dependency.
pub(crate) fn instance_salt() -> u64 {
    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u8(0);
    hasher.finish()
}
