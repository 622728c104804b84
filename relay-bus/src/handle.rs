use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};

/// An opaque subscription handle: a monotonic counter paired with a salt
/// generated once per [`crate::EventBus`] instance, so handles from
/// different bus instances never collide even if their counters realign.
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

/// Produce a per-instance salt without depending on a random-number crate:
/// [`RandomState`]'s keys are seeded from the OS on first use, so hashing
/// a fixed input with a freshly constructed one yields an unpredictable
/// (not cryptographically secure) instance identifier.
pub(crate) fn instance_salt() -> u64 {
    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u8(0);
    hasher.finish()
}
