#![deny(rust_2018_compatibility)]
#![deny(rust_2018_idioms)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
//! Path splitting and the segment trie shared by `relay-state`'s listener
//! model and (as a key type) `relay-bus`/`relay-pipeline`.

mod error;
mod intern;
mod path;
mod trie;

pub use error::PathError;
pub use intern::{intern, resolve, Symbol};
pub use path::{join, split, NormalizedPath};
pub use trie::{Granularity, ListenerId, PathTrie};
