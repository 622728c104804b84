#![deny(rust_2018_compatibility)]
#![deny(rust_2018_idioms)]
#![warn(missing_docs)]
//! A dynamically-typed, path-addressed state tree with re-entrant listener
//! dispatch.
//!
//! Values live at `/`-separated paths (see [`relay_path::NormalizedPath`]);
//! writes auto-create missing intermediate objects, and listeners registered
//! at [`relay_path::Granularity::Node`], [`relay_path::Granularity::DirectChild`],
//! or [`relay_path::Granularity::Subtree`] scopes are notified synchronously
//! as the tree mutates.

mod config;
mod error;
mod event;
mod node;
mod sink;
mod tree;

pub use config::Config;
pub use error::StateError;
pub use event::{Event, EventKind};
pub use node::{Kind, Node, NodeSummary};
pub use relay_path::{Granularity, ListenerId, NormalizedPath};
pub use tree::StateTree;
