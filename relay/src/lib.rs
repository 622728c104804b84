#![deny(rust_2018_compatibility)]
#![deny(rust_2018_idioms)]
#![warn(missing_docs)]
//! Relay bundles three small, independently-useful engines behind one
//! crate: a path-addressed [`state`] tree, a type-erased [`bus`], and a
//! six-stage [`pipeline`]. Each is re-entrancy-safe: handlers may call back
//! into the engine that invoked them without deadlocking or corrupting
//! dispatch, via a take/put-back discipline described on each engine's
//! `execute`/`emit`/`publish` method.
//!
//! Pull in just the satellite crate you need (`relay-state`, `relay-bus`,
//! `relay-pipeline`, `relay-value`, `relay-path`) or depend on `relay` for
//! all of them under one name.

/// Path parsing, interning, and the trie used to index listeners by path.
pub mod path {
    pub use relay_path::{intern, join, resolve, split, Granularity, ListenerId, NormalizedPath, PathError, PathTrie, Symbol};
}

/// A type-checked, non-owning registry of pointers keyed by an arbitrary
/// key type.
pub mod value {
    pub use relay_value::{TypedValueBag, ValueError};
}

/// A dynamically-typed, path-addressed state tree with re-entrant listener
/// dispatch.
pub mod state {
    pub use relay_state::{Config, Event, EventKind, Kind, Node, NodeSummary, StateError, StateTree};
    pub use relay_path::{Granularity, ListenerId, NormalizedPath};
}

/// A type-erased, re-entrancy-safe multicast/unicast event bus.
pub mod bus {
    pub use relay_bus::{EventBus, Handle, Mode, PublishResult, Signature};
}

/// A six-stage validate/process/notify action pipeline with overload
/// support.
pub mod pipeline {
    pub use relay_pipeline::{ActionPipeline, ActionResult, DiagnosticSink, Handle, PipelineError, Signature};
}
