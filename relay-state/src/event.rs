use relay_path::NormalizedPath;

use crate::node::{Kind, NodeSummary};

/// What happened to a node. Also used as the listener filter type in the
/// underlying [`relay_path::PathTrie`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A node was created where none existed.
    Add,
    /// A node was destroyed.
    Remove,
    /// A subtree was relocated; see [`Event::related_path`].
    Move,
    /// An existing node's value (or, on a kind change, identity) changed.
    Update,
}

/// A record of a single mutation to a [`crate::StateTree`], delivered to
/// matching listeners synchronously, on the caller's thread, during the call
/// that caused it.
#[derive(Debug, Clone)]
pub struct Event {
    /// What kind of mutation occurred.
    pub kind: EventKind,
    /// The path the mutation targeted. For `Move`, the source path.
    pub path: NormalizedPath,
    /// Only set for `Move`: the destination path.
    pub related_path: Option<NormalizedPath>,
    /// The node as of the mutation. `None` only for an attempted removal that
    /// found nothing (in which case no event is emitted at all, so in
    /// practice this is always `Some` on a delivered event).
    pub node: Option<NodeSummary>,
}

impl Event {
    /// The kind of the involved node, or [`Kind::Empty`] if none is carried.
    pub fn node_kind(&self) -> Kind {
        self.node.as_ref().map(NodeSummary::kind).unwrap_or(Kind::Empty)
    }
}
