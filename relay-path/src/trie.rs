//! A prefix tree over path segments, storing listener records at nodes and
//! answering node/direct-child/subtree queries in `O(depth)` insertions and
//! `O(depth * listeners at ancestors)` queries.
//!
//! Dispatch in the engines built on this trie is re-entrant: a callback may
//! mutate the structure it is being called from. [`PathTrie::take`] /
//! [`PathTrie::put_back`] exist so a caller can pull a payload out of the
//! trie before invoking it (so the trie no longer aliases it) and put it
//! back afterward, unless the call site decides to drop it (e.g. `once`
//! listeners) or it was removed mid-dispatch, in which case `take` simply
//! returns `None` for the snapshot id and the caller skips it.

use std::collections::{HashMap, HashSet};

use crate::path::NormalizedPath;

/// The scope of a listener's interest relative to its registered path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// Fires only when the mutated path equals the registered path exactly.
    Node,
    /// Fires when the mutated path's parent is the registered path.
    DirectChild,
    /// Fires when the mutated path is the registered path or any descendant.
    Subtree,
}

/// Opaque, process-unique (per [`PathTrie`] instance) identifier for a
/// registered listener. `0` is never issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    const INVALID: ListenerId = ListenerId(0);

    /// The reserved "no listener" id.
    pub const fn invalid() -> Self {
        Self::INVALID
    }

    /// The raw numeric value, for diagnostics.
    pub fn get(&self) -> u64 {
        self.0
    }
}

struct Record<F, T> {
    id: ListenerId,
    filter: F,
    // `None` while a caller is mid-dispatch of this listener (see module docs).
    payload: Option<T>,
}

#[derive(Default)]
struct Node<F, T> {
    children: Vec<(Box<str>, Node<F, T>)>,
    subtree: Vec<Record<F, T>>,
    direct_child: Vec<Record<F, T>>,
    node: Vec<Record<F, T>>,
}

impl<F, T> Node<F, T> {
    fn child_mut(&mut self, name: &str) -> &mut Node<F, T> {
        if let Some(idx) = self.children.iter().position(|(n, _)| n.as_ref() == name) {
            &mut self.children[idx].1
        } else {
            self.children.push((name.into(), Node::default()));
            &mut self.children.last_mut().unwrap().1
        }
    }

    fn child(&self, name: &str) -> Option<&Node<F, T>> {
        self.children.iter().find(|(n, _)| n.as_ref() == name).map(|(_, c)| c)
    }

    fn bucket_mut(&mut self, granularity: Granularity) -> &mut Vec<Record<F, T>> {
        match granularity {
            Granularity::Node => &mut self.node,
            Granularity::DirectChild => &mut self.direct_child,
            Granularity::Subtree => &mut self.subtree,
        }
    }

    fn buckets_mut(&mut self) -> [&mut Vec<Record<F, T>>; 3] {
        [&mut self.node, &mut self.direct_child, &mut self.subtree]
    }

    fn remove_by_id(&mut self, id: ListenerId) -> bool {
        for bucket in self.buckets_mut() {
            if let Some(idx) = bucket.iter().position(|r| r.id == id) {
                bucket.remove(idx);
                return true;
            }
        }
        false
    }

    fn record_mut(&mut self, id: ListenerId) -> Option<&mut Record<F, T>> {
        self.buckets_mut().into_iter().find_map(|bucket| bucket.iter_mut().find(|r| r.id == id))
    }

    fn is_empty_leaf(&self) -> bool {
        self.children.is_empty() && self.node.is_empty() && self.direct_child.is_empty() && self.subtree.is_empty()
    }
}

/// A trie of path segments carrying listener records of payload type `T`,
/// filtered at query time by a caller-supplied event-kind-like type `F`.
pub struct PathTrie<F, T> {
    root: Node<F, T>,
    locations: HashMap<ListenerId, NormalizedPath>,
    next_id: u64,
}

impl<F, T> Default for PathTrie<F, T> {
    fn default() -> Self {
        Self {
            root: Node::default(),
            locations: HashMap::new(),
            next_id: 1,
        }
    }
}

impl<F, T> PathTrie<F, T>
where
    F: Copy + PartialEq,
{
    /// Create an empty trie.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener at `path` with the given granularity and filter,
    /// returning a fresh handle.
    pub fn insert(&mut self, path: &NormalizedPath, granularity: Granularity, filter: F, payload: T) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        let mut node = &mut self.root;
        for seg in path.segments() {
            node = node.child_mut(seg);
        }
        node.bucket_mut(granularity).push(Record {
            id,
            filter,
            payload: Some(payload),
        });
        self.locations.insert(id, path.clone());
        id
    }

    /// Remove a previously-registered listener by handle, wherever its
    /// payload currently stands (present or mid-dispatch).
    ///
    /// Runs in `O(depth)`: the listener's registered path is looked up in the
    /// handle index, so no sibling subtree is scanned.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let Some(path) = self.locations.remove(&id) else {
            return false;
        };
        let Some(node) = Self::navigate_mut(&mut self.root, &path) else {
            return false;
        };
        node.remove_by_id(id)
    }

    /// Take the payload for `id` out of the trie, leaving the record in
    /// place (so its path/granularity/filter survive for [`Self::put_back`])
    /// but absent from further [`Self::query`] results until restored.
    ///
    /// Returns `None` if `id` is unknown or was already taken (or removed).
    pub fn take(&mut self, id: ListenerId) -> Option<T> {
        let path = self.locations.get(&id)?;
        let node = Self::navigate_mut(&mut self.root, path)?;
        node.record_mut(id)?.payload.take()
    }

    /// Restore a payload previously removed with [`Self::take`]. A no-op if
    /// `id` was unregistered (via [`Self::remove`]) in the meantime.
    pub fn put_back(&mut self, id: ListenerId, payload: T) {
        let Some(path) = self.locations.get(&id) else {
            return;
        };
        if let Some(node) = Self::navigate_mut(&mut self.root, path) {
            if let Some(record) = node.record_mut(id) {
                record.payload = Some(payload);
            }
        }
    }

    fn navigate_mut<'a>(mut node: &'a mut Node<F, T>, path: &NormalizedPath) -> Option<&'a mut Node<F, T>> {
        for seg in path.segments() {
            node = node_child_mut_checked(node, seg)?;
        }
        Some(node)
    }

    /// Whether any listener is registered at `path` (any granularity).
    pub fn has_listeners_at(&self, path: &NormalizedPath) -> bool {
        let mut node = &self.root;
        for seg in path.segments() {
            match node.child(seg) {
                Some(n) => node = n,
                None => return false,
            }
        }
        !node.node.is_empty() || !node.direct_child.is_empty() || !node.subtree.is_empty()
    }

    /// Query the ids of listeners matching `path` and `filter`, in delivery
    /// order: ancestor subtree listeners (root-to-leaf), then the parent's
    /// direct-child listeners, then the node's own node listeners. Each id
    /// appears at most once. Listeners currently mid-dispatch (their
    /// payload is taken) are skipped.
    pub fn query(&self, path: &NormalizedPath, filter: F) -> Vec<ListenerId> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut node = &self.root;
        let segs: Vec<&str> = path.segments().collect();

        // Subtree listeners at every ancestor including the target itself.
        Self::collect(node, filter, Granularity::Subtree, &mut seen, &mut out);
        let mut parent: Option<&Node<F, T>> = None;
        for seg in &segs {
            parent = Some(node);
            match node.child(seg) {
                Some(n) => node = n,
                None => {
                    // No node exists at this depth: no further subtree/node/direct_child
                    // records can exist past this point either.
                    return out;
                }
            }
            Self::collect(node, filter, Granularity::Subtree, &mut seen, &mut out);
        }
        // The root has no parent, so DirectChild listeners never fire for a root query.
        if let Some(parent) = parent {
            Self::collect(parent, filter, Granularity::DirectChild, &mut seen, &mut out);
        }
        Self::collect(node, filter, Granularity::Node, &mut seen, &mut out);
        out
    }

    fn collect(node: &Node<F, T>, filter: F, granularity: Granularity, seen: &mut HashSet<ListenerId>, out: &mut Vec<ListenerId>) {
        let bucket = match granularity {
            Granularity::Node => &node.node,
            Granularity::DirectChild => &node.direct_child,
            Granularity::Subtree => &node.subtree,
        };
        for record in bucket {
            if record.payload.is_some() && record.filter == filter && seen.insert(record.id) {
                out.push(record.id);
            }
        }
    }

    /// Drop any now-empty trie nodes left behind after repeated removals.
    /// Purely a memory-housekeeping pass; correctness does not depend on it.
    pub fn prune(&mut self) {
        fn prune_node<F, T>(node: &mut Node<F, T>) {
            node.children.retain_mut(|(_, child)| {
                prune_node(child);
                !child.is_empty_leaf()
            });
        }
        prune_node(&mut self.root);
    }
}

fn node_child_mut_checked<'a, F, T>(node: &'a mut Node<F, T>, name: &str) -> Option<&'a mut Node<F, T>> {
    node.children.iter_mut().find(|(n, _)| n.as_ref() == name).map(|(_, c)| c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Kind {
        Add,
        Remove,
    }

    #[test]
    fn subtree_fires_for_descendants_and_self() {
        let mut trie: PathTrie<Kind, &'static str> = PathTrie::new();
        trie.insert(&NormalizedPath::new("x"), Granularity::Subtree, Kind::Add, "sub-x");
        assert_eq!(trie.query(&NormalizedPath::new("x"), Kind::Add).len(), 1);
        assert_eq!(trie.query(&NormalizedPath::new("x/y/z"), Kind::Add).len(), 1);
        assert!(trie.query(&NormalizedPath::new("other"), Kind::Add).is_empty());
    }

    #[test]
    fn direct_child_fires_only_for_immediate_children() {
        let mut trie: PathTrie<Kind, &'static str> = PathTrie::new();
        trie.insert(&NormalizedPath::new("x"), Granularity::DirectChild, Kind::Add, "dc-x");
        assert!(trie.query(&NormalizedPath::new("x"), Kind::Add).is_empty());
        assert_eq!(trie.query(&NormalizedPath::new("x/y"), Kind::Add).len(), 1);
        assert!(trie.query(&NormalizedPath::new("x/y/z"), Kind::Add).is_empty());
    }

    #[test]
    fn node_fires_only_for_exact_path() {
        let mut trie: PathTrie<Kind, &'static str> = PathTrie::new();
        trie.insert(&NormalizedPath::new("x/y"), Granularity::Node, Kind::Add, "node-xy");
        assert_eq!(trie.query(&NormalizedPath::new("x/y"), Kind::Add).len(), 1);
        assert!(trie.query(&NormalizedPath::new("x"), Kind::Add).is_empty());
        assert!(trie.query(&NormalizedPath::new("x/y/z"), Kind::Add).is_empty());
    }

    #[test]
    fn filter_by_event_kind() {
        let mut trie: PathTrie<Kind, &'static str> = PathTrie::new();
        trie.insert(&NormalizedPath::new("x"), Granularity::Subtree, Kind::Add, "add-only");
        assert!(trie.query(&NormalizedPath::new("x"), Kind::Remove).is_empty());
    }

    #[test]
    fn delivery_order_is_subtree_then_direct_child_then_node() {
        let mut trie: PathTrie<Kind, &'static str> = PathTrie::new();
        let subtree = trie.insert(&NormalizedPath::new("x"), Granularity::Subtree, Kind::Add, "subtree");
        trie.insert(&NormalizedPath::new("x"), Granularity::DirectChild, Kind::Add, "direct-child-of-x-parent");
        // "x" is queried directly, so the DirectChild bucket that applies is the one
        // registered at "x"'s parent (root), not at "x" itself.
        let direct_child = trie.insert(&NormalizedPath::root(), Granularity::DirectChild, Kind::Add, "direct-child");
        let node = trie.insert(&NormalizedPath::new("x"), Granularity::Node, Kind::Add, "node");
        let got = trie.query(&NormalizedPath::new("x"), Kind::Add);
        assert_eq!(got, vec![subtree, direct_child, node]);
    }

    #[test]
    fn remove_by_handle_then_query_finds_nothing() {
        let mut trie: PathTrie<Kind, &'static str> = PathTrie::new();
        let id = trie.insert(&NormalizedPath::new("x"), Granularity::Subtree, Kind::Add, "gone");
        assert!(trie.remove(id));
        assert!(trie.query(&NormalizedPath::new("x"), Kind::Add).is_empty());
        assert!(!trie.remove(id));
    }

    #[test]
    fn take_hides_then_put_back_restores() {
        let mut trie: PathTrie<Kind, &'static str> = PathTrie::new();
        let id = trie.insert(&NormalizedPath::new("x"), Granularity::Subtree, Kind::Add, "payload");
        let payload = trie.take(id).unwrap();
        assert!(trie.query(&NormalizedPath::new("x"), Kind::Add).is_empty());
        assert!(trie.take(id).is_none());
        trie.put_back(id, payload);
        assert_eq!(trie.query(&NormalizedPath::new("x"), Kind::Add), vec![id]);
    }

    #[test]
    fn removed_while_taken_stays_gone_after_put_back() {
        let mut trie: PathTrie<Kind, &'static str> = PathTrie::new();
        let id = trie.insert(&NormalizedPath::new("x"), Granularity::Subtree, Kind::Add, "payload");
        let payload = trie.take(id).unwrap();
        assert!(trie.remove(id));
        trie.put_back(id, payload);
        assert!(trie.query(&NormalizedPath::new("x"), Kind::Add).is_empty());
    }

    #[test]
    fn no_listener_id_appears_twice() {
        let mut trie: PathTrie<Kind, &'static str> = PathTrie::new();
        trie.insert(&NormalizedPath::root(), Granularity::Subtree, Kind::Add, "root-subtree");
        trie.insert(&NormalizedPath::new("a"), Granularity::Subtree, Kind::Add, "a-subtree");
        let got = trie.query(&NormalizedPath::new("a/b"), Kind::Add);
        let mut ids = got.clone();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), got.len());
    }

    #[test]
    fn prune_removes_emptied_nodes() {
        let mut trie: PathTrie<Kind, &'static str> = PathTrie::new();
        let id = trie.insert(&NormalizedPath::new("a/b/c"), Granularity::Node, Kind::Add, "leaf");
        trie.remove(id);
        trie.prune();
        assert!(trie.root.children.is_empty());
    }
}
