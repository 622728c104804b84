use relay_path::{Granularity, ListenerId, NormalizedPath, PathTrie};

use crate::config::Config;
use crate::error::StateError;
use crate::event::{Event, EventKind};
use crate::node::{Kind, Node, NodeSummary};
use crate::sink::DiagnosticSink;

struct ListenerEntry {
    once: bool,
    callback: Box<dyn FnMut(&Event, &mut StateTree)>,
}

/// A dynamically-typed, path-addressed tree with listener dispatch.
///
/// The root is always an `Object` and always exists; every other node has
/// exactly one parent. Writes auto-create missing intermediate objects;
/// listeners are registered against [`Granularity`] scopes and are notified
/// synchronously, on the caller's thread, during the call that mutated the
/// tree. Re-entrant mutation from within a listener callback is supported:
/// callbacks receive `&mut StateTree` directly rather than through interior
/// mutability, so a callback may itself call back into the tree it was
/// invoked from.
pub struct StateTree {
    root: Node,
    listeners: PathTrie<EventKind, ListenerEntry>,
    sink: DiagnosticSink,
    events_enabled: bool,
    config: Config,
}

impl Default for StateTree {
    fn default() -> Self {
        Self {
            root: Node::empty_object(NormalizedPath::root()),
            listeners: PathTrie::new(),
            sink: DiagnosticSink::default(),
            events_enabled: true,
            config: Config::default(),
        }
    }
}

impl StateTree {
    /// Create an empty tree: a single root `Object` with no children.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tree using the given [`Config`] instead of the
    /// default print width and allocation capacity.
    pub fn with_config(config: Config) -> Self {
        Self { config, ..Self::default() }
    }

    /// Install a diagnostic sink, replacing the default stderr printer.
    pub fn set_diagnostic_sink(&mut self, sink: impl Fn(&str) + 'static) {
        self.sink = DiagnosticSink::new(sink);
    }

    /// Stop delivering events. Mutations still happen; only notification is
    /// suppressed.
    pub fn disable_events(&mut self) {
        self.events_enabled = false;
    }

    /// Resume delivering events.
    pub fn enable_events(&mut self) {
        self.events_enabled = true;
    }

    // --- reads -----------------------------------------------------------

    /// Whether a node exists at `path`. The root always has one.
    pub fn has(&self, path: &NormalizedPath) -> bool {
        find(&self.root, path).is_some()
    }

    /// The kind of node at `path`, or [`Kind::Empty`] if none exists.
    pub fn type_of(&self, path: &NormalizedPath) -> Kind {
        find(&self.root, path).map(Node::kind).unwrap_or(Kind::Empty)
    }

    /// The names of `path`'s direct children, in insertion order, or `None`
    /// if `path` does not resolve to an `Object`.
    pub fn children(&self, path: &NormalizedPath) -> Option<Vec<Box<str>>> {
        match find(&self.root, path)? {
            Node::Object { children, .. } => Some(children.iter().map(|(n, _)| n.clone()).collect()),
            _ => None,
        }
    }

    /// The integer at `path`, if it exists and is an `Int`.
    pub fn get_int(&self, path: &NormalizedPath) -> Option<i32> {
        match find(&self.root, path) {
            Some(Node::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// [`Self::get_int`], or `default` if absent/mismatched.
    pub fn get_or_int(&self, path: &NormalizedPath, default: i32) -> i32 {
        self.get_int(path).unwrap_or(default)
    }

    /// The float at `path`, if it exists and is a `Float`.
    pub fn get_float(&self, path: &NormalizedPath) -> Option<f32> {
        match find(&self.root, path) {
            Some(Node::Float(v)) => Some(*v),
            _ => None,
        }
    }

    /// [`Self::get_float`], or `default` if absent/mismatched.
    pub fn get_or_float(&self, path: &NormalizedPath, default: f32) -> f32 {
        self.get_float(path).unwrap_or(default)
    }

    /// The bool at `path`, if it exists and is a `Bool`.
    pub fn get_bool(&self, path: &NormalizedPath) -> Option<bool> {
        match find(&self.root, path) {
            Some(Node::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    /// [`Self::get_bool`], or `default` if absent/mismatched.
    pub fn get_or_bool(&self, path: &NormalizedPath, default: bool) -> bool {
        self.get_bool(path).unwrap_or(default)
    }

    /// The pointer at `path`, if it exists and is a `Pointer`.
    pub fn get_pointer(&self, path: &NormalizedPath) -> Option<*mut ()> {
        match find(&self.root, path) {
            Some(Node::Pointer(p)) => Some(*p),
            _ => None,
        }
    }

    /// [`Self::get_pointer`], or `default` if absent/mismatched.
    pub fn get_or_pointer(&self, path: &NormalizedPath, default: *mut ()) -> *mut () {
        self.get_pointer(path).unwrap_or(default)
    }

    /// The string at `path`, if it exists and is a `String`.
    pub fn get_string(&self, path: &NormalizedPath) -> Option<&str> {
        match find(&self.root, path) {
            Some(Node::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// [`Self::get_string`], or `default` if absent/mismatched.
    pub fn get_or_string<'a>(&'a self, path: &NormalizedPath, default: &'a str) -> &'a str {
        self.get_string(path).unwrap_or(default)
    }

    // --- writes ------------------------------------------------------------

    /// Set (creating or replacing) the integer at `path`.
    pub fn set_int(&mut self, path: &NormalizedPath, value: i32) {
        self.write(path, Node::Int(value));
    }

    /// Set (creating or replacing) the float at `path`.
    pub fn set_float(&mut self, path: &NormalizedPath, value: f32) {
        self.write(path, Node::Float(value));
    }

    /// Set (creating or replacing) the bool at `path`.
    pub fn set_bool(&mut self, path: &NormalizedPath, value: bool) {
        self.write(path, Node::Bool(value));
    }

    /// Set (creating or replacing) the pointer at `path`.
    pub fn set_pointer(&mut self, path: &NormalizedPath, value: *mut ()) {
        self.write(path, Node::Pointer(value));
    }

    /// Set (creating or replacing) the string at `path`.
    pub fn set_string(&mut self, path: &NormalizedPath, value: impl Into<String>) {
        self.write(path, Node::String(value.into()));
    }

    /// Set (creating or replacing) an `Object` at `path` with the given
    /// children. Child paths are rewritten to be rooted at `path`,
    /// regardless of what they carried before.
    pub fn set_object(&mut self, path: &NormalizedPath, children: Vec<(Box<str>, Node)>) {
        self.write(path, Node::Object { path: path.clone(), children });
    }

    /// Set (creating or replacing) an externally-built node at `path`. If
    /// `path` is the root, `node` is dropped without effect (the root must
    /// stay a bare `Object`; see [`Self::set_object`] to seed its children).
    pub fn set_node(&mut self, path: &NormalizedPath, node: Node) {
        self.write(path, node);
    }

    fn write(&mut self, path: &NormalizedPath, mut value: Node) {
        let Some((parent_path, name)) = path.split_last() else {
            self.sink.report("relay-state: cannot set a value at the root path");
            return; // `value` is dropped here, satisfying the no-leak invariant.
        };
        value.repath(path);
        let parent = ensure_object_mut(&mut self.root, &parent_path, self.config.default_capacity);
        let Node::Object { children, .. } = parent else {
            unreachable!("ensure_object_mut always yields an Object")
        };
        let existing_idx = children.iter().position(|(n, _)| n.as_ref() == name);
        let event_kind = match existing_idx {
            None => EventKind::Add,
            Some(idx) => {
                if std::mem::discriminant(&children[idx].1) != std::mem::discriminant(&value) {
                    self.sink.report(&format!("relay-state: replacing `{path}` due to type mismatch"));
                }
                EventKind::Update
            }
        };
        let summary = NodeSummary::from(&value);
        match existing_idx {
            Some(idx) => children[idx].1 = value,
            None => children.push((name.into(), value)),
        }
        self.emit(Event {
            kind: event_kind,
            path: path.clone(),
            related_path: None,
            node: Some(summary),
        });
    }

    // --- strict writes -------------------------------------------------

    /// Like [`Self::set_int`], but refuses to create `path` or change an
    /// existing node's kind. Returns whether the write took place.
    pub fn try_set_int(&mut self, path: &NormalizedPath, value: i32) -> bool {
        self.try_write(path, Node::Int(value))
    }

    /// Like [`Self::set_float`], but strict; see [`Self::try_set_int`].
    pub fn try_set_float(&mut self, path: &NormalizedPath, value: f32) -> bool {
        self.try_write(path, Node::Float(value))
    }

    /// Like [`Self::set_bool`], but strict; see [`Self::try_set_int`].
    pub fn try_set_bool(&mut self, path: &NormalizedPath, value: bool) -> bool {
        self.try_write(path, Node::Bool(value))
    }

    /// Like [`Self::set_pointer`], but strict; see [`Self::try_set_int`].
    pub fn try_set_pointer(&mut self, path: &NormalizedPath, value: *mut ()) -> bool {
        self.try_write(path, Node::Pointer(value))
    }

    /// Like [`Self::set_string`], but strict; see [`Self::try_set_int`].
    pub fn try_set_string(&mut self, path: &NormalizedPath, value: impl Into<String>) -> bool {
        self.try_write(path, Node::String(value.into()))
    }

    fn try_write(&mut self, path: &NormalizedPath, value: Node) -> bool {
        match find(&self.root, path) {
            Some(existing) if std::mem::discriminant(existing) == std::mem::discriminant(&value) => {
                self.write(path, value);
                true
            }
            _ => false,
        }
    }

    // --- removal / move --------------------------------------------------

    /// Remove the node at `path`, if any, emitting `Remove` first. A no-op
    /// (not an error) if nothing exists there. Errs only on the root, which
    /// can never be removed.
    pub fn remove(&mut self, path: &NormalizedPath) -> Result<(), StateError> {
        path.ensure_non_root()?;
        let Some((parent_path, name)) = path.split_last() else {
            return Ok(());
        };
        let Some(parent) = find_mut(&mut self.root, &parent_path) else {
            return Ok(());
        };
        let Node::Object { children, .. } = parent else {
            return Ok(());
        };
        let Some(idx) = children.iter().position(|(n, _)| n.as_ref() == name) else {
            return Ok(());
        };
        let summary = NodeSummary::from(&children[idx].1);
        self.emit(Event {
            kind: EventKind::Remove,
            path: path.clone(),
            related_path: None,
            node: Some(summary),
        });
        // Re-locate: a reentrant callback may have mutated siblings or even
        // removed this same node already.
        if let Some(Node::Object { children, .. }) = find_mut(&mut self.root, &parent_path) {
            if let Some(idx) = children.iter().position(|(n, _)| n.as_ref() == name) {
                children.remove(idx);
            }
        }
        Ok(())
    }

    /// Relocate the subtree at `from` to `to`, emitting a single `Move`
    /// event. A no-op if nothing exists at `from`. Fails, restoring `from`
    /// untouched, if `to` is `from` itself or a descendant of it (moving a
    /// subtree into itself).
    pub fn move_node(&mut self, from: &NormalizedPath, to: &NormalizedPath) -> Result<(), StateError> {
        from.ensure_non_root()?;
        let (from_parent_path, from_name) = from.split_last().expect("non-root path always splits");

        if to.is_within(from) {
            return Err(StateError::MoveDestinationUnresolved { path: to.as_str().to_string() });
        }

        let Some(Node::Object { children: from_children, .. }) = find_mut(&mut self.root, &from_parent_path) else {
            return Ok(());
        };
        let Some(idx) = from_children.iter().position(|(n, _)| n.as_ref() == from_name) else {
            return Ok(());
        };
        let (_, mut detached) = from_children.remove(idx);

        let Some((to_parent_path, to_name)) = to.split_last() else {
            // Destination is the root: reattach at the original location and fail.
            if let Some(Node::Object { children, .. }) = find_mut(&mut self.root, &from_parent_path) {
                children.push((from_name.into(), detached));
            }
            return Err(StateError::MoveDestinationUnresolved { path: to.as_str().to_string() });
        };

        detached.repath(to);
        let summary = NodeSummary::from(&detached);
        let to_parent = ensure_object_mut(&mut self.root, &to_parent_path, self.config.default_capacity);
        let Node::Object { children: to_children, .. } = to_parent else {
            unreachable!("ensure_object_mut always yields an Object")
        };
        match to_children.iter().position(|(n, _)| n.as_ref() == to_name) {
            Some(idx) => to_children[idx].1 = detached,
            None => to_children.push((to_name.into(), detached)),
        }

        self.emit(Event {
            kind: EventKind::Move,
            path: from.clone(),
            related_path: Some(to.clone()),
            node: Some(summary),
        });
        Ok(())
    }

    // --- listeners ---------------------------------------------------------

    /// Register a listener at `path` with the given granularity and event
    /// kind. Fires on every matching mutation until removed.
    pub fn on(
        &mut self,
        path: &NormalizedPath,
        granularity: Granularity,
        kind: EventKind,
        callback: impl FnMut(&Event, &mut StateTree) + 'static,
    ) -> ListenerId {
        self.listeners.insert(
            path,
            granularity,
            kind,
            ListenerEntry {
                once: false,
                callback: Box::new(callback),
            },
        )
    }

    /// Like [`Self::on`], but automatically removed after its first firing.
    pub fn once(
        &mut self,
        path: &NormalizedPath,
        granularity: Granularity,
        kind: EventKind,
        callback: impl FnMut(&Event, &mut StateTree) + 'static,
    ) -> ListenerId {
        self.listeners.insert(
            path,
            granularity,
            kind,
            ListenerEntry {
                once: true,
                callback: Box::new(callback),
            },
        )
    }

    /// Unregister a listener by handle. Returns whether it was found.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    fn emit(&mut self, event: Event) {
        if !self.events_enabled {
            return;
        }
        for id in self.listeners.query(&event.path, event.kind) {
            let Some(mut entry) = self.listeners.take(id) else {
                continue; // removed, or already mid-dispatch from an outer call
            };
            (entry.callback)(&event, self);
            if entry.once {
                self.listeners.remove(id);
            } else {
                self.listeners.put_back(id, entry);
            }
        }
    }

    /// Render the tree as a deterministic, human-readable box-drawing tree.
    /// The root itself is not printed; its children start at column zero.
    /// Leaf values longer than [`Config::print_width`] are truncated with
    /// a trailing `…`.
    pub fn print_tree(&self) -> String {
        let mut out = String::new();
        if let Node::Object { children, .. } = &self.root {
            render_children(children, "", &mut out, self.config.print_width);
        }
        out
    }
}

fn find<'a>(root: &'a Node, path: &NormalizedPath) -> Option<&'a Node> {
    let mut node = root;
    for seg in path.segments() {
        match node {
            Node::Object { children, .. } => {
                node = &children.iter().find(|(n, _)| n.as_ref() == seg)?.1;
            }
            _ => return None,
        }
    }
    Some(node)
}

fn find_mut<'a>(root: &'a mut Node, path: &NormalizedPath) -> Option<&'a mut Node> {
    let mut node = root;
    for seg in path.segments() {
        match node {
            Node::Object { children, .. } => {
                node = &mut children.iter_mut().find(|(n, _)| n.as_ref() == seg)?.1;
            }
            _ => return None,
        }
    }
    Some(node)
}

/// Walk to the `Object` at `path`, auto-creating missing intermediates and
/// silently replacing any non-`Object` intermediate encountered along the
/// way (its previous value is dropped).
fn ensure_object_mut<'a>(mut node: &'a mut Node, path: &NormalizedPath, capacity: usize) -> &'a mut Node {
    let mut prefix = NormalizedPath::root();
    for seg in path.segments() {
        prefix = prefix.join(seg);
        if !matches!(node, Node::Object { .. }) {
            *node = Node::empty_object_with_capacity(prefix.clone(), capacity);
        }
        let Node::Object { children, .. } = node else {
            unreachable!("just ensured Object")
        };
        let idx = match children.iter().position(|(n, _)| n.as_ref() == seg) {
            Some(i) => i,
            None => {
                children.push(((*seg).into(), Node::empty_object_with_capacity(prefix.clone(), capacity)));
                children.len() - 1
            }
        };
        node = &mut children[idx].1;
    }
    if !matches!(node, Node::Object { .. }) {
        *node = Node::empty_object_with_capacity(prefix, capacity);
    }
    node
}

fn render_children(children: &[(Box<str>, Node)], prefix: &str, out: &mut String, print_width: usize) {
    for (i, (name, node)) in children.iter().enumerate() {
        let is_last = i + 1 == children.len();
        out.push_str(prefix);
        out.push_str(if is_last { "└── " } else { "├── " });
        out.push('"');
        out.push_str(name);
        out.push_str("\": ");
        out.push_str(&render_content(node, print_width));
        out.push('\n');
        if let Node::Object { children: grandchildren, .. } = node {
            let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
            render_children(grandchildren, &child_prefix, out, print_width);
        }
    }
}

fn render_content(node: &Node, print_width: usize) -> String {
    match node {
        Node::Int(v) => format!("[Int: {v}]"),
        Node::Float(v) => format!("[Float: {v}]"),
        Node::Bool(v) => format!("[Bool: {v}]"),
        Node::Pointer(p) => format!("[Pointer: {:#x}]", *p as usize),
        Node::String(s) => format!("[String: \"{}\"]", truncate(s, print_width)),
        Node::Object { children, .. } => format!("[Object: {} children]", children.len()),
    }
}

/// Truncate `s` to at most `width` characters, appending `…` if anything
/// was cut. `width == 0` disables truncation.
fn truncate(s: &str, width: usize) -> std::borrow::Cow<'_, str> {
    if width == 0 || s.chars().count() <= width {
        return std::borrow::Cow::Borrowed(s);
    }
    let mut out: String = s.chars().take(width).collect();
    out.push('…');
    std::borrow::Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn set_twice_emits_add_then_update() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut tree = StateTree::new();
        let log2 = log.clone();
        tree.on(&NormalizedPath::root(), Granularity::Subtree, EventKind::Add, move |e, _| {
            log2.borrow_mut().push((e.kind, e.path.clone()));
        });
        let log3 = log.clone();
        tree.on(&NormalizedPath::root(), Granularity::Subtree, EventKind::Update, move |e, _| {
            log3.borrow_mut().push((e.kind, e.path.clone()));
        });
        tree.set_int(&NormalizedPath::new("a/b"), 7);
        tree.set_int(&NormalizedPath::new("a/b"), 8);
        assert_eq!(tree.get_int(&NormalizedPath::new("a/b")), Some(8));
        assert_eq!(
            *log.borrow(),
            vec![(EventKind::Add, NormalizedPath::new("a/b")), (EventKind::Update, NormalizedPath::new("a/b"))]
        );
    }

    #[test]
    fn subtree_listener_fires_once_for_descendant_write() {
        let count = Rc::new(RefCell::new(0));
        let mut tree = StateTree::new();
        let seen_path = Rc::new(RefCell::new(NormalizedPath::root()));
        let count2 = count.clone();
        let seen_path2 = seen_path.clone();
        tree.on(&NormalizedPath::new("x"), Granularity::Subtree, EventKind::Add, move |e, _| {
            *count2.borrow_mut() += 1;
            *seen_path2.borrow_mut() = e.path.clone();
        });
        tree.set_int(&NormalizedPath::new("x/y/z"), 1);
        assert_eq!(*count.borrow(), 1);
        assert_eq!(*seen_path.borrow(), NormalizedPath::new("x/y/z"));
    }

    #[test]
    fn move_populated_subtree_rewrites_descendant_paths() {
        let mut tree = StateTree::new();
        tree.set_int(&NormalizedPath::new("s/v"), 5);
        tree.set_int(&NormalizedPath::new("s/sub/v2"), 6);
        let events = Rc::new(RefCell::new(Vec::new()));
        let events2 = events.clone();
        tree.on(&NormalizedPath::root(), Granularity::Subtree, EventKind::Move, move |e, _| {
            events2.borrow_mut().push((e.path.clone(), e.related_path.clone()));
        });
        tree.move_node(&NormalizedPath::new("s"), &NormalizedPath::new("t")).unwrap();
        assert_eq!(tree.get_int(&NormalizedPath::new("t/v")), Some(5));
        assert_eq!(tree.get_int(&NormalizedPath::new("t/sub/v2")), Some(6));
        assert!(!tree.has(&NormalizedPath::new("s")));
        assert_eq!(
            *events.borrow(),
            vec![(NormalizedPath::new("s"), Some(NormalizedPath::new("t")))]
        );
    }

    #[test]
    fn move_into_own_subtree_restores_and_fails() {
        let mut tree = StateTree::new();
        tree.set_int(&NormalizedPath::new("s/v"), 1);
        let err = tree.move_node(&NormalizedPath::new("s"), &NormalizedPath::new("s/nested")).unwrap_err();
        assert!(matches!(err, StateError::MoveDestinationUnresolved { .. }));
        assert_eq!(tree.get_int(&NormalizedPath::new("s/v")), Some(1));
    }

    #[test]
    fn remove_emits_before_destruction() {
        let mut tree = StateTree::new();
        tree.set_int(&NormalizedPath::new("a"), 1);
        let seen = Rc::new(RefCell::new(false));
        let seen2 = seen.clone();
        tree.on(&NormalizedPath::new("a"), Granularity::Node, EventKind::Remove, move |e, t| {
            // The node is still observable from elsewhere in the tree at this instant.
            assert!(t.has(&NormalizedPath::new("a")));
            assert_eq!(e.node_kind(), Kind::Int);
            *seen2.borrow_mut() = true;
        });
        tree.remove(&NormalizedPath::new("a")).unwrap();
        assert!(*seen.borrow());
        assert!(!tree.has(&NormalizedPath::new("a")));
        assert_eq!(tree.type_of(&NormalizedPath::new("a")), Kind::Empty);
    }

    #[test]
    fn writing_incompatible_kind_replaces_and_emits_update() {
        let mut tree = StateTree::new();
        tree.set_int(&NormalizedPath::new("a"), 1);
        tree.set_string(&NormalizedPath::new("a"), "hi");
        assert_eq!(tree.get_string(&NormalizedPath::new("a")), Some("hi"));
        assert_eq!(tree.get_int(&NormalizedPath::new("a")), None);
    }

    #[test]
    fn try_set_refuses_creation_and_kind_change() {
        let mut tree = StateTree::new();
        assert!(!tree.try_set_int(&NormalizedPath::new("missing"), 1));
        tree.set_int(&NormalizedPath::new("a"), 1);
        assert!(!tree.try_set_string(&NormalizedPath::new("a"), "nope"));
        assert!(tree.try_set_int(&NormalizedPath::new("a"), 2));
        assert_eq!(tree.get_int(&NormalizedPath::new("a")), Some(2));
    }

    #[test]
    fn reentrant_write_from_listener_is_observed() {
        let mut tree = StateTree::new();
        tree.on(&NormalizedPath::new("trigger"), Granularity::Node, EventKind::Add, |_, t| {
            t.set_int(&NormalizedPath::new("derived"), 99);
        });
        tree.set_int(&NormalizedPath::new("trigger"), 1);
        assert_eq!(tree.get_int(&NormalizedPath::new("derived")), Some(99));
    }

    #[test]
    fn print_tree_matches_box_drawing_shape() {
        let mut tree = StateTree::new();
        tree.set_int(&NormalizedPath::new("a"), 1);
        tree.set_object(&NormalizedPath::new("b"), Vec::new());
        tree.set_bool(&NormalizedPath::new("b/c"), true);
        let rendered = tree.print_tree();
        assert_eq!(
            rendered,
            "├── \"a\": [Int: 1]\n└── \"b\": [Object: 1 children]\n    └── \"c\": [Bool: true]\n"
        );
    }

    #[test]
    fn no_listener_id_fires_twice_for_a_single_mutation() {
        let mut tree = StateTree::new();
        let calls = Rc::new(RefCell::new(0));
        let calls2 = calls.clone();
        tree.on(&NormalizedPath::root(), Granularity::Subtree, EventKind::Add, move |_, _| {
            *calls2.borrow_mut() += 1;
        });
        tree.on(&NormalizedPath::new("a"), Granularity::Subtree, EventKind::Add, |_, _| {});
        tree.set_int(&NormalizedPath::new("a/b"), 1);
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn pointer_round_trips_through_set_get_and_try_set() {
        let mut value = 42i32;
        let ptr = &mut value as *mut i32 as *mut ();
        let mut tree = StateTree::new();
        let path = NormalizedPath::new("device/handle");

        assert_eq!(tree.get_pointer(&path), None);
        tree.set_pointer(&path, ptr);
        assert_eq!(tree.get_pointer(&path), Some(ptr));
        assert_eq!(tree.get_or_pointer(&NormalizedPath::new("missing"), std::ptr::null_mut()), std::ptr::null_mut());

        let mut other = 7i32;
        let other_ptr = &mut other as *mut i32 as *mut ();
        assert!(tree.try_set_pointer(&path, other_ptr));
        assert_eq!(tree.get_pointer(&path), Some(other_ptr));
        assert!(!tree.try_set_int(&path, 1));

        let rendered = tree.print_tree();
        assert_eq!(rendered, format!("└── \"device\": [Object: 1 children]\n    └── \"handle\": [Pointer: {:#x}]\n", other_ptr as usize));
    }

    #[test]
    fn print_width_truncates_long_strings_with_an_ellipsis() {
        let mut tree = StateTree::with_config(Config { print_width: 5, default_capacity: 4 });
        tree.set_string(&NormalizedPath::new("s"), "abcdefghij");
        assert_eq!(tree.print_tree(), "└── \"s\": [String: \"abcde…\"]\n");
    }

    #[test]
    fn print_width_zero_disables_truncation() {
        let mut tree = StateTree::with_config(Config { print_width: 0, default_capacity: 4 });
        tree.set_string(&NormalizedPath::new("s"), "abcdefghij");
        assert_eq!(tree.print_tree(), "└── \"s\": [String: \"abcdefghij\"]\n");
    }

    #[test]
    fn default_capacity_is_reserved_on_auto_created_objects() {
        let mut tree = StateTree::with_config(Config { print_width: 80, default_capacity: 6 });
        tree.set_int(&NormalizedPath::new("a/b"), 1);
        if let Node::Object { children, .. } = find(&tree.root, &NormalizedPath::new("a")).unwrap() {
            assert!(children.capacity() >= 6);
        } else {
            panic!("expected an Object at `a`");
        }
    }
}
