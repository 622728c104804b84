/// Errors shared by path-addressed operations across the toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// An operation required a non-root path (e.g. `remove`, `move_node`)
    /// but was given the root.
    #[error("path is empty")]
    Empty,
}
