/// Errors produced by [`crate::StateTree`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// An operation that requires a non-root path (e.g. `remove`) was given the root.
    #[error(transparent)]
    PathInvalid(#[from] relay_path::PathError),
    /// A strict `try_set_*` would have had to create a path segment, or change
    /// an existing node's kind, and refused.
    #[error("strict write refused: would create or change kind at `{path}`")]
    StrictWriteRefused {
        /// The path the write targeted.
        path: String,
    },
    /// `move_node` could not resolve or create the destination's parent; the
    /// subtree was restored at its original location.
    #[error("could not resolve destination parent for move: `{path}`")]
    MoveDestinationUnresolved {
        /// The destination path that could not be reached.
        path: String,
    },
}
