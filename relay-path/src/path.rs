//! Splitting and joining of `/`-separated paths.
//!
//! A path is a sequence of non-empty segments. Repeated separators collapse:
//! `"a//b/"` and `"/a/b"` both split into `["a", "b"]`. The empty path (`""`)
//! denotes the root and splits into zero segments.

/// Split a path into its non-empty segments.
///
/// Leading, trailing, and repeated `/` are ignored.
pub fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Join segments with a single `/` between each.
pub fn join<I>(segments: I) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut out = String::new();
    for seg in segments {
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(seg.as_ref());
    }
    out
}

/// An owned, normalized path: re-joined from [`split`], so `"a//b/"` and
/// `"/a/b"` compare equal once normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NormalizedPath(String);

impl NormalizedPath {
    /// Normalize a path, collapsing repeated separators.
    pub fn new(path: &str) -> Self {
        Self(join(split(path)))
    }

    /// The root path (no segments).
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Require this path to be something other than the root, for
    /// operations (`remove`, `move_node`, ...) where the root is never a
    /// valid target.
    pub fn ensure_non_root(&self) -> Result<(), crate::error::PathError> {
        if self.is_root() {
            Err(crate::error::PathError::Empty)
        } else {
            Ok(())
        }
    }

    /// The normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the path's segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        split(&self.0)
    }

    /// The number of segments (0 for the root).
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// The parent path and the final segment, or `None` if this is the root.
    pub fn split_last(&self) -> Option<(NormalizedPath, &str)> {
        let segs: Vec<&str> = self.segments().collect();
        let (last, rest) = segs.split_last()?;
        Some((NormalizedPath(join(rest)), last))
    }

    /// A new path with `child` appended as a final segment.
    pub fn join(&self, child: &str) -> Self {
        if self.0.is_empty() {
            Self::new(child)
        } else {
            Self(format!("{}/{}", self.0, child))
        }
    }

    /// Whether `self` is `other` or a descendant of `other`.
    pub fn is_within(&self, other: &NormalizedPath) -> bool {
        if other.is_root() {
            return true;
        }
        self.0 == other.0 || self.0.starts_with(other.0.as_str()) && self.0.as_bytes().get(other.0.len()) == Some(&b'/')
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl core::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_collapses_repeats() {
        assert_eq!(split("a//b/").collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(split("/a/b").collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(split("").collect::<Vec<_>>(), Vec::<&str>::new());
    }

    #[test]
    fn normalized_round_trips() {
        let p = NormalizedPath::new("/a//b/c/");
        assert_eq!(p.as_str(), "a/b/c");
        assert_eq!(p.depth(), 3);
    }

    #[test]
    fn split_last_on_root_is_none() {
        assert!(NormalizedPath::root().split_last().is_none());
    }

    #[test]
    fn split_last_returns_parent_and_name() {
        let p = NormalizedPath::new("a/b/c");
        let (parent, name) = p.split_last().unwrap();
        assert_eq!(parent.as_str(), "a/b");
        assert_eq!(name, "c");
    }

    #[test]
    fn join_appends_segment() {
        let root = NormalizedPath::root();
        assert_eq!(root.join("a").as_str(), "a");
        assert_eq!(root.join("a").join("b").as_str(), "a/b");
    }

    #[test]
    fn ensure_non_root_rejects_only_the_root() {
        assert!(NormalizedPath::root().ensure_non_root().is_err());
        assert!(NormalizedPath::new("/").ensure_non_root().is_err());
        assert!(NormalizedPath::new("a").ensure_non_root().is_ok());
    }

    #[test]
    fn is_within_checks_descendants_not_prefixes() {
        let ancestor = NormalizedPath::new("a/b");
        assert!(NormalizedPath::new("a/b").is_within(&ancestor));
        assert!(NormalizedPath::new("a/b/c").is_within(&ancestor));
        assert!(!NormalizedPath::new("a/bc").is_within(&ancestor));
        assert!(!NormalizedPath::new("a").is_within(&ancestor));
        assert!(NormalizedPath::new("anything").is_within(&NormalizedPath::root()));
    }
}
