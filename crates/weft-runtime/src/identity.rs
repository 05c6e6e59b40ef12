#![forbid(unsafe_code)]

//! Structural identity paths.
//!
//! A view's identity is the path of segments from the root: child positions,
//! explicit keys, and named containers. State and lifecycle entries are keyed
//! by this path, so a node that keeps its position (or key) across frames
//! keeps its state even though the tree is rebuilt every frame.

use std::borrow::Cow;
use std::fmt;

use smallvec::SmallVec;

/// One step in an identity path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Position among siblings.
    Index(usize),
    /// Explicit key (stable across reordering).
    Key(Cow<'static, str>),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Key(key) => f.write_str(key),
        }
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&'static str> for PathSegment {
    fn from(key: &'static str) -> Self {
        Self::Key(Cow::Borrowed(key))
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(Cow::Owned(key))
    }
}

/// Path from the root to a view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct IdentityPath {
    segments: SmallVec<[PathSegment; 8]>,
}

impl IdentityPath {
    /// The root path (no segments).
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// This path extended by one segment.
    #[must_use]
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether this is the root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The segments, root first.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Whether `self` is `other` or one of its descendants.
    #[must_use]
    pub fn starts_with(&self, other: &IdentityPath) -> bool {
        self.segments.starts_with(&other.segments)
    }
}

impl fmt::Display for IdentityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("root")?;
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}
