#![forbid(unsafe_code)]

//! View evaluation errors.
//!
//! None of these abort a frame. Dispatch substitutes an empty or fallback
//! render for the failing sub-tree, logs the error and records it in the
//! frame report.

use std::fmt;

/// Failure category reported by an external collaborator (image decoder,
/// file-backed content, remote data).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The resource does not exist.
    NotFound,
    /// The resource exists but cannot be shown here.
    Unsupported,
    /// The resource could not be decoded.
    Decode,
    /// The resource exceeds a size limit.
    Oversized,
}

impl FailureKind {
    /// Short lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not found",
            Self::Unsupported => "unsupported",
            Self::Decode => "decode failure",
            Self::Oversized => "oversized",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A collaborator failure, carried out of a view through `Body::Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollaboratorError {
    /// What went wrong.
    pub kind: FailureKind,
    /// Free-form detail (path, format name, limit).
    pub detail: String,
}

impl CollaboratorError {
    /// Create an error.
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for CollaboratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.detail.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.detail)
        }
    }
}

impl std::error::Error for CollaboratorError {}

/// Errors recorded while evaluating the view tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    /// A view kept expanding into bodies (or nesting) past the bound.
    DepthExceeded {
        /// Type name of the view where the bound was hit.
        view: &'static str,
        /// Identity path at that point.
        path: String,
        /// The bound that was exceeded.
        limit: usize,
    },
    /// An external collaborator failed; a fallback was rendered.
    Collaborator {
        /// Identity path of the failing view.
        path: String,
        /// The reported failure.
        error: CollaboratorError,
    },
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DepthExceeded { view, path, limit } => write!(
                f,
                "view {view} at {path} exceeded the expansion bound of {limit}"
            ),
            Self::Collaborator { path, error } => write!(f, "view at {path} failed: {error}"),
        }
    }
}

impl std::error::Error for ViewError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Collaborator { error, .. } => Some(error),
            Self::DepthExceeded { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn collaborator_display() {
        let err = CollaboratorError::new(FailureKind::Decode, "logo.png");
        assert_eq!(err.to_string(), "decode failure: logo.png");
        assert_eq!(
            CollaboratorError::new(FailureKind::NotFound, "").to_string(),
            "not found"
        );
    }

    #[test]
    fn view_error_source_chain() {
        let err = ViewError::Collaborator {
            path: "root/0".into(),
            error: CollaboratorError::new(FailureKind::Oversized, "4096x4096"),
        };
        assert!(err.to_string().contains("oversized: 4096x4096"));
        assert!(err.source().is_some());

        let depth = ViewError::DepthExceeded {
            view: "Loop",
            path: "root".into(),
            limit: 64,
        };
        assert!(depth.source().is_none());
    }
}
