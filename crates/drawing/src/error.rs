//! The `drawing` facade's error type (spec.md §7's "Invalid structure"
//! kind): the only errors a host sees are programming errors in how it
//! used the tree. Transient and filter-parameter failures are absorbed
//! inside `render_pipeline`/`filters` and never reach here.

use std::fmt;

use drawing_tree::TreeError;

/// Structural errors surfaced from `Item` mutators. Every variant fails
/// loudly and leaves the tree unchanged, per spec.md §7.
#[derive(Debug)]
pub enum DrawingError {
    // Structural errors, forwarded from `drawing_tree::Tree`.
    AlreadyHasParent,
    ClipMaskCycle,

    // Host misuse of a handle.
    NoSuchItem,
}

impl fmt::Display for DrawingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawingError::AlreadyHasParent => {
                write!(f, "item already has a parent")
            }
            DrawingError::ClipMaskCycle => {
                write!(f, "clip or mask would create an ancestor cycle")
            }
            DrawingError::NoSuchItem => {
                write!(f, "item handle does not belong to this drawing")
            }
        }
    }
}

impl std::error::Error for DrawingError {}

impl From<TreeError> for DrawingError {
    fn from(err: TreeError) -> Self {
        match err {
            TreeError::AlreadyHasParent => DrawingError::AlreadyHasParent,
            TreeError::ClipMaskCycle => DrawingError::ClipMaskCycle,
            TreeError::NoSuchItem => DrawingError::NoSuchItem,
        }
    }
}
