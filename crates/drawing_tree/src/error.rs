//! Structural errors (spec.md §7's "invalid structure" kind): programming
//! errors that fail loudly and leave the tree unchanged, rather than
//! partial mutations a caller could observe.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    /// A child passed to `append_child`/`prepend_child` already has a
    /// parent; detach it first.
    AlreadyHasParent,
    /// `set_clip`/`set_mask` was given an item that is an ancestor of the
    /// host, which would create a cycle.
    ClipMaskCycle,
    /// The item handle does not resolve — it was destroyed or belongs to a
    /// different tree.
    NoSuchItem,
}

impl fmt::Display for TreeError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::AlreadyHasParent => write!(formatter, "item already has a parent"),
            TreeError::ClipMaskCycle => write!(formatter, "clip/mask would create a cycle through an ancestor"),
            TreeError::NoSuchItem => write!(formatter, "no such item in this tree"),
        }
    }
}

impl std::error::Error for TreeError {}
