//! The update scheduler (spec.md §4.6, component C7): turns a local
//! mutation into ancestor cache invalidation and a host-visible signal.
//! Pure free functions over a `Tree` and a `CacheRegistry` — this crate
//! holds no state of its own beyond the callback list.

mod callbacks;
mod scheduler;

pub use callbacks::{CallbackList, SchedulerCallbacks};
pub use scheduler::{mark_for_rendering, mark_for_update};
