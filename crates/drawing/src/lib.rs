//! The public facade (spec.md §6): `Drawing` owns the scene tree, the
//! cache registry, and the render pipeline, and exposes the operations a
//! host needs — tree mutation, `update`, `render`, and `pick` — without
//! requiring the host to touch `drawing_tree`, `cache`, or
//! `render_pipeline` directly.

mod drawing;
mod error;

pub use drawing::Drawing;
pub use error::DrawingError;

pub use drawing_tree::{
    ChildRole, DrawingItem, GlyphsData, GroupData, ImageData, ItemKey, ItemVariant, PickMemo,
    ShapeData, TextData,
};
pub use scheduler::SchedulerCallbacks;
