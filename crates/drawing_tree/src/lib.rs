//! The scene tree (spec.md's DrawingItem / Tree component): a `slotmap`
//! arena of polymorphic nodes plus the mutation, update, pick, and
//! own-content-render operations defined over it.

mod error;
mod item;
mod pick;
mod render;
mod state;
mod tree;
mod update;

pub use error::TreeError;
pub use item::{
    ChildRole, DrawingItem, GlyphsData, GroupData, ImageData, ItemKey, ItemVariant, PickMemo,
    ShapeData, TextData,
};
pub use pick::pick;
pub use render::{paint_clip_geometry, paint_content};
pub use state::ItemState;
pub use tree::Tree;
pub use update::UpdatePass;
