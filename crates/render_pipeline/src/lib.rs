//! The §4.2 composite algorithm (component C5): turns a `drawing_tree`
//! subtree into pixels on a host-provided `Context`, reading and writing
//! the `cache` crate's tiles and running the `filters` crate's pipeline
//! where a filter is attached and the render mode allows it.

mod clip_shape;
mod composite;
mod filter_bridge;
mod mask;
mod outline;

pub use composite::RenderPipeline;
pub use filter_bridge::{ContentSlotSource, premul_image_to_surface, surface_to_premul_image};
pub use mask::luminance_to_alpha;
pub use outline::OutlineColors;
