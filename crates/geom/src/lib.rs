//! Shared geometry and fixed-point color primitives used throughout the
//! renderer core: rectangles, affine transforms, premultiplied-color
//! rounding. No item tree, surface, or filter logic lives here — just the
//! math every other crate builds on.

mod affine;
mod color;
mod rect;

pub use affine::Affine2D;
pub use color::{PremulPixel, clamp_u8, round255, round512};
pub use rect::{IntRect, RectF};
