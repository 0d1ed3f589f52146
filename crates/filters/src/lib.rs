//! The filter primitive pipeline (spec.md §4.4, component C3): named
//! slots, lazy materialization of reserved source slots, and the
//! per-pixel kernels (blend, color matrix, convolution, morphology,
//! turbulence) that must preserve their fixed-point rounding exactly.

mod error;
mod image;
mod kernels;
mod pipeline;
mod primitive;
mod slot;
mod worker;

pub use error::FilterParamError;
pub use image::PremulImage;
pub use kernels::{
    Blend, BlendMode, ColorMatrix, ColorMatrixMode, ConvolveMatrix, DisplacementMap, Flood,
    GaussianBlur, Lighting, Merge, Morphology, MorphologyOp, Offset, Turbulence, TurbulenceType,
};
pub use pipeline::{FilterPipeline, FilterStage, SlotSource};
pub use primitive::{Primitive, PrimitiveInputs};
pub use slot::SlotName;
