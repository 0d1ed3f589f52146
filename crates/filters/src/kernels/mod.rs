pub mod blend;
pub mod color_matrix;
pub mod convolve_matrix;
pub mod morphology;
pub mod passthrough;
pub mod turbulence;

pub use blend::{Blend, BlendMode};
pub use color_matrix::{ColorMatrix, ColorMatrixMode};
pub use convolve_matrix::ConvolveMatrix;
pub use morphology::{Morphology, MorphologyOp};
pub use passthrough::{DisplacementMap, Flood, GaussianBlur, Lighting, Merge, Offset};
pub use turbulence::{Turbulence, TurbulenceType};
