//! The common primitive contract (spec.md §4.4): every kernel reads one or
//! two input images and produces one output image, reports how far it
//! reaches outside its nominal output region, and reports whether it
//! tolerates a non-translation affine without resampling.

use geom::{Affine2D, IntRect};

use crate::image::PremulImage;

pub struct PrimitiveInputs<'a> {
    pub primary: &'a PremulImage,
    /// The device-space rectangle `primary`'s local `(0, 0)` corresponds
    /// to. Pixel-local primitives (Blend, ColorMatrix) always receive this
    /// equal to `output_region`; spatial primitives (Convolve, Morphology)
    /// receive it enlarged by their own `area_enlarge` margins so they can
    /// sample neighbors that lie outside the output rectangle.
    pub primary_region: IntRect,
    pub secondary: Option<&'a PremulImage>,
    pub secondary_region: Option<IntRect>,
}

pub trait Primitive: Send + Sync {
    fn name(&self) -> &'static str;

    /// Computes the output image for the given inputs, which are already
    /// cropped/aligned to `output_region`'s dimensions by the pipeline.
    fn apply(&self, inputs: PrimitiveInputs<'_>, output_region: IntRect, num_threads: usize) -> PremulImage;

    /// How far this primitive reads outside its output rectangle,
    /// expressed as an enlarged rectangle in the same (device) space as
    /// `rect`. Pixel-local primitives return `rect` unchanged.
    fn area_enlarge(&self, rect: IntRect, ctm: Affine2D) -> IntRect {
        let _ = ctm;
        rect
    }

    /// Whether this primitive produces identical results if `m` is
    /// applied to its inputs and the inverse applied to its output,
    /// without resampling. Spatial primitives only tolerate translation.
    fn can_handle_affine(&self, m: Affine2D) -> bool {
        m.is_translation_only()
    }
}
