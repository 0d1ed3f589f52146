//! The primitives spec.md §4.4 names but leaves unspecified beyond SVG
//! semantics (`Offset`, `Flood`, `Merge`, `GaussianBlur`, `DisplacementMap`,
//! `Lighting`). `Offset`, `Flood`, and `Merge` are cheap enough to implement
//! for real; the rest plug into the same `Primitive` contract as an
//! identity copy of their first input until a concrete kernel lands.

use geom::{Affine2D, IntRect, PremulPixel};

use crate::image::PremulImage;
use crate::primitive::{Primitive, PrimitiveInputs};
use crate::worker::par_rows;

pub struct Offset {
    pub dx: i32,
    pub dy: i32,
}

impl Primitive for Offset {
    fn name(&self) -> &'static str {
        "Offset"
    }

    fn apply(&self, inputs: PrimitiveInputs<'_>, output_region: IntRect, num_threads: usize) -> PremulImage {
        let src = inputs.primary;
        let src_region = inputs.primary_region;
        let mut out = PremulImage::new(output_region.width().max(0) as u32, output_region.height().max(0) as u32);
        par_rows(&mut out, num_threads, |y, row| {
            let abs_y = output_region.min_y + y as i32 - self.dy;
            for (x, pixel) in row.iter_mut().enumerate() {
                let abs_x = output_region.min_x + x as i32 - self.dx;
                *pixel = src.get((abs_x - src_region.min_x) as i64, (abs_y - src_region.min_y) as i64);
            }
        });
        out
    }

    fn can_handle_affine(&self, m: Affine2D) -> bool {
        m.is_translation_only()
    }
}

pub struct Flood {
    pub color: PremulPixel,
}

impl Primitive for Flood {
    fn name(&self) -> &'static str {
        "Flood"
    }

    fn apply(&self, _inputs: PrimitiveInputs<'_>, output_region: IntRect, _num_threads: usize) -> PremulImage {
        let mut out = PremulImage::new(output_region.width().max(0) as u32, output_region.height().max(0) as u32);
        out.fill(self.color);
        out
    }

    fn can_handle_affine(&self, _m: Affine2D) -> bool {
        true
    }
}

/// Composites every input in order with `SRC_OVER`, matching `feMerge`'s
/// semantics; the pipeline supplies each merge node's resolved input list.
pub struct Merge;

impl Merge {
    pub fn composite(inputs: &[PremulImage]) -> PremulImage {
        let Some(first) = inputs.first() else {
            return PremulImage::new(0, 0);
        };
        let mut out = first.clone();
        for layer in &inputs[1..] {
            for y in 0..out.height {
                for x in 0..out.width {
                    let top = layer.get(x as i64, y as i64);
                    let bottom = out.get(x as i64, y as i64);
                    let inv_a = 255 - top.a as u32;
                    let blend_c = |tc: u8, bc: u8| -> u8 {
                        (tc as u32 + geom::round255(bc as u32 * inv_a)).min(255) as u8
                    };
                    let composed = PremulPixel::new(
                        (top.a as u32 + geom::round255(bottom.a as u32 * inv_a)).min(255) as u8,
                        blend_c(top.r, bottom.r),
                        blend_c(top.g, bottom.g),
                        blend_c(top.b, bottom.b),
                    );
                    out.set(x, y, composed);
                }
            }
        }
        out
    }
}

macro_rules! identity_primitive {
    ($name:ident, $label:literal, $doc:literal) => {
        #[doc = $doc]
        pub struct $name;

        impl Primitive for $name {
            fn name(&self) -> &'static str {
                $label
            }

            fn apply(&self, inputs: PrimitiveInputs<'_>, output_region: IntRect, num_threads: usize) -> PremulImage {
                let src = inputs.primary;
                let src_region = inputs.primary_region;
                let mut out =
                    PremulImage::new(output_region.width().max(0) as u32, output_region.height().max(0) as u32);
                par_rows(&mut out, num_threads, |y, row| {
                    let abs_y = output_region.min_y + y as i32;
                    for (x, pixel) in row.iter_mut().enumerate() {
                        let abs_x = output_region.min_x + x as i32;
                        *pixel = src.get((abs_x - src_region.min_x) as i64, (abs_y - src_region.min_y) as i64);
                    }
                });
                out
            }
        }
    };
}

// TODO: replace with a separable box-blur approximation of the Gaussian
// kernel (three passes, per the SVG spec's recommended approximation).
identity_primitive!(GaussianBlur, "GaussianBlur", "Deferred: identity copy of SourceGraphic.");
// TODO: needs a second input (the displacement map) sampled per-channel;
// wire that through PrimitiveInputs::secondary once a caller needs it.
identity_primitive!(DisplacementMap, "DisplacementMap", "Deferred: identity copy of its primary input.");
// TODO: diffuse/specular lighting needs a surface-normal estimate from the
// alpha channel, which no other kernel here computes yet.
identity_primitive!(Lighting, "Lighting", "Deferred: identity copy of SourceGraphic.");
