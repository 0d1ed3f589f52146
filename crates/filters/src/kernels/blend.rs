//! `feBlend`-style compositing of two premultiplied images (spec.md §4.4).
//! Every channel operation rounds through `(x + 127) / 255`.

use geom::{round255, Affine2D, IntRect, PremulPixel};

use crate::image::PremulImage;
use crate::primitive::{Primitive, PrimitiveInputs};
use crate::worker::par_rows;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Normal,
    Multiply,
    Screen,
    Darken,
    Lighten,
}

pub struct Blend {
    pub mode: BlendMode,
}

/// `1 - (1-qa)(1-qb)`: the alpha-union formula shared by every blend mode.
fn alpha_union(qa: u8, qb: u8) -> u8 {
    let inv = round255((255 - qa as u32) * (255 - qb as u32));
    255 - inv
}

fn multiply_channel(ca: u8, qa: u8, cb: u8, qb: u8) -> u8 {
    let term1 = round255((255 - qa as u32) * cb as u32) as u32;
    let term2 = round255((255 - qb as u32) * ca as u32) as u32;
    let term3 = round255(ca as u32 * cb as u32) as u32;
    (term1 + term2 + term3).min(255) as u8
}

fn screen_channel(ca: u8, cb: u8) -> u8 {
    let product = round255(ca as u32 * cb as u32);
    (ca as u32 + cb as u32).saturating_sub(product as u32).min(255) as u8
}

fn blend_pixel(mode: BlendMode, a: PremulPixel, b: PremulPixel) -> PremulPixel {
    match mode {
        BlendMode::Normal => {
            let inv_a = 255 - a.a as u32;
            let out_a = (a.a as u32 + round255(b.a as u32 * inv_a) as u32).min(255) as u8;
            let blend_c = |ca: u8, cb: u8| -> u8 {
                (ca as u32 + round255(cb as u32 * inv_a) as u32).min(255) as u8
            };
            PremulPixel::new(out_a, blend_c(a.r, b.r), blend_c(a.g, b.g), blend_c(a.b, b.b))
        }
        BlendMode::Multiply => {
            let out_a = alpha_union(a.a, b.a);
            PremulPixel::new(
                out_a,
                multiply_channel(a.r, a.a, b.r, b.a),
                multiply_channel(a.g, a.a, b.g, b.a),
                multiply_channel(a.b, a.a, b.b, b.a),
            )
        }
        BlendMode::Screen => {
            let out_a = alpha_union(a.a, b.a);
            PremulPixel::new(
                out_a,
                screen_channel(a.r, b.r),
                screen_channel(a.g, b.g),
                screen_channel(a.b, b.b),
            )
        }
        BlendMode::Darken | BlendMode::Lighten => {
            let out_a = alpha_union(a.a, b.a);
            let pick = |ca: u8, cb: u8| -> u8 {
                let m = multiply_channel(ca, a.a, cb, b.a);
                let s = screen_channel(ca, cb);
                if mode == BlendMode::Darken {
                    m.min(s)
                } else {
                    m.max(s)
                }
            };
            PremulPixel::new(out_a, pick(a.r, b.r), pick(a.g, b.g), pick(a.b, b.b))
        }
    }
}

impl Primitive for Blend {
    fn name(&self) -> &'static str {
        "Blend"
    }

    fn apply(&self, inputs: PrimitiveInputs<'_>, output_region: IntRect, num_threads: usize) -> PremulImage {
        let a = inputs.primary;
        let b = inputs.secondary.unwrap_or(a);
        let mut out = PremulImage::new(output_region.width().max(0) as u32, output_region.height().max(0) as u32);
        let mode = self.mode;
        par_rows(&mut out, num_threads, |y, row| {
            for (x, pixel) in row.iter_mut().enumerate() {
                *pixel = blend_pixel(mode, a.get(x as i64, y as i64), b.get(x as i64, y as i64));
            }
        });
        out
    }

    fn can_handle_affine(&self, _m: Affine2D) -> bool {
        true
    }
}
