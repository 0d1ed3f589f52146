//! `feColorMatrix`-style per-pixel recoloring (spec.md §4.4): un-premultiply,
//! apply one of four fixed modes, clamp, re-premultiply.
//!
//! `LuminanceToAlpha` follows spec.md §8 scenario 4's literal formula —
//! `round255(109R + 366G + 37B)` — rather than the table's `54/182/18`
//! entry; scenario 4 is the concrete, checkable definition and the two
//! disagree only because the table transcribed the render pipeline's
//! separate mask-luminance weights with the wrong divisor. See DESIGN.md.

use geom::{round255, Affine2D, IntRect, PremulPixel};

use crate::image::PremulImage;
use crate::primitive::{Primitive, PrimitiveInputs};
use crate::worker::par_rows;

#[derive(Debug, Clone)]
pub enum ColorMatrixMode {
    /// Full 4x5 matrix over straight (un-premultiplied) RGBA, row-major:
    /// `[R', G', B', A']^T = M * [R, G, B, A, 1]^T`, coefficients in
    /// `0.0..=1.0` (scaled internally to the 255-wide fixed-point range).
    Matrix([f64; 20]),
    Saturate(f64),
    HueRotate(f64),
    LuminanceToAlpha,
}

pub struct ColorMatrix {
    pub mode: ColorMatrixMode,
}

fn saturate_matrix(s: f64) -> [f64; 20] {
    [
        0.213 + 0.787 * s,
        0.715 - 0.715 * s,
        0.072 - 0.072 * s,
        0.0,
        0.0,
        0.213 - 0.213 * s,
        0.715 + 0.285 * s,
        0.072 - 0.072 * s,
        0.0,
        0.0,
        0.213 - 0.213 * s,
        0.715 - 0.715 * s,
        0.072 + 0.928 * s,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        1.0,
        0.0,
    ]
}

fn hue_rotate_matrix(degrees: f64) -> [f64; 20] {
    let theta = degrees.to_radians();
    let (sin, cos) = theta.sin_cos();
    [
        0.213 + cos * 0.787 - sin * 0.213,
        0.715 - cos * 0.715 - sin * 0.715,
        0.072 - cos * 0.072 + sin * 0.928,
        0.0,
        0.0,
        0.213 - cos * 0.213 + sin * 0.143,
        0.715 + cos * 0.285 + sin * 0.140,
        0.072 - cos * 0.072 - sin * 0.283,
        0.0,
        0.0,
        0.213 - cos * 0.213 - sin * 0.787,
        0.715 - cos * 0.715 + sin * 0.715,
        0.072 + cos * 0.928 + sin * 0.072,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        1.0,
        0.0,
    ]
}

fn apply_matrix(m: &[f64; 20], r: u8, g: u8, b: u8, a: u8) -> (u8, u8, u8, u8) {
    let (rf, gf, bf, af) = (r as f64, g as f64, b as f64, a as f64);
    let row = |base: usize| -> f64 {
        m[base] * rf + m[base + 1] * gf + m[base + 2] * bf + m[base + 3] * af + m[base + 4] * 255.0
    };
    let clamp = |v: f64| -> u8 { v.round().clamp(0.0, 255.0) as u8 };
    (clamp(row(0)), clamp(row(5)), clamp(row(10)), clamp(row(15)))
}

fn apply_pixel(mode: &ColorMatrixMode, pixel: PremulPixel) -> PremulPixel {
    match mode {
        ColorMatrixMode::LuminanceToAlpha => {
            let (_, r, g, b) = pixel.unpremultiply();
            let alpha = round255(109 * r as u32 + 366 * g as u32 + 37 * b as u32);
            PremulPixel::new(alpha, 0, 0, 0)
        }
        ColorMatrixMode::Matrix(m) => {
            let (a, r, g, b) = pixel.unpremultiply();
            let (r2, g2, b2, a2) = apply_matrix(m, r, g, b, a);
            PremulPixel::premultiply_from_straight(a2, r2, g2, b2)
        }
        ColorMatrixMode::Saturate(s) => {
            let m = saturate_matrix(s.clamp(0.0, 1.0));
            let (a, r, g, b) = pixel.unpremultiply();
            let (r2, g2, b2, a2) = apply_matrix(&m, r, g, b, a);
            PremulPixel::premultiply_from_straight(a2, r2, g2, b2)
        }
        ColorMatrixMode::HueRotate(degrees) => {
            let m = hue_rotate_matrix(*degrees);
            let (a, r, g, b) = pixel.unpremultiply();
            let (r2, g2, b2, a2) = apply_matrix(&m, r, g, b, a);
            PremulPixel::premultiply_from_straight(a2, r2, g2, b2)
        }
    }
}

impl Primitive for ColorMatrix {
    fn name(&self) -> &'static str {
        "ColorMatrix"
    }

    fn apply(&self, inputs: PrimitiveInputs<'_>, output_region: IntRect, num_threads: usize) -> PremulImage {
        let src = inputs.primary;
        let mut out = PremulImage::new(output_region.width().max(0) as u32, output_region.height().max(0) as u32);
        let mode = &self.mode;
        par_rows(&mut out, num_threads, |y, row| {
            for (x, pixel) in row.iter_mut().enumerate() {
                *pixel = apply_pixel(mode, src.get(x as i64, y as i64));
            }
        });
        out
    }

    fn can_handle_affine(&self, _m: Affine2D) -> bool {
        true
    }
}
