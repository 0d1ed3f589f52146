//! `feMorphology` erode/dilate (spec.md §4.4): per-channel min/max over a
//! rectangular neighborhood, computed on un-premultiplied color so the
//! morphology doesn't bias toward transparent neighbors.

use geom::{Affine2D, IntRect};

use crate::image::PremulImage;
use crate::primitive::{Primitive, PrimitiveInputs};
use crate::worker::par_rows;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphologyOp {
    Erode,
    Dilate,
}

pub struct Morphology {
    pub op: MorphologyOp,
    pub radius_x: u32,
    pub radius_y: u32,
}

impl Primitive for Morphology {
    fn name(&self) -> &'static str {
        "Morphology"
    }

    fn apply(&self, inputs: PrimitiveInputs<'_>, output_region: IntRect, num_threads: usize) -> PremulImage {
        let src = inputs.primary;
        let src_region = inputs.primary_region;
        let mut out = PremulImage::new(output_region.width().max(0) as u32, output_region.height().max(0) as u32);
        let (rx, ry) = (self.radius_x as i32, self.radius_y as i32);
        let op = self.op;

        par_rows(&mut out, num_threads, |y, row| {
            let abs_y = output_region.min_y + y as i32;
            let local_y = abs_y - src_region.min_y;
            for (x, pixel) in row.iter_mut().enumerate() {
                let abs_x = output_region.min_x + x as i32;
                let local_x = abs_x - src_region.min_x;

                let (mut a, mut r, mut g, mut b) = match op {
                    MorphologyOp::Erode => (255u8, 255u8, 255u8, 255u8),
                    MorphologyOp::Dilate => (0u8, 0u8, 0u8, 0u8),
                };
                for dy in -ry..=ry {
                    for dx in -rx..=rx {
                        let neighbor = src.get((local_x + dx) as i64, (local_y + dy) as i64);
                        let (na, nr, ng, nb) = neighbor.unpremultiply();
                        match op {
                            MorphologyOp::Erode => {
                                a = a.min(na);
                                r = r.min(nr);
                                g = g.min(ng);
                                b = b.min(nb);
                            }
                            MorphologyOp::Dilate => {
                                a = a.max(na);
                                r = r.max(nr);
                                g = g.max(ng);
                                b = b.max(nb);
                            }
                        }
                    }
                }
                *pixel = geom::PremulPixel::premultiply_from_straight(a, r, g, b);
            }
        });
        out
    }

    fn area_enlarge(&self, rect: IntRect, ctm: Affine2D) -> IntRect {
        let scale_x = ctm.a.abs() + ctm.b.abs();
        let scale_y = ctm.c.abs() + ctm.d.abs();
        let ex = (self.radius_x as f64 * scale_x).ceil() as i32;
        let ey = (self.radius_y as f64 * scale_y).ceil() as i32;
        IntRect::new(rect.min_x - ex, rect.min_y - ey, rect.max_x + ex, rect.max_y + ey)
    }

    fn can_handle_affine(&self, m: Affine2D) -> bool {
        m.is_translation_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geom::PremulPixel;

    fn center_dot() -> PremulImage {
        let mut image = PremulImage::new(3, 3);
        image.set(1, 1, PremulPixel::new(255, 255, 0, 0));
        image
    }

    #[test]
    fn dilate_spreads_the_center_pixel_to_a_full_block() {
        let src = center_dot();
        let morph = Morphology {
            op: MorphologyOp::Dilate,
            radius_x: 1,
            radius_y: 1,
        };
        let out = morph.apply(
            PrimitiveInputs {
                primary: &src,
                primary_region: IntRect::new(0, 0, 3, 3),
                secondary: None,
                secondary_region: None,
            },
            IntRect::new(0, 0, 3, 3),
            1,
        );
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(out.get(x, y), PremulPixel::new(255, 255, 0, 0));
            }
        }
    }

    #[test]
    fn erode_clears_everything_around_a_single_dot() {
        let src = center_dot();
        let morph = Morphology {
            op: MorphologyOp::Erode,
            radius_x: 1,
            radius_y: 1,
        };
        let out = morph.apply(
            PrimitiveInputs {
                primary: &src,
                primary_region: IntRect::new(0, 0, 3, 3),
                secondary: None,
                secondary_region: None,
            },
            IntRect::new(0, 0, 3, 3),
            1,
        );
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(out.get(x, y), PremulPixel::TRANSPARENT);
            }
        }
    }
}
