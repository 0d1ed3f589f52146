//! `feTurbulence` (spec.md §4.4): Perlin noise seeded by a Park–Miller
//! minimal-standard generator, with a 256-entry lattice per channel.
//! Ported from the reference algorithm in the SVG filter effects spec,
//! reworked into safe Rust without the original's global mutable tables.

use geom::{Affine2D, IntRect, PremulPixel};

use crate::image::PremulImage;
use crate::primitive::{Primitive, PrimitiveInputs};
use crate::worker::par_rows;

const LATTICE_SIZE: usize = 256;
const LATTICE_MASK: i32 = 255;
const RAND_M: i32 = 2_147_483_647;
const RAND_A: i32 = 16_807;
const RAND_Q: i32 = 127_773;
const RAND_R: i32 = 2_836;

fn next_random(seed: i32) -> i32 {
    let seed = if seed <= 0 { -(seed % (RAND_M - 1)) + 1 } else { seed };
    let hi = seed / RAND_Q;
    let lo = seed % RAND_Q;
    let mut result = RAND_A * lo - RAND_R * hi;
    if result <= 0 {
        result += RAND_M;
    }
    result
}

struct Lattice {
    selector: [i32; LATTICE_SIZE + LATTICE_SIZE + 2],
    gradient: [[[f64; 2]; LATTICE_SIZE + LATTICE_SIZE + 2]; 4],
}

impl Lattice {
    fn new(seed: i32) -> Self {
        let mut seed = if seed <= 0 { 1 } else { seed };
        let mut selector = [0i32; LATTICE_SIZE + LATTICE_SIZE + 2];
        let mut gradient = [[[0.0f64; 2]; LATTICE_SIZE + LATTICE_SIZE + 2]; 4];

        for index in 0..LATTICE_SIZE {
            selector[index] = index as i32;
            for channel in gradient.iter_mut() {
                seed = next_random(seed);
                let a = (seed % (LATTICE_SIZE as i32 * 2)) - LATTICE_SIZE as i32;
                seed = next_random(seed);
                let b = (seed % (LATTICE_SIZE as i32 * 2)) - LATTICE_SIZE as i32;
                let mut v = [a as f64, b as f64];
                let len = (v[0] * v[0] + v[1] * v[1]).sqrt();
                if len > 1e-12 {
                    v[0] /= len;
                    v[1] /= len;
                }
                channel[index] = v;
            }
        }

        for index in (1..LATTICE_SIZE).rev() {
            seed = next_random(seed);
            let j = (seed % LATTICE_SIZE as i32) as usize;
            selector.swap(index, j);
        }

        for index in 0..(LATTICE_SIZE + 2) {
            selector[LATTICE_SIZE + index] = selector[index];
            for channel in gradient.iter_mut() {
                channel[LATTICE_SIZE + index] = channel[index];
            }
        }

        Lattice { selector, gradient }
    }

    fn noise2(&self, channel: usize, vx: f64, vy: f64) -> f64 {
        let t = vx + 4096.0;
        let bx0 = (t as i32) & LATTICE_MASK;
        let bx1 = (bx0 + 1) & LATTICE_MASK;
        let rx0 = t.fract();
        let rx1 = rx0 - 1.0;

        let t = vy + 4096.0;
        let by0 = (t as i32) & LATTICE_MASK;
        let by1 = (by0 + 1) & LATTICE_MASK;
        let ry0 = t.fract();
        let ry1 = ry0 - 1.0;

        // `i`, `j` and `by0`/`by1` are each in `0..LATTICE_SIZE`, so the sums
        // below stay within the `selector`/`gradient` arrays' padded length
        // (`LATTICE_SIZE * 2 + 2`) without needing to wrap.
        let i = self.selector[bx0 as usize];
        let j = self.selector[bx1 as usize];
        let b00 = self.selector[(i + by0) as usize];
        let b10 = self.selector[(j + by0) as usize];
        let b01 = self.selector[(i + by1) as usize];
        let b11 = self.selector[(j + by1) as usize];

        let sx = scurve(rx0);
        let sy = scurve(ry0);

        let q = self.gradient[channel][b00 as usize];
        let u = rx0 * q[0] + ry0 * q[1];
        let q = self.gradient[channel][b10 as usize];
        let v = rx1 * q[0] + ry0 * q[1];
        let a = lerp(sx, u, v);

        let q = self.gradient[channel][b01 as usize];
        let u = rx0 * q[0] + ry1 * q[1];
        let q = self.gradient[channel][b11 as usize];
        let v = rx1 * q[0] + ry1 * q[1];
        let b = lerp(sx, u, v);

        lerp(sy, a, b)
    }
}

fn scurve(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurbulenceType {
    FractalNoise,
    Turbulence,
}

pub struct Turbulence {
    pub seed: i32,
    pub base_freq_x: f64,
    pub base_freq_y: f64,
    pub num_octaves: u32,
    pub kind: TurbulenceType,
    /// Filter-primitive-space origin of pixel `(0, 0)` in the output
    /// buffer, so noise stays continuous across tiled primitive subregions.
    pub origin_x: f64,
    pub origin_y: f64,
}

impl Turbulence {
    fn sample(&self, lattice: &Lattice, channel: usize, x: f64, y: f64) -> f64 {
        let octaves = self.num_octaves.min(12);
        let mut freq_x = self.base_freq_x;
        let mut freq_y = self.base_freq_y;
        let mut sum = 0.0;
        let mut amplitude = 1.0;
        for _ in 0..octaves {
            let n = lattice.noise2(channel, x * freq_x, y * freq_y);
            sum += (if self.kind == TurbulenceType::Turbulence { n.abs() } else { n }) * amplitude;
            freq_x *= 2.0;
            freq_y *= 2.0;
            amplitude *= 0.5;
        }
        sum
    }
}

impl Primitive for Turbulence {
    fn name(&self) -> &'static str {
        "Turbulence"
    }

    fn apply(&self, _inputs: PrimitiveInputs<'_>, output_region: IntRect, num_threads: usize) -> PremulImage {
        let lattice = Lattice::new(self.seed);
        let mut out = PremulImage::new(output_region.width().max(0) as u32, output_region.height().max(0) as u32);
        par_rows(&mut out, num_threads, |y, row| {
            let py = self.origin_y + (output_region.min_y + y as i32) as f64;
            for (x, pixel) in row.iter_mut().enumerate() {
                let px = self.origin_x + (output_region.min_x + x as i32) as f64;
                let mut channels = [0u8; 4];
                for (channel, slot) in channels.iter_mut().enumerate() {
                    let raw = self.sample(&lattice, channel, px, py);
                    let normalized = match self.kind {
                        TurbulenceType::FractalNoise => (raw + 1.0) / 2.0,
                        TurbulenceType::Turbulence => raw,
                    };
                    *slot = (normalized.clamp(0.0, 1.0) * 255.0).round() as u8;
                }
                let (r, g, b, a) = (channels[0], channels[1], channels[2], channels[3]);
                *pixel = PremulPixel::premultiply_from_straight(a, r, g, b);
            }
        });
        out
    }

    fn can_handle_affine(&self, m: Affine2D) -> bool {
        m.is_translation_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turbulence_is_deterministic_for_a_fixed_seed() {
        let turbulence = Turbulence {
            seed: 7,
            base_freq_x: 0.1,
            base_freq_y: 0.1,
            num_octaves: 3,
            kind: TurbulenceType::Turbulence,
            origin_x: 0.0,
            origin_y: 0.0,
        };
        let image = PremulImage::new(1, 1);
        let inputs_a = PrimitiveInputs {
            primary: &image,
            primary_region: IntRect::new(0, 0, 1, 1),
            secondary: None,
            secondary_region: None,
        };
        let inputs_b = PrimitiveInputs {
            primary: &image,
            primary_region: IntRect::new(0, 0, 1, 1),
            secondary: None,
            secondary_region: None,
        };
        let out_a = turbulence.apply(inputs_a, IntRect::new(0, 0, 8, 8), 1);
        let out_b = turbulence.apply(inputs_b, IntRect::new(0, 0, 8, 8), 1);
        assert_eq!(out_a.get(3, 5), out_b.get(3, 5));
    }

    #[test]
    fn fractal_noise_stays_within_the_normalized_range() {
        let turbulence = Turbulence {
            seed: 1,
            base_freq_x: 0.05,
            base_freq_y: 0.05,
            num_octaves: 4,
            kind: TurbulenceType::FractalNoise,
            origin_x: 0.0,
            origin_y: 0.0,
        };
        let image = PremulImage::new(1, 1);
        let inputs = PrimitiveInputs {
            primary: &image,
            primary_region: IntRect::new(0, 0, 1, 1),
            secondary: None,
            secondary_region: None,
        };
        let out = turbulence.apply(inputs, IntRect::new(0, 0, 16, 16), 1);
        for y in 0..16 {
            for x in 0..16 {
                let pixel = out.get(x, y);
                assert!(pixel.a <= 255);
            }
        }
    }
}
