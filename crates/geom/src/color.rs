//! Fixed-point helpers for premultiplied 8-bit-per-channel ARGB math.
//!
//! Every filter kernel in `filters` and the mask-luminance step in
//! `render_pipeline` round through `(x + 127) / 255`, except the
//! luminance-to-alpha mask kernel, whose divisor is 512 (spec.md §4.2).

/// Rounds an `a*b` style product already in the `0..=255*255` range back
/// down to `0..=255`, matching libart/cairo-style premultiplied rounding.
#[inline]
pub fn round255(x: u32) -> u8 {
    (((x + 127) / 255).min(255)) as u8
}

/// The `(x + 256) / 512` rounding used by the luminance-to-alpha mask
/// kernel, whose coefficients (109 + 366 + 37 = 512) sum to 512 rather
/// than 255.
#[inline]
pub fn round512(x: u32) -> u8 {
    (((x + 256) / 512).min(255)) as u8
}

#[inline]
pub fn clamp_u8(x: i32) -> u8 {
    x.clamp(0, 255) as u8
}

/// A premultiplied 32-bit ARGB pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PremulPixel {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl PremulPixel {
    pub const TRANSPARENT: PremulPixel = PremulPixel {
        a: 0,
        r: 0,
        g: 0,
        b: 0,
    };

    pub fn new(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }

    /// Un-premultiplies (divides channels by alpha, or yields zero channels
    /// for a fully transparent pixel) for kernels that require straight
    /// color, such as the 20-entry ColorMatrix.
    pub fn unpremultiply(&self) -> (u8, u8, u8, u8) {
        if self.a == 0 {
            return (0, 0, 0, 0);
        }
        let unpremul = |c: u8| -> u8 { ((c as u32 * 255 + self.a as u32 / 2) / self.a as u32).min(255) as u8 };
        (self.a, unpremul(self.r), unpremul(self.g), unpremul(self.b))
    }

    pub fn premultiply_from_straight(a: u8, r: u8, g: u8, b: u8) -> PremulPixel {
        let premul = |c: u8| -> u8 { round255(c as u32 * a as u32) };
        PremulPixel {
            a,
            r: premul(r),
            g: premul(g),
            b: premul(b),
        }
    }

    pub fn to_u32(self) -> u32 {
        u32::from(self.a) << 24 | u32::from(self.r) << 16 | u32::from(self.g) << 8 | u32::from(self.b)
    }

    pub fn from_u32(packed: u32) -> PremulPixel {
        PremulPixel {
            a: (packed >> 24) as u8,
            r: (packed >> 16) as u8,
            g: (packed >> 8) as u8,
            b: packed as u8,
        }
    }
}
