//! Mask-luminance-to-alpha compositing step (spec.md §4.2): convert a
//! rendered mask's premultiplied pixels into an alpha-only surface via
//! the fixed-point kernel `alpha = (109*R + 366*G + 37*B + 256) / 512`.

use geom::round512;
use scene_protocol::{PixelFormat, Surface, SurfaceError, SurfaceFactory};

/// Renders `mask_surface` (premultiplied ARGB32) down to an `A8` surface
/// of the same dimensions, one byte per pixel, via the 512-scale
/// luminance kernel. Coefficients (109 + 366 + 37 = 512) sum to the
/// divisor, matching SPEC_FULL §10.6.
pub fn luminance_to_alpha(mask_surface: &dyn Surface, factory: &dyn SurfaceFactory) -> Result<Box<dyn Surface>, SurfaceError> {
    assert_eq!(mask_surface.format(), PixelFormat::Argb32, "mask source must be Argb32");
    let width = mask_surface.width();
    let height = mask_surface.height();
    let mut alpha_surface = factory.new_image(PixelFormat::A8, width.max(1), height.max(1))?;
    let src_stride = mask_surface.stride();
    let src = mask_surface.data_ref();
    let dst_stride = alpha_surface.stride();
    {
        let dst = alpha_surface.data();
        for y in 0..height {
            let src_row = y as usize * src_stride;
            let dst_row = y as usize * dst_stride;
            for x in 0..width {
                let off = src_row + x as usize * 4;
                if off + 4 > src.len() {
                    continue;
                }
                let packed = u32::from_ne_bytes([src[off], src[off + 1], src[off + 2], src[off + 3]]);
                let pixel = geom::PremulPixel::from_u32(packed);
                let luminance = 109 * pixel.r as u32 + 366 * pixel.g as u32 + 37 * pixel.b as u32;
                let dst_off = dst_row + x as usize;
                if dst_off < dst.len() {
                    dst[dst_off] = round512(luminance);
                }
            }
        }
    }
    alpha_surface.mark_dirty();
    Ok(alpha_surface)
}
