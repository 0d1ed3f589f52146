//! Bridges the render pipeline's `dyn Surface` world to the `filters`
//! crate's own `PremulImage` pixel buffers, and supplies the `SlotSource`
//! the filter pipeline needs to materialize its reserved source slots.

use filters::{PremulImage, SlotSource};
use geom::{IntRect, PremulPixel};
use scene_protocol::{PixelFormat, Surface, SurfaceError, SurfaceFactory};

/// Reads `surface`'s premultiplied ARGB32 bytes into a `PremulImage` of
/// the same dimensions. Panics if `surface` isn't `Argb32` — the render
/// pipeline never hands this a raw-alpha surface.
pub fn surface_to_premul_image(surface: &dyn Surface) -> PremulImage {
    assert_eq!(surface.format(), PixelFormat::Argb32, "filter input must be Argb32");
    let width = surface.width();
    let height = surface.height();
    let stride = surface.stride();
    let data = surface.data_ref();
    let mut image = PremulImage::new(width, height);
    for y in 0..height {
        let row_start = y as usize * stride;
        for x in 0..width {
            let off = row_start + x as usize * 4;
            if off + 4 > data.len() {
                continue;
            }
            let packed = u32::from_ne_bytes([data[off], data[off + 1], data[off + 2], data[off + 3]]);
            image.set(x, y, PremulPixel::from_u32(packed));
        }
    }
    image
}

/// Writes `image`'s pixels into a freshly allocated `Argb32` surface.
pub fn premul_image_to_surface(
    image: &PremulImage,
    factory: &dyn SurfaceFactory,
) -> Result<Box<dyn Surface>, SurfaceError> {
    let mut surface = factory.new_image(PixelFormat::Argb32, image.width.max(1), image.height.max(1))?;
    let stride = surface.stride();
    {
        let data = surface.data();
        for y in 0..image.height {
            let row_start = y as usize * stride;
            for x in 0..image.width {
                let off = row_start + x as usize * 4;
                if off + 4 > data.len() {
                    continue;
                }
                let bytes = image.get(x as i64, y as i64).to_u32().to_ne_bytes();
                data[off..off + 4].copy_from_slice(&bytes);
            }
        }
    }
    surface.mark_dirty();
    Ok(surface)
}

/// The render pipeline's `SlotSource`: backs `SourceGraphic`/`SourceAlpha`
/// with the item's just-rendered content, cropped/padded to whatever
/// region a primitive asks for. `BackgroundImage`/`FillPaint`/
/// `StrokePaint` are out of this core's scope (gradient/pattern source
/// computation and backdrop compositing are external collaborators per
/// spec.md §1) and materialize as transparent, matching spec.md §7's
/// "missing paint source -> treated as none".
pub struct ContentSlotSource<'a> {
    pub source_graphic: &'a PremulImage,
    /// The device-space rectangle `source_graphic`'s `(0, 0)` corresponds
    /// to — the region the content was rendered into.
    pub content_region: IntRect,
}

impl<'a> SlotSource for ContentSlotSource<'a> {
    fn materialize(&self, slot: &filters::SlotName, region: IntRect) -> PremulImage {
        let mut out = PremulImage::new(region.width().max(0) as u32, region.height().max(0) as u32);
        let alpha_only = matches!(slot, filters::SlotName::SourceAlpha);
        let is_source = matches!(slot, filters::SlotName::SourceGraphic | filters::SlotName::SourceAlpha);
        if !is_source {
            return out;
        }
        for y in 0..out.height {
            for x in 0..out.width {
                let device_x = region.min_x + x as i32;
                let device_y = region.min_y + y as i32;
                let local_x = (device_x - self.content_region.min_x) as i64;
                let local_y = (device_y - self.content_region.min_y) as i64;
                let mut pixel = self.source_graphic.get(local_x, local_y);
                if alpha_only {
                    pixel = PremulPixel::new(pixel.a, 0, 0, 0);
                }
                out.set(x, y, pixel);
            }
        }
        out
    }
}
