//! Raw pixel copy between two `Surface`s, used wherever the render
//! pipeline needs to move pixels between a popped group and a cache
//! tile's own backing surface — operations the `Context` trait has no
//! primitive for, since it only composites onto its own current target.
//!
//! Both surfaces are assumed `PixelFormat::Argb32`, 4 bytes per pixel,
//! native-endian-packed premultiplied ARGB (the same packing
//! `geom::PremulPixel::to_u32`/`from_u32` use).

use crate::surface::Surface;

/// Copies `src` onto `dst` at `(dst_x, dst_y)`, clipped to whichever of
/// the two surfaces is smaller. A plain byte copy, not a compositing
/// operation — this is `SRC`, not `OVER`.
pub fn copy_region(dst: &mut dyn Surface, dst_x: i32, dst_y: i32, src: &dyn Surface) {
    let width = src.width().min(dst.width().saturating_sub(dst_x.max(0) as u32));
    let height = src.height().min(dst.height().saturating_sub(dst_y.max(0) as u32));
    if width == 0 || height == 0 || dst_x < 0 && (-dst_x) as u32 >= src.width() {
        return;
    }

    let src_stride = src.stride();
    let dst_stride = dst.stride();
    let src_data = src.data_ref();
    let dst_data = dst.data();

    for row in 0..height {
        let src_off = row as usize * src_stride;
        let dst_off = (row as i32 + dst_y) as usize * dst_stride + (dst_x.max(0) as usize * 4);
        let row_bytes = width as usize * 4;
        if src_off + row_bytes > src_data.len() || dst_off + row_bytes > dst_data.len() {
            continue;
        }
        dst_data[dst_off..dst_off + row_bytes].copy_from_slice(&src_data[src_off..src_off + row_bytes]);
    }
    dst.mark_dirty();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::PixelFormat;

    struct ByteSurface {
        width: u32,
        height: u32,
        data: Vec<u8>,
    }

    impl ByteSurface {
        fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                data: vec![0u8; width as usize * height as usize * 4],
            }
        }
    }

    impl Surface for ByteSurface {
        fn format(&self) -> PixelFormat {
            PixelFormat::Argb32
        }
        fn width(&self) -> u32 {
            self.width
        }
        fn height(&self) -> u32 {
            self.height
        }
        fn stride(&self) -> usize {
            self.width as usize * 4
        }
        fn data(&mut self) -> &mut [u8] {
            &mut self.data
        }
        fn data_ref(&self) -> &[u8] {
            &self.data
        }
        fn flush(&mut self) {}
        fn mark_dirty(&mut self) {}
    }

    #[test]
    fn copies_full_surface_at_origin() {
        let mut src = ByteSurface::new(2, 2);
        src.data.fill(0xAB);
        let mut dst = ByteSurface::new(4, 4);
        copy_region(&mut dst, 1, 1, &src);
        // top-left of the copied block.
        let idx = (1 * dst.stride()) + 1 * 4;
        assert_eq!(dst.data[idx], 0xAB);
        // outside the copied block stays zero.
        assert_eq!(dst.data[0], 0);
    }

    #[test]
    fn clips_to_destination_bounds() {
        let mut src = ByteSurface::new(4, 4);
        src.data.fill(0xFF);
        let mut dst = ByteSurface::new(2, 2);
        copy_region(&mut dst, 0, 0, &src);
        assert_eq!(dst.data.len(), 16);
    }
}
