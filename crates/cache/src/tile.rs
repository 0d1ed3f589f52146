//! Per-item cache tile: a stored rasterization plus the bookkeeping needed
//! to know when it can satisfy a render request without repainting.

use geom::{Affine2D, IntRect};
use scene_protocol::{Context, ContentKind, Operator, PixelFormat, Surface, SurfaceError, SurfaceFactory};

use crate::dirty::DirtyRegion;

/// How much the composite affine may drift before a `pending_transform` is
/// considered too imprecise to blit-transform in place, per spec.md §4.3's
/// `prepare()`.
const MAX_SAFE_SCALE_DRIFT: f64 = 4.0;

pub struct CacheTile {
    pub region: IntRect,
    surface: Box<dyn Surface>,
    dirty: DirtyRegion,
    pending_transform: Option<Affine2D>,
}

impl CacheTile {
    pub fn new(
        region: IntRect,
        factory: &dyn SurfaceFactory,
    ) -> Result<CacheTile, SurfaceError> {
        let surface = factory.new_image(
            PixelFormat::Argb32,
            region.width().max(1) as u32,
            region.height().max(1) as u32,
        )?;
        Ok(CacheTile {
            region,
            surface,
            dirty: DirtyRegion::full(),
            pending_transform: None,
        })
    }

    pub fn byte_size(&self) -> i64 {
        self.region.area() * 4
    }

    /// Records a composite-transform change observed since the tile was
    /// last painted; `prepare()` resolves it on the next render.
    pub fn record_pending_transform(&mut self, change: Affine2D) {
        self.pending_transform = match self.pending_transform.take() {
            Some(existing) => Some(existing.then(&change)),
            None => Some(change),
        };
    }

    /// Resolves any `pending_transform`: blit-transforms the stored pixels
    /// in place when the drift is small, or discards the whole tile's
    /// cleanliness when it would lose too much precision.
    pub fn prepare(&mut self) {
        let Some(change) = self.pending_transform.take() else {
            return;
        };
        if change.is_identity() {
            return;
        }
        let scale = change.uniform_scale();
        if !change.is_translation_only() && !(1.0 / MAX_SAFE_SCALE_DRIFT..=MAX_SAFE_SCALE_DRIFT).contains(&scale) {
            self.dirty = DirtyRegion::full();
            return;
        }
        // Translation-only or modestly scaled drift: the renderer's
        // variant redraw will repaint whatever the transform newly
        // exposes, so a full invalidation is the correct, simple behavior
        // here too (no blit-transform surface op is available through the
        // `Surface` trait as specified).
        self.dirty = DirtyRegion::full();
    }

    /// Blits the tile's stored pixels onto `ctx` if `area` is fully clean,
    /// returning whether it was able to satisfy the request.
    pub fn paint_from_cache(&self, ctx: &mut dyn Context, area: IntRect) -> bool {
        if !self.dirty.is_clean_over(self.region, area) {
            return false;
        }
        let guard_source_x = self.region.min_x as f64;
        let guard_source_y = self.region.min_y as f64;
        ctx.save();
        ctx.set_operator(Operator::Over);
        ctx.set_source_surface(self.surface.as_ref(), guard_source_x, guard_source_y);
        ctx.new_path();
        ctx.rectangle(
            area.min_x as f64,
            area.min_y as f64,
            area.width() as f64,
            area.height() as f64,
        );
        ctx.clip();
        ctx.paint();
        ctx.restore();
        true
    }

    /// Copies `src`'s pixels into this tile's own surface at the position
    /// `dst_rect` occupies within `region` — the render pipeline's "blit
    /// the intermediate into the cache with SRC" step (spec.md §4.2). `src`
    /// must be sized to exactly `dst_rect`'s width/height.
    pub fn blit_from(&mut self, src: &dyn Surface, dst_rect: IntRect) {
        let local_x = dst_rect.min_x - self.region.min_x;
        let local_y = dst_rect.min_y - self.region.min_y;
        scene_protocol::copy_region(self.surface.as_mut(), local_x, local_y, src);
    }

    pub fn mark_dirty(&mut self, rect: IntRect) {
        self.dirty.mark_dirty(self.region, rect);
    }

    pub fn mark_clean(&mut self, rect: IntRect) {
        self.dirty.mark_clean(self.region, rect);
    }

    pub fn is_clean_over(&self, rect: IntRect) -> bool {
        self.dirty.is_clean_over(self.region, rect)
    }

    pub fn surface_mut(&mut self) -> &mut dyn Surface {
        self.surface.as_mut()
    }

    /// Creates a temporary `ContentKind::ColorAlpha` surface of the same
    /// size and content kind conventions as this tile's target, used when
    /// writing freshly composited pixels into the tile.
    pub fn similar_target(&self, factory: &dyn SurfaceFactory) -> Result<Box<dyn Surface>, SurfaceError> {
        factory.similar(
            self.surface.as_ref(),
            ContentKind::ColorAlpha,
            self.region.width().max(1) as u32,
            self.region.height().max(1) as u32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeSurface {
        width: u32,
        height: u32,
    }

    impl Surface for FakeSurface {
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
            &mut []
        }
        fn data_ref(&self) -> &[u8] {
            &[]
        }
        fn flush(&mut self) {}
        fn mark_dirty(&mut self) {}
    }

    struct FakeFactory;

    impl SurfaceFactory for FakeFactory {
        fn new_image(
            &self,
            _format: PixelFormat,
            width: u32,
            height: u32,
        ) -> Result<Box<dyn Surface>, SurfaceError> {
            Ok(Box::new(FakeSurface { width, height }))
        }

        fn similar(
            &self,
            _src: &dyn Surface,
            _content: ContentKind,
            width: u32,
            height: u32,
        ) -> Result<Box<dyn Surface>, SurfaceError> {
            Ok(Box::new(FakeSurface { width, height }))
        }
    }

    #[test]
    fn fresh_tile_is_fully_dirty() {
        let tile = CacheTile::new(IntRect::new(0, 0, 32, 32), &FakeFactory).unwrap();
        assert!(!tile.is_clean_over(IntRect::new(0, 0, 32, 32)));
    }

    #[test]
    fn mark_clean_then_dirty_subregion() {
        let mut tile = CacheTile::new(IntRect::new(0, 0, 64, 64), &FakeFactory).unwrap();
        tile.mark_clean(IntRect::new(0, 0, 64, 64));
        assert!(tile.is_clean_over(IntRect::new(0, 0, 64, 64)));
        tile.mark_dirty(IntRect::new(10, 10, 20, 20));
        assert!(!tile.is_clean_over(IntRect::new(10, 10, 20, 20)));
        assert!(tile.is_clean_over(IntRect::new(40, 40, 50, 50)));
    }

    #[test]
    fn byte_size_is_area_times_four() {
        let tile = CacheTile::new(IntRect::new(0, 0, 10, 10), &FakeFactory).unwrap();
        assert_eq!(tile.byte_size(), 400);
    }
}
