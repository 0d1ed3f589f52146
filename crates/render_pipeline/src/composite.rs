//! The §4.2 composite algorithm: cache read, fast path for items with no
//! clip/mask/filter/partial-opacity, and the intermediate-surface slow
//! path for everything else.

use cache::CacheRegistry;
use drawing_tree::{ItemKey, ItemVariant, Tree};
use filters::FilterPipeline;
use geom::IntRect;
use scene_protocol::{
    Color, ContentKind, Context, ContextGuard, Operator, PaintResolver, RenderMode,
};

use crate::clip_shape::resolve_clip_source;
use crate::filter_bridge::{ContentSlotSource, premul_image_to_surface, surface_to_premul_image};
use crate::mask::luminance_to_alpha;
use crate::outline::{OutlineColors, render_outline};

/// Drives one `render(area)` call's worth of compositing over a tree.
/// Holds the cache registry and per-frame state that's constant across
/// the whole recursive walk (paint resolver, render mode, cache limit).
pub struct RenderPipeline<'a> {
    pub registry: &'a mut CacheRegistry<ItemKey>,
    pub resolver: &'a dyn PaintResolver,
    pub render_mode: RenderMode,
    /// Device-space rectangle beyond which no cache tile is allocated,
    /// per spec.md §4.3's cache limit.
    pub cache_limit: IntRect,
    pub outline_colors: OutlineColors,
}

impl<'a> RenderPipeline<'a> {
    pub fn new(
        registry: &'a mut CacheRegistry<ItemKey>,
        resolver: &'a dyn PaintResolver,
        render_mode: RenderMode,
        cache_limit: IntRect,
        outline_colors: OutlineColors,
    ) -> Self {
        Self {
            registry,
            resolver,
            render_mode,
            cache_limit,
            outline_colors,
        }
    }

    /// Renders `key` (and its descendants) into `ctx`, clipped to `area`.
    /// Entry point for both the top-level `Drawing::render` call and every
    /// recursive child/clip/mask render inside this crate.
    pub fn render(&mut self, tree: &Tree, key: ItemKey, ctx: &mut dyn Context, area: IntRect) {
        let Some(item) = tree.get(key) else { return };
        if !item.visible {
            return;
        }

        if self.render_mode.is_outline() {
            let composite_area = area.intersect(&item.bbox);
            if composite_area.is_empty() {
                return;
            }
            render_outline(
                tree,
                key,
                ctx,
                composite_area,
                self.outline_colors.shape,
                &self.outline_colors,
                self.resolver,
            );
            return;
        }

        let mut composite_area = area.intersect(&item.drawbox);
        if composite_area.is_empty() {
            return;
        }

        if item.cached {
            if let Some(tile) = self.registry.tile_mut(key) {
                tile.prepare();
                if tile.paint_from_cache(ctx, composite_area) {
                    return;
                }
            } else {
                let region = item.drawbox.intersect(&self.cache_limit);
                if !region.is_empty() {
                    if let Err(err) = self.registry.allocate_tile(key, region, ctx.surface_factory()) {
                        log::debug!("cache tile allocation failed, rendering uncached this frame: {err}");
                    }
                }
            }
        }

        let filter_applies = item.filter.is_some() && self.render_mode.renders_filters();
        if filter_applies {
            if let Some(filter) = item.filter.as_ref() {
                composite_area = filter.compute_drawbox(composite_area, item.ctm).intersect(&item.drawbox);
                if composite_area.is_empty() {
                    return;
                }
            }
        }

        let intermediate_needed =
            item.clip.is_some() || item.mask.is_some() || filter_applies || item.opacity < 0.995;

        if intermediate_needed {
            self.render_slow_path(tree, key, ctx, composite_area);
        } else {
            self.render_fast_path(tree, key, ctx, composite_area);
        }
    }

    /// Renders only `key`'s own content (spec.md §4.1's `render_variant`):
    /// a `Group` recurses the full pipeline over each child in order;
    /// every other variant paints directly via `drawing_tree::paint_content`.
    fn render_own_content(&mut self, tree: &Tree, key: ItemKey, ctx: &mut dyn Context, area: IntRect) {
        let Some(item) = tree.get(key) else { return };
        match &item.variant {
            ItemVariant::Group(_) => {
                for &child in &item.children {
                    self.render(tree, child, ctx, area);
                }
            }
            _ => {
                drawing_tree::paint_content(tree, key, ctx, self.resolver, false, Color::TRANSPARENT);
            }
        }
    }

    /// No clip, no mask, no filter, opacity ~1: render straight into `ctx`
    /// (or, if cached, into a group first so the pixels can be blitted into
    /// the tile).
    fn render_fast_path(&mut self, tree: &Tree, key: ItemKey, ctx: &mut dyn Context, area: IntRect) {
        let cached = tree.get(key).map(|item| item.cached).unwrap_or(false);
        if !cached {
            self.render_own_content(tree, key, ctx, area);
            return;
        }

        let popped = {
            let mut guard = ContextGuard::new(&mut *ctx);
            let c = guard.ctx();
            c.new_path();
            c.rectangle(area.min_x as f64, area.min_y as f64, area.width() as f64, area.height() as f64);
            c.clip();
            c.push_group_with_content(ContentKind::ColorAlpha);
            self.render_own_content(tree, key, c, area);
            c.pop_group_to_surface()
        };

        if let Some(tile) = self.registry.tile_mut(key) {
            tile.blit_from(popped.as_ref(), area);
            tile.mark_clean(area);
            tile.paint_from_cache(ctx, area);
        } else {
            let mut guard = ContextGuard::new(&mut *ctx);
            let c = guard.ctx();
            c.set_operator(Operator::Over);
            c.set_source_surface(popped.as_ref(), area.min_x as f64, area.min_y as f64);
            c.new_path();
            c.rectangle(area.min_x as f64, area.min_y as f64, area.width() as f64, area.height() as f64);
            c.clip();
            c.paint();
        }
    }

    /// Clip, mask, filter, or partial opacity: composite everything into a
    /// single intermediate group, then present it (blit into the cache, or
    /// paint straight onto `ctx`).
    fn render_slow_path(&mut self, tree: &Tree, key: ItemKey, ctx: &mut dyn Context, area: IntRect) {
        let Some(item) = tree.get(key) else { return };
        let opacity = item.opacity;
        let clip_key = item.clip;
        let mask_key = item.mask;
        let ctm = item.ctm;
        let cached = item.cached;
        let has_filter = item.filter.is_some() && self.render_mode.renders_filters();

        let mut guard = ContextGuard::new(&mut *ctx);
        let c = guard.ctx();
        c.new_path();
        c.rectangle(area.min_x as f64, area.min_y as f64, area.width() as f64, area.height() as f64);
        c.clip();

        c.push_group_with_content(ContentKind::ColorAlpha);

        // Clip alpha: flood (0, 0, 0, opacity), restricted to the clip
        // shape's coverage when there is one.
        c.set_operator(Operator::Source);
        if let Some(clip_item) = clip_key {
            resolve_clip_source(tree, clip_item, c);
            c.set_operator(Operator::Source);
            c.paint_with_alpha(opacity);
        } else {
            c.set_source_rgba(0.0, 0.0, 0.0, opacity);
            c.paint();
        }
        c.set_operator(Operator::Over);

        // Mask: render the mask subtree, convert its luminance to alpha,
        // and AND it into what's accumulated so far.
        if let Some(mask_item) = mask_key {
            c.push_group();
            self.render(tree, mask_item, c, area);
            let mask_surface = c.pop_group_to_surface();
            match luminance_to_alpha(mask_surface.as_ref(), c.surface_factory()) {
                Ok(alpha_surface) => {
                    c.set_operator(Operator::In);
                    c.set_source_surface(alpha_surface.as_ref(), area.min_x as f64, area.min_y as f64);
                    c.paint();
                    c.set_operator(Operator::Over);
                }
                Err(err) => {
                    log::debug!("mask alpha surface allocation failed, rendering without mask: {err}");
                }
            }
        }

        // Content, with an optional filter applied before it's ANDed into
        // the clip/mask/opacity layer accumulated so far.
        c.push_group();
        self.render_own_content(tree, key, c, area);
        c.set_operator(Operator::In);
        if has_filter {
            let content_surface = c.pop_group_to_surface();
            if let Some(filter) = filter_for(tree, key) {
                apply_filter(filter, content_surface.as_ref(), area, ctm, c);
            } else {
                c.set_source_surface(content_surface.as_ref(), area.min_x as f64, area.min_y as f64);
            }
        } else {
            c.pop_group_to_source();
        }
        c.paint();

        if cached {
            let intermediate = c.pop_group_to_surface();
            if self.registry.tile_mut(key).is_some() {
                drop(guard);
                if let Some(tile) = self.registry.tile_mut(key) {
                    tile.blit_from(intermediate.as_ref(), area);
                    tile.mark_clean(area);
                    tile.paint_from_cache(ctx, area);
                }
            } else {
                // Tile allocation failed earlier (transient resource
                // limit): fall through to an uncached paint instead of
                // dropping the popped intermediate on the floor.
                c.set_source_surface(intermediate.as_ref(), area.min_x as f64, area.min_y as f64);
                c.set_operator(Operator::Over);
                c.paint();
            }
        } else {
            c.pop_group_to_source();
            c.set_operator(Operator::Over);
            c.paint();
        }
    }
}

fn filter_for(tree: &Tree, key: ItemKey) -> Option<&FilterPipeline> {
    tree.get(key).and_then(|item| item.filter.as_ref())
}

fn apply_filter(
    filter: &FilterPipeline,
    content_surface: &dyn scene_protocol::Surface,
    area: IntRect,
    ctm: geom::Affine2D,
    ctx: &mut dyn Context,
) {
    let source_image = surface_to_premul_image(content_surface);
    let source = ContentSlotSource {
        source_graphic: &source_image,
        content_region: area,
    };
    let output = filter.run(&source, area, ctm);
    match premul_image_to_surface(&output, ctx.surface_factory()) {
        Ok(filtered_surface) => {
            ctx.set_source_surface(filtered_surface.as_ref(), area.min_x as f64, area.min_y as f64);
        }
        Err(err) => {
            log::debug!("filter output surface allocation failed, using unfiltered content: {err}");
            ctx.set_source_surface(content_surface, area.min_x as f64, area.min_y as f64);
        }
    }
}
