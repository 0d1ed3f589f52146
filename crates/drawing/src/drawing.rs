//! `Drawing`: the public facade of spec.md §6, owning the tree, the
//! cache registry, and the callback list, and wiring every `Item`
//! mutator through `scheduler::mark_for_rendering`/`mark_for_update`
//! the way `drawing_tree`'s own setters, by design, do not.

use cache::CacheRegistry;
use drawing_tree::{DrawingItem, ItemKey, ItemState, ItemVariant, Tree, UpdatePass};
use filters::FilterPipeline;
use geom::{Affine2D, IntRect, RectF};
use render_pipeline::{OutlineColors, RenderPipeline};
use scene_protocol::{Color, Context, PaintResolver, Preferences, RenderMode};
use scheduler::{CallbackList, SchedulerCallbacks};

use crate::error::DrawingError;

/// Every attribute `update` needs to recompute after a mutation, per
/// spec.md §4.1: bbox, drawbox, cache readiness, and pick readiness all
/// depend on the mutated attribute.
fn derived_flags() -> ItemState {
    ItemState::BBOX | ItemState::DRAWBOX | ItemState::CACHE_READY | ItemState::PICK_READY
}

/// The scene-graph renderer (spec.md §3-§6): one instance per document.
pub struct Drawing {
    tree: Tree,
    registry: CacheRegistry<ItemKey>,
    render_mode: RenderMode,
    cache_limit: IntRect,
    outline_colors: OutlineColors,
    delta: f64,
    callbacks: CallbackList,
}

impl Drawing {
    /// Builds a `Drawing` rooted at `root_variant`, reading worker-thread
    /// count, cache budget, and outline color from `prefs` at boot, per
    /// spec.md §6's "queried at boot" preferences list. `num_threads` is
    /// not stored here: it's a property of each `FilterPipeline` the host
    /// attaches via `Item::set_filter`, not of the `Drawing` itself.
    pub fn new(root_variant: ItemVariant, prefs: &dyn Preferences) -> Self {
        let _num_threads = prefs.int("rendering/num-threads", 1, 256);
        let cache_budget_mb = prefs.int("rendering/cache-budget-mb", 1, 4096) as i64;
        let outline_color = prefs.color("rendering/outline-color");

        Self {
            tree: Tree::new(root_variant),
            registry: CacheRegistry::new(cache_budget_mb * 1024 * 1024),
            render_mode: RenderMode::Normal,
            cache_limit: IntRect::INFINITE,
            outline_colors: OutlineColors {
                shape: Color::from_packed_argb32(outline_color),
                clip: Color::from_packed_argb32(outline_color),
                mask: Color::from_packed_argb32(outline_color),
            },
            delta: 0.0,
            callbacks: CallbackList::new(),
        }
    }

    pub fn root(&self) -> ItemKey {
        self.tree.root()
    }

    pub fn set_render_mode(&mut self, mode: RenderMode) {
        self.render_mode = mode;
    }

    pub fn set_outline_color(&mut self, rgba: u32) {
        let color = Color::from_packed_argb32(rgba);
        self.outline_colors = OutlineColors {
            shape: color,
            clip: color,
            mask: color,
        };
    }

    pub fn set_cache_budget(&mut self, bytes: i64) {
        self.registry.set_budget_bytes(bytes);
    }

    pub fn set_cache_limit(&mut self, rect: IntRect) {
        self.cache_limit = rect;
    }

    /// Pick tolerance default; `pick` still takes its own tolerance
    /// argument, so this only affects callers that don't pass one.
    pub fn set_delta(&mut self, tolerance: f64) {
        self.delta = tolerance;
    }

    /// Connects a host observer; see `SchedulerCallbacks`.
    pub fn connect(&mut self, callback: Box<dyn SchedulerCallbacks>) {
        self.callbacks.connect(callback);
    }

    /// Brings every derived attribute in the tree up to date, starting
    /// from the root, then turns the accumulated damage into ancestor
    /// cache invalidation and `needs-redraw` signals, per spec.md §4.6's
    /// "the host batches needs-redraw regions and later calls
    /// `root.update(area)`".
    pub fn update(&mut self, area: IntRect) {
        let root = self.tree.root();
        let mut pass = UpdatePass::new(
            &mut self.tree,
            &mut self.registry,
            self.cache_limit,
            self.render_mode,
        );
        pass.update(root, area, Affine2D::IDENTITY, ItemState::all(), ItemState::empty());
        let damage = std::mem::take(&mut pass.damage);

        self.registry.evict_to_budget();

        for rect in damage {
            self.callbacks.needs_redraw(rect);
        }
    }

    /// Renders `area` of the tree onto `ctx`, per spec.md §4.2.
    pub fn render(&mut self, ctx: &mut dyn Context, area: IntRect, resolver: &dyn PaintResolver) {
        let root = self.tree.root();
        let mut pipeline = RenderPipeline::new(
            &mut self.registry,
            resolver,
            self.render_mode,
            self.cache_limit,
            OutlineColors {
                shape: self.outline_colors.shape,
                clip: self.outline_colors.clip,
                mask: self.outline_colors.mask,
            },
        );
        pipeline.render(&self.tree, root, ctx, area);
    }

    /// Spatial hit test (spec.md §4.5), starting from the root.
    pub fn pick(&mut self, point: (f64, f64), tolerance: f64, sticky: bool) -> Option<ItemKey> {
        let root = self.tree.root();
        let outline = self.render_mode.is_outline();
        drawing_tree::pick(&mut self.tree, root, point, tolerance, sticky, outline)
    }

    /// Inserts a new, unattached item, returning its handle. The host
    /// attaches it via `append_child`/`set_clip`/`set_mask`.
    pub fn insert(&mut self, variant: ItemVariant) -> ItemKey {
        self.tree.insert(variant)
    }

    pub fn get(&self, item: ItemKey) -> Option<&DrawingItem> {
        self.tree.get(item)
    }

    // -- Item mutators (spec.md §4.1), each routed through
    // mark_for_rendering (with the pre-mutation bbox/drawbox) then
    // mark_for_update, per spec.md's "setters mark an item for rendering
    // (with the old bbox) then for update". --

    pub fn append_child(&mut self, host: ItemKey, child: ItemKey) -> Result<(), DrawingError> {
        self.tree.append_child(host, child)?;
        self.mark_rendered_then_updated(host);
        Ok(())
    }

    pub fn prepend_child(&mut self, host: ItemKey, child: ItemKey) -> Result<(), DrawingError> {
        self.tree.prepend_child(host, child)?;
        self.mark_rendered_then_updated(host);
        Ok(())
    }

    pub fn set_z_order(&mut self, host: ItemKey, child: ItemKey, index: usize) -> Result<(), DrawingError> {
        self.tree.set_z_order(host, child, index)?;
        self.mark_rendered_then_updated(host);
        Ok(())
    }

    pub fn clear_children(&mut self, host: ItemKey) -> Result<(), DrawingError> {
        self.mark_for_rendering(host);
        self.tree.clear_children(host)?;
        self.mark_for_update(host, true);
        Ok(())
    }

    pub fn set_clip(&mut self, host: ItemKey, clip: Option<ItemKey>) -> Result<(), DrawingError> {
        self.mark_for_rendering(host);
        self.tree.set_clip(host, clip)?;
        self.mark_for_update(host, true);
        Ok(())
    }

    pub fn set_mask(&mut self, host: ItemKey, mask: Option<ItemKey>) -> Result<(), DrawingError> {
        self.mark_for_rendering(host);
        self.tree.set_mask(host, mask)?;
        self.mark_for_update(host, true);
        Ok(())
    }

    /// Attaches or replaces `key`'s filter chain. `drawing_tree` carries
    /// no setter of its own for this field (filter identity doesn't
    /// participate in the ancestor-cycle checks `set_clip`/`set_mask`
    /// need), so the facade writes it directly and re-derives the bbox.
    pub fn set_filter(&mut self, key: ItemKey, filter: Option<FilterPipeline>) -> Result<(), DrawingError> {
        self.mark_for_rendering(key);
        {
            let item = self.tree.get_mut(key).ok_or(DrawingError::NoSuchItem)?;
            item.filter = filter;
        }
        self.mark_for_update(key, true);
        Ok(())
    }

    /// Replaces a shape or glyph's style (fill, stroke, dash, ...).
    /// `drawing_tree` carries no setter of its own for this field either,
    /// for the same reason as `set_filter`. A no-op on any other variant.
    pub fn set_shape_style(&mut self, key: ItemKey, style: scene_protocol::Style) -> Result<(), DrawingError> {
        self.mark_for_rendering(key);
        {
            let item = self.tree.get_mut(key).ok_or(DrawingError::NoSuchItem)?;
            match &mut item.variant {
                ItemVariant::Shape(shape) => shape.style = style,
                ItemVariant::Glyphs(glyphs) => glyphs.style = style,
                _ => {}
            }
        }
        self.mark_for_update(key, false);
        Ok(())
    }

    pub fn set_transform(&mut self, key: ItemKey, transform: Option<Affine2D>) -> Result<(), DrawingError> {
        self.mark_for_rendering(key);
        self.tree.set_transform(key, transform)?;
        self.mark_for_update(key, false);
        Ok(())
    }

    pub fn set_opacity(&mut self, key: ItemKey, opacity: f64) -> Result<(), DrawingError> {
        self.mark_for_rendering(key);
        self.tree.set_opacity(key, opacity)?;
        self.mark_for_update(key, false);
        Ok(())
    }

    pub fn set_visible(&mut self, key: ItemKey, visible: bool) -> Result<(), DrawingError> {
        self.mark_for_rendering(key);
        self.tree.set_visible(key, visible)?;
        self.mark_for_update(key, false);
        Ok(())
    }

    pub fn set_sensitive(&mut self, key: ItemKey, sensitive: bool) -> Result<(), DrawingError> {
        self.tree.set_sensitive(key, sensitive)?;
        Ok(())
    }

    pub fn set_item_bbox(&mut self, key: ItemKey, rect: RectF) -> Result<(), DrawingError> {
        self.mark_for_rendering(key);
        self.tree.set_item_bbox(key, rect)?;
        self.mark_for_update(key, false);
        Ok(())
    }

    pub fn set_cached(&mut self, key: ItemKey, on: bool, persistent: bool) -> Result<(), DrawingError> {
        self.tree.set_cached(key, on, persistent)?;
        Ok(())
    }

    /// Destroys `key` and everything it owns, emitting `item_deleted` for
    /// it first so the host can drop any reference before the handle
    /// goes stale.
    pub fn destroy(&mut self, key: ItemKey) {
        self.mark_for_rendering(key);
        self.callbacks.item_deleted(key);
        self.tree.destroy(key);
    }

    pub fn get_bbox(&self, key: ItemKey) -> Option<IntRect> {
        self.tree.get(key).map(|item| item.bbox)
    }

    pub fn get_drawbox(&self, key: ItemKey) -> Option<IntRect> {
        self.tree.get(key).map(|item| item.drawbox)
    }

    pub fn get_ctm(&self, key: ItemKey) -> Option<Affine2D> {
        self.tree.get(key).map(|item| item.ctm)
    }

    pub fn get_item_bbox(&self, key: ItemKey) -> Option<RectF> {
        self.tree.get(key).map(|item| item.item_bbox)
    }

    fn mark_for_rendering(&mut self, key: ItemKey) {
        scheduler::mark_for_rendering(
            &self.tree,
            &mut self.registry,
            key,
            self.render_mode,
            &mut self.callbacks,
        );
    }

    fn mark_for_update(&mut self, key: ItemKey, propagate: bool) {
        scheduler::mark_for_update(&mut self.tree, key, derived_flags(), propagate, &mut self.callbacks);
    }

    fn mark_rendered_then_updated(&mut self, key: ItemKey) {
        self.mark_for_rendering(key);
        self.mark_for_update(key, true);
    }
}
