//! `DrawingItem::update` (spec.md §4.1, §9): recomputes `ctm`, `bbox`,
//! `drawbox`, and the cache score, recursing into children, clip, and
//! mask as needed, and records every item whose own content needs
//! repainting.

use std::rc::Rc;

use cache::CacheRegistry;
use geom::{Affine2D, IntRect};
use scene_protocol::{PathVector, RenderMode, Style};

use crate::item::ItemKey;
use crate::item::ItemVariant;
use crate::state::ItemState;
use crate::tree::Tree;

/// Threads the registry, cache-limit rectangle, and render mode through a
/// recursive `update` pass, accumulating the drawbox rectangles of every
/// item that needs its own content repainted (spec.md §4.1 step 10). The
/// caller (the `drawing` facade, via `scheduler`) turns `damage` into
/// ancestor cache invalidation and a host `needs-redraw` signal.
pub struct UpdatePass<'a> {
    pub tree: &'a mut Tree,
    pub registry: &'a mut CacheRegistry<ItemKey>,
    pub cache_limit: IntRect,
    pub render_mode: RenderMode,
    pub damage: Vec<IntRect>,
}

impl<'a> UpdatePass<'a> {
    pub fn new(
        tree: &'a mut Tree,
        registry: &'a mut CacheRegistry<ItemKey>,
        cache_limit: IntRect,
        render_mode: RenderMode,
    ) -> Self {
        Self {
            tree,
            registry,
            cache_limit,
            render_mode,
            damage: Vec::new(),
        }
    }

    pub fn update(
        &mut self,
        key: ItemKey,
        area: IntRect,
        parent_ctm: Affine2D,
        requested: ItemState,
        mut reset: ItemState,
    ) {
        // 1. `propagate` forces children to reset whatever they don't
        // already have set, per spec.md §4.1 step 1.
        let propagate = self.tree.get(key).map(|i| i.propagate).unwrap_or(false);
        if propagate {
            if let Some(item) = self.tree.get(key) {
                reset |= ItemState::all().difference(item.state);
            }
            if let Some(item) = self.tree.get_mut(key) {
                item.propagate = false;
            }
        }

        // 2. clear the reset bits.
        if let Some(item) = self.tree.get_mut(key) {
            item.state.remove(reset);
        }

        // 3. already satisfied?
        let satisfied = self
            .tree
            .get(key)
            .map(|i| i.state.contains(requested))
            .unwrap_or(true);
        if satisfied {
            return;
        }

        // 4. bbox already valid but `area` doesn't reach this item's
        // painted region: nothing deeper needs to run.
        if let Some(item) = self.tree.get(key) {
            if item.state.contains(ItemState::BBOX) {
                let relevant = if self.render_mode.is_outline() {
                    item.bbox
                } else {
                    item.drawbox
                };
                if !area.intersects(&relevant) {
                    return;
                }
            }
        }

        // 5. compose ctm; remember the change for cache invalidation.
        let (local, old_ctm) = match self.tree.get(key) {
            Some(item) => (item.local_transform(), item.ctm),
            None => return,
        };
        let new_ctm = local.then(&parent_ctm);
        let ctm_change = old_ctm
            .inverse()
            .map(|inv| inv.then(&new_ctm))
            .unwrap_or(Affine2D::IDENTITY);
        if let Some(item) = self.tree.get_mut(key) {
            item.ctm = new_ctm;
        }

        // 6. variant-specific bbox recomputation; recurses into children.
        self.update_variant(key, area, new_ctm, requested, reset);

        // 7. clip/mask, then derive drawbox.
        let (clip, mask, has_filter) = match self.tree.get(key) {
            Some(item) => (item.clip, item.mask, item.filter.is_some()),
            None => return,
        };
        if let Some(clip_key) = clip {
            self.update(clip_key, area, new_ctm, requested, reset);
        }
        if let Some(mask_key) = mask {
            self.update(mask_key, area, new_ctm, requested, reset);
        }

        let bbox = self.tree.get(key).map(|i| i.bbox).unwrap_or(IntRect::EMPTY);
        let mut drawbox = bbox;
        if let Some(item) = self.tree.get(key) {
            if let Some(filter) = &item.filter {
                drawbox = filter.compute_drawbox(bbox, new_ctm);
            }
        }
        if let Some(clip_key) = clip {
            if let Some(clip_item) = self.tree.get(clip_key) {
                drawbox = drawbox.intersect(&clip_item.bbox);
            }
        }
        if let Some(mask_key) = mask {
            if let Some(mask_item) = self.tree.get(mask_key) {
                drawbox = drawbox.intersect(&mask_item.drawbox);
            }
        }

        if let Some(item) = self.tree.get_mut(key) {
            item.drawbox = drawbox;
            item.state
                .insert(ItemState::BBOX | ItemState::DRAWBOX | ItemState::PICK_READY);
        }

        // 8. cache score, per spec.md §4.3 (drawbox area clipped to the
        // cache limit, per SPEC_FULL §10.6's `_cacheRect()` reading).
        let filter_complexity = self
            .tree
            .get(key)
            .and_then(|i| i.filter.as_ref())
            .map(|f| (f.stages.len() as f64).max(1.0))
            .unwrap_or(1.0);
        let filter_expansion = if bbox.area() > 0 {
            drawbox.area() as f64 / bbox.area() as f64
        } else if drawbox.area() > 0 {
            2.0
        } else {
            1.0
        };
        let clip_area = clip.and_then(|k| self.tree.get(k)).map(|i| i.bbox.area());
        let mask_score = mask.and_then(|k| self.tree.get(k)).map(|i| i.cache_score).unwrap_or(0.0);
        let scored_area = drawbox.intersect(&self.cache_limit).area();
        let score = cache::compute_score(scored_area, filter_complexity, filter_expansion, clip_area, mask_score);
        if let Some(item) = self.tree.get_mut(key) {
            item.cache_score = score;
            item.state.insert(ItemState::CACHE_READY);
        }
        self.registry.update_candidate_score(key, score);

        // 9. transform-driven cache invalidation / eviction.
        let visible = self.tree.get(key).map(|i| i.visible).unwrap_or(false);
        let off_canvas = drawbox.intersect(&self.cache_limit).is_empty();
        if self.registry.has_tile(key) {
            if !visible || off_canvas {
                self.registry.remove_tile(key);
            } else if !ctm_change.is_identity() {
                if let Some(tile) = self.registry.tile_mut(key) {
                    tile.record_pending_transform(ctm_change);
                }
            }
        }

        // 10. does this item need to paint its own content?
        let needs_own_paint = self
            .tree
            .get(key)
            .map(|i| i.variant.draws_own_content(has_filter))
            .unwrap_or(false);
        if needs_own_paint && !drawbox.is_empty() {
            self.damage.push(drawbox);
        }
    }

    fn update_variant(
        &mut self,
        key: ItemKey,
        area: IntRect,
        ctm: Affine2D,
        requested: ItemState,
        reset: ItemState,
    ) {
        enum Kind {
            Group {
                child_transform: Option<Affine2D>,
                children: Vec<ItemKey>,
            },
            Text {
                children: Vec<ItemKey>,
            },
            Shape {
                path: Option<Rc<dyn PathVector>>,
                style: Style,
                markers: Vec<ItemKey>,
            },
            Image {
                rect: geom::RectF,
            },
            Glyphs {
                path: Option<Rc<dyn PathVector>>,
            },
        }

        let kind = match self.tree.get(key) {
            Some(item) => match &item.variant {
                ItemVariant::Group(group) => Kind::Group {
                    child_transform: group.child_transform,
                    children: item.children.clone(),
                },
                ItemVariant::Text(_) => Kind::Text {
                    children: item.children.clone(),
                },
                ItemVariant::Shape(shape) => Kind::Shape {
                    path: shape.path.clone(),
                    style: shape.style.clone(),
                    markers: shape.markers.clone(),
                },
                ItemVariant::Image(image) => Kind::Image { rect: image.rect },
                ItemVariant::Glyphs(glyphs) => Kind::Glyphs {
                    path: glyphs.path.clone(),
                },
            },
            None => return,
        };

        let bbox = match kind {
            Kind::Group {
                child_transform,
                children,
            } => {
                let child_ctm = match child_transform {
                    Some(t) => t.then(&ctm),
                    None => ctm,
                };
                for child in &children {
                    self.update(*child, area, child_ctm, requested, reset);
                }
                self.union_bboxes(&children)
            }
            Kind::Text { children } => {
                for child in &children {
                    self.update(*child, area, ctm, requested, reset);
                }
                self.union_bboxes(&children)
            }
            Kind::Shape { path, style, markers } => {
                let raw = path.as_ref().and_then(|p| p.bounds_exact_transformed(ctm));
                let mut bbox = raw.map(|r| r.to_outward_int_rect()).unwrap_or(IntRect::EMPTY);
                if style.is_stroked() && !bbox.is_empty() {
                    let width = style.stroke_width * ctm.uniform_scale();
                    let expand = width.max(0.125) + style.miter_limit * width;
                    let expand = expand.ceil().max(0.0) as i32;
                    bbox = bbox.inflate(expand, expand);
                }
                for marker in &markers {
                    self.update(*marker, area, ctm, requested, reset);
                }
                bbox.union(&self.union_bboxes(&markers))
            }
            Kind::Image { rect } => {
                if rect.is_empty() {
                    IntRect::EMPTY
                } else {
                    ctm.transform_rect_bounds(rect).to_outward_int_rect()
                }
            }
            Kind::Glyphs { path } => path
                .as_ref()
                .and_then(|p| p.bounds_exact_transformed(ctm))
                .map(|r| r.to_outward_int_rect())
                .unwrap_or(IntRect::EMPTY),
        };

        if let Some(item) = self.tree.get_mut(key) {
            item.bbox = bbox;
        }
    }

    fn union_bboxes(&self, keys: &[ItemKey]) -> IntRect {
        keys.iter()
            .fold(IntRect::EMPTY, |acc, k| acc.union(&self.tree.get(*k).map(|i| i.bbox).unwrap_or(IntRect::EMPTY)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{GroupData, ShapeData};
    use cache::CacheRegistry;
    use geom::RectF;
    use scene_protocol::{Color, FillRule, Paint};

    struct RectPath {
        rect: RectF,
    }

    impl PathVector for RectPath {
        fn subpaths(&self) -> Vec<scene_protocol::SubPath> {
            Vec::new()
        }

        fn bounds_exact_transformed(&self, transform: Affine2D) -> Option<RectF> {
            Some(transform.transform_rect_bounds(self.rect))
        }

        fn point_bbox_wind_distance(
            &self,
            _transform: Affine2D,
            _point: (f64, f64),
            _viewbox: Option<RectF>,
        ) -> (i32, f64) {
            (0, f64::INFINITY)
        }
    }

    fn registry() -> CacheRegistry<ItemKey> {
        CacheRegistry::new(i64::MAX)
    }

    #[test]
    fn scenario_one_rectangle_bbox() {
        // spec.md §8 scenario 1: rectangle (10,10)-(30,30), no stroke.
        let mut tree = Tree::new(ItemVariant::Group(GroupData::default()));
        let root = tree.root();
        let rect_key = tree.insert(ItemVariant::Shape(ShapeData {
            path: Some(Rc::new(RectPath {
                rect: RectF::new(10.0, 10.0, 30.0, 30.0),
            })),
            style: Style {
                fill: Paint::Color(Color::new(1.0, 0.0, 0.0, 1.0)),
                fill_rule: FillRule::NonZero,
                stroke: Paint::None,
                ..Style::default()
            },
            markers: Vec::new(),
            pick_memo: None,
        }));
        tree.append_child(root, rect_key).unwrap();

        let mut reg = registry();
        let mut pass = UpdatePass::new(&mut tree, &mut reg, IntRect::INFINITE, RenderMode::Normal);
        pass.update(root, IntRect::INFINITE, Affine2D::IDENTITY, ItemState::all(), ItemState::empty());

        let item = tree.get(rect_key).unwrap();
        assert_eq!(item.bbox, IntRect::new(10, 10, 30, 30));
        assert_eq!(item.drawbox, item.bbox);
        let root_item = tree.get(root).unwrap();
        assert_eq!(root_item.bbox, IntRect::new(10, 10, 30, 30));
    }

    #[test]
    fn update_is_idempotent() {
        let mut tree = Tree::new(ItemVariant::Group(GroupData::default()));
        let root = tree.root();
        let rect_key = tree.insert(ItemVariant::Shape(ShapeData {
            path: Some(Rc::new(RectPath {
                rect: RectF::new(0.0, 0.0, 10.0, 10.0),
            })),
            ..ShapeData::default()
        }));
        tree.append_child(root, rect_key).unwrap();

        let mut reg = registry();
        {
            let mut pass = UpdatePass::new(&mut tree, &mut reg, IntRect::INFINITE, RenderMode::Normal);
            pass.update(root, IntRect::INFINITE, Affine2D::IDENTITY, ItemState::all(), ItemState::empty());
        }
        let bbox_after_first = tree.get(rect_key).unwrap().bbox;
        {
            let mut pass = UpdatePass::new(&mut tree, &mut reg, IntRect::INFINITE, RenderMode::Normal);
            pass.update(root, IntRect::INFINITE, Affine2D::IDENTITY, ItemState::all(), ItemState::empty());
        }
        assert_eq!(tree.get(rect_key).unwrap().bbox, bbox_after_first);
    }
}
