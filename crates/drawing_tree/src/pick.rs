//! Spatial hit-testing (spec.md §4.5, component C6): walk the tree in
//! reverse z-order, respecting visibility, sensitivity, and the throttled
//! shape-pick memo.

use std::rc::Rc;
use std::time::Instant;

use geom::{PremulPixel, RectF};
use scene_protocol::{PathVector, PixelFormat, Surface};

use crate::item::{ItemKey, ItemVariant, PickMemo};
use crate::state::ItemState;
use crate::tree::Tree;

/// Queries above this duration are throttled: the result is memoized and
/// reused for `query_time / 5000` subsequent picks, per spec.md §4.5.
const SLOW_PICK_THRESHOLD_MS: f64 = 10.0;

fn expanded_bbox_contains(rect: geom::IntRect, tolerance: f64, point: (f64, f64)) -> bool {
    let rect_f: RectF = rect.into();
    let expanded = rect_f.inflate(tolerance, tolerance);
    !expanded.is_empty()
        && point.0 >= expanded.min_x
        && point.0 < expanded.max_x
        && point.1 >= expanded.min_y
        && point.1 < expanded.max_y
}

/// `pick(point, tolerance, sticky)` (spec.md §4.5). Requires `&mut Tree`
/// since throttled shape picks memoize their answer on the item.
pub fn pick(
    tree: &mut Tree,
    key: ItemKey,
    point: (f64, f64),
    tolerance: f64,
    sticky: bool,
    outline: bool,
) -> Option<ItemKey> {
    // 1. require BBOX and PICK_READY.
    let ready = tree
        .get(key)
        .map(|i| i.state.contains(ItemState::BBOX | ItemState::PICK_READY))
        .unwrap_or(false);
    if !ready {
        return None;
    }

    // 2. visibility/sensitivity gate, bypassed when `sticky`.
    let (visible, sensitive, bbox) = match tree.get(key) {
        Some(item) => (item.visible, item.sensitive, item.bbox),
        None => return None,
    };
    if !sticky && (!visible || !sensitive) {
        return None;
    }

    // 3. bbox (expanded by tolerance) must contain the point.
    if !expanded_bbox_contains(bbox, tolerance, point) {
        return None;
    }

    pick_variant(tree, key, point, tolerance, sticky, outline)
}

fn pick_variant(
    tree: &mut Tree,
    key: ItemKey,
    point: (f64, f64),
    tolerance: f64,
    sticky: bool,
    outline: bool,
) -> Option<ItemKey> {
    enum Kind {
        Group { children: Vec<ItemKey>, pick_children: bool },
        Text { children: Vec<ItemKey> },
        Shape,
        Image { rect: RectF, pixbuf: Option<Rc<dyn Surface>> },
        Glyphs,
    }

    let (ctm, kind) = match tree.get(key) {
        Some(item) => {
            let kind = match &item.variant {
                ItemVariant::Group(g) => Kind::Group {
                    children: item.children.clone(),
                    pick_children: g.pick_children,
                },
                ItemVariant::Text(_) => Kind::Text {
                    children: item.children.clone(),
                },
                ItemVariant::Shape(_) => Kind::Shape,
                ItemVariant::Image(image) => {
                    Kind::Image { rect: image.rect, pixbuf: image.pixbuf.clone() }
                }
                ItemVariant::Glyphs(_) => Kind::Glyphs,
            };
            (item.ctm, kind)
        }
        None => return None,
    };

    match kind {
        Kind::Group { children, pick_children } => {
            for &child in children.iter().rev() {
                if let Some(hit) = pick(tree, child, point, tolerance, sticky, outline) {
                    return Some(if pick_children { hit } else { key });
                }
            }
            None
        }
        Kind::Text { children } => {
            for &child in children.iter().rev() {
                if pick(tree, child, point, tolerance, sticky, outline).is_some() {
                    return Some(key);
                }
            }
            None
        }
        Kind::Glyphs => Some(key),
        Kind::Image { rect, pixbuf } => {
            let local = ctm.inverse()?.transform_point(point.0, point.1);
            if rect.is_empty()
                || local.0 < rect.min_x
                || local.0 >= rect.max_x
                || local.1 < rect.min_y
                || local.1 >= rect.max_y
            {
                return None;
            }
            let Some(pixbuf) = pixbuf else {
                return None;
            };
            if sample_image_alpha(pixbuf.as_ref(), rect, local) > 0 {
                Some(key)
            } else {
                None
            }
        }
        Kind::Shape => pick_shape(tree, key, point, tolerance, outline),
    }
}

/// Samples the alpha channel of `pixbuf` at the pixel `local` (in the
/// image-local coordinate space, i.e. before `ctm`) maps onto, using the
/// same rect-to-pixel scale `paint_image` uses to place the surface.
fn sample_image_alpha(pixbuf: &dyn Surface, rect: RectF, local: (f64, f64)) -> u8 {
    let width = pixbuf.width();
    let height = pixbuf.height();
    if width == 0 || height == 0 || rect.width() <= 0.0 || rect.height() <= 0.0 {
        return 0;
    }
    let px = ((local.0 - rect.min_x) / rect.width() * width as f64) as i64;
    let py = ((local.1 - rect.min_y) / rect.height() * height as f64) as i64;
    if px < 0 || py < 0 || px >= width as i64 || py >= height as i64 {
        return 0;
    }
    let (px, py) = (px as usize, py as usize);
    let stride = pixbuf.stride();
    let data = pixbuf.data_ref();
    match pixbuf.format() {
        PixelFormat::Argb32 => {
            let off = py * stride + px * 4;
            if off + 4 > data.len() {
                return 0;
            }
            let packed = u32::from_ne_bytes([data[off], data[off + 1], data[off + 2], data[off + 3]]);
            PremulPixel::from_u32(packed).a
        }
        PixelFormat::A8 => {
            let off = py * stride + px;
            if off >= data.len() {
                return 0;
            }
            data[off]
        }
    }
}

fn pick_shape(
    tree: &mut Tree,
    key: ItemKey,
    point: (f64, f64),
    tolerance: f64,
    outline: bool,
) -> Option<ItemKey> {
    // Check the throttle memo first: a short-lived mutable borrow, freed
    // before any recursive or slow work starts.
    if let Some(item) = tree.get_mut(key) {
        if let ItemVariant::Shape(shape) = &mut item.variant {
            if let Some(memo) = shape.pick_memo.as_mut() {
                if memo.reuse_remaining > 0 {
                    memo.reuse_remaining -= 1;
                    return if memo.hit { Some(key) } else { None };
                }
            }
        }
    }

    // Snapshot what the query needs so nothing stays borrowed across the
    // (potentially slow) geometry query below.
    let (ctm, path, style) = match tree.get(key) {
        Some(item) => match &item.variant {
            ItemVariant::Shape(shape) => (item.ctm, shape.path.clone(), shape.style.clone()),
            _ => return None,
        },
        None => return None,
    };
    let Some(path) = path else {
        return None;
    };

    let effective_tolerance = if outline {
        tolerance.max(1.0)
    } else {
        tolerance.max(style.stroke_width * ctm.uniform_scale() / 2.0)
    };

    let start = Instant::now();
    let (winding, distance) = path.point_bbox_wind_distance(ctm, point, None);
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    let hit = if outline {
        distance.abs() <= effective_tolerance
    } else {
        let fill_hit = style.fill != scene_protocol::Paint::None
            && match style.fill_rule {
                scene_protocol::FillRule::NonZero => winding != 0,
                scene_protocol::FillRule::EvenOdd => winding % 2 != 0,
            };
        let stroke_hit = style.is_stroked() && distance.abs() <= effective_tolerance;
        fill_hit || stroke_hit
    };

    if elapsed_ms > SLOW_PICK_THRESHOLD_MS {
        let reuse = ((elapsed_ms * 1000.0) / 5000.0).floor().max(0.0) as u32;
        if let Some(item) = tree.get_mut(key) {
            if let ItemVariant::Shape(shape) = &mut item.variant {
                shape.pick_memo = Some(PickMemo {
                    point,
                    tolerance,
                    hit,
                    reuse_remaining: reuse,
                });
            }
        }
    }

    if hit { Some(key) } else { None }
}
