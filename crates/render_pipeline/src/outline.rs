//! Outline render mode (spec.md §4.1's "Outline mode" / §4.2 step 2):
//! draws a thin stroked outline of every path plus the clip/mask outlines
//! in distinct colors, and never touches the cache.

use drawing_tree::{ItemVariant, Tree, paint_content};
use geom::IntRect;
use scene_protocol::{Color, Context, PaintResolver};

pub struct OutlineColors {
    pub shape: Color,
    pub clip: Color,
    pub mask: Color,
}

/// Recursively paints `key` and its descendants in outline style, per
/// spec.md §4.2 step 2: the item's own geometry in `color`, then its
/// clip in `colors.clip` and mask in `colors.mask`, all within `area ∩
/// bbox` (outline mode picks/renders against `bbox`, not `drawbox`).
pub fn render_outline(
    tree: &Tree,
    key: drawing_tree::ItemKey,
    ctx: &mut dyn Context,
    area: IntRect,
    color: Color,
    colors: &OutlineColors,
    resolver: &dyn PaintResolver,
) {
    let Some(item) = tree.get(key) else { return };
    if !item.visible {
        return;
    }
    let composite_area = area.intersect(&item.bbox);
    if composite_area.is_empty() {
        return;
    }

    paint_content(tree, key, ctx, resolver, true, color);

    if matches!(item.variant, ItemVariant::Group(_) | ItemVariant::Text(_)) {
        for &child in &item.children {
            render_outline(tree, child, ctx, composite_area, color, colors, resolver);
        }
    }
    if let Some(clip_key) = item.clip {
        render_outline(tree, clip_key, ctx, composite_area, colors.clip, colors, resolver);
    }
    if let Some(mask_key) = item.mask {
        render_outline(tree, mask_key, ctx, composite_area, colors.mask, colors, resolver);
    }
}
