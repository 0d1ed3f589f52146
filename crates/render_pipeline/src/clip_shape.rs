//! The `clip(ct, area)` operation of spec.md §4.1: renders an item as a
//! flat opaque black shape, used when the item serves as another item's
//! clip. A clip that itself has a clip composites the two with `SRC_OVER`
//! inside a temporary group, then `IN`s the nested clip into the outer
//! one, per spec.md §4.1's `clip` row.

use drawing_tree::{ItemKey, Tree, paint_clip_geometry};
use scene_protocol::{Context, Operator};

/// Leaves `ctx`'s current source set to `key`'s clip-shape coverage
/// (opaque black where the geometry covers, transparent elsewhere),
/// already composited through any clip-of-a-clip chain. Does not paint
/// — the caller decides how to composite the result (`paint`,
/// `paint_with_alpha`, or against an existing destination with `IN`).
pub fn resolve_clip_source(tree: &Tree, key: ItemKey, ctx: &mut dyn Context) {
    let Some(item) = tree.get(key) else {
        ctx.set_source_rgba(0.0, 0.0, 0.0, 0.0);
        return;
    };

    ctx.push_group();
    ctx.set_operator(Operator::Over);
    paint_clip_geometry(tree, key, ctx);
    ctx.pop_group_to_source();

    if let Some(inner_clip) = item.clip {
        ctx.push_group();
        ctx.set_operator(Operator::Over);
        ctx.paint();
        ctx.set_operator(Operator::In);
        resolve_clip_source(tree, inner_clip, ctx);
        ctx.paint();
        ctx.pop_group_to_source();
    }
    ctx.set_operator(Operator::Over);
}
