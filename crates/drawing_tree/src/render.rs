//! Variant-specific *content* painting (spec.md §4.1's `render_variant`
//! column): draws only an item's own geometry into `ctx`. Recursing into
//! children/markers with the full clip/mask/filter/opacity composite is
//! `render_pipeline`'s job (C5) — this module never calls back into that
//! algorithm, which keeps the dependency graph acyclic.

use geom::Affine2D;
use scene_protocol::{Color, Context, Paint, PaintResolver, PathVector, Style};

use crate::item::{ItemKey, ItemVariant};
use crate::tree::Tree;

/// Sets `ctx`'s source to `paint` (scaled by `opacity`) and returns
/// whether the caller should proceed to fill/stroke — `Paint::None`
/// paints nothing, matching spec.md §7's "missing paint source ->
/// treated as none".
fn apply_paint(ctx: &mut dyn Context, resolver: &dyn PaintResolver, paint: &Paint, opacity: f64) -> bool {
    match paint {
        Paint::None => false,
        Paint::Color(c) => {
            ctx.set_source_rgba(c.r, c.g, c.b, c.a * opacity);
            true
        }
        Paint::Server(paint_ref) => {
            resolver.resolve(*paint_ref, ctx, opacity);
            true
        }
    }
}

fn emit_path(ctx: &mut dyn Context, ctm: Affine2D, path: &dyn PathVector) {
    ctx.set_transform(ctm);
    ctx.new_path();
    ctx.append_path(path);
}

fn paint_shape_style(ctx: &mut dyn Context, ctm: Affine2D, resolver: &dyn PaintResolver, path: &dyn PathVector, style: &Style) {
    emit_path(ctx, ctm, path);
    ctx.set_transform(Affine2D::IDENTITY);
    ctx.set_fill_rule(style.fill_rule);
    if apply_paint(ctx, resolver, &style.fill, style.fill_opacity) {
        if style.is_stroked() {
            ctx.fill_preserve();
        } else {
            ctx.fill();
        }
    }
    if style.is_stroked() {
        ctx.set_line_width(style.stroke_width);
        ctx.set_dash(&style.dash_array, style.dash_offset);
        if apply_paint(ctx, resolver, &style.stroke, style.stroke_opacity) {
            ctx.stroke();
        } else {
            ctx.new_path();
        }
    }
}

fn paint_outline_path(ctx: &mut dyn Context, ctm: Affine2D, path: &dyn PathVector, color: Color) {
    emit_path(ctx, ctm, path);
    ctx.set_transform(Affine2D::IDENTITY);
    ctx.set_source_rgba(color.r, color.g, color.b, color.a);
    ctx.set_line_width(1.0);
    ctx.stroke();
}

/// Paints `key`'s own content (not children, not markers) into `ctx`.
/// `outline` draws a thin stroked outline instead of the styled fill,
/// per spec.md §4.1's outline-mode row.
pub fn paint_content(
    tree: &Tree,
    key: ItemKey,
    ctx: &mut dyn Context,
    resolver: &dyn PaintResolver,
    outline: bool,
    outline_color: Color,
) {
    let Some(item) = tree.get(key) else { return };
    match &item.variant {
        ItemVariant::Group(_) => {}
        ItemVariant::Shape(shape) => {
            let Some(path) = shape.path.as_ref() else { return };
            if outline {
                paint_outline_path(ctx, item.ctm, path.as_ref(), outline_color);
            } else {
                paint_shape_style(ctx, item.ctm, resolver, path.as_ref(), &shape.style);
            }
        }
        ItemVariant::Glyphs(glyphs) => {
            let Some(path) = glyphs.path.as_ref() else { return };
            if outline {
                paint_outline_path(ctx, item.ctm, path.as_ref(), outline_color);
            } else {
                paint_shape_style(ctx, item.ctm, resolver, path.as_ref(), &glyphs.style);
            }
        }
        ItemVariant::Text(text) => {
            paint_text(tree, item, &text.style, ctx, resolver, outline, outline_color);
        }
        ItemVariant::Image(image) => {
            paint_image(item.ctm, image, ctx, outline, outline_color);
        }
    }
}

/// Paints `key`'s own geometry, recursing into group/text children, as a
/// flat opaque black shape — spec.md §4.1's `clip(ct, area)` operation,
/// used when this item serves as another item's clip. Ignores paint,
/// opacity, and stroke; only geometry coverage matters, composited with
/// the context's current operator (normally `SRC_OVER`, so overlapping
/// children union together).
pub fn paint_clip_geometry(tree: &Tree, key: ItemKey, ctx: &mut dyn Context) {
    let Some(item) = tree.get(key) else { return };
    match &item.variant {
        ItemVariant::Group(_) | ItemVariant::Text(_) => {
            for &child in &item.children {
                paint_clip_geometry(tree, child, ctx);
            }
        }
        ItemVariant::Shape(shape) => {
            if let Some(path) = shape.path.as_ref() {
                fill_geometry_black(ctx, item.ctm, path.as_ref(), shape.style.fill_rule);
            }
        }
        ItemVariant::Glyphs(glyphs) => {
            if let Some(path) = glyphs.path.as_ref() {
                fill_geometry_black(ctx, item.ctm, path.as_ref(), glyphs.style.fill_rule);
            }
        }
        ItemVariant::Image(image) => {
            if !image.rect.is_empty() {
                ctx.set_transform(item.ctm);
                ctx.new_path();
                ctx.rectangle(image.rect.min_x, image.rect.min_y, image.rect.width(), image.rect.height());
                ctx.set_transform(Affine2D::IDENTITY);
                ctx.set_source_rgba(0.0, 0.0, 0.0, 1.0);
                ctx.fill();
            }
        }
    }
}

fn fill_geometry_black(ctx: &mut dyn Context, ctm: Affine2D, path: &dyn PathVector, fill_rule: scene_protocol::FillRule) {
    emit_path(ctx, ctm, path);
    ctx.set_transform(Affine2D::IDENTITY);
    ctx.set_fill_rule(fill_rule);
    ctx.set_source_rgba(0.0, 0.0, 0.0, 1.0);
    ctx.fill();
}

fn paint_text(
    tree: &Tree,
    item: &crate::item::DrawingItem,
    style: &Style,
    ctx: &mut dyn Context,
    resolver: &dyn PaintResolver,
    outline: bool,
    outline_color: Color,
) {
    // spec.md §9: Text aggregates every child glyph's path into one, then
    // fills/strokes once, rather than compositing each glyph separately.
    // Glyph paths are defined relative to the glyph item's own ctm, which
    // for Text's children is the Text item's ctm composed with per-glyph
    // placement already baked into `local_transform` at update time, so
    // each glyph's ctm is used directly rather than the Text item's ctm.
    ctx.new_path();
    let mut any = false;
    for &child in &item.children {
        if let Some(glyph_item) = tree.get(child) {
            if let ItemVariant::Glyphs(glyph) = &glyph_item.variant {
                if let Some(path) = glyph.path.as_ref() {
                    ctx.set_transform(glyph_item.ctm);
                    ctx.append_path(path.as_ref());
                    any = true;
                }
            }
        }
    }
    ctx.set_transform(Affine2D::IDENTITY);
    if !any {
        return;
    }
    if outline {
        ctx.set_source_rgba(outline_color.r, outline_color.g, outline_color.b, outline_color.a);
        ctx.set_line_width(1.0);
        ctx.stroke();
        return;
    }
    ctx.set_fill_rule(style.fill_rule);
    if apply_paint(ctx, resolver, &style.fill, style.fill_opacity) {
        if style.is_stroked() {
            ctx.fill_preserve();
        } else {
            ctx.fill();
        }
    }
    if style.is_stroked() {
        ctx.set_line_width(style.stroke_width);
        ctx.set_dash(&style.dash_array, style.dash_offset);
        if apply_paint(ctx, resolver, &style.stroke, style.stroke_opacity) {
            ctx.stroke();
        }
    }
}

fn paint_image(ctm: Affine2D, image: &crate::item::ImageData, ctx: &mut dyn Context, outline: bool, outline_color: Color) {
    if image.rect.is_empty() {
        return;
    }
    if outline {
        ctx.new_path();
        ctx.set_transform(ctm);
        ctx.rectangle(image.rect.min_x, image.rect.min_y, image.rect.width(), image.rect.height());
        ctx.move_to(image.rect.min_x, image.rect.min_y);
        ctx.line_to(image.rect.max_x, image.rect.max_y);
        ctx.move_to(image.rect.max_x, image.rect.min_y);
        ctx.line_to(image.rect.min_x, image.rect.max_y);
        ctx.set_transform(Affine2D::IDENTITY);
        ctx.set_source_rgba(outline_color.r, outline_color.g, outline_color.b, outline_color.a);
        ctx.set_line_width(1.0);
        ctx.stroke();
        return;
    }
    let Some(pixbuf) = image.pixbuf.as_ref() else {
        // spec.md §7: an image with no pixel source is replaced with a
        // placeholder rectangle rather than producing nothing at all.
        ctx.new_path();
        ctx.set_transform(ctm);
        ctx.rectangle(image.rect.min_x, image.rect.min_y, image.rect.width(), image.rect.height());
        ctx.set_transform(Affine2D::IDENTITY);
        ctx.set_source_rgba(0.5, 0.5, 0.5, 0.5);
        ctx.fill();
        return;
    };
    ctx.set_transform(ctm);
    ctx.new_path();
    ctx.rectangle(image.rect.min_x, image.rect.min_y, image.rect.width(), image.rect.height());
    ctx.clip();
    let sx = image.rect.width() / pixbuf.width().max(1) as f64;
    let sy = image.rect.height() / pixbuf.height().max(1) as f64;
    let scaled = Affine2D::scale(sx, sy)
        .then(&Affine2D::translation(image.rect.min_x, image.rect.min_y))
        .then(&ctm);
    ctx.set_transform(scaled);
    ctx.set_source_surface(pixbuf.as_ref(), 0.0, 0.0);
    ctx.paint();
    ctx.set_transform(Affine2D::IDENTITY);
}
