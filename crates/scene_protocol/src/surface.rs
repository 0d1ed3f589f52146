//! The consumed `Surface`/`Context` contract (spec.md §6): a thin,
//! cairo-shaped 2D raster API the host provides. This crate defines the
//! trait boundary only; a real implementation (backed by cairo, skia, or a
//! software rasterizer) lives in the host application.

use std::fmt;

use geom::Affine2D;

use crate::path::PathVector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Argb32,
    A8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Over,
    Source,
    In,
    Xor,
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Color,
    ColorAlpha,
    Alpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceError {
    AllocationFailed,
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceError::AllocationFailed => write!(formatter, "surface allocation failed"),
        }
    }
}

impl std::error::Error for SurfaceError {}

/// A raster surface: premultiplied ARGB32 or opaque-alpha A8, matching
/// spec.md §6's `Surface` contract.
pub trait Surface {
    fn format(&self) -> PixelFormat;
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn stride(&self) -> usize;
    fn data(&mut self) -> &mut [u8];
    fn data_ref(&self) -> &[u8];
    fn flush(&mut self);
    fn mark_dirty(&mut self);
}

/// Factory side of the `Surface` contract: `new_image`/`similar` create
/// fresh surfaces, kept separate from `Surface` itself since an existing
/// surface instance has no use for them.
pub trait SurfaceFactory {
    fn new_image(
        &self,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn Surface>, SurfaceError>;

    fn similar(
        &self,
        src: &dyn Surface,
        content: ContentKind,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn Surface>, SurfaceError>;
}

/// The drawing context: path construction, paint, compositing operator,
/// and group push/pop, matching spec.md §6's `Context` contract. Object
/// safe so `render_pipeline` can hold `&mut dyn Context` without knowing
/// the host's concrete backend.
pub trait Context {
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64);
    fn close_path(&mut self);
    fn new_path(&mut self);
    fn rectangle(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn append_path(&mut self, path: &dyn PathVector);

    fn fill(&mut self);
    fn fill_preserve(&mut self);
    fn stroke(&mut self);
    fn stroke_preserve(&mut self);
    fn clip(&mut self);
    fn clip_preserve(&mut self);

    fn set_source_rgba(&mut self, r: f64, g: f64, b: f64, a: f64);
    fn set_source_surface(&mut self, surface: &dyn Surface, x: f64, y: f64);
    fn set_operator(&mut self, op: Operator);
    fn set_transform(&mut self, transform: Affine2D);

    /// Stroke parameters applied by the next `stroke`/`stroke_preserve`
    /// call. Kept as discrete setters (matching cairo's own API) rather
    /// than bundled into one call, since a `Context` implementation may
    /// cache each independently.
    fn set_line_width(&mut self, width: f64);
    fn set_fill_rule(&mut self, rule: crate::path::FillRule);
    fn set_dash(&mut self, dashes: &[f64], offset: f64);

    fn paint(&mut self);
    fn paint_with_alpha(&mut self, alpha: f64);

    fn push_group(&mut self);
    fn push_group_with_content(&mut self, content: ContentKind);
    fn pop_group_to_source(&mut self);

    /// Pops the most recent `push_group` as an inspectable surface rather
    /// than setting it as the context's current source. Mirrors cairo's
    /// `pop_group()` (a `Pattern` the caller can get the backing surface
    /// from), as distinct from `pop_group_to_source()` — needed by the
    /// mask-luminance compositing step, which reads raw premultiplied
    /// pixels to compute luminance-to-alpha (spec.md §4.2).
    fn pop_group_to_surface(&mut self) -> Box<dyn Surface>;

    fn save(&mut self);
    fn restore(&mut self);

    fn surface_factory(&self) -> &dyn SurfaceFactory;
}

/// RAII scoped guard over `Context::save`/`restore`: every block that
/// mutates source/operator/clip state on the context acquires one of these
/// so state is restored on every exit path, including early returns and
/// panics, per spec.md §9's "RAII context state" design note.
pub struct ContextGuard<'a> {
    ctx: &'a mut dyn Context,
}

impl<'a> ContextGuard<'a> {
    pub fn new(ctx: &'a mut dyn Context) -> Self {
        ctx.save();
        Self { ctx }
    }

    pub fn ctx(&mut self) -> &mut dyn Context {
        &mut *self.ctx
    }
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        self.ctx.restore();
    }
}
