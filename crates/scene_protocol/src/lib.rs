//! Shared contract types consumed or produced at the boundary between the
//! renderer core and its host: the `Surface`/`Context` raster contract, the
//! `PathVector` geometry contract, paint resolution, style, preferences,
//! and render mode. No item tree or render algorithm lives here — just the
//! types every other crate agrees on.

mod blit;
mod path;
mod preferences;
mod render_mode;
mod style;
mod surface;

pub use blit::copy_region;
pub use path::{FillRule, PathSegment, PathVector, SubPath};
pub use preferences::{DefaultPreferences, Preferences};
pub use render_mode::RenderMode;
pub use style::{Color, Paint, PaintRef, PaintResolver, Style};
pub use surface::{
    Context, ContextGuard, ContentKind, Operator, PixelFormat, Surface, SurfaceError,
    SurfaceFactory,
};
