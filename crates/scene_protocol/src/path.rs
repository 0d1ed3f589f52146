//! The consumed `PathVector` contract: an opaque curve representation the
//! host owns. The core never builds or mutates paths itself, only queries
//! bounds and winding/distance, per spec.md §1's non-goals.

use geom::{Affine2D, RectF};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(f64, f64),
    LineTo(f64, f64),
    CurveTo {
        c1: (f64, f64),
        c2: (f64, f64),
        to: (f64, f64),
    },
    ClosePath,
}

pub type SubPath = Vec<PathSegment>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRule {
    NonZero,
    EvenOdd,
}

/// A host-owned curve, convertible to cubic-Bézier subpaths, with
/// transformed-bounds and winding/distance queries the core relies on for
/// bbox computation (`update_variant`) and hit-testing (`pick_variant`).
pub trait PathVector {
    fn subpaths(&self) -> Vec<SubPath>;

    fn is_empty(&self) -> bool {
        self.subpaths().iter().all(|sp| sp.is_empty())
    }

    /// Exact bounding box of the path after applying `transform`, or
    /// `None` for an empty path (spec.md §4.1's Shape `update_variant`
    /// consumes this directly).
    fn bounds_exact_transformed(&self, transform: Affine2D) -> Option<RectF>;

    /// Winding number and signed distance from `point` (in the space
    /// `transform` maps into) to the nearest edge of the path, used by
    /// Shape's `pick_variant`. `viewbox`, when given, restricts the query
    /// to a visible sub-region (matching the underlying geometry library's
    /// viewport clamp).
    fn point_bbox_wind_distance(
        &self,
        transform: Affine2D,
        point: (f64, f64),
        viewbox: Option<RectF>,
    ) -> (i32, f64);
}
