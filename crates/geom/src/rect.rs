//! Axis-aligned rectangles in integer pixel space and real item-local space.

/// Integer pixel axis-aligned rectangle. `min >= max` on either axis denotes
/// the empty rectangle; callers must not assume `min_x < max_x` holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntRect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl IntRect {
    pub const EMPTY: IntRect = IntRect {
        min_x: 0,
        min_y: 0,
        max_x: 0,
        max_y: 0,
    };

    /// A rectangle large enough to behave as "unbounded" for intersection
    /// purposes, without risking overflow in width/height arithmetic.
    pub const INFINITE: IntRect = IntRect {
        min_x: i32::MIN / 2,
        min_y: i32::MIN / 2,
        max_x: i32::MAX / 2,
        max_y: i32::MAX / 2,
    };

    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x + width,
            max_y: y + height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x >= self.max_x || self.min_y >= self.max_y
    }

    pub fn width(&self) -> i32 {
        (self.max_x - self.min_x).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.max_y - self.min_y).max(0)
    }

    pub fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            i64::from(self.width()) * i64::from(self.height())
        }
    }

    pub fn union(&self, other: &IntRect) -> IntRect {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => IntRect::EMPTY,
            (true, false) => *other,
            (false, true) => *self,
            (false, false) => IntRect {
                min_x: self.min_x.min(other.min_x),
                min_y: self.min_y.min(other.min_y),
                max_x: self.max_x.max(other.max_x),
                max_y: self.max_y.max(other.max_y),
            },
        }
    }

    pub fn intersect(&self, other: &IntRect) -> IntRect {
        let rect = IntRect {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        };
        if rect.is_empty() { IntRect::EMPTY } else { rect }
    }

    pub fn intersects(&self, other: &IntRect) -> bool {
        !self.intersect(other).is_empty()
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        !self.is_empty() && x >= self.min_x && x < self.max_x && y >= self.min_y && y < self.max_y
    }

    pub fn contains_rect(&self, other: &IntRect) -> bool {
        other.is_empty()
            || (!self.is_empty()
                && other.min_x >= self.min_x
                && other.min_y >= self.min_y
                && other.max_x <= self.max_x
                && other.max_y <= self.max_y)
    }

    /// Grows the rectangle outward by `dx`/`dy` on every side. Negative
    /// values shrink it; a rectangle that shrinks past emptiness collapses
    /// to `EMPTY`.
    pub fn inflate(&self, dx: i32, dy: i32) -> IntRect {
        if self.is_empty() {
            return IntRect::EMPTY;
        }
        let rect = IntRect {
            min_x: self.min_x - dx,
            min_y: self.min_y - dy,
            max_x: self.max_x + dx,
            max_y: self.max_y + dy,
        };
        if rect.is_empty() { IntRect::EMPTY } else { rect }
    }

    pub fn translate(&self, dx: i32, dy: i32) -> IntRect {
        IntRect {
            min_x: self.min_x + dx,
            min_y: self.min_y + dy,
            max_x: self.max_x + dx,
            max_y: self.max_y + dy,
        }
    }
}

/// Real-valued axis-aligned rectangle, used for item-local bounding boxes
/// (`item_bbox`) before outward rounding to pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectF {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl RectF {
    pub const EMPTY: RectF = RectF {
        min_x: 0.0,
        min_y: 0.0,
        max_x: 0.0,
        max_y: 0.0,
    };

    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x + width,
            max_y: y + height,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.min_x < self.max_x && self.min_y < self.max_y)
    }

    pub fn width(&self) -> f64 {
        (self.max_x - self.min_x).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.max_y - self.min_y).max(0.0)
    }

    pub fn union(&self, other: &RectF) -> RectF {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => RectF::EMPTY,
            (true, false) => *other,
            (false, true) => *self,
            (false, false) => RectF {
                min_x: self.min_x.min(other.min_x),
                min_y: self.min_y.min(other.min_y),
                max_x: self.max_x.max(other.max_x),
                max_y: self.max_y.max(other.max_y),
            },
        }
    }

    pub fn intersect(&self, other: &RectF) -> RectF {
        let rect = RectF {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        };
        if rect.is_empty() { RectF::EMPTY } else { rect }
    }

    pub fn inflate(&self, dx: f64, dy: f64) -> RectF {
        if self.is_empty() {
            return RectF::EMPTY;
        }
        RectF {
            min_x: self.min_x - dx,
            min_y: self.min_y - dy,
            max_x: self.max_x + dx,
            max_y: self.max_y + dy,
        }
    }

    /// Outward rounding to integer pixel space: floor the minimum corner,
    /// ceil the maximum corner, per spec.md's "integer outward-rounded" bbox
    /// rule.
    pub fn to_outward_int_rect(&self) -> IntRect {
        if self.is_empty() {
            return IntRect::EMPTY;
        }
        IntRect {
            min_x: self.min_x.floor() as i32,
            min_y: self.min_y.floor() as i32,
            max_x: self.max_x.ceil() as i32,
            max_y: self.max_y.ceil() as i32,
        }
    }
}

impl From<IntRect> for RectF {
    fn from(r: IntRect) -> Self {
        RectF {
            min_x: r.min_x as f64,
            min_y: r.min_y as f64,
            max_x: r.max_x as f64,
            max_y: r.max_y as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_disjoint_is_empty() {
        let a = IntRect::from_xywh(0, 0, 10, 10);
        let b = IntRect::from_xywh(20, 20, 10, 10);
        assert!(a.intersect(&b).is_empty());
    }

    #[test]
    fn union_grows_bounds() {
        let a = IntRect::from_xywh(0, 0, 10, 10);
        let b = IntRect::from_xywh(5, -5, 10, 10);
        let u = a.union(&b);
        assert_eq!(u, IntRect::new(0, -5, 15, 10));
    }

    #[test]
    fn outward_rounding_matches_scenario_one() {
        // spec.md scenario 1: rectangle (10,10)-(30,30), no stroke.
        let r = RectF::new(10.0, 10.0, 30.0, 30.0);
        assert_eq!(r.to_outward_int_rect(), IntRect::new(10, 10, 30, 30));
    }

    #[test]
    fn outward_rounding_rounds_away_from_center() {
        let r = RectF::new(9.9, 9.1, 30.01, 29.999);
        assert_eq!(r.to_outward_int_rect(), IntRect::new(9, 9, 31, 30));
    }
}
