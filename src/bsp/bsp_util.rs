// src/bsp/bsp_util.rs
// Geometry primitives shared by the node builder, the lump writers and the
// reject builder.

use serde::{Deserialize, Serialize};

use crate::bsp::{Seg, ON_LINE_EPSILON, ON_LINE_RADIUS, SLOP};
use crate::error::{BuildError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: i32,
    pub y: i32,
}

impl Point2D {
    pub fn new(x: i32, y: i32) -> Self {
        Point2D { x, y }
    }
}

/// Result of testing a point against a divline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointSide {
    Front,
    Back,
    On,
}

/// Result of testing a whole seg against a divline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegPosition {
    Front,
    Back,
    MustSplit,
}

/// An infinite line through `(x, y)` heading along `(dx, dy)`. The front is
/// the right-hand side of the heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Divline {
    pub x: i32,
    pub y: i32,
    pub dx: i32,
    pub dy: i32,
}

impl Divline {
    pub fn new(x: i32, y: i32, dx: i32, dy: i32) -> Self {
        Divline { x, y, dx, dy }
    }

    pub fn from_points(start: Point2D, end: Point2D) -> Self {
        Divline::new(start.x, start.y, end.x - start.x, end.y - start.y)
    }

    pub fn from_seg(seg: &Seg) -> Self {
        Divline::from_points(seg.start, seg.end)
    }

    /// Classifies a point with the builder's tolerances: anything within two
    /// units of the line counts as on it, so a cut never leaves a sliver.
    pub fn point_on_side(&self, p: Point2D) -> PointSide {
        let (px, py) = (p.x as f64, p.y as f64);
        let (lx, ly) = (self.x as f64, self.y as f64);
        let (ldx, ldy) = (self.dx as f64, self.dy as f64);

        if self.dx == 0 {
            if px > lx - ON_LINE_EPSILON && px < lx + ON_LINE_EPSILON {
                return PointSide::On;
            }
            let back = if px < lx { self.dy > 0 } else { self.dy < 0 };
            return if back { PointSide::Back } else { PointSide::Front };
        }
        if self.dy == 0 {
            if py > ly - ON_LINE_EPSILON && py < ly + ON_LINE_EPSILON {
                return PointSide::On;
            }
            let back = if py < ly { self.dx < 0 } else { self.dx > 0 };
            return if back { PointSide::Back } else { PointSide::Front };
        }

        // Does the infinite line pass through the circle of ON_LINE_RADIUS
        // around the point?
        let dx = lx - px;
        let dy = ly - py;
        let a = ldx * ldx + ldy * ldy;
        let b = 2.0 * (ldx * dx + ldy * dy);
        let c = dx * dx + dy * dy - ON_LINE_RADIUS * ON_LINE_RADIUS;
        if b * b - 4.0 * a * c > 0.0 {
            return PointSide::On;
        }

        let dx = px - lx;
        let dy = py - ly;
        let left = ldy * dx;
        let right = dy * ldx;
        if (left - right).abs() < SLOP {
            PointSide::On
        } else if right < left {
            PointSide::Front
        } else {
            PointSide::Back
        }
    }

    /// Exact integer side test, no tolerance. Used where both the line and
    /// the point come straight from the vertex table.
    pub fn point_on_side_exact(&self, p: Point2D) -> PointSide {
        let dx = p.x as i64 - self.x as i64;
        let dy = p.y as i64 - self.y as i64;
        let left = self.dy as i64 * dx;
        let right = dy * self.dx as i64;
        if right < left {
            PointSide::Front
        } else if right > left {
            PointSide::Back
        } else {
            PointSide::On
        }
    }

    /// Classifies a whole seg. A seg lying along the divline goes to the
    /// front when it heads the same way (by sign of each component), to the
    /// back otherwise, so collinear segs always end up on a consistent side.
    pub fn seg_on_side(&self, seg: &Seg) -> SegPosition {
        let s1 = self.point_on_side(seg.start);
        let s2 = self.point_on_side(seg.end);

        match (s1, s2) {
            (PointSide::On, PointSide::On) => {
                let dx = seg.end.x - seg.start.x;
                let dy = seg.end.y - seg.start.y;
                if (dx < 0) == (self.dx < 0) && (dy < 0) == (self.dy < 0) {
                    SegPosition::Front
                } else {
                    SegPosition::Back
                }
            }
            (PointSide::On, side) | (side, PointSide::On) => side.into(),
            (a, b) if a == b => a.into(),
            _ => SegPosition::MustSplit,
        }
    }

    /// Fraction along `self` where `splitter` crosses it, strictly inside
    /// (0, 1). Anything else means the caller classified a seg as needing a
    /// split when it does not, which is a fatal inconsistency.
    pub fn intercept(&self, splitter: &Divline) -> Result<f64> {
        let frac = self.intercept_fraction(splitter)?;
        if frac <= 0.0 || frac >= 1.0 {
            return Err(BuildError::InterceptOutside(frac));
        }
        Ok(frac)
    }

    /// Fraction along `self` where the infinite `splitter` crosses it, with no
    /// range check.
    pub fn intercept_fraction(&self, splitter: &Divline) -> Result<f64> {
        let (x1, y1, dx1, dy1) = (self.x as f64, self.y as f64, self.dx as f64, self.dy as f64);
        let (x2, y2, dx2, dy2) = (
            splitter.x as f64,
            splitter.y as f64,
            splitter.dx as f64,
            splitter.dy as f64,
        );

        let den = dy2 * dx1 - dx2 * dy1;
        if den == 0.0 {
            return Err(BuildError::ParallelIntercept);
        }
        let num = (x2 - x1) * dy2 + (y1 - y2) * dx2;
        Ok(num / den)
    }
}

impl From<PointSide> for SegPosition {
    fn from(side: PointSide) -> Self {
        match side {
            PointSide::Front => SegPosition::Front,
            PointSide::Back => SegPosition::Back,
            // Only reached for the both-on case, which seg_on_side handles first.
            PointSide::On => SegPosition::Front,
        }
    }
}

/// Integer bounding box, inclusive on all edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Default for BoundingBox {
    fn default() -> Self {
        BoundingBox::new_empty()
    }
}

impl BoundingBox {
    pub fn new_empty() -> Self {
        BoundingBox {
            min_x: i32::MAX,
            min_y: i32::MAX,
            max_x: i32::MIN,
            max_y: i32::MIN,
        }
    }

    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        BoundingBox { min_x, min_y, max_x, max_y }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn expand_point(&mut self, x: i32, y: i32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn combine(&mut self, other: &BoundingBox) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    pub fn union(mut self, other: &BoundingBox) -> BoundingBox {
        self.combine(other);
        self
    }

    pub fn from_segs(segs: &[Seg]) -> Self {
        let mut bbox = BoundingBox::new_empty();
        for seg in segs {
            bbox.expand_point(seg.start.x, seg.start.y);
            bbox.expand_point(seg.end.x, seg.end.y);
        }
        bbox
    }

    pub fn width(&self) -> i64 {
        self.max_x as i64 - self.min_x as i64
    }

    pub fn height(&self) -> i64 {
        self.max_y as i64 - self.min_y as i64
    }

    // Overlapping or merely touching boxes both count.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.max_x >= other.min_x
            && self.min_x <= other.max_x
            && self.max_y >= other.min_y
            && self.min_y <= other.max_y
    }

    /// Node/bbox field order used by the NODES lump: top, bottom, left, right.
    pub fn to_tblr(&self) -> [i32; 4] {
        [self.max_y, self.min_y, self.min_x, self.max_x]
    }
}

const INSIDE: u8 = 0; // 0000
const LEFT: u8 = 1; // 0001
const RIGHT: u8 = 2; // 0010
const BOTTOM: u8 = 4; // 0100
const TOP: u8 = 8; // 1000

// Compute the bit code for a point (x, y) using the clip rectangle
fn compute_out_code(x: f64, y: f64, bounds: &BoundingBox) -> u8 {
    let mut code = INSIDE; // initialised as being inside of clip window

    if x < bounds.min_x as f64 {
        code |= LEFT;
    } else if x > bounds.max_x as f64 {
        code |= RIGHT;
    }
    if y < bounds.min_y as f64 {
        code |= BOTTOM;
    } else if y > bounds.max_y as f64 {
        code |= TOP;
    }

    code
}

/// Does the segment `p1`-`p2` touch the closed box? Cohen-Sutherland clipping,
/// run in floating point so clipped endpoints are not rounded off the box.
pub fn segment_touches_box(p1: Point2D, p2: Point2D, bounds: &BoundingBox) -> bool {
    let (mut x1, mut y1) = (p1.x as f64, p1.y as f64);
    let (mut x2, mut y2) = (p2.x as f64, p2.y as f64);
    let mut code1 = compute_out_code(x1, y1, bounds);
    let mut code2 = compute_out_code(x2, y2, bounds);

    let xmin = bounds.min_x as f64;
    let ymin = bounds.min_y as f64;
    let xmax = bounds.max_x as f64;
    let ymax = bounds.max_y as f64;

    loop {
        if code1 == INSIDE || code2 == INSIDE {
            return true;
        }
        if (code1 & code2) != 0 {
            // Both endpoints share an outside region
            return false;
        }

        let code_out = code1;
        let (x, y) = if (code_out & TOP) != 0 {
            (x1 + (x2 - x1) * (ymax - y1) / (y2 - y1), ymax)
        } else if (code_out & BOTTOM) != 0 {
            (x1 + (x2 - x1) * (ymin - y1) / (y2 - y1), ymin)
        } else if (code_out & RIGHT) != 0 {
            (xmax, y1 + (y2 - y1) * (xmax - x1) / (x2 - x1))
        } else {
            (xmin, y1 + (y2 - y1) * (xmin - x1) / (x2 - x1))
        };

        x1 = x;
        y1 = y;
        code1 = compute_out_code(x1, y1, bounds);
        if code1 == INSIDE {
            return true;
        }
        // Swap so the next round clips whichever end is still outside.
        std::mem::swap(&mut x1, &mut x2);
        std::mem::swap(&mut y1, &mut y2);
        std::mem::swap(&mut code1, &mut code2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::LineSide;
    use assert_approx_eq::assert_approx_eq;

    fn seg(x1: i32, y1: i32, x2: i32, y2: i32) -> Seg {
        Seg::new(Point2D::new(x1, y1), Point2D::new(x2, y2), 0, LineSide::Front)
    }

    #[test]
    fn test_axis_aligned_sides() {
        // Heading north: east is the front.
        let north = Divline::new(0, 0, 0, 64);
        assert_eq!(north.point_on_side(Point2D::new(10, 5)), PointSide::Front);
        assert_eq!(north.point_on_side(Point2D::new(-10, 5)), PointSide::Back);
        assert_eq!(north.point_on_side(Point2D::new(1, 500)), PointSide::On);
        assert_eq!(north.point_on_side(Point2D::new(2, 0)), PointSide::Front);

        // Heading east: south is the front.
        let east = Divline::new(0, 0, 64, 0);
        assert_eq!(east.point_on_side(Point2D::new(5, -10)), PointSide::Front);
        assert_eq!(east.point_on_side(Point2D::new(5, 10)), PointSide::Back);
        assert_eq!(east.point_on_side(Point2D::new(-300, -1)), PointSide::On);

        let west = Divline::new(0, 0, -64, 0);
        assert_eq!(west.point_on_side(Point2D::new(5, 10)), PointSide::Front);
    }

    #[test]
    fn test_diagonal_near_line_is_on() {
        let diag = Divline::new(0, 0, 100, 100);
        // One unit off the diagonal is well inside the two-unit radius.
        assert_eq!(diag.point_on_side(Point2D::new(51, 50)), PointSide::On);
        assert_eq!(diag.point_on_side(Point2D::new(50, 0)), PointSide::Front);
        assert_eq!(diag.point_on_side(Point2D::new(0, 50)), PointSide::Back);
        assert_eq!(diag.point_on_side_exact(Point2D::new(51, 50)), PointSide::Front);
        assert_eq!(diag.point_on_side_exact(Point2D::new(7, 7)), PointSide::On);
    }

    #[test]
    fn test_seg_on_side() {
        let div = Divline::new(0, 0, 0, 128);
        assert_eq!(div.seg_on_side(&seg(10, 0, 20, 0)), SegPosition::Front);
        assert_eq!(div.seg_on_side(&seg(-10, 0, -20, 5)), SegPosition::Back);
        assert_eq!(div.seg_on_side(&seg(-10, 0, 20, 0)), SegPosition::MustSplit);
        // One end on the line: the other end decides.
        assert_eq!(div.seg_on_side(&seg(0, 10, -30, 10)), SegPosition::Back);
        assert_eq!(div.seg_on_side(&seg(30, 10, 1, 10)), SegPosition::Front);
    }

    #[test]
    fn test_collinear_tie_break() {
        let div = Divline::new(0, 0, 0, 128);
        assert_eq!(div.seg_on_side(&seg(0, 200, 0, 300)), SegPosition::Front);
        assert_eq!(div.seg_on_side(&seg(0, 300, 0, 200)), SegPosition::Back);

        let diag = Divline::new(0, 0, 64, 64);
        assert_eq!(diag.seg_on_side(&seg(128, 128, 192, 192)), SegPosition::Front);
        assert_eq!(diag.seg_on_side(&seg(192, 192, 128, 128)), SegPosition::Back);
    }

    #[test]
    fn test_intercept_fraction() {
        let along = Divline::new(-50, 10, 100, 0);
        let splitter = Divline::new(0, 0, 0, 64);
        assert_approx_eq!(along.intercept(&splitter).unwrap(), 0.5);

        let along = Divline::new(0, -10, 0, 40);
        let splitter = Divline::new(-5, 0, 10, 0);
        assert_approx_eq!(along.intercept(&splitter).unwrap(), 0.25);
    }

    #[test]
    fn test_intercept_failures() {
        let a = Divline::new(0, 0, 64, 0);
        let parallel = Divline::new(0, 32, 128, 0);
        assert!(matches!(a.intercept(&parallel), Err(BuildError::ParallelIntercept)));

        let past_end = Divline::new(100, -10, 0, 20);
        assert!(matches!(a.intercept(&past_end), Err(BuildError::InterceptOutside(_))));
    }

    #[test]
    fn test_bbox() {
        let mut b = BoundingBox::new_empty();
        assert!(b.is_empty());
        b.expand_point(10, -5);
        b.expand_point(-3, 20);
        assert_eq!(b, BoundingBox::new(-3, -5, 10, 20));
        assert_eq!(b.to_tblr(), [20, -5, -3, 10]);
        assert_eq!((b.width(), b.height()), (13, 25));

        let touching = BoundingBox::new(10, 0, 30, 5);
        assert!(b.intersects(&touching));
        let apart = BoundingBox::new(11, 0, 30, 5);
        assert!(!b.intersects(&apart));
        assert_eq!(b.union(&apart), BoundingBox::new(-3, -5, 30, 20));
    }

    #[test]
    fn test_segment_touches_box() {
        let block = BoundingBox::new(0, 0, 128, 128);
        let p = Point2D::new;
        assert!(segment_touches_box(p(10, 10), p(20, 20), &block));
        assert!(segment_touches_box(p(-50, 64), p(500, 64), &block));
        assert!(segment_touches_box(p(-10, 64), p(64, -10), &block));
        assert!(!segment_touches_box(p(128, 200), p(128, 129), &block));
        assert!(segment_touches_box(p(128, 200), p(128, 128), &block));
        assert!(!segment_touches_box(p(-100, 50), p(50, 250), &block));
        assert!(!segment_touches_box(p(200, 0), p(300, 128), &block));
    }
}
