use serde::{Deserialize, Serialize};

use crate::geom::EPS;

/// Axis-aligned rectangle on the floor plane.
///
/// `(x, y)` is the corner with the smallest coordinates, `width` extends
/// along x and `depth` along y.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub depth: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, depth: f64) -> Self {
        Self {
            x,
            y,
            width,
            depth,
        }
    }

    /// Rectangle of the given size centered on `(cx, cy)`.
    pub fn centered(cx: f64, cy: f64, width: f64, depth: f64) -> Self {
        Self::new(cx - width * 0.5, cy - depth * 0.5, width, depth)
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.depth
    }

    pub fn area(&self) -> f64 {
        self.width * self.depth
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width * 0.5, self.y + self.depth * 0.5)
    }

    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.x, self.y),
            (self.max_x(), self.y),
            (self.max_x(), self.max_y()),
            (self.x, self.max_y()),
        ]
    }

    /// Grows the rectangle by `margin` on every side (shrinks if negative).
    pub fn inflate(&self, margin: f64) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.depth + 2.0 * margin,
        )
    }

    /// Checks whether a point lies inside or on the boundary.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x - EPS
            && x <= self.max_x() + EPS
            && y >= self.y - EPS
            && y <= self.max_y() + EPS
    }

    /// Checks whether `other` lies entirely inside this rectangle (boundary included).
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x - EPS
            && other.y >= self.y - EPS
            && other.max_x() <= self.max_x() + EPS
            && other.max_y() <= self.max_y() + EPS
    }

    /// Checks whether two rectangles share a region of positive area.
    ///
    /// Rectangles that only touch along an edge or a corner do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.max_x() - EPS
            && other.x < self.max_x() - EPS
            && self.y < other.max_y() - EPS
            && other.y < self.max_y() - EPS
    }

    /// Checks whether two rectangles overlap or touch.
    pub fn touches(&self, other: &Rect) -> bool {
        self.x <= other.max_x() + EPS
            && other.x <= self.max_x() + EPS
            && self.y <= other.max_y() + EPS
            && other.y <= self.max_y() + EPS
    }

    /// Smallest rectangle containing every rectangle in `rects`.
    pub fn union_bounds<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> Option<Rect> {
        let mut iter = rects.into_iter();
        let first = iter.next()?;
        let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.max_x(), first.max_y());
        for r in iter {
            x0 = x0.min(r.x);
            y0 = y0.min(r.y);
            x1 = x1.max(r.max_x());
            y1 = y1.max(r.max_y());
        }
        Some(Rect::new(x0, y0, x1 - x0, y1 - y0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_is_strict() {
        let a = Rect::new(0.0, 0.0, 2.0, 2.0);
        let b = Rect::new(2.0, 0.0, 2.0, 2.0);
        let c = Rect::new(1.5, 1.5, 2.0, 2.0);
        assert!(!a.overlaps(&b), "touching edges do not overlap");
        assert!(a.touches(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&a));
    }

    #[test]
    fn test_contains() {
        let room = Rect::new(0.0, 0.0, 10.0, 5.0);
        assert!(room.contains_point(10.0, 5.0));
        assert!(!room.contains_point(10.1, 2.0));
        assert!(room.contains_rect(&Rect::new(8.0, 3.0, 2.0, 2.0)));
        assert!(!room.contains_rect(&Rect::new(8.5, 3.0, 2.0, 2.0)));
    }

    #[test]
    fn test_inflate_and_center() {
        let r = Rect::centered(5.0, 5.0, 2.0, 4.0).inflate(0.5);
        assert!((r.x - 3.5).abs() < 1e-12);
        assert!((r.y - 2.5).abs() < 1e-12);
        assert!((r.area() - 15.0).abs() < 1e-12);
        assert_eq!(r.center(), (5.0, 5.0));
    }

    #[test]
    fn test_union_bounds() {
        let rects = [Rect::new(1.0, 1.0, 2.0, 2.0), Rect::new(5.0, -1.0, 1.0, 1.0)];
        let u = Rect::union_bounds(&rects).unwrap();
        assert_eq!(u, Rect::new(1.0, -1.0, 5.0, 4.0));
        assert!(Rect::union_bounds(&[] as &[Rect]).is_none());
    }
}
