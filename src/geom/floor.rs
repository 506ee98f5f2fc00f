use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::geom::EPS;
use crate::geom::rect::Rect;

/// Floor outline of a non-rectangular room.
///
/// Vertices are `(x, y)` pairs in room units, listed in either winding order.
/// The outline must be a simple polygon (no self-intersections).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FloorPlan {
    vertices: Vec<(f64, f64)>,
}

impl FloorPlan {
    pub fn new(vertices: Vec<(f64, f64)>) -> Result<Self> {
        let plan = Self { vertices };
        plan.validate()?;
        Ok(plan)
    }

    pub fn validate(&self) -> Result<()> {
        if self.vertices.len() < 3 {
            return Err(EngineError::geometry(format!(
                "floor plan needs at least 3 vertices, got {}",
                self.vertices.len()
            )));
        }
        if self
            .vertices
            .iter()
            .any(|(x, y)| !x.is_finite() || !y.is_finite())
        {
            return Err(EngineError::geometry("floor plan has non-finite vertices"));
        }
        if self.area() <= EPS {
            return Err(EngineError::geometry("floor plan has zero area"));
        }
        Ok(())
    }

    pub fn vertices(&self) -> &[(f64, f64)] {
        &self.vertices
    }

    fn edges(&self) -> impl Iterator<Item = ((f64, f64), (f64, f64))> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Polygon area (shoelace formula).
    pub fn area(&self) -> f64 {
        let twice: f64 = self
            .edges()
            .map(|((x0, y0), (x1, y1))| x0 * y1 - x1 * y0)
            .sum();
        twice.abs() * 0.5
    }

    pub fn bounds(&self) -> Rect {
        let (mut x0, mut y0) = (f64::INFINITY, f64::INFINITY);
        let (mut x1, mut y1) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for &(x, y) in &self.vertices {
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x);
            y1 = y1.max(y);
        }
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Checks whether a point lies inside the outline. Boundary points count as inside.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        if self.edges().any(|(a, b)| is_point_on_segment((x, y), a, b)) {
            return true;
        }
        // Even-odd ray casting along +x
        let mut inside = false;
        for ((x0, y0), (x1, y1)) in self.edges() {
            if (y0 > y) != (y1 > y) {
                let x_cross = x0 + (y - y0) * (x1 - x0) / (y1 - y0);
                if x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Checks whether a rectangle lies entirely inside the outline.
    ///
    /// All corners must be inside, no outline vertex may sit strictly inside the
    /// rectangle and no outline edge may cross a rectangle edge.
    pub fn contains_rect(&self, rect: &Rect) -> bool {
        let corners = rect.corners();
        if !corners.iter().all(|&(x, y)| self.contains_point(x, y)) {
            return false;
        }
        let inner = rect.inflate(-EPS * 10.0);
        if self
            .vertices
            .iter()
            .any(|&(x, y)| x > inner.x && x < inner.max_x() && y > inner.y && y < inner.max_y())
        {
            return false;
        }
        for (a, b) in self.edges() {
            for i in 0..4 {
                let c = corners[i];
                let d = corners[(i + 1) % 4];
                if segments_cross(a, b, c, d) {
                    return false;
                }
            }
        }
        true
    }
}

fn orientation(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

fn is_point_on_segment(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> bool {
    if orientation(a, b, p).abs() > EPS * (1.0 + (b.0 - a.0).abs() + (b.1 - a.1).abs()) {
        return false;
    }
    p.0 >= a.0.min(b.0) - EPS
        && p.0 <= a.0.max(b.0) + EPS
        && p.1 >= a.1.min(b.1) - EPS
        && p.1 <= a.1.max(b.1) + EPS
}

/// Proper crossing: the segments intersect at a single point interior to both.
fn segments_cross(a: (f64, f64), b: (f64, f64), c: (f64, f64), d: (f64, f64)) -> bool {
    let o1 = orientation(a, b, c);
    let o2 = orientation(a, b, d);
    let o3 = orientation(c, d, a);
    let o4 = orientation(c, d, b);
    ((o1 > EPS && o2 < -EPS) || (o1 < -EPS && o2 > EPS))
        && ((o3 > EPS && o4 < -EPS) || (o3 < -EPS && o4 > EPS))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l_shape() -> FloorPlan {
        FloorPlan::new(vec![
            (0.0, 0.0),
            (6.0, 0.0),
            (6.0, 4.0),
            (4.0, 4.0),
            (4.0, 8.0),
            (0.0, 8.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_area_and_bounds() {
        let plan = l_shape();
        assert!((plan.area() - 40.0).abs() < 1e-12);
        assert_eq!(plan.bounds(), Rect::new(0.0, 0.0, 6.0, 8.0));
    }

    #[test]
    fn test_contains_point() {
        let plan = l_shape();
        assert!(plan.contains_point(1.0, 1.0));
        assert!(plan.contains_point(5.0, 2.0));
        assert!(plan.contains_point(6.0, 2.0), "boundary counts as inside");
        assert!(!plan.contains_point(5.0, 6.0), "notch of the L");
    }

    #[test]
    fn test_contains_rect() {
        let plan = l_shape();
        assert!(plan.contains_rect(&Rect::new(0.5, 0.5, 5.0, 3.0)));
        assert!(plan.contains_rect(&Rect::new(0.0, 4.0, 4.0, 4.0)));
        // One corner sits in the notch of the L
        assert!(!plan.contains_rect(&Rect::new(3.0, 3.0, 2.0, 2.0)));
    }

    #[test]
    fn test_contains_rect_spanning_a_notch() {
        let u_shape = FloorPlan::new(vec![
            (0.0, 0.0),
            (9.0, 0.0),
            (9.0, 6.0),
            (6.0, 6.0),
            (6.0, 2.0),
            (3.0, 2.0),
            (3.0, 6.0),
            (0.0, 6.0),
        ])
        .unwrap();
        // Every corner is inside an arm of the U, the middle is not
        assert!(!u_shape.contains_rect(&Rect::new(1.0, 3.0, 7.0, 2.0)));
        assert!(u_shape.contains_rect(&Rect::new(1.0, 0.5, 7.0, 1.5)));
    }

    #[test]
    fn test_degenerate_plans_are_rejected() {
        assert!(FloorPlan::new(vec![(0.0, 0.0), (1.0, 0.0)]).is_err());
        assert!(FloorPlan::new(vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]).is_err());
    }
}
