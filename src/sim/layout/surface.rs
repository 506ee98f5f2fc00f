use serde::{Deserialize, Serialize};

use crate::UID;
use crate::geom::rect::Rect;

/// A placed growing area (bench, table, bed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowSurface {
    pub id: UID,
    /// Corner with the smallest coordinates.
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub depth: f64,
    /// Nominal growing units.
    pub capacity: u32,
}

impl GrowSurface {
    pub fn new(id: UID, footprint: Rect, capacity: u32) -> Self {
        Self {
            id,
            x: footprint.x,
            y: footprint.y,
            width: footprint.width,
            depth: footprint.depth,
            capacity,
        }
    }

    /// Surface with capacity derived from its area.
    pub fn with_density(id: UID, footprint: Rect, units_per_area: f64) -> Self {
        let capacity = (footprint.area() * units_per_area).floor().max(0.0) as u32;
        Self::new(id, footprint, capacity)
    }

    pub fn footprint(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.depth)
    }

    pub fn area(&self) -> f64 {
        self.width * self.depth
    }

    /// Checks whether a floor point lies over the surface (boundary included).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.footprint().contains_point(x, y)
    }
}

/// Total area of a set of non-overlapping surfaces.
pub fn total_area(surfaces: &[GrowSurface]) -> f64 {
    surfaces.iter().map(GrowSurface::area).sum()
}
