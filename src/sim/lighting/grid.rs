use crate::error::{EngineError, Result};
use crate::geom::point::Point;
use crate::geom::rect::Rect;
use crate::geom::room::Geometry;
use crate::sim::layout::GrowSurface;

use super::config::GridConfig;

/// Tolerance when deriving the cell count from the extent.
const CELL_COUNT_EPS: f64 = 1e-9;

/// Horizontal sampling plane at canopy height.
///
/// Cells are `resolution × resolution` squares laid row by row from the
/// bounds origin; `values[row * columns + col]` is the intensity
/// (μmol/m²/s) at the cell center. The last row and column may overhang the
/// bounds when the extent is not a multiple of the resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct CanopyGrid {
    pub resolution: f64,
    pub bounds: Rect,
    pub columns: usize,
    pub rows: usize,
    /// Height of the plane above the floor.
    pub height: f64,
    pub values: Vec<f64>,
    /// Whether each cell center lies over a grow surface.
    pub in_surface: Vec<bool>,
}

impl CanopyGrid {
    /// Zeroed grid covering `bounds`.
    pub fn new(bounds: Rect, resolution: f64, height: f64) -> Result<Self> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(EngineError::config(format!(
                "grid resolution must be positive, got {resolution}"
            )));
        }
        if !(bounds.width > 0.0 && bounds.depth > 0.0) {
            return Err(EngineError::geometry("grid bounds have no area"));
        }
        let columns = cell_count(bounds.width, resolution);
        let rows = cell_count(bounds.depth, resolution);
        Ok(Self {
            resolution,
            bounds,
            columns,
            rows,
            height,
            values: vec![0.0; columns * rows],
            in_surface: vec![false; columns * rows],
        })
    }

    /// Grid over the whole room at the configured canopy height.
    pub fn for_room(geometry: &Geometry, config: &GridConfig) -> Result<Self> {
        config.validate()?;
        if config.canopy_height > geometry.room().height {
            return Err(EngineError::config(format!(
                "canopy height {} is above the ceiling",
                config.canopy_height
            )));
        }
        Self::new(geometry.bounds(), config.resolution, config.canopy_height)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn index(&self, col: usize, row: usize) -> usize {
        row * self.columns + col
    }

    pub fn cell_center(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.bounds.x + (col as f64 + 0.5) * self.resolution,
            self.bounds.y + (row as f64 + 0.5) * self.resolution,
        )
    }

    /// Cell center on the canopy plane.
    pub fn cell_point(&self, col: usize, row: usize) -> Point {
        let (x, y) = self.cell_center(col, row);
        Point::new(x, y, self.height)
    }

    pub fn value(&self, col: usize, row: usize) -> f64 {
        self.values[self.index(col, row)]
    }

    /// Flags the cells whose centers lie over any of `surfaces` (boundary included).
    pub fn mark_surfaces(&mut self, surfaces: &[GrowSurface]) {
        for row in 0..self.rows {
            for col in 0..self.columns {
                let (x, y) = self.cell_center(col, row);
                let i = self.index(col, row);
                self.in_surface[i] = surfaces.iter().any(|s| s.contains(x, y));
            }
        }
    }

    /// Multiplies every value by `factor`.
    pub fn scale(&mut self, factor: f64) {
        self.values.iter_mut().for_each(|v| *v *= factor);
    }

    /// Values of the cells over grow surfaces.
    pub fn surface_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values
            .iter()
            .zip(&self.in_surface)
            .filter(|(_, inside)| **inside)
            .map(|(v, _)| *v)
    }

    pub fn surface_cell_count(&self) -> usize {
        self.in_surface.iter().filter(|inside| **inside).count()
    }

    /// Checks that the dimensions follow from the bounds and resolution and
    /// that the value buffers hold one entry per cell.
    pub fn validate(&self) -> Result<()> {
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(EngineError::config("grid resolution must be positive"));
        }
        let b = &self.bounds;
        let finite = [b.x, b.y, b.width, b.depth].iter().all(|v| v.is_finite());
        if !finite || b.width <= 0.0 || b.depth <= 0.0 {
            return Err(EngineError::config("grid bounds have no area"));
        }
        if self.columns == 0 || self.rows == 0 {
            return Err(EngineError::config(format!(
                "grid of {} x {} cells is empty",
                self.columns, self.rows
            )));
        }
        let columns = cell_count(b.width, self.resolution);
        let rows = cell_count(b.depth, self.resolution);
        if (self.columns, self.rows) != (columns, rows) {
            return Err(EngineError::config(format!(
                "grid of {} x {} cells does not match its bounds ({columns} x {rows} expected)",
                self.columns, self.rows
            )));
        }
        let expected = self.columns * self.rows;
        if self.values.len() != expected || self.in_surface.len() != expected {
            return Err(EngineError::config(format!(
                "grid of {} x {} cells holds {} values",
                self.columns,
                self.rows,
                self.values.len()
            )));
        }
        Ok(())
    }
}

fn cell_count(extent: f64, resolution: f64) -> usize {
    ((extent / resolution - CELL_COUNT_EPS).ceil() as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UID;

    #[test]
    fn test_dimensions() -> anyhow::Result<()> {
        let grid = CanopyGrid::new(Rect::new(0.0, 0.0, 10.0, 5.0), 0.5, 1.0)?;
        assert_eq!(grid.columns, 20);
        assert_eq!(grid.rows, 10);
        assert_eq!(grid.len(), 200);
        assert_eq!(grid.cell_center(0, 0), (0.25, 0.25));
        assert_eq!(grid.cell_point(19, 9), Point::new(9.75, 4.75, 1.0));

        // Partial cells are kept
        let grid = CanopyGrid::new(Rect::new(0.0, 0.0, 10.2, 5.0), 0.5, 1.0)?;
        assert_eq!(grid.columns, 21);
        Ok(())
    }

    #[test]
    fn test_invalid_grid() {
        assert!(CanopyGrid::new(Rect::new(0.0, 0.0, 1.0, 1.0), 0.0, 1.0).is_err());
        assert!(CanopyGrid::new(Rect::new(0.0, 0.0, 0.0, 1.0), 0.1, 1.0).is_err());
    }

    #[test]
    fn test_validate_rejects_mismatched_dimensions() -> anyhow::Result<()> {
        let grid = CanopyGrid::new(Rect::new(0.0, 0.0, 4.0, 2.0), 1.0, 1.0)?;
        grid.validate()?;

        let mut empty = grid.clone();
        empty.columns = 0;
        empty.rows = 0;
        empty.values.clear();
        empty.in_surface.clear();
        assert!(empty.validate().is_err());

        // Buffer sizes agree but the shape does not follow from the bounds
        let mut transposed = grid.clone();
        transposed.columns = 2;
        transposed.rows = 4;
        assert!(transposed.validate().is_err());

        let mut coarse = grid;
        coarse.resolution = 2.0;
        assert!(coarse.validate().is_err());
        Ok(())
    }

    #[test]
    fn test_mark_surfaces() -> anyhow::Result<()> {
        let mut grid = CanopyGrid::new(Rect::new(0.0, 0.0, 4.0, 2.0), 1.0, 1.0)?;
        let surface = GrowSurface::new(UID::from("s"), Rect::new(0.0, 0.0, 2.0, 1.0), 0);
        grid.mark_surfaces(&[surface]);
        assert_eq!(grid.surface_cell_count(), 2);
        assert!(grid.in_surface[grid.index(0, 0)]);
        assert!(grid.in_surface[grid.index(1, 0)]);
        assert!(!grid.in_surface[grid.index(0, 1)]);

        grid.values = (0..8).map(f64::from).collect();
        grid.scale(2.0);
        let inside: Vec<f64> = grid.surface_values().collect();
        assert_eq!(inside, vec![0.0, 2.0]);
        Ok(())
    }
}
