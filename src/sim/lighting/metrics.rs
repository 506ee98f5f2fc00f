use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::grid::CanopyGrid;
use super::sources::{SourceCatalog, SourceInstance};

/// Seconds per hour over micromoles per mole.
const DLI_FACTOR: f64 = 3600.0 / 1_000_000.0;

/// Aggregate figures of a solved design.
///
/// Intensities are μmol/m²/s over in-surface cells only. An empty design
/// yields all zeros.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    /// `min / average` in `[0, 1]`; zero when the average is zero.
    pub uniformity: f64,
    /// Daily light integral (mol/m²/day).
    pub daily_light_integral: f64,
    /// Electrical power per unit² of floor (W).
    pub power_density: f64,
    /// Emitted flux after dimming (μmol/s).
    pub total_flux: f64,
    /// Drawn power after dimming (W).
    pub total_power: f64,
    /// Photon efficacy of the lit sources (μmol/J); zero when nothing draws power.
    pub efficacy: f64,
    /// Cells counted toward the intensity figures.
    pub cell_count: usize,
    /// Enabled sources with a non-zero output.
    pub active_sources: usize,
}

/// Reduces a solved grid and its sources to [`Metrics`].
///
/// `floor_area` is in room units². Fails only if a source refers to a model
/// missing from `catalog`.
pub fn aggregate(
    grid: &CanopyGrid,
    sources: &[SourceInstance],
    catalog: &SourceCatalog,
    floor_area: f64,
    photoperiod_hours: f64,
) -> Result<Metrics> {
    let mut metrics = Metrics::default();

    for source in sources {
        let model = catalog.model(&source.model_id)?;
        let output = source.output();
        if output > 0.0 {
            metrics.active_sources += 1;
        }
        metrics.total_flux += model.flux * output;
        metrics.total_power += model.power * output;
    }
    if floor_area > 0.0 {
        metrics.power_density = metrics.total_power / floor_area;
    }
    if metrics.total_power > 0.0 {
        metrics.efficacy = metrics.total_flux / metrics.total_power;
    }

    let (mut sum, mut min, mut max) = (0.0, f64::INFINITY, f64::NEG_INFINITY);
    for v in grid.surface_values() {
        sum += v;
        min = min.min(v);
        max = max.max(v);
        metrics.cell_count += 1;
    }
    if metrics.cell_count == 0 {
        return Ok(metrics);
    }

    metrics.average = sum / metrics.cell_count as f64;
    metrics.min = min;
    metrics.max = max;
    metrics.uniformity = uniformity(min, metrics.average);
    metrics.daily_light_integral = metrics.average * photoperiod_hours * DLI_FACTOR;
    Ok(metrics)
}

/// Minimum-to-average ratio bounded to `[0, 1]`.
pub fn uniformity(min: f64, average: f64) -> f64 {
    if average > 0.0 {
        (min / average).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UID;
    use crate::geom::point::Point;
    use crate::geom::rect::Rect;
    use crate::sim::layout::GrowSurface;
    use crate::sim::lighting::sources::SourceModel;

    fn setup() -> (CanopyGrid, SourceCatalog) {
        let mut grid = CanopyGrid::new(Rect::new(0.0, 0.0, 4.0, 1.0), 1.0, 1.0).unwrap();
        let surface = GrowSurface::new(UID::from("s"), Rect::new(0.0, 0.0, 3.0, 1.0), 0);
        grid.mark_surfaces(&[surface]);
        grid.values = vec![400.0, 600.0, 500.0, 9000.0];
        let catalog =
            SourceCatalog::from_models([SourceModel::new("m", 1700.0, 680.0, 16.0, 2.0)]).unwrap();
        (grid, catalog)
    }

    #[test]
    fn test_aggregate() -> anyhow::Result<()> {
        let (grid, catalog) = setup();
        let mut dimmed = SourceInstance::new(UID::from("b"), "m", Point::new(0.0, 0.0, 3.0));
        dimmed.dimming = 0.5;
        let mut off = SourceInstance::new(UID::from("c"), "m", Point::new(0.0, 0.0, 3.0));
        off.enabled = false;
        let sources = vec![
            SourceInstance::new(UID::from("a"), "m", Point::new(0.0, 0.0, 3.0)),
            dimmed,
            off,
        ];
        let m = aggregate(&grid, &sources, &catalog, 100.0, 12.0)?;

        // The 9000 cell lies outside the surface
        assert_eq!(m.cell_count, 3);
        assert!((m.average - 500.0).abs() < 1e-12);
        assert_eq!(m.min, 400.0);
        assert_eq!(m.max, 600.0);
        assert!((m.uniformity - 0.8).abs() < 1e-12);
        assert!((m.daily_light_integral - 21.6).abs() < 1e-9);
        assert!((m.total_power - 1020.0).abs() < 1e-9);
        assert!((m.total_flux - 2550.0).abs() < 1e-9);
        assert!((m.power_density - 10.2).abs() < 1e-9);
        assert!((m.efficacy - 2.5).abs() < 1e-12);
        assert_eq!(m.active_sources, 2);
        Ok(())
    }

    #[test]
    fn test_empty_design_yields_zeros() -> anyhow::Result<()> {
        let (mut grid, catalog) = setup();
        grid.values = vec![0.0; 4];
        let m = aggregate(&grid, &[], &catalog, 100.0, 12.0)?;
        assert_eq!(m.average, 0.0);
        assert_eq!(m.uniformity, 0.0);
        assert_eq!(m.power_density, 0.0);
        assert_eq!(m.efficacy, 0.0);

        grid.in_surface = vec![false; 4];
        let m = aggregate(&grid, &[], &catalog, 0.0, 12.0)?;
        assert_eq!(m, Metrics::default());
        Ok(())
    }

    #[test]
    fn test_uniformity_bounds() {
        assert_eq!(uniformity(5.0, 0.0), 0.0);
        assert_eq!(uniformity(-1.0, 2.0), 0.0);
        assert_eq!(uniformity(3.0, 2.0), 1.0);
        assert!((uniformity(1.0, 2.0) - 0.5).abs() < 1e-12);
    }
}
