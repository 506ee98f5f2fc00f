//! Light-source placement planner.
//!
//! The number of sources follows from the canopy area and the model's
//! nominal coverage. Sources are laid on a uniform grid spanning the bounding
//! box of all grow surfaces, with the outermost rows and columns on the box
//! edges.

use log::{debug, warn};

use crate::UID;
use crate::error::{EngineError, Result};
use crate::geom::EPS;
use crate::geom::point::Point;
use crate::geom::rect::Rect;
use crate::geom::room::Geometry;
use crate::sim::layout::GrowSurface;
use crate::sim::layout::surface::total_area;

use super::config::PlacementConfig;
use super::sources::{SourceCatalog, SourceInstance, SourceModel};

/// Grid points tried beyond the required count before giving up.
const MAX_EXTRA_POINTS: usize = 256;

/// Output of [`place_sources`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementPlan {
    pub model_id: String,
    /// Source count needed to cover the canopy.
    pub required: usize,
    /// Distance between neighbouring grid columns (0 for a single column).
    pub spacing_x: f64,
    /// Distance between neighbouring grid rows (0 for a single row).
    pub spacing_y: f64,
    /// Height of the sources above the canopy.
    pub mounting_height: f64,
    pub instances: Vec<SourceInstance>,
}

/// `ceil(area / effective_coverage)`, where the effective coverage is the
/// model's nominal coverage weighted by the profile and divided by the
/// density scale.
pub fn required_count(surface_area: f64, model: &SourceModel, config: &PlacementConfig) -> usize {
    if surface_area <= 0.0 {
        return 0;
    }
    let coverage = model.coverage_area * config.profile.coverage_factor() / config.density_scale;
    (surface_area / coverage - EPS).ceil().max(1.0) as usize
}

/// Grid shape `(columns, rows)` holding at least `n` points with near-square
/// cells over a `width × depth` box.
fn grid_shape(n: usize, width: f64, depth: f64) -> (usize, usize) {
    let n = n.max(1);
    let ratio = if width > EPS { depth / width } else { n as f64 };
    let rows = ((n as f64 * ratio).sqrt().round() as usize).clamp(1, n);
    (n.div_ceil(rows), rows)
}

/// Evenly spaced coordinates from `start` to `start + extent` inclusive.
fn axis(start: f64, extent: f64, count: usize) -> (Vec<f64>, f64) {
    if count <= 1 {
        return (vec![start + extent * 0.5], 0.0);
    }
    let step = extent / (count - 1) as f64;
    ((0..count).map(|i| start + i as f64 * step).collect(), step)
}

/// Places instances of the configured model over `surfaces`.
///
/// Sources sit at `canopy_height + mounting_height`, enabled at full output.
/// Grid points whose model footprint does not reach any surface are
/// skipped; the grid is refined until at least the required count survives.
pub fn place_sources(
    geometry: &Geometry,
    surfaces: &[GrowSurface],
    catalog: &SourceCatalog,
    config: &PlacementConfig,
    canopy_height: f64,
) -> Result<PlacementPlan> {
    config.validate()?;
    let model = catalog.model(&config.model_id)?;
    let mounting_height = config
        .mounting_height
        .unwrap_or(model.reference_mounting_height);
    let z = canopy_height + mounting_height;
    if z > geometry.room().height + EPS {
        return Err(EngineError::config(format!(
            "sources at {z:.2} (canopy {canopy_height} + mounting {mounting_height}) \
             would be above the ceiling at {}",
            geometry.room().height
        )));
    }

    let mut plan = PlacementPlan {
        model_id: model.id.clone(),
        required: 0,
        spacing_x: 0.0,
        spacing_y: 0.0,
        mounting_height,
        instances: Vec::new(),
    };
    let footprints: Vec<Rect> = surfaces.iter().map(GrowSurface::footprint).collect();
    let Some(bbox) = Rect::union_bounds(&footprints) else {
        return Ok(plan);
    };
    plan.required = required_count(total_area(surfaces), model, config);

    let mut points = Vec::new();
    for n in plan.required..=plan.required + MAX_EXTRA_POINTS {
        let (nx, ny) = grid_shape(n, bbox.width, bbox.depth);
        let (xs, spacing_x) = axis(bbox.x, bbox.width, nx);
        let (ys, spacing_y) = axis(bbox.y, bbox.depth, ny);
        points = ys
            .iter()
            .flat_map(|&y| xs.iter().map(move |&x| (x, y)))
            .filter(|&(x, y)| {
                let reach = Rect::centered(x, y, model.footprint_width, model.footprint_depth);
                footprints.iter().any(|f| f.touches(&reach))
            })
            .collect::<Vec<_>>();
        plan.spacing_x = spacing_x;
        plan.spacing_y = spacing_y;
        if points.len() >= plan.required {
            debug!(
                "Placement grid {nx} x {ny}: {} of {} points over surfaces",
                points.len(),
                nx * ny
            );
            break;
        }
    }
    if points.len() < plan.required {
        warn!(
            "Only {} of {} required sources fit over the surfaces",
            points.len(),
            plan.required
        );
    }

    plan.instances = points
        .into_iter()
        .enumerate()
        .map(|(i, (x, y))| {
            SourceInstance::new(UID::indexed("source", i), &model.id, Point::new(x, y, z))
        })
        .collect();
    Ok(plan)
}
