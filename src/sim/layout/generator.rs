use log::{debug, info};

use crate::UID;
use crate::error::{EngineError, Result};
use crate::geom::EPS;
use crate::geom::rect::Rect;
use crate::geom::room::Geometry;

use super::config::LayoutConfig;
use super::surface::{GrowSurface, total_area};

/// Tiles the free floor area with grow surfaces.
///
/// Candidate origins are swept row by row (y outer, x inner) at a stride of
/// footprint plus aisle, starting at the perimeter clearance. A candidate is
/// accepted iff it stays `perimeter_clearance` away from the room outline,
/// does not overlap a buffered obstacle and does not overlap a surface
/// accepted before it. Identical inputs always give identical layouts.
///
/// Fails with [`EngineError::NoFeasibleLayout`] if no surface fits.
pub fn generate_layout(geometry: &Geometry, config: &LayoutConfig) -> Result<Vec<GrowSurface>> {
    config.validate()?;

    let mut surfaces = sweep(geometry, config);
    if config.auto_orient && config.surface_width != config.surface_depth {
        let rotated = sweep(geometry, &config.rotated());
        if total_area(&rotated) > total_area(&surfaces) + EPS {
            debug!(
                "Rotated footprint fits more area ({:.2} vs {:.2})",
                total_area(&rotated),
                total_area(&surfaces)
            );
            surfaces = rotated;
        }
    }

    if surfaces.is_empty() {
        return Err(EngineError::NoFeasibleLayout {
            reason: format!(
                "no {} x {} surface fits with clearance {} and {} obstacle(s)",
                config.surface_width,
                config.surface_depth,
                config.perimeter_clearance,
                geometry.obstacles().len()
            ),
        });
    }

    info!(
        "Placed {} grow surfaces ({:.2} units² of canopy)",
        surfaces.len(),
        total_area(&surfaces)
    );
    Ok(surfaces)
}

fn sweep(geometry: &Geometry, config: &LayoutConfig) -> Vec<GrowSurface> {
    let bounds = geometry.bounds();
    let (w, d) = (config.surface_width, config.surface_depth);
    let stride_x = w + config.aisle_width;
    let stride_y = d + config.aisle_width;
    let x_end = bounds.max_x() - config.perimeter_clearance;
    let y_end = bounds.max_y() - config.perimeter_clearance;

    let mut accepted: Vec<Rect> = Vec::new();
    let mut rejected = 0usize;

    let mut row = 0usize;
    loop {
        let y = bounds.y + config.perimeter_clearance + row as f64 * stride_y;
        if y + d > y_end + EPS {
            break;
        }
        let mut col = 0usize;
        loop {
            let x = bounds.x + config.perimeter_clearance + col as f64 * stride_x;
            if x + w > x_end + EPS {
                break;
            }
            let candidate = Rect::new(x, y, w, d);
            if is_free(geometry, config, &candidate, &accepted) {
                accepted.push(candidate);
            } else {
                rejected += 1;
            }
            col += 1;
        }
        row += 1;
    }

    debug!(
        "Layout sweep {w} x {d}: {} accepted, {rejected} rejected",
        accepted.len()
    );

    accepted
        .into_iter()
        .enumerate()
        .map(|(i, r)| GrowSurface::with_density(UID::indexed("surface", i), r, config.units_per_area))
        .collect()
}

fn is_free(geometry: &Geometry, config: &LayoutConfig, candidate: &Rect, accepted: &[Rect]) -> bool {
    geometry.rect_within_floor(candidate, config.perimeter_clearance)
        && !geometry.rect_intersects_obstacle(candidate, config.obstacle_clearance)
        && !accepted.iter().any(|r| r.overlaps(candidate))
}
