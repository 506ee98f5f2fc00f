//! Irradiance field solver.
//!
//! Every enabled source contributes
//!
//! ```text
//! I(p) = flux × D(θ) / (4π × max(d², ε²)) × dimming
//! ```
//!
//! to a cell center `p`, with `d` the distance in meters, `θ` the angle
//! between the source's downward axis and the direction to `p`, `D` the
//! model's normalized distribution and `ε` = [`MIN_DISTANCE_M`]. The field
//! is the superposition over all sources.

use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::time::Instant;

use log::debug;
use rayon::prelude::*;

use crate::error::Result;
use crate::geom::point::Point;
use crate::geom::room::UnitSystem;
use crate::sim::cancel::CancelToken;

use super::distribution::Profile;
use super::grid::CanopyGrid;
use super::sources::{SourceCatalog, SourceInstance};

/// Distance floor (meters) preventing the singularity at a source.
pub const MIN_DISTANCE_M: f64 = 0.05;

/// One emitting point, in meters.
#[derive(Debug, Clone, Copy)]
pub struct Emitter {
    pub position: Point,
    /// Flux carried by this point after dimming and footprint sampling (μmol/s).
    pub flux: f64,
    pub profile: Profile,
}

impl Emitter {
    /// Intensity (μmol/m²/s) received at `p` (meters).
    pub fn intensity_at(&self, p: &Point) -> f64 {
        let d2 = self.position.distance_squared(p);
        let cos_theta = if d2 > 0.0 {
            (self.position.z - p.z) / d2.sqrt()
        } else {
            1.0
        };
        let floor = MIN_DISTANCE_M * MIN_DISTANCE_M;
        self.flux * self.profile.relative_intensity(cos_theta) / (4.0 * PI * d2.max(floor))
    }
}

/// Expands enabled, non-dark instances into emitters in meters.
///
/// Fails if an instance references a missing model or is out of bounds.
pub fn emitters(
    sources: &[SourceInstance],
    catalog: &SourceCatalog,
    units: UnitSystem,
) -> Result<Vec<Emitter>> {
    let m = units.meters_per_unit();
    let mut profiles: BTreeMap<&str, Profile> = BTreeMap::new();
    let mut out = Vec::new();
    for source in sources {
        source.validate(catalog)?;
        let output = source.output();
        if output <= 0.0 {
            continue;
        }
        let model = catalog.model(&source.model_id)?;
        let profile = *profiles
            .entry(model.id.as_str())
            .or_insert_with(|| model.distribution.profile());
        let offsets = model.emitter_offsets(source.rotation);
        let flux = model.flux * output / offsets.len() as f64;
        for (dx, dy) in offsets {
            let position = Point::new(source.position.x + dx, source.position.y + dy, source.position.z);
            out.push(Emitter {
                position: position.scale(m),
                flux,
                profile,
            });
        }
    }
    Ok(out)
}

/// Intensity at a point given in room units.
pub fn intensity_at(emitters: &[Emitter], p: &Point, units: UnitSystem) -> f64 {
    let p = p.scale(units.meters_per_unit());
    emitters.iter().map(|e| e.intensity_at(&p)).sum()
}

/// Fills every cell of `grid` with the superposed intensity of `sources`.
///
/// Rows are distributed over the rayon pool when `parallel` is set. The
/// token is checked before each row and once after the last; on
/// cancellation the partially filled grid is dropped and
/// [`crate::EngineError::ComputationCancelled`] is returned.
pub fn solve(
    mut grid: CanopyGrid,
    sources: &[SourceInstance],
    catalog: &SourceCatalog,
    units: UnitSystem,
    parallel: bool,
    token: &CancelToken,
) -> Result<CanopyGrid> {
    grid.validate()?;
    let emitters = emitters(sources, catalog, units)?;
    let t0 = Instant::now();

    let m = units.meters_per_unit();
    let columns = grid.columns;
    let (x0, y0, res) = (grid.bounds.x, grid.bounds.y, grid.resolution);
    let z = grid.height * m;
    let fill_row = |row: usize, values: &mut [f64]| -> Result<()> {
        token.check()?;
        let y = (y0 + (row as f64 + 0.5) * res) * m;
        for (col, value) in values.iter_mut().enumerate() {
            let x = (x0 + (col as f64 + 0.5) * res) * m;
            let p = Point::new(x, y, z);
            *value = emitters.iter().map(|e| e.intensity_at(&p)).sum();
        }
        Ok(())
    };

    if parallel {
        grid.values
            .par_chunks_mut(columns)
            .enumerate()
            .try_for_each(|(row, values)| fill_row(row, values))?;
    } else {
        for (row, values) in grid.values.chunks_mut(columns).enumerate() {
            fill_row(row, values)?;
        }
    }
    token.check()?;

    debug!(
        "Solved {} x {} cells for {} emitters in {:.1?}",
        grid.columns,
        grid.rows,
        emitters.len(),
        t0.elapsed()
    );
    Ok(grid)
}
