//! Whole-pipeline helpers: layout generation, placement and solving.

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geom::room::Geometry;
use crate::sim::cancel::CancelToken;
use crate::sim::config::EngineConfig;
use crate::sim::layout::{GrowSurface, generate_layout};
use crate::sim::lighting::config::GridConfig;
use crate::sim::lighting::grid::CanopyGrid;
use crate::sim::lighting::metrics::{Metrics, aggregate};
use crate::sim::lighting::placement::place_sources;
use crate::sim::lighting::solver::solve;
use crate::sim::lighting::sources::{SourceCatalog, SourceInstance};

/// Grow surfaces and light sources of a design.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub grow_surfaces: Vec<GrowSurface>,
    pub source_instances: Vec<SourceInstance>,
}

impl Layout {
    pub fn new(grow_surfaces: Vec<GrowSurface>, source_instances: Vec<SourceInstance>) -> Self {
        Self {
            grow_surfaces,
            source_instances,
        }
    }

    /// Checks every source against the catalog.
    pub fn validate(&self, catalog: &SourceCatalog) -> Result<()> {
        self.source_instances
            .iter()
            .try_for_each(|s| s.validate(catalog))
    }
}

/// Solved field and its metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub grid: CanopyGrid,
    pub metrics: Metrics,
}

/// Generates grow surfaces and places sources over them.
pub fn plan_layout(
    geometry: &Geometry,
    catalog: &SourceCatalog,
    config: &EngineConfig,
) -> Result<Layout> {
    let surfaces = generate_layout(geometry, &config.layout)?;
    let plan = place_sources(
        geometry,
        &surfaces,
        catalog,
        &config.placement,
        config.grid.canopy_height,
    )?;
    info!(
        "Planned {} sources ({} required) over {} surfaces",
        plan.instances.len(),
        plan.required,
        surfaces.len()
    );
    Ok(Layout::new(surfaces, plan.instances))
}

/// Empty canopy grid over the room with the surface cells flagged.
pub fn surface_grid(
    geometry: &Geometry,
    surfaces: &[GrowSurface],
    config: &GridConfig,
) -> Result<CanopyGrid> {
    let mut grid = CanopyGrid::for_room(geometry, config)?;
    grid.mark_surfaces(surfaces);
    Ok(grid)
}

/// Solves `layout` and aggregates its metrics.
pub fn solve_layout(
    geometry: &Geometry,
    catalog: &SourceCatalog,
    layout: &Layout,
    config: &EngineConfig,
    token: &CancelToken,
) -> Result<Solution> {
    let grid = surface_grid(geometry, &layout.grow_surfaces, &config.grid)?;
    let grid = solve(
        grid,
        &layout.source_instances,
        catalog,
        geometry.units(),
        config.grid.parallel,
        token,
    )?;
    let metrics = aggregate(
        &grid,
        &layout.source_instances,
        catalog,
        geometry.floor_area(),
        config.targets.photoperiod_hours,
    )?;
    Ok(Solution { grid, metrics })
}
