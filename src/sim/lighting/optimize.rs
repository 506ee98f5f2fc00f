//! Bounded search for a layout meeting intensity and uniformity targets.
//!
//! Each iteration places sources at the current density scale and mounting
//! height, solves at full output, trims all sources to one common dimming
//! level and aggregates. Between iterations the loop prefers, in order:
//!
//! 1. denser spacing (more sources),
//! 2. a different mounting height (higher for uniformity, lower for intensity),
//!
//! while the dimming level is re-trimmed on every iteration. Density steps
//! that leave the source count unchanged are skipped without solving.

use log::{debug, info};

use crate::error::{EngineError, Result};
use crate::geom::EPS;
use crate::geom::room::Geometry;
use crate::sim::cancel::CancelToken;
use crate::sim::config::EngineConfig;
use crate::sim::design::{Layout, Solution, surface_grid};
use crate::sim::layout::GrowSurface;

use super::config::{PlacementConfig, Targets};
use super::grid::CanopyGrid;
use super::metrics::aggregate;
use super::placement::{PlacementPlan, place_sources};
use super::solver::solve;
use super::sources::SourceCatalog;

/// Summary of one evaluated layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trial {
    pub density_scale: f64,
    pub mounting_height: f64,
    pub sources: usize,
    pub average: f64,
    pub uniformity: f64,
    pub dimming: f64,
}

/// Outcome of one optimizer iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct Optimized {
    pub layout: Layout,
    pub solution: Solution,
    /// Placement density scale used.
    pub density_scale: f64,
    /// Source height above the canopy.
    pub mounting_height: f64,
    /// Common dimming level of every source.
    pub dimming: f64,
    /// Iterations run until this outcome was returned.
    pub iterations: usize,
    /// Every layout evaluated, in order.
    pub trials: Vec<Trial>,
}

/// Signed distance of the best outcome from the targets (achieved minus
/// target). Zero for an absent target.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TargetDelta {
    pub average: f64,
    pub uniformity: f64,
}

impl TargetDelta {
    fn new(targets: &Targets, average: f64, uniformity: f64) -> Self {
        Self {
            average: targets.target_average.map_or(0.0, |t| average - t),
            uniformity: targets.target_uniformity.map_or(0.0, |u| uniformity - u),
        }
    }
}

/// Residual beyond tolerance, normalized by the targets. Zero when met.
fn residual(targets: &Targets, average: f64, uniformity: f64) -> f64 {
    let avg = targets.target_average.map_or(0.0, |t| {
        ((average - t).abs() - targets.tolerance_avg).max(0.0) / t
    });
    let uni = targets.target_uniformity.map_or(0.0, |u| {
        (u - targets.tolerance_uniformity - uniformity).max(0.0)
    });
    avg + uni
}

/// Placement of the configured model at the given density and height.
struct Placer<'a> {
    geometry: &'a Geometry,
    catalog: &'a SourceCatalog,
    surfaces: &'a [GrowSurface],
    config: &'a EngineConfig,
}

impl Placer<'_> {
    fn place(&self, density: f64, height: f64) -> Result<PlacementPlan> {
        let placement = PlacementConfig {
            density_scale: density,
            mounting_height: Some(height),
            ..self.config.placement.clone()
        };
        place_sources(
            self.geometry,
            self.surfaces,
            self.catalog,
            &placement,
            self.config.grid.canopy_height,
        )
    }

    /// Steps the density up until the placed source count changes.
    ///
    /// Returns `None` once the next step would pass the maximum density.
    fn densify(
        &self,
        density: f64,
        height: f64,
        count: usize,
    ) -> Result<Option<(f64, PlacementPlan)>> {
        let opt = &self.config.optimizer;
        let mut next = density;
        loop {
            next += opt.density_step;
            if next > opt.max_density_scale + EPS {
                return Ok(None);
            }
            let plan = self.place(next, height)?;
            if plan.instances.len() != count {
                return Ok(Some((next, plan)));
            }
            debug!("Density {next:.2} keeps {count} sources at height {height:.2}, skipping");
        }
    }
}

/// Runs the optimization loop for the placement model in `config`.
///
/// Returns the first outcome meeting both targets. When the iteration budget
/// is spent, or no adjustment is left, fails with
/// [`EngineError::TargetUnreachable`] carrying the outcome with the smallest
/// residual (the earliest on ties) and its distance from the targets. Only
/// evaluated layouts count against the budget.
pub fn optimize(
    geometry: &Geometry,
    catalog: &SourceCatalog,
    surfaces: &[GrowSurface],
    config: &EngineConfig,
    token: &CancelToken,
) -> Result<Optimized> {
    config.validate()?;
    let targets = &config.targets;
    let opt = &config.optimizer;
    let model = catalog.model(&config.placement.model_id)?;

    let start_density = config.placement.density_scale;
    let height_step = opt
        .height_step
        .unwrap_or(0.5 * model.reference_mounting_height);
    let max_height = geometry.room().height - config.grid.canopy_height;
    let base = surface_grid(geometry, surfaces, &config.grid)?;
    let placer = Placer {
        geometry,
        catalog,
        surfaces,
        config,
    };

    let mut density = start_density;
    let mut height = config
        .placement
        .mounting_height
        .unwrap_or(model.reference_mounting_height);
    let mut plan = placer.place(density, height)?;
    let mut best: Option<(Optimized, f64)> = None;
    let mut trials = Vec::new();
    let mut iterations = 0;

    while iterations < opt.max_iterations {
        token.check()?;
        iterations += 1;
        let count = plan.instances.len();
        let mut outcome = evaluate(
            geometry, catalog, surfaces, config, &base, plan, density, token,
        )?;
        let m = outcome.solution.metrics;
        info!(
            "Iteration {iterations}: density {density:.2}, height {height:.2}, {count} sources, \
             average {:.1}, uniformity {:.3}, dimming {:.3}",
            m.average, m.uniformity, outcome.dimming
        );
        trials.push(Trial {
            density_scale: density,
            mounting_height: height,
            sources: count,
            average: m.average,
            uniformity: m.uniformity,
            dimming: outcome.dimming,
        });
        outcome.iterations = iterations;
        outcome.trials = trials.clone();

        if targets.is_met(m.average, m.uniformity) {
            return Ok(outcome);
        }
        let score = residual(targets, m.average, m.uniformity);
        if best.as_ref().is_none_or(|(_, s)| score < *s) {
            best = Some((outcome, score));
        }

        let short = targets
            .target_average
            .is_some_and(|t| m.average < t - targets.tolerance_avg);
        let uniform = targets.uniformity_met(m.uniformity);
        if uniform && !short {
            break;
        }
        if let Some((next, next_plan)) = placer.densify(density, height, count)? {
            density = next;
            plan = next_plan;
        } else if !uniform && height + height_step <= max_height + EPS {
            height += height_step;
            density = start_density;
            plan = placer.place(density, height)?;
        } else if uniform && height - height_step > EPS {
            height -= height_step;
            plan = placer.place(density, height)?;
        } else {
            debug!("No adjustment left");
            break;
        }
    }

    match best {
        Some((mut best, _)) => {
            best.iterations = iterations;
            best.trials = trials;
            let m = best.solution.metrics;
            let delta = TargetDelta::new(targets, m.average, m.uniformity);
            Err(EngineError::TargetUnreachable {
                best: Box::new(best),
                delta,
            })
        }
        // Only reachable with a zero budget, which validation rejects
        None => Err(EngineError::config("optimizer ran no iterations")),
    }
}

/// Solves `plan` at full output and trims the common dimming level.
#[allow(clippy::too_many_arguments)]
fn evaluate(
    geometry: &Geometry,
    catalog: &SourceCatalog,
    surfaces: &[GrowSurface],
    config: &EngineConfig,
    base: &CanopyGrid,
    plan: PlacementPlan,
    density: f64,
    token: &CancelToken,
) -> Result<Optimized> {
    let mounting_height = plan.mounting_height;
    let mut instances = plan.instances;
    let mut grid = solve(
        base.clone(),
        &instances,
        catalog,
        geometry.units(),
        config.grid.parallel,
        token,
    )?;

    let (sum, count) = grid
        .surface_values()
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    let full_average = if count > 0 { sum / count as f64 } else { 0.0 };
    let dimming = match config.targets.target_average {
        Some(t) if full_average > 0.0 => (t / full_average).min(1.0),
        _ => 1.0,
    };
    for s in &mut instances {
        s.set_dimming(dimming)?;
    }
    grid.scale(dimming);

    let metrics = aggregate(
        &grid,
        &instances,
        catalog,
        geometry.floor_area(),
        config.targets.photoperiod_hours,
    )?;
    Ok(Optimized {
        layout: Layout::new(surfaces.to_vec(), instances),
        solution: Solution { grid, metrics },
        density_scale: density,
        mounting_height,
        dimming,
        iterations: 0,
        trials: Vec::new(),
    })
}
