//! Caller-owned design state.
//!
//! A [`DesignSession`] holds the immutable geometry and catalog together with
//! the editable layout. Every edit bumps the revision and cancels in-flight
//! solves; the grid and metrics are recomputed lazily on the next query.
//! Background solves go through [`DesignSession::begin_solve`], which hands
//! out a self-contained [`SolveRequest`] that may run on any thread.

use std::sync::Arc;

use log::debug;

use crate::UID;
use crate::error::{EngineError, Result};
use crate::geom::point::Point;
use crate::geom::rect::Rect;
use crate::geom::room::Geometry;
use crate::io::layout::LayoutRecord;
use crate::sim::cancel::{CancelToken, SolveGate};
use crate::sim::config::EngineConfig;
use crate::sim::design::{Layout, Solution, plan_layout, solve_layout};
use crate::sim::layout::GrowSurface;
use crate::sim::lighting::metrics::Metrics;
use crate::sim::lighting::optimize::{Optimized, optimize};
use crate::sim::lighting::sources::{SourceCatalog, SourceInstance};

#[derive(Debug)]
pub struct DesignSession {
    geometry: Arc<Geometry>,
    catalog: Arc<SourceCatalog>,
    config: EngineConfig,
    layout: Layout,
    revision: u64,
    /// Solution and the revision it was computed for.
    cache: Option<(u64, Solution)>,
    gate: Arc<SolveGate>,
}

impl DesignSession {
    /// Empty design over validated geometry.
    pub fn new(geometry: Geometry, catalog: SourceCatalog, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            geometry: Arc::new(geometry),
            catalog: Arc::new(catalog),
            config,
            layout: Layout::default(),
            revision: 0,
            cache: None,
            gate: Arc::new(SolveGate::new()),
        })
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn catalog(&self) -> &SourceCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Gate of this session's solves; cancel it to abandon running work.
    pub fn gate(&self) -> Arc<SolveGate> {
        Arc::clone(&self.gate)
    }

    /// True when the cached solution does not match the current layout.
    pub fn is_dirty(&self) -> bool {
        self.cache.as_ref().is_none_or(|(rev, _)| *rev != self.revision)
    }

    fn invalidate(&mut self) {
        self.revision += 1;
        self.gate.cancel();
        debug!("Design revision {}", self.revision);
    }

    /// Replaces the engine configuration. Invalidates the solution.
    pub fn set_config(&mut self, config: EngineConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        self.invalidate();
        Ok(())
    }

    /// Replaces the layout after checking every source against the catalog.
    pub fn set_layout(&mut self, layout: Layout) -> Result<()> {
        layout.validate(&self.catalog)?;
        self.layout = layout;
        self.invalidate();
        Ok(())
    }

    /// Generates surfaces and sources from scratch with the session configuration.
    pub fn generate(&mut self) -> Result<&Layout> {
        let layout = plan_layout(&self.geometry, &self.catalog, &self.config)?;
        self.set_layout(layout)?;
        Ok(&self.layout)
    }

    /// Runs the optimization loop over the current surfaces and adopts its
    /// result.
    ///
    /// Returns `Ok(None)` if the run was cancelled through the session gate.
    /// On [`EngineError::TargetUnreachable`] the layout is left unchanged.
    pub fn optimize(&mut self) -> Result<Option<Optimized>> {
        let token = SolveGate::issue(&self.gate);
        let outcome = match optimize(
            &self.geometry,
            &self.catalog,
            &self.layout.grow_surfaces,
            &self.config,
            &token,
        ) {
            Ok(outcome) => outcome,
            Err(EngineError::ComputationCancelled) => return Ok(None),
            Err(e) => return Err(e),
        };
        self.layout = outcome.layout.clone();
        self.invalidate();
        self.cache = Some((self.revision, outcome.solution.clone()));
        Ok(Some(outcome))
    }

    /// Solved field and metrics of the current layout, solving if dirty.
    pub fn solution(&mut self) -> Result<&Solution> {
        if self.is_dirty() {
            let solution = solve_layout(
                &self.geometry,
                &self.catalog,
                &self.layout,
                &self.config,
                &CancelToken::never(),
            )?;
            self.cache = Some((self.revision, solution));
        }
        match &self.cache {
            Some((_, solution)) => Ok(solution),
            None => Err(EngineError::ComputationCancelled),
        }
    }

    pub fn metrics(&mut self) -> Result<Metrics> {
        Ok(self.solution()?.metrics)
    }

    /// Cached solution without recomputing; `None` when dirty.
    pub fn cached_solution(&self) -> Option<&Solution> {
        match &self.cache {
            Some((rev, solution)) if *rev == self.revision => Some(solution),
            _ => None,
        }
    }

    /// Snapshot of the current design for a background solve.
    ///
    /// Issuing a request cancels every earlier one, so only the latest
    /// request delivers a result.
    pub fn begin_solve(&self) -> SolveRequest {
        SolveRequest {
            geometry: Arc::clone(&self.geometry),
            catalog: Arc::clone(&self.catalog),
            layout: self.layout.clone(),
            config: self.config.clone(),
            revision: self.revision,
            token: SolveGate::issue(&self.gate),
        }
    }

    /// Adopts a finished background solve if it matches the current revision
    /// and no newer request has been issued since.
    pub fn install(&mut self, solved: Solved) -> bool {
        if solved.revision != self.revision {
            debug!(
                "Discarding solve of revision {} (now {})",
                solved.revision, self.revision
            );
            return false;
        }
        if solved.generation != self.gate.generation() {
            debug!(
                "Discarding superseded solve {} (latest {})",
                solved.generation,
                self.gate.generation()
            );
            return false;
        }
        self.cache = Some((solved.revision, solved.solution));
        true
    }

    /// Neutral record of the current layout with its solved grid.
    pub fn export_record(&mut self) -> Result<LayoutRecord> {
        let grid = self.solution()?.grid.clone();
        Ok(LayoutRecord::new(&self.layout, Some(&grid)))
    }

    /// Replaces the layout with the one stored in `record`.
    pub fn import_record(&mut self, record: &LayoutRecord) -> Result<()> {
        self.set_layout(record.to_layout())
    }

    // Surfaces

    /// Adds a surface after checking it against the floor, the obstacles and
    /// the existing surfaces.
    pub fn add_surface(&mut self, footprint: Rect) -> Result<UID> {
        let valid = footprint.width > 0.0
            && footprint.depth > 0.0
            && footprint.x.is_finite()
            && footprint.y.is_finite();
        if !valid || !self.geometry.rect_within_floor(&footprint, 0.0) {
            return Err(EngineError::geometry(format!(
                "surface {footprint:?} does not lie on the floor"
            )));
        }
        if self
            .geometry
            .rect_intersects_obstacle(&footprint, self.config.layout.obstacle_clearance)
        {
            return Err(EngineError::geometry(format!(
                "surface {footprint:?} overlaps an obstacle"
            )));
        }
        if let Some(other) = self
            .layout
            .grow_surfaces
            .iter()
            .find(|s| s.footprint().overlaps(&footprint))
        {
            return Err(EngineError::geometry(format!(
                "surface {footprint:?} overlaps {}",
                other.id
            )));
        }
        let id = UID::new();
        let surface = GrowSurface::with_density(id.clone(), footprint, self.config.layout.units_per_area);
        self.layout.grow_surfaces.push(surface);
        self.invalidate();
        Ok(id)
    }

    pub fn remove_surface(&mut self, id: &UID) -> Option<GrowSurface> {
        let i = self.layout.grow_surfaces.iter().position(|s| &s.id == id)?;
        let removed = self.layout.grow_surfaces.remove(i);
        self.invalidate();
        Some(removed)
    }

    // Sources

    /// Adds an enabled source at full output.
    pub fn add_source(&mut self, model_id: &str, position: Point) -> Result<UID> {
        let source = SourceInstance::new(UID::new(), model_id, position);
        source.validate(&self.catalog)?;
        let id = source.id.clone();
        self.layout.source_instances.push(source);
        self.invalidate();
        Ok(id)
    }

    pub fn remove_source(&mut self, id: &UID) -> Option<SourceInstance> {
        let i = self.layout.source_instances.iter().position(|s| &s.id == id)?;
        let removed = self.layout.source_instances.remove(i);
        self.invalidate();
        Some(removed)
    }

    fn edit_source(&mut self, id: &UID, edit: impl FnOnce(&mut SourceInstance) -> Result<()>) -> Result<()> {
        let source = self
            .layout
            .source_instances
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| EngineError::InvalidSource(format!("no source with id {id}")))?;
        edit(source)?;
        self.invalidate();
        Ok(())
    }

    pub fn move_source(&mut self, id: &UID, position: Point) -> Result<()> {
        if !position.is_finite() {
            return Err(EngineError::InvalidSource(format!(
                "source {id} moved to a non-finite position"
            )));
        }
        self.edit_source(id, |s| {
            s.position = position;
            Ok(())
        })
    }

    pub fn rotate_source(&mut self, id: &UID, rotation_deg: f64) -> Result<()> {
        if !rotation_deg.is_finite() {
            return Err(EngineError::InvalidSource(format!(
                "source {id} rotation must be finite"
            )));
        }
        self.edit_source(id, |s| {
            s.rotation = rotation_deg;
            Ok(())
        })
    }

    pub fn set_dimming(&mut self, id: &UID, level: f64) -> Result<()> {
        self.edit_source(id, |s| s.set_dimming(level))
    }

    pub fn set_enabled(&mut self, id: &UID, enabled: bool) -> Result<()> {
        self.edit_source(id, |s| {
            s.enabled = enabled;
            Ok(())
        })
    }

    pub fn set_circuit(&mut self, id: &UID, circuit_id: Option<String>) -> Result<()> {
        self.edit_source(id, |s| {
            s.circuit_id = circuit_id;
            Ok(())
        })
    }
}

/// Finished background solve, tagged with the revision it was computed for
/// and the generation of the request that produced it.
#[derive(Debug, Clone)]
pub struct Solved {
    pub revision: u64,
    pub generation: u64,
    pub solution: Solution,
}

/// Self-contained solve of one design revision.
pub struct SolveRequest {
    geometry: Arc<Geometry>,
    catalog: Arc<SourceCatalog>,
    layout: Layout,
    config: EngineConfig,
    revision: u64,
    token: CancelToken,
}

impl SolveRequest {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Solves the snapshot.
    ///
    /// Returns `Ok(None)` if a newer request or an edit superseded this one
    /// at any point, including after the last row.
    pub fn run(self) -> Result<Option<Solved>> {
        match solve_layout(
            &self.geometry,
            &self.catalog,
            &self.layout,
            &self.config,
            &self.token,
        ) {
            Ok(_) if self.token.is_cancelled() => Ok(None),
            Ok(solution) => Ok(Some(Solved {
                revision: self.revision,
                generation: self.token.generation(),
                solution,
            })),
            Err(EngineError::ComputationCancelled) => {
                debug!("Solve of revision {} superseded", self.revision);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
