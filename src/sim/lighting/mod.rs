//! Light-source placement, irradiance solving, metrics and optimization.

pub mod config;
pub mod distribution;
pub mod grid;
pub mod metrics;
pub mod optimize;
pub mod placement;
pub mod solver;
pub mod sources;

pub use config::{DensityProfile, GridConfig, OptimizerConfig, PlacementConfig, Targets};
pub use distribution::Distribution;
pub use grid::CanopyGrid;
pub use metrics::{Metrics, aggregate};
pub use optimize::{Optimized, TargetDelta, Trial, optimize};
pub use placement::{PlacementPlan, place_sources};
pub use solver::solve;
pub use sources::{SourceCatalog, SourceInstance, SourceModel};
