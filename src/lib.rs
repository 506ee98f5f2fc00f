//! Layout planning and canopy irradiance simulation for grow rooms.
//!
//! The pipeline runs leaf to root: [`Geometry`] → grow-surface layout →
//! light-source placement → irradiance solve → metrics, with an optional
//! optimization loop feeding back into placement. [`DesignSession`] keeps
//! the editable state of one design.

pub mod error;
pub mod geom;
pub mod io;
pub mod session;
pub mod sim;
mod uid;

// Prelude
pub use error::{EngineError, Result};
pub use geom::point::Point;
pub use geom::rect::Rect;
pub use geom::room::{Geometry, Obstacle, ObstacleKind, Room, UnitSystem};
pub use session::{DesignSession, SolveRequest, Solved};
pub use sim::config::EngineConfig;
pub use sim::design::{Layout, Solution};
pub use sim::layout::{GrowSurface, LayoutConfig};
pub use sim::lighting::{
    CanopyGrid, Distribution, Metrics, Optimized, SourceCatalog, SourceInstance, SourceModel,
    TargetDelta, Targets, Trial,
};
pub use uid::UID;
