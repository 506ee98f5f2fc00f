//! Engine error type.
//!
//! Engine operations return [`Result`]. File I/O and the command-line front
//! end wrap these in `anyhow` with context.

use thiserror::Error;

use crate::sim::lighting::optimize::{Optimized, TargetDelta};

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Non-positive room dimensions or an obstacle outside the room.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Not a single grow surface fits the free floor area.
    #[error("no feasible layout: {reason}")]
    NoFeasibleLayout { reason: String },

    /// A source instance or placement refers to a model missing from the catalog.
    #[error("unknown source model: {0}")]
    UnknownSourceModel(String),

    /// A source model or instance violates its invariants.
    #[error("invalid source: {0}")]
    InvalidSource(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The optimizer used its iteration budget without meeting the targets.
    #[error(
        "target unreachable after {} iterations (average off by {:.1}, uniformity off by {:.3})",
        best.iterations,
        delta.average,
        delta.uniformity
    )]
    TargetUnreachable {
        best: Box<Optimized>,
        delta: TargetDelta,
    },

    /// A newer solve request superseded this one.
    #[error("computation cancelled")]
    ComputationCancelled,
}

impl EngineError {
    pub(crate) fn geometry(msg: impl Into<String>) -> Self {
        Self::InvalidGeometry(msg.into())
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// True for [`EngineError::ComputationCancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::ComputationCancelled)
    }
}
