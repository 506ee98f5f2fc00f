use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::sim::layout::LayoutConfig;
use crate::sim::lighting::config::{GridConfig, OptimizerConfig, PlacementConfig, Targets};

/// Configuration of every pipeline stage.
///
/// Each section falls back to its defaults when missing from a design file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub layout: LayoutConfig,
    pub placement: PlacementConfig,
    pub grid: GridConfig,
    pub targets: Targets,
    pub optimizer: OptimizerConfig,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        self.layout.validate()?;
        self.placement.validate()?;
        self.grid.validate()?;
        self.targets.validate()?;
        self.optimizer.validate()
    }
}
