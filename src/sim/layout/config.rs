use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Configuration of the grow-surface layout generator.
///
/// All lengths are in room units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Surface extent along x.
    pub surface_width: f64,
    /// Surface extent along y.
    pub surface_depth: f64,
    /// Walkway between neighbouring surfaces.
    pub aisle_width: f64,
    /// Distance kept clear from the room perimeter.
    pub perimeter_clearance: f64,
    /// Clearance added on top of every obstacle's own buffer.
    pub obstacle_clearance: f64,
    /// Nominal growing units (plants, pots) per unit² of surface.
    pub units_per_area: f64,
    /// Also try the footprint rotated by 90° and keep the denser layout.
    pub auto_orient: bool,
}

impl LayoutConfig {
    pub fn new() -> Self {
        Self {
            surface_width: 1.2,
            surface_depth: 2.4,
            aisle_width: 0.6,
            perimeter_clearance: 0.3,
            obstacle_clearance: 0.0,
            units_per_area: 9.0,
            auto_orient: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !(positive(self.surface_width) && positive(self.surface_depth)) {
            return Err(EngineError::config(format!(
                "surface footprint must be positive, got {} x {}",
                self.surface_width, self.surface_depth
            )));
        }
        for (name, value) in [
            ("aisle_width", self.aisle_width),
            ("perimeter_clearance", self.perimeter_clearance),
            ("obstacle_clearance", self.obstacle_clearance),
            ("units_per_area", self.units_per_area),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::config(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Same configuration with the surface footprint rotated by 90°.
    pub fn rotated(&self) -> Self {
        Self {
            surface_width: self.surface_depth,
            surface_depth: self.surface_width,
            ..self.clone()
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::new()
    }
}
