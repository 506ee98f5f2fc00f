use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Coverage profile used to derive the required source count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DensityProfile {
    /// Nominal catalog coverage.
    #[default]
    Sparse,
    /// Overlapping beams, each source credited with 70 % of its coverage.
    Dense,
}

impl DensityProfile {
    pub fn coverage_factor(self) -> f64 {
        match self {
            DensityProfile::Sparse => 1.0,
            DensityProfile::Dense => 0.7,
        }
    }
}

/// Configuration of the light-source placement planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Catalog id of the model to place.
    pub model_id: String,
    pub profile: DensityProfile,
    /// Multiplier on the required source count (1.0 = nominal).
    pub density_scale: f64,
    /// Height of the sources above the canopy. Defaults to the model's
    /// reference mounting height.
    pub mounting_height: Option<f64>,
}

impl PlacementConfig {
    pub fn new() -> Self {
        Self {
            model_id: String::new(),
            profile: DensityProfile::Sparse,
            density_scale: 1.0,
            mounting_height: None,
        }
    }

    pub fn for_model(model_id: &str) -> Self {
        Self {
            model_id: model_id.to_string(),
            ..Self::new()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.density_scale.is_finite() || self.density_scale <= 0.0 {
            return Err(EngineError::config(format!(
                "density_scale must be positive, got {}",
                self.density_scale
            )));
        }
        if let Some(h) = self.mounting_height.filter(|h| !h.is_finite() || *h <= 0.0) {
            return Err(EngineError::config(format!(
                "mounting_height must be positive, got {h}"
            )));
        }
        Ok(())
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Canopy grid sampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Cell edge length (room units).
    pub resolution: f64,
    /// Height of the growing plane above the floor.
    pub canopy_height: f64,
    /// Partition rows across the rayon thread pool.
    pub parallel: bool,
}

impl GridConfig {
    pub fn new() -> Self {
        Self {
            resolution: 0.25,
            canopy_height: 1.0,
            parallel: true,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(EngineError::config(format!(
                "grid resolution must be positive, got {}",
                self.resolution
            )));
        }
        if !self.canopy_height.is_finite() || self.canopy_height < 0.0 {
            return Err(EngineError::config(format!(
                "canopy_height must be non-negative, got {}",
                self.canopy_height
            )));
        }
        Ok(())
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Intensity and uniformity goals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Targets {
    /// Average PPFD-equivalent intensity over the canopy (μmol/m²/s).
    #[serde(rename = "targetAveragePPFD")]
    pub target_average: Option<f64>,
    /// Minimum-to-average ratio.
    pub target_uniformity: Option<f64>,
    /// Accepted absolute deviation from `target_average`.
    pub tolerance_avg: f64,
    /// Accepted shortfall below `target_uniformity`.
    pub tolerance_uniformity: f64,
    /// Lit hours per day.
    pub photoperiod_hours: f64,
}

impl Targets {
    pub fn new() -> Self {
        Self {
            target_average: None,
            target_uniformity: None,
            tolerance_avg: 0.0,
            tolerance_uniformity: 0.0,
            photoperiod_hours: 12.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(t) = self.target_average.filter(|t| !t.is_finite() || *t <= 0.0) {
            return Err(EngineError::config(format!(
                "targetAveragePPFD must be positive, got {t}"
            )));
        }
        if let Some(u) = self.target_uniformity.filter(|u| !(0.0..=1.0).contains(u)) {
            return Err(EngineError::config(format!(
                "targetUniformity must lie in [0, 1], got {u}"
            )));
        }
        for (name, value) in [
            ("toleranceAvg", self.tolerance_avg),
            ("toleranceUniformity", self.tolerance_uniformity),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::config(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        if !(0.0..=24.0).contains(&self.photoperiod_hours) {
            return Err(EngineError::config(format!(
                "photoperiodHours must lie in [0, 24], got {}",
                self.photoperiod_hours
            )));
        }
        Ok(())
    }

    /// Checks an average and a uniformity against the targets.
    /// Absent targets are always met.
    pub fn is_met(&self, average: f64, uniformity: f64) -> bool {
        let avg_ok = self
            .target_average
            .is_none_or(|t| (average - t).abs() <= self.tolerance_avg);
        avg_ok && self.uniformity_met(uniformity)
    }

    pub fn uniformity_met(&self, uniformity: f64) -> bool {
        self.target_uniformity
            .is_none_or(|t| uniformity >= t - self.tolerance_uniformity)
    }
}

impl Default for Targets {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounds of the optimization loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub max_iterations: usize,
    /// Increment of the placement density scale per step.
    pub density_step: f64,
    /// Density scale beyond which the loop switches to mounting height.
    pub max_density_scale: f64,
    /// Mounting height change per step. Defaults to half the model's
    /// reference mounting height.
    pub height_step: Option<f64>,
}

impl OptimizerConfig {
    pub fn new() -> Self {
        Self {
            max_iterations: 20,
            density_step: 0.15,
            max_density_scale: 2.0,
            height_step: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(EngineError::config("max_iterations must be at least 1"));
        }
        if !self.density_step.is_finite() || self.density_step <= 0.0 {
            return Err(EngineError::config(format!(
                "density_step must be positive, got {}",
                self.density_step
            )));
        }
        if !self.max_density_scale.is_finite() || self.max_density_scale < 1.0 {
            return Err(EngineError::config(format!(
                "max_density_scale must be at least 1, got {}",
                self.max_density_scale
            )));
        }
        if let Some(step) = self.height_step.filter(|s| !s.is_finite() || *s <= 0.0) {
            return Err(EngineError::config(format!(
                "height_step must be positive, got {step}"
            )));
        }
        Ok(())
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::new()
    }
}
