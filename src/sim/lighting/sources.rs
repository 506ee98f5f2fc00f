use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::UID;
use crate::error::{EngineError, Result};
use crate::geom::point::Point;

use super::distribution::Distribution;

/// Upper bound on emitter samples per axis.
pub const MAX_EMITTER_SAMPLES: u32 = 16;

fn default_emitter_samples() -> u32 {
    1
}

/// Catalog entry describing a fixture type. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceModel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Photon flux (μmol/s).
    pub flux: f64,
    /// Electrical power draw (W).
    pub power: f64,
    /// Physical extent along the instance's local x axis.
    #[serde(default)]
    pub footprint_width: f64,
    /// Physical extent along the instance's local y axis.
    #[serde(default)]
    pub footprint_depth: f64,
    #[serde(default)]
    pub distribution: Distribution,
    /// Nominal canopy area covered at the reference mounting height (units²).
    pub coverage_area: f64,
    /// Height above the canopy at which `coverage_area` applies.
    pub reference_mounting_height: f64,
    /// Emitter points per footprint axis; 1 treats the fixture as a point source.
    #[serde(default = "default_emitter_samples")]
    pub emitter_samples: u32,
}

impl SourceModel {
    /// Point-source model with a Lambertian beam and no physical footprint.
    pub fn new(
        id: &str,
        flux: f64,
        power: f64,
        coverage_area: f64,
        reference_mounting_height: f64,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            flux,
            power,
            footprint_width: 0.0,
            footprint_depth: 0.0,
            distribution: Distribution::default(),
            coverage_area,
            reference_mounting_height,
            emitter_samples: 1,
        }
    }

    pub fn with_footprint(mut self, width: f64, depth: f64) -> Self {
        self.footprint_width = width;
        self.footprint_depth = depth;
        self
    }

    pub fn with_distribution(mut self, distribution: Distribution) -> Self {
        self.distribution = distribution;
        self
    }

    pub fn with_emitter_samples(mut self, samples: u32) -> Self {
        self.emitter_samples = samples;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| EngineError::InvalidSource(format!("model {}: {msg}", self.id));
        if self.id.is_empty() {
            return Err(EngineError::InvalidSource("model id is empty".to_string()));
        }
        for (name, value) in [
            ("flux", self.flux),
            ("power", self.power),
            ("footprint_width", self.footprint_width),
            ("footprint_depth", self.footprint_depth),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!("{name} must be non-negative, got {value}")));
            }
        }
        for (name, value) in [
            ("coverage_area", self.coverage_area),
            ("reference_mounting_height", self.reference_mounting_height),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(format!("{name} must be positive, got {value}")));
            }
        }
        if self.emitter_samples == 0 || self.emitter_samples > MAX_EMITTER_SAMPLES {
            return Err(invalid(format!(
                "emitter_samples must lie in 1..={MAX_EMITTER_SAMPLES}, got {}",
                self.emitter_samples
            )));
        }
        self.distribution.validate()
    }

    /// Horizontal offsets of the emitter points from the instance center.
    ///
    /// The footprint is split into `k × k` equal cells (`k = emitter_samples`)
    /// and rotated by `rotation_deg` about the vertical axis. Each point
    /// carries `1 / k²` of the flux.
    pub fn emitter_offsets(&self, rotation_deg: f64) -> Vec<(f64, f64)> {
        let k = self.emitter_samples.max(1) as usize;
        if k == 1 {
            return vec![(0.0, 0.0)];
        }
        let (sin, cos) = rotation_deg.to_radians().sin_cos();
        let mut offsets = Vec::with_capacity(k * k);
        for j in 0..k {
            let v = ((j as f64 + 0.5) / k as f64 - 0.5) * self.footprint_depth;
            for i in 0..k {
                let u = ((i as f64 + 0.5) / k as f64 - 0.5) * self.footprint_width;
                offsets.push((u * cos - v * sin, u * sin + v * cos));
            }
        }
        offsets
    }
}

/// Source models keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SourceModel>", into = "Vec<SourceModel>")]
pub struct SourceCatalog {
    models: BTreeMap<String, SourceModel>,
}

impl SourceCatalog {
    pub fn new() -> Self {
        Self {
            models: BTreeMap::new(),
        }
    }

    pub fn from_models(models: impl IntoIterator<Item = SourceModel>) -> Result<Self> {
        let mut catalog = Self::new();
        for model in models {
            catalog.insert(model)?;
        }
        Ok(catalog)
    }

    /// Adds a validated model. Ids must be unique.
    pub fn insert(&mut self, model: SourceModel) -> Result<()> {
        model.validate()?;
        if self.models.contains_key(&model.id) {
            return Err(EngineError::InvalidSource(format!(
                "duplicate model id {}",
                model.id
            )));
        }
        self.models.insert(model.id.clone(), model);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&SourceModel> {
        self.models.get(id)
    }

    /// Looks a model up, failing with [`EngineError::UnknownSourceModel`].
    pub fn model(&self, id: &str) -> Result<&SourceModel> {
        self.get(id)
            .ok_or_else(|| EngineError::UnknownSourceModel(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.models.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceModel> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl TryFrom<Vec<SourceModel>> for SourceCatalog {
    type Error = EngineError;

    fn try_from(models: Vec<SourceModel>) -> Result<Self> {
        Self::from_models(models)
    }
}

impl From<SourceCatalog> for Vec<SourceModel> {
    fn from(catalog: SourceCatalog) -> Self {
        catalog.models.into_values().collect()
    }
}

/// A placed fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInstance {
    pub id: UID,
    /// Center of the emitting face.
    pub position: Point,
    /// Degrees about the vertical axis.
    #[serde(default)]
    pub rotation: f64,
    /// Output level in `[0, 1]`.
    pub dimming: f64,
    pub enabled: bool,
    pub model_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circuit_id: Option<String>,
}

impl SourceInstance {
    /// Enabled instance at full output.
    pub fn new(id: UID, model_id: &str, position: Point) -> Self {
        Self {
            id,
            position,
            rotation: 0.0,
            dimming: 1.0,
            enabled: true,
            model_id: model_id.to_string(),
            circuit_id: None,
        }
    }

    /// Checks the model reference and the bounds of every field.
    pub fn validate(&self, catalog: &SourceCatalog) -> Result<()> {
        if !catalog.contains(&self.model_id) {
            return Err(EngineError::UnknownSourceModel(self.model_id.clone()));
        }
        if !self.position.is_finite() || !self.rotation.is_finite() {
            return Err(EngineError::InvalidSource(format!(
                "source {} has a non-finite position or rotation",
                self.id
            )));
        }
        check_dimming(self.dimming).map_err(|e| match e {
            EngineError::InvalidSource(msg) => {
                EngineError::InvalidSource(format!("source {}: {msg}", self.id))
            }
            other => other,
        })
    }

    pub fn set_dimming(&mut self, level: f64) -> Result<()> {
        check_dimming(level)?;
        self.dimming = level;
        Ok(())
    }

    /// Fraction of the model's flux and power actually emitted.
    pub fn output(&self) -> f64 {
        if self.enabled { self.dimming } else { 0.0 }
    }
}

fn check_dimming(level: f64) -> Result<()> {
    if (0.0..=1.0).contains(&level) {
        Ok(())
    } else {
        Err(EngineError::InvalidSource(format!(
            "dimming level must lie in [0, 1], got {level}"
        )))
    }
}
