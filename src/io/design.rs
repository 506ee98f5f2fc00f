//! Design file: room, obstacles, source catalog and engine configuration.
//!
//! ```json
//! {
//!   "room": { "length": 66.0, "width": 22.0, "height": 10.0, "units": "imperial" },
//!   "obstacles": [{ "kind": "column", "x": 30.0, "y": 10.0, "width": 1.0, "depth": 1.0 }],
//!   "catalog": [{ "id": "bar", "flux": 1700.0, "power": 680.0, "coverage_area": 16.0,
//!                 "reference_mounting_height": 2.0 }],
//!   "config": { "placement": { "model_id": "bar" } }
//! }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::geom::room::{Geometry, Obstacle, Room};
use crate::session::DesignSession;
use crate::sim::config::EngineConfig;
use crate::sim::lighting::sources::SourceCatalog;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignFile {
    pub room: Room,
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
    pub catalog: SourceCatalog,
    #[serde(default)]
    pub config: EngineConfig,
}

impl DesignFile {
    /// Validates the geometry and opens a session on it.
    pub fn into_session(self) -> Result<DesignSession> {
        let geometry = Geometry::new(self.room, self.obstacles).context("Invalid room geometry")?;
        let session = DesignSession::new(geometry, self.catalog, self.config)
            .context("Invalid engine configuration")?;
        Ok(session)
    }
}

pub fn read_design(path: &Path) -> Result<DesignFile> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    let reader = BufReader::new(file);

    let design: DesignFile = serde_json::from_reader(reader)
        .with_context(|| format!("Failed to deserialize design from: {}", path.display()))?;

    Ok(design)
}

pub fn from_design_string(json: &str) -> Result<DesignFile> {
    serde_json::from_str(json).context("Failed to deserialize design from string")
}
