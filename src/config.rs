// SPDX-License-Identifier: AGPL-3.0-only

//! JSON run configuration.
//!
//! Drivers describe a run as a flat JSON document and convert it into the
//! typed layout/boundary/parameter records the solver constructors take.
//! Parsing and validation failures are configuration errors; nothing is
//! defaulted silently except the documented optional entries.
//!
//! ```json
//! {
//!   "nx": 128, "my": 128,
//!   "x_left": -10.0, "length_x": 20.0,
//!   "y_low": -10.0, "length_y": 20.0,
//!   "delta_t": 0.001,
//!   "diffusion": 0.001,
//!   "bc_left":  { "kind": "dirichlet", "value": 0.0 },
//!   "bc_right": { "kind": "dirichlet", "value": 0.0 }
//! }
//! ```

use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::SolverError;
use crate::geometry::{BoundaryCondition, BoundarySet, SlabLayout};
use crate::integrator::StiffParams;

/// Columns reserved per row for the in-place bookkeeping of the real
/// transform (`my` real samples ↔ `my/2 + 1` complex coefficients).
pub const TRANSFORM_PAD_Y: usize = 2;

fn default_tlevs() -> usize {
    4
}

/// One run setup, as read from disk.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    pub nx: usize,
    pub my: usize,
    pub x_left: f64,
    pub length_x: f64,
    pub y_low: f64,
    pub length_y: f64,
    pub delta_t: f64,
    pub diffusion: f64,
    #[serde(default)]
    pub hyper_viscosity: f64,
    #[serde(default = "default_tlevs")]
    pub time_levels: usize,
    pub bc_left: BoundaryCondition<f64>,
    pub bc_right: BoundaryCondition<f64>,
}

impl SimulationConfig {
    /// Parse a configuration from any reader.
    pub fn from_reader(reader: impl Read) -> Result<Self, SolverError> {
        serde_json::from_reader(reader)
            .map_err(|e| SolverError::config(format!("cannot parse run configuration: {e}")))
    }

    /// Load and parse a configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SolverError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            SolverError::config(format!("cannot open {}: {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(file))
    }

    /// Reject impossible extents, spacings and level counts early, before
    /// any allocation happens.
    pub fn validate(&self) -> Result<(), SolverError> {
        self.layout().validate()?;
        self.stiff_params().validate()?;
        if !(self.length_x > 0.0) || !(self.length_y > 0.0) {
            return Err(SolverError::config(format!(
                "domain lengths must be positive, got {} x {}",
                self.length_x, self.length_y
            )));
        }
        Ok(())
    }

    /// The slab geometry this configuration describes.
    #[must_use]
    pub fn layout(&self) -> SlabLayout {
        SlabLayout {
            x_left: self.x_left,
            delta_x: if self.nx > 0 {
                self.length_x / self.nx as f64
            } else {
                0.0
            },
            y_low: self.y_low,
            delta_y: if self.my > 0 {
                self.length_y / self.my as f64
            } else {
                0.0
            },
            nx: self.nx,
            pad_x: 0,
            my: self.my,
            pad_y: TRANSFORM_PAD_Y,
        }
    }

    #[must_use]
    pub fn boundaries(&self) -> BoundarySet<f64> {
        BoundarySet::new(self.bc_left, self.bc_right)
    }

    #[must_use]
    pub fn stiff_params(&self) -> StiffParams {
        StiffParams {
            delta_t: self.delta_t,
            diff: self.diffusion,
            hv: self.hyper_viscosity,
            num_modes: (self.my + TRANSFORM_PAD_Y) / 2,
            tlevs: self.time_levels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = r#"{
        "nx": 64, "my": 64,
        "x_left": -10.0, "length_x": 20.0,
        "y_low": -10.0, "length_y": 20.0,
        "delta_t": 0.001,
        "diffusion": 0.001,
        "bc_left":  { "kind": "dirichlet", "value": 0.0 },
        "bc_right": { "kind": "neumann", "value": 1.5 }
    }"#;

    #[test]
    fn parses_and_converts() {
        let cfg = SimulationConfig::from_reader(GOOD.as_bytes()).expect("parse");
        cfg.validate().expect("valid");
        let l = cfg.layout();
        assert_eq!(l.nx, 64);
        assert_eq!(l.pad_y, TRANSFORM_PAD_Y);
        assert!((l.delta_x - 20.0 / 64.0).abs() < 1e-15);
        let p = cfg.stiff_params();
        assert_eq!(p.num_modes, 33);
        assert_eq!(p.tlevs, 4, "time levels default to 4");
        assert_eq!(
            cfg.boundaries().right,
            BoundaryCondition::Neumann(1.5),
        );
    }

    #[test]
    fn optional_entries_default() {
        let cfg = SimulationConfig::from_reader(GOOD.as_bytes()).expect("parse");
        assert_eq!(cfg.hyper_viscosity, 0.0);
        assert_eq!(cfg.time_levels, 4);
    }

    #[test]
    fn malformed_json_is_config_error() {
        let err = SimulationConfig::from_reader("{ not json".as_bytes()).expect_err("reject");
        assert!(matches!(err, SolverError::Config(_)));
    }

    #[test]
    fn unknown_fields_rejected() {
        let doc = GOOD.replace("\"nx\": 64", "\"nx\": 64, \"Nx_typo\": 3");
        assert!(SimulationConfig::from_reader(doc.as_bytes()).is_err());
    }

    #[test]
    fn zero_extent_fails_validation() {
        let doc = GOOD.replace("\"nx\": 64", "\"nx\": 0");
        let cfg = SimulationConfig::from_reader(doc.as_bytes()).expect("parse");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = SimulationConfig::from_path("/nonexistent/run.json").expect_err("reject");
        assert!(matches!(err, SolverError::Config(_)));
    }
}
