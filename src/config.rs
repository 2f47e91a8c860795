//! Run configuration, read from an optional TOML file.
//!
//! Every table and every field is optional:
//!
//! ```toml
//! [limits]
//! mass_target = 1000.0
//! protein = { min = 170.0, max = 200.0 }
//!
//! [solver]
//! max_iterations = 200
//!
//! [bounds]
//! lower = 0.0
//! upper = 1000.0
//!
//! [start]
//! x0 = [600.0, 150.0, 25.0, 225.0]
//!
//! [paths]
//! data = "datos/ingredientes.csv"
//! output = "resultados/solucion.csv"
//!
//! [labels]
//! trigo = "Semillas de trigo"
//! ```
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::limits::BlendLimits;
use crate::report::{default_labels, Labels};
use crate::solve::DEFAULT_BOUNDS;
use crate::solvers::SolverSettings;

/// The configuration file read when none is named
pub const DEFAULT_CONFIG_PATH: &str = "feedmix.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        let (lower, upper) = DEFAULT_BOUNDS;
        Bounds { lower, upper }
    }
}

impl Bounds {
    pub fn as_pair(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }
}

/// Where the search starts
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Start {
    /// kg per ingredient. The mass target split evenly when absent.
    pub x0: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    /// Coefficient table
    pub data: PathBuf,
    /// Result table
    pub output: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Paths {
            data: PathBuf::from("datos/ingredientes.csv"),
            output: PathBuf::from("resultados/solucion.csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub limits: BlendLimits,
    pub solver: SolverSettings,
    pub bounds: Bounds,
    pub start: Start,
    pub paths: Paths,
    /// Display names used in the result table and the charts
    pub labels: Labels,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            limits: BlendLimits::default(),
            solver: SolverSettings::default(),
            bounds: Bounds::default(),
            start: Start::default(),
            paths: Paths::default(),
            labels: default_labels(),
        }
    }
}

impl RunConfig {
    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
