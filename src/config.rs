//! Run configuration for the regridding engine.
//!
//! Every tunable travels in a [`RegridConfig`] value handed to the entry
//! points in [`crate::algs::regrid`]; nothing is read from process-wide state.
//! Configs can be built in code or decoded from JSON:
//!
//! ```
//! use mesh_regrid::config::{AggregationMode, RegridConfig};
//!
//! let cfg = RegridConfig::from_json_str(r#"{ "mode": "sum", "max_concurrency": 4 }"#).unwrap();
//! assert_eq!(cfg.mode, AggregationMode::Sum);
//! assert_eq!(cfg.max_concurrency, 4);
//! ```

use crate::mesh_error::MeshRegridError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Default bound on concurrently running per-target tasks.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Default slack allowed above 1.0 for fractions and fraction sums.
pub const DEFAULT_FRACTION_TOLERANCE: f64 = 1e-6;

/// Which cell's area is the denominator of an intersection fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    /// `overlap / area(target)`: each target receives the overlap-weighted
    /// mean of the source field (intensive quantities such as concentrations).
    #[default]
    Mean,
    /// `overlap / area(source)`: each source value is split across targets in
    /// proportion to coverage, conserving the total (extensive quantities).
    Sum,
}

impl AggregationMode {
    /// Pick the denominator for a `(source, target)` pair.
    #[inline]
    pub fn denominator(self, source_area: f64, target_area: f64) -> f64 {
        match self {
            AggregationMode::Mean => target_area,
            AggregationMode::Sum => source_area,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AggregationMode::Mean => "mean",
            AggregationMode::Sum => "sum",
        }
    }
}

impl fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregationMode {
    type Err = MeshRegridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(AggregationMode::Mean),
            "sum" => Ok(AggregationMode::Sum),
            other => Err(MeshRegridError::InvalidConfig(format!(
                "unknown aggregation mode `{other}` (expected `mean` or `sum`)"
            ))),
        }
    }
}

/// Parameters for one regridding run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegridConfig {
    /// Fraction denominator convention.
    pub mode: AggregationMode,
    /// Number of worker threads in the per-run pool. Must be at least 1.
    pub max_concurrency: usize,
    /// Fractions above `1 + fraction_tolerance` are reported as suspect.
    pub fraction_tolerance: f64,
}

impl Default for RegridConfig {
    fn default() -> Self {
        Self {
            mode: AggregationMode::Mean,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            fraction_tolerance: DEFAULT_FRACTION_TOLERANCE,
        }
    }
}

impl RegridConfig {
    pub fn with_mode(mut self, mode: AggregationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_fraction_tolerance(mut self, tolerance: f64) -> Self {
        self.fraction_tolerance = tolerance;
        self
    }

    /// Check ranges. Entry points call this before any work starts.
    pub fn validate(&self) -> Result<(), MeshRegridError> {
        if self.max_concurrency == 0 {
            return Err(MeshRegridError::InvalidConfig(
                "max_concurrency must be at least 1".into(),
            ));
        }
        if !self.fraction_tolerance.is_finite() || self.fraction_tolerance < 0.0 {
            return Err(MeshRegridError::InvalidConfig(format!(
                "fraction_tolerance must be a finite non-negative number, got {}",
                self.fraction_tolerance
            )));
        }
        Ok(())
    }

    /// Decode a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, MeshRegridError> {
        let cfg: RegridConfig =
            serde_json::from_str(json).map_err(|e| MeshRegridError::ConfigParse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and decode a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, MeshRegridError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| MeshRegridError::from(e).in_file(path))?;
        Self::from_json_str(&text).map_err(|e| e.in_file(path))
    }
}
