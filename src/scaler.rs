//! Pre-fitted feature scalers.
//!
//! Parameters are exported from the training run as JSON, e.g.
//! `{"kind": "standard", "mean": [...], "scale": [...]}`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error;

/// Feature-wise transform applied before inference.
pub trait Transform: Send + Sync {
    fn transform(&self, x: &[f64]) -> Result<Vec<f64>>;

    /// Number of features the transform was fitted on.
    fn width(&self) -> usize;
}

#[derive(Debug, Error, PartialEq)]
pub enum ScalerError {
    #[error("X has {got} features, but the scaler is expecting {expected} features as input")]
    WidthMismatch { got: usize, expected: usize },
    #[error("scaler parameters have different lengths ({0} vs {1})")]
    ParamLength(usize, usize),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    /// `(x - mean) / scale`
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// `x * scale + min`
    MinMax { min: Vec<f64>, scale: Vec<f64> },
}

impl Scaler {
    pub fn load(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .with_context(|| format!("failed to read scaler at {}", path.display()))?;
        let scaler: Scaler = serde_json::from_str(&txt)
            .with_context(|| format!("failed to parse scaler {}", path.display()))?;
        scaler.validate()?;
        Ok(scaler)
    }

    pub fn validate(&self) -> Result<(), ScalerError> {
        let (a, b) = self.params();
        if a.len() != b.len() {
            return Err(ScalerError::ParamLength(a.len(), b.len()));
        }
        Ok(())
    }

    fn params(&self) -> (&[f64], &[f64]) {
        match self {
            Scaler::Standard { mean, scale } => (mean.as_slice(), scale.as_slice()),
            Scaler::MinMax { min, scale } => (min.as_slice(), scale.as_slice()),
        }
    }
}

impl Transform for Scaler {
    fn transform(&self, x: &[f64]) -> Result<Vec<f64>> {
        let expected = self.width();
        if x.len() != expected {
            return Err(ScalerError::WidthMismatch { got: x.len(), expected }.into());
        }
        let out = match self {
            Scaler::Standard { mean, scale } => x
                .iter()
                .zip(mean.iter().zip(scale))
                .map(|(v, (m, s))| {
                    // zero-variance columns are stored with scale 0 by some exporters
                    let s = if *s == 0.0 { 1.0 } else { *s };
                    (v - m) / s
                })
                .collect(),
            Scaler::MinMax { min, scale } => x
                .iter()
                .zip(min.iter().zip(scale))
                .map(|(v, (lo, s))| v * s + lo)
                .collect(),
        };
        Ok(out)
    }

    fn width(&self) -> usize {
        self.params().0.len()
    }
}
