//! Prediction service: aligner -> scaler -> model.
//!
//! A service is either Ready (artifacts loaded) or Unloaded. Unloaded is
//! terminal for the process; every prediction then fails with
//! [`PredictError::ModelUnavailable`].

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use thiserror::Error;

use crate::config::ArtifactPaths;
use crate::features::{align, category_match};
use crate::model::{Regressor, TorchRegressor};
use crate::scaler::{Scaler, Transform};
use crate::schema::FeatureSchema;
use crate::types::{PredictionDetails, PredictionRequest, PredictionResult};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PredictError {
    #[error("model or scaler not loaded: {0}")]
    ModelUnavailable(String),
    #[error("{0}")]
    Inference(String),
}

/// Everything loaded at startup. Read-only afterwards.
pub struct Artifacts {
    pub schema: Arc<FeatureSchema>,
    pub scaler: Arc<dyn Transform>,
    pub model: Arc<dyn Regressor>,
    pub model_tag: String,
}

impl Artifacts {
    pub fn new(
        schema: FeatureSchema,
        scaler: Arc<dyn Transform>,
        model: Arc<dyn Regressor>,
        model_tag: impl Into<String>,
    ) -> Result<Self> {
        check_width(scaler.as_ref(), &schema)?;
        Ok(Self {
            schema: Arc::new(schema),
            scaler,
            model,
            model_tag: model_tag.into(),
        })
    }

    /// Loads schema, scaler and TorchScript model from disk.
    pub fn load(paths: &ArtifactPaths) -> Result<Self> {
        let schema = match &paths.meta {
            Some(meta) => FeatureSchema::from_meta_file(meta)?,
            None => FeatureSchema::builtin(),
        };
        let scaler = Scaler::load(&paths.scaler)?;
        check_width(&scaler, &schema)?;
        let model = TorchRegressor::load(&paths.model, schema.len())?;

        // Warmup to make sure the whole chain runs on this schema width
        let warm = model
            .predict(&scaler.transform(&vec![0.0; schema.len()])?)
            .context("warmup forward failed")?;
        tracing::debug!("warmup forward ok, out_len={}", warm.len());

        Self::new(schema, Arc::new(scaler), Arc::new(model), paths.model_tag.clone())
    }
}

fn check_width(scaler: &dyn Transform, schema: &FeatureSchema) -> Result<()> {
    if scaler.width() != schema.len() {
        bail!(
            "scaler expects {} features but the schema has {} columns",
            scaler.width(),
            schema.len()
        );
    }
    Ok(())
}

#[derive(Clone)]
enum State {
    Ready(Arc<Artifacts>),
    Unloaded(Arc<str>),
}

/// Cheap to clone; clones share the same artifacts.
#[derive(Clone)]
pub struct PredictionService {
    state: State,
}

impl PredictionService {
    pub fn ready(artifacts: Artifacts) -> Self {
        Self {
            state: State::Ready(Arc::new(artifacts)),
        }
    }

    pub fn unloaded(reason: impl Into<String>) -> Self {
        let reason: String = reason.into();
        Self {
            state: State::Unloaded(reason.into()),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    pub fn predict(&self, req: &PredictionRequest) -> Result<PredictionResult, PredictError> {
        let artifacts = match &self.state {
            State::Ready(a) => a,
            State::Unloaded(reason) => {
                return Err(PredictError::ModelUnavailable(reason.to_string()))
            }
        };

        let matched = category_match(req, &artifacts.schema);
        if !matched.area {
            tracing::warn!(area = %req.area, "unknown area label, Area_* segment left at zero");
        }
        if !matched.item {
            tracing::warn!(item = %req.item, "unknown item label, Item_* segment left at zero");
        }

        let features = align(req, &artifacts.schema);
        tracing::debug!(
            in_dim = features.len(),
            nonzero = features.nonzero(),
            "aligned features"
        );

        let scaled = artifacts
            .scaler
            .transform(features.as_slice())
            .map_err(|e| PredictError::Inference(format!("{e:#}")))?;
        let out = artifacts
            .model
            .predict(&scaled)
            .map_err(|e| PredictError::Inference(format!("{e:#}")))?;

        let raw = match out.first() {
            Some(v) if v.is_finite() => *v,
            Some(v) => {
                return Err(PredictError::Inference(format!(
                    "model returned a non-finite prediction ({v})"
                )))
            }
            None => return Err(PredictError::Inference("model returned no output".into())),
        };

        Ok(PredictionResult {
            value: round2(raw),
            details: PredictionDetails {
                year: req.year,
                rainfall_mm: req.rainfall_mm_per_year,
                pesticides_tonnes: req.pesticides_tonnes,
                avg_temp: req.avg_temp,
                area: req.area.clone(),
                item: req.item.clone(),
                model: artifacts.model_tag.clone(),
            },
        })
    }
}

pub fn round2(v: f64) -> f64 {
    // halves go to the even neighbour, like numpy's round
    (v * 100.0).round_ties_even() / 100.0
}
