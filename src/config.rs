//! Configuration module

use std::{env, path::PathBuf};

use crate::types::DEFAULT_MODEL_TAG;

/// Where the model artifacts live.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactPaths {
    pub scaler: PathBuf,
    pub model: PathBuf,
    /// Schema metadata; the built-in schema is used when unset.
    pub meta: Option<PathBuf>,
    pub model_tag: String,
}

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub artifacts: ArtifactPaths,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let models_dir = PathBuf::from(var("MODELS_DIR").unwrap_or_else(|| "models".to_string()));

        let artifacts = ArtifactPaths {
            scaler: var("SCALER_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| models_dir.join("scaler.json")),
            model: var("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| models_dir.join("decision_tree_model.pt")),
            meta: var("META_PATH").filter(|p| !p.is_empty()).map(PathBuf::from),
            model_tag: var("MODEL_TAG").unwrap_or_else(|| DEFAULT_MODEL_TAG.to_string()),
        };

        Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: var("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(5001),
            artifacts,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
