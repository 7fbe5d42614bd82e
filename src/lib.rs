//! Crop yield prediction server.
//!
//! A request is aligned onto the trained one-hot feature schema, scaled,
//! and run through a TorchScript regressor. See [`service::PredictionService`].

pub mod api;
pub mod config;
pub mod features;
pub mod model;
pub mod scaler;
pub mod schema;
pub mod service;
pub mod types;

pub use features::{align, AlignedFeatureVector, CategoryMatch};
pub use schema::FeatureSchema;
pub use service::{Artifacts, PredictError, PredictionService};
pub use types::{PredictionDetails, PredictionRequest, PredictionResult};
