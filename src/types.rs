use serde::{Deserialize, Serialize};

pub const UNITS: &str = "tonnes/ha";
pub const DEFAULT_MODEL_TAG: &str = "decision_tree";

/// One prediction call, after field coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub year: i64,
    pub rainfall_mm_per_year: f64,
    pub pesticides_tonnes: f64,
    pub avg_temp: f64,
    pub area: String, // country label, e.g. "India"
    pub item: String, // crop label, e.g. "Wheat"
}

/// Echo of the inputs plus the model tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionDetails {
    pub year: i64,
    pub rainfall_mm: f64,
    pub pesticides_tonnes: f64,
    pub avg_temp: f64,
    pub area: String,
    pub item: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    /// Yield in tonnes/ha, rounded to 2 decimals.
    pub value: f64,
    pub details: PredictionDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: f64,
    pub units: String,
    pub details: PredictionDetails,
}

impl From<PredictionResult> for PredictResponse {
    fn from(r: PredictionResult) -> Self {
        Self {
            prediction: r.value,
            units: UNITS.to_string(),
            details: r.details,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
