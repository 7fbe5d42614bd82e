//! HTTP surface: `GET /health` and `POST /predict`.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::service::{PredictError, PredictionService};
use crate::types::{HealthResponse, PredictResponse, PredictionRequest};

/// Body keys of `POST /predict`, in the order they are reported when missing.
pub const REQUIRED_FIELDS: [&str; 6] = [
    "year",
    "average_rain_fall_mm_per_year",
    "pesticides_tonnes",
    "avg_temp",
    "area",
    "item",
];

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid JSON body")]
    InvalidBody,
    #[error("missing fields")]
    MissingFields(Vec<String>),
    #[error("invalid value for {field:?}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error(transparent)]
    Predict(#[from] PredictError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            ApiError::InvalidBody => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::MissingFields(missing) => {
                tracing::info!("Missing fields: {:?}", missing);
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": message, "missing": missing })),
                )
                    .into_response()
            }
            ApiError::InvalidField { .. } | ApiError::Predict(_) => {
                tracing::error!("prediction failed: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": message })),
                )
                    .into_response()
            }
        }
    }
}

pub fn router(service: PredictionService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

// The body is read as raw bytes so clients need not send a JSON content type.
async fn predict(
    State(service): State<PredictionService>,
    body: Bytes,
) -> Result<Json<PredictResponse>, ApiError> {
    let payload: Value = serde_json::from_slice(&body).map_err(|_| ApiError::InvalidBody)?;
    let obj = payload.as_object().ok_or(ApiError::InvalidBody)?;

    let req = parse_request(obj)?;
    let result = service.predict(&req)?;
    tracing::debug!(
        area = %req.area,
        item = %req.item,
        prediction = result.value,
        "prediction ok"
    );
    Ok(Json(result.into()))
}

/// Checks presence of every required key, then coerces each value.
pub fn parse_request(obj: &Map<String, Value>) -> Result<PredictionRequest, ApiError> {
    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|k| !obj.contains_key(**k))
        .map(|k| k.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ApiError::MissingFields(missing));
    }

    Ok(PredictionRequest {
        year: as_int("year", &obj["year"])?,
        rainfall_mm_per_year: as_float(
            "average_rain_fall_mm_per_year",
            &obj["average_rain_fall_mm_per_year"],
        )?,
        pesticides_tonnes: as_float("pesticides_tonnes", &obj["pesticides_tonnes"])?,
        avg_temp: as_float("avg_temp", &obj["avg_temp"])?,
        area: as_label(&obj["area"]),
        item: as_label(&obj["item"]),
    })
}

fn as_int(field: &'static str, v: &Value) -> Result<i64, ApiError> {
    let parsed = match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Bool(b) => Some(*b as i64),
        _ => None,
    };
    parsed.ok_or_else(|| ApiError::InvalidField {
        field,
        reason: format!("expected an integer, got {v}"),
    })
}

fn as_float(field: &'static str, v: &Value) -> Result<f64, ApiError> {
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.ok_or_else(|| ApiError::InvalidField {
        field,
        reason: format!("expected a number, got {v}"),
    })
}

fn as_label(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().expect("object")
    }

    #[test]
    fn test_parse_full_request() {
        let req = parse_request(&obj(json!({
            "year": 2024,
            "average_rain_fall_mm_per_year": 1100.0,
            "pesticides_tonnes": 6000,
            "avg_temp": "21.5",
            "area": "India",
            "item": "Wheat",
            "extra": true
        })))
        .unwrap();
        assert_eq!(req.year, 2024);
        assert_eq!(req.rainfall_mm_per_year, 1100.0);
        assert_eq!(req.pesticides_tonnes, 6000.0);
        assert_eq!(req.avg_temp, 21.5);
        assert_eq!(req.area, "India");
        assert_eq!(req.item, "Wheat");
    }

    #[test]
    fn test_missing_fields_listed_in_order() {
        let err = parse_request(&obj(json!({ "year": 2024 }))).unwrap_err();
        match err {
            ApiError::MissingFields(missing) => assert_eq!(
                missing,
                vec![
                    "average_rain_fall_mm_per_year",
                    "pesticides_tonnes",
                    "avg_temp",
                    "area",
                    "item"
                ]
            ),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_null_counts_as_present() {
        let err = parse_request(&obj(json!({
            "year": 2024,
            "average_rain_fall_mm_per_year": null,
            "pesticides_tonnes": 1.0,
            "avg_temp": 1.0,
            "area": "India",
            "item": "Wheat"
        })))
        .unwrap_err();
        assert!(matches!(
            err,
            ApiError::InvalidField { field: "average_rain_fall_mm_per_year", .. }
        ));
    }

    #[test]
    fn test_year_coercion() {
        assert_eq!(as_int("year", &json!(2024)).unwrap(), 2024);
        assert_eq!(as_int("year", &json!(2024.9)).unwrap(), 2024);
        assert_eq!(as_int("year", &json!(" 1999 ")).unwrap(), 1999);
        let err = as_int("year", &json!("abc")).unwrap_err();
        assert_eq!(err.to_string(), r#"invalid value for "year": expected an integer, got "abc""#);
    }

    #[test]
    fn test_label_coercion() {
        assert_eq!(as_label(&json!("Sri Lanka")), "Sri Lanka");
        assert_eq!(as_label(&json!(42)), "42");
    }
}
