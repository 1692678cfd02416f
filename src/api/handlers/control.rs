use axum::extract::State;
use axum::Json;
use chrono::Utc;

use super::ApiResponse;
use crate::errors::AppError;
use crate::services::{DetectionReport, ValuationReport};
use crate::AppState;

/// POST /api/control/detect: run one detection pass now.
pub async fn detect(State(state): State<AppState>) -> Result<Json<ApiResponse<DetectionReport>>, AppError> {
    tracing::info!("Detection pass triggered via control API");
    let report = state.engine.run_detection_pass(Utc::now()).await?;
    Ok(Json(ApiResponse::ok(report)))
}

/// POST /api/control/valuate: run one valuation pass now.
pub async fn valuate(State(state): State<AppState>) -> Result<Json<ApiResponse<ValuationReport>>, AppError> {
    tracing::info!("Valuation pass triggered via control API");
    let report = state.engine.run_valuation_pass(Utc::now()).await?;
    Ok(Json(ApiResponse::ok(report)))
}
