use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use super::ApiResponse;
use crate::errors::AppError;
use crate::models::{Signal, SignalStatus};
use crate::store::sort_newest_first;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<Signal>>>, AppError> {
    let status = match params.status.as_deref() {
        None | Some("") | Some("all") => None,
        Some(raw) => Some(
            SignalStatus::from_str(raw)
                .ok_or_else(|| AppError::BadRequest(format!("unknown status filter: {raw}")))?,
        ),
    };

    let mut signals = state.engine.store().load_signals().await?;
    if let Some(status) = status {
        signals.retain(|s| s.status == status);
    }
    sort_newest_first(&mut signals);

    Ok(Json(ApiResponse::ok(signals)))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Signal>>, AppError> {
    let signal = state
        .engine
        .store()
        .load_signals()
        .await?
        .into_iter()
        .find(|s| s.id == id)
        .ok_or_else(|| AppError::NotFound(format!("signal {id}")))?;

    Ok(Json(ApiResponse::ok(signal)))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Signal>>, AppError> {
    let removed = state.engine.delete_signal(&id).await?;
    Ok(Json(ApiResponse::ok(removed)))
}
